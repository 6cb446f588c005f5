use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers;
use crate::store::traits::Store;

/// Loyalty backend endpoints the admin dashboard talks to, mounted under `/api`
pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    let api = Router::new()
        // Session
        .route("/login", post(handlers::login::<S>))
        // Users
        .route("/getAllUsers", get(handlers::list_users::<S>))
        .route("/getUserById/:user_id", get(handlers::get_user_by_id::<S>))
        .route("/deleteUserById/:user_id", delete(handlers::delete_user_by_id::<S>))
        .route("/updateUserStatus", patch(handlers::update_user_status::<S>))
        // Business requests
        .route(
            "/pendingBusinessRequests",
            get(handlers::pending_business_requests::<S>),
        )
        .route("/approveBusiness/:user_id", post(handlers::approve_business::<S>))
        .route("/rejectBusiness/:user_id", post(handlers::reject_business::<S>))
        // Businesses
        .route("/getAllBusinesses", get(handlers::list_businesses::<S>))
        .route("/createBusiness", post(handlers::create_business::<S>))
        .route("/updateBusiness/:business_id", patch(handlers::update_business::<S>))
        .route("/deleteBusiness/:business_id", delete(handlers::delete_business::<S>))
        // Rewards
        .route("/getAllRewards", get(handlers::list_rewards::<S>))
        .route("/createReward", post(handlers::create_reward::<S>))
        .route("/updateReward/:reward_id", put(handlers::update_reward::<S>))
        .route(
            "/updateRewardStatus/:reward_id",
            put(handlers::update_reward_status::<S>),
        )
        .route("/deleteReward/:reward_id", delete(handlers::delete_reward::<S>))
        // Redeems (the list path keeps the backend's spelling)
        .route("/geAllRedeems", get(handlers::list_redeems::<S>))
        .route("/update-status", put(handlers::update_redeem_status::<S>))
        // Business details
        .route(
            "/get-all-business-details",
            get(handlers::list_business_details::<S>),
        )
        .route(
            "/create-business-details",
            post(handlers::create_business_details::<S>),
        )
        .route(
            "/update-business-details/:info_id",
            put(handlers::update_business_details::<S>),
        )
        .route(
            "/delete-business-details/:info_id",
            delete(handlers::delete_business_details::<S>),
        )
        // History
        .route("/getAllUserHistory", get(handlers::list_all_history::<S>))
        .route(
            "/getUserHistoryByBusinessId/:business_id",
            get(handlers::list_business_history::<S>),
        )
        // Receipts
        .route("/uploaded-receipts", get(handlers::list_receipts::<S>))
        .route(
            "/update-receipt-status",
            patch(handlers::update_receipt_status::<S>),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
