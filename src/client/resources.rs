//! Endpoint definitions of every admin list page.
//!
//! A [`Resource`] tells the list controller where to fetch, how to decode
//! and flatten one record, and which category tabs it offers. The inherent
//! methods on each resource build the [`MutationIntent`]s its page can fire.

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::client::ListRequest;
use crate::config::ListSettings;
use crate::logic::normalize;
use crate::model::{
    is_missing_id, BusinessDraft, BusinessInfoDraft, BusinessInfoRecord, BusinessInfoRow,
    BusinessRecord, BusinessRequestRow, BusinessRow, HistoryRecord, HistoryRow, Id,
    MutationIntent, MutationKind, Payload, QueryState, ReceiptRecord, ReceiptRow,
    ReceiptStatus, ReceiptStatusUpdate, RedeemRecord, RedeemRow, RedeemStatus, RewardDraft,
    RewardRecord, RewardRow, Route, Row, SortOrder, UserRecord, UserRow, UserStatus,
};

/// Business categories every reward and redeem page offers as tabs
pub const BUSINESS_TYPE_TABS: [&str; 4] = [
    "Supermarket",
    "Rumshop/Small Store",
    "Wholesaler",
    "Bar/Restaurant",
];

pub const HISTORY_ACTION_TYPES: [&str; 3] = ["qr_code_create", "qr_scan", "receipt_upload"];

pub const RECEIPT_CASE_TYPES: [&str; 4] = ["case_0_25", "case_0_5", "case_0_75", "case_1"];

const LARGE_PAGE: u32 = 100;

pub trait Resource: Send + Sync + 'static {
    type Raw: DeserializeOwned + Send;
    type Row: Row + Clone + Send + Sync + 'static;

    /// Plural noun used in messages, e.g. `rewards`
    fn noun(&self) -> &'static str;

    fn list_path(&self) -> String;

    /// Query parameter that carries the active tab
    fn filter_param(&self) -> Option<&'static str> {
        None
    }

    fn page_size(&self, settings: &ListSettings) -> u32 {
        settings.page_size
    }

    fn default_sort(&self) -> Option<(&'static str, SortOrder)> {
        None
    }

    fn normalize(&self, raw: Self::Raw) -> Self::Row;

    /// Tab value a row belongs to, for pages whose tabs come from data
    fn category(&self, _row: &Self::Row) -> Option<String> {
        None
    }

    /// Tabs shown before any data has been seen
    fn base_tabs(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the tab list is completed from a first-page snapshot
    fn tabs_from_snapshot(&self) -> bool {
        false
    }

    fn initial_query(&self, settings: &ListSettings) -> QueryState {
        let query = QueryState::new(self.page_size(settings));
        match self.default_sort() {
            Some((sort_by, order)) => query.with_sort(sort_by, order),
            None => query,
        }
    }

    fn list_request(&self, query: &QueryState) -> ListRequest {
        let mut request = ListRequest::new(self.list_path(), query.page(), query.page_size())
            .param("search", query.search());
        if let Some(sort_by) = query.sort_by() {
            request = request.param("sortBy", sort_by);
        }
        if let Some(order) = query.sort_order() {
            request = request.param("sortOrder", order.as_str());
        }
        match (self.filter_param(), query.filter().tag()) {
            (Some(param), Some(tag)) => request.param(param, tag),
            _ => request,
        }
    }
}

fn delete_intent(resource: &'static str, path: &str, id: &str) -> MutationIntent {
    MutationIntent::new(
        MutationKind::Delete,
        resource,
        Route::delete(format!("{}/{}", path, id.trim())),
    )
    .targeting(id)
    .needs_confirmation()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Users;

impl Resource for Users {
    type Raw = UserRecord;
    type Row = UserRow;

    fn noun(&self) -> &'static str {
        "users"
    }

    fn list_path(&self) -> String {
        "/getAllUsers".to_string()
    }

    fn filter_param(&self) -> Option<&'static str> {
        Some("role")
    }

    fn normalize(&self, raw: UserRecord) -> UserRow {
        normalize::normalize_user(raw)
    }

    fn base_tabs(&self) -> Vec<String> {
        vec!["consumer".to_string(), "business".to_string()]
    }
}

impl Users {
    pub fn delete(&self, row: &UserRow) -> MutationIntent {
        delete_intent("user", "/deleteUserById", &row.id)
    }

    pub fn set_status(&self, user_id: &str, status: UserStatus) -> MutationIntent {
        MutationIntent::new(
            MutationKind::StatusTransition,
            "user",
            Route::patch("/updateUserStatus"),
        )
        .targeting(user_id)
        .with_json(json!({"userId": user_id.trim(), "status": status.as_str()}))
    }

    /// Active users get blocked, blocked users get reactivated
    pub fn toggle_status(&self, row: &UserRow) -> MutationIntent {
        self.set_status(&row.id, row.status.toggled())
    }
}

/// Business accounts awaiting approval
#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessRequests;

impl Resource for BusinessRequests {
    type Raw = UserRecord;
    type Row = BusinessRequestRow;

    fn noun(&self) -> &'static str {
        "business requests"
    }

    fn list_path(&self) -> String {
        "/pendingBusinessRequests".to_string()
    }

    fn normalize(&self, raw: UserRecord) -> BusinessRequestRow {
        normalize::normalize_business_request(raw)
    }
}

impl BusinessRequests {
    fn decision(&self, row: &BusinessRequestRow, approve: bool) -> MutationIntent {
        let (verb, path, done) = if approve {
            ("approve", "/approveBusiness", "approved")
        } else {
            ("reject", "/rejectBusiness", "rejected")
        };
        let intent = MutationIntent::new(
            MutationKind::StatusTransition,
            "business",
            Route::post(format!("{}/{}", path, row.id.trim())),
        )
        .described(
            &format!("{verb} this business"),
            &format!("Business {done} successfully."),
            &format!("Failed to {verb} business."),
        )
        .needs_confirmation();
        if is_missing_id(&row.id) {
            intent.with_violations(vec![format!("Unable to {verb}: missing identifier.")])
        } else {
            intent.targeting(&row.id)
        }
    }

    pub fn approve(&self, row: &BusinessRequestRow) -> MutationIntent {
        self.decision(row, true)
    }

    pub fn reject(&self, row: &BusinessRequestRow) -> MutationIntent {
        self.decision(row, false)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Businesses;

impl Resource for Businesses {
    type Raw = BusinessRecord;
    type Row = BusinessRow;

    fn noun(&self) -> &'static str {
        "businesses"
    }

    fn list_path(&self) -> String {
        "/getAllBusinesses".to_string()
    }

    fn normalize(&self, raw: BusinessRecord) -> BusinessRow {
        normalize::normalize_business(raw)
    }
}

impl Businesses {
    pub fn create(&self, draft: &BusinessDraft) -> MutationIntent {
        MutationIntent::new(MutationKind::Create, "business", Route::post("/createBusiness"))
            .with_json(draft.to_json())
            .with_violations(draft.violations())
    }

    pub fn update(&self, business_id: &str, draft: &BusinessDraft) -> MutationIntent {
        MutationIntent::new(
            MutationKind::Update,
            "business",
            Route::patch(format!("/updateBusiness/{}", business_id.trim())),
        )
        .targeting(business_id)
        .with_json(draft.to_json())
        .with_violations(draft.violations())
    }

    pub fn delete(&self, row: &BusinessRow) -> MutationIntent {
        delete_intent("business", "/deleteBusiness", &row.id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Rewards;

impl Resource for Rewards {
    type Raw = RewardRecord;
    type Row = RewardRow;

    fn noun(&self) -> &'static str {
        "rewards"
    }

    fn list_path(&self) -> String {
        "/getAllRewards".to_string()
    }

    fn filter_param(&self) -> Option<&'static str> {
        Some("business")
    }

    fn normalize(&self, raw: RewardRecord) -> RewardRow {
        normalize::normalize_reward(raw)
    }

    fn category(&self, row: &RewardRow) -> Option<String> {
        Some(row.business_name.clone())
    }

    fn base_tabs(&self) -> Vec<String> {
        BUSINESS_TYPE_TABS.iter().map(|tab| tab.to_string()).collect()
    }

    fn tabs_from_snapshot(&self) -> bool {
        true
    }
}

impl Rewards {
    pub fn create(&self, draft: &RewardDraft) -> MutationIntent {
        MutationIntent::new(MutationKind::Create, "reward", Route::post("/createReward"))
            .with_payload(Payload::Multipart(draft.to_form()))
            .with_violations(draft.violations(true))
    }

    pub fn update(&self, reward_id: &str, draft: &RewardDraft) -> MutationIntent {
        MutationIntent::new(
            MutationKind::Update,
            "reward",
            Route::put(format!("/updateReward/{}", reward_id.trim())),
        )
        .targeting(reward_id)
        .with_payload(Payload::Multipart(draft.to_form()))
        .with_violations(draft.violations(false))
    }

    pub fn set_active(&self, reward_id: &str, active: bool) -> MutationIntent {
        MutationIntent::new(
            MutationKind::StatusTransition,
            "reward",
            Route::put(format!("/updateRewardStatus/{}", reward_id.trim())),
        )
        .targeting(reward_id)
        .with_json(json!({"isActive": active}))
    }

    pub fn toggle_status(&self, row: &RewardRow) -> MutationIntent {
        self.set_active(&row.id, !row.is_active)
    }

    pub fn delete(&self, row: &RewardRow) -> MutationIntent {
        delete_intent("reward", "/deleteReward", &row.id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Redeems;

impl Resource for Redeems {
    type Raw = RedeemRecord;
    type Row = RedeemRow;

    fn noun(&self) -> &'static str {
        "redeems"
    }

    fn list_path(&self) -> String {
        "/geAllRedeems".to_string()
    }

    fn filter_param(&self) -> Option<&'static str> {
        Some("business")
    }

    fn normalize(&self, raw: RedeemRecord) -> RedeemRow {
        normalize::normalize_redeem(raw)
    }

    fn category(&self, row: &RedeemRow) -> Option<String> {
        Some(row.business_name.clone())
    }

    fn base_tabs(&self) -> Vec<String> {
        BUSINESS_TYPE_TABS.iter().map(|tab| tab.to_string()).collect()
    }

    fn tabs_from_snapshot(&self) -> bool {
        true
    }
}

impl Redeems {
    pub fn set_status(&self, redeem_id: &str, status: RedeemStatus) -> MutationIntent {
        MutationIntent::new(
            MutationKind::StatusTransition,
            "redeem",
            Route::put("/update-status"),
        )
        .targeting(redeem_id)
        .with_json(json!({"redeemId": redeem_id.trim(), "status": status.as_str()}))
    }

    /// Applies the one action the row currently offers
    pub fn toggle_status(&self, row: &RedeemRow) -> MutationIntent {
        self.set_status(&row.id, row.available_action().target_status())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessInfo;

impl Resource for BusinessInfo {
    type Raw = BusinessInfoRecord;
    type Row = BusinessInfoRow;

    fn noun(&self) -> &'static str {
        "business info"
    }

    fn list_path(&self) -> String {
        "/get-all-business-details".to_string()
    }

    fn normalize(&self, raw: BusinessInfoRecord) -> BusinessInfoRow {
        normalize::normalize_business_info(raw)
    }
}

impl BusinessInfo {
    pub fn create(&self, draft: &BusinessInfoDraft) -> MutationIntent {
        MutationIntent::new(
            MutationKind::Create,
            "business info",
            Route::post("/create-business-details"),
        )
        .with_json(draft.to_json())
        .with_violations(draft.violations())
    }

    pub fn update(&self, info_id: &str, draft: &BusinessInfoDraft) -> MutationIntent {
        MutationIntent::new(
            MutationKind::Update,
            "business info",
            Route::put(format!("/update-business-details/{}", info_id.trim())),
        )
        .targeting(info_id)
        .with_json(draft.to_json())
        .with_violations(draft.violations())
    }

    pub fn delete(&self, row: &BusinessInfoRow) -> MutationIntent {
        delete_intent("business info", "/delete-business-details", &row.id)
    }
}

/// Activity log, optionally scoped to one business
#[derive(Debug, Clone, Default)]
pub struct History {
    business_id: Option<Id>,
}

impl History {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_business(business_id: &str) -> Self {
        Self {
            business_id: Some(business_id.trim().to_string()).filter(|id| !is_missing_id(id)),
        }
    }

    pub fn business_id(&self) -> Option<&str> {
        self.business_id.as_deref()
    }
}

impl Resource for History {
    type Raw = HistoryRecord;
    type Row = HistoryRow;

    fn noun(&self) -> &'static str {
        "history"
    }

    fn list_path(&self) -> String {
        match &self.business_id {
            Some(id) => format!("/getUserHistoryByBusinessId/{id}"),
            None => "/getAllUserHistory".to_string(),
        }
    }

    fn filter_param(&self) -> Option<&'static str> {
        Some("actionType")
    }

    fn page_size(&self, _settings: &ListSettings) -> u32 {
        LARGE_PAGE
    }

    fn default_sort(&self) -> Option<(&'static str, SortOrder)> {
        Some(("timestamp", SortOrder::Desc))
    }

    fn normalize(&self, raw: HistoryRecord) -> HistoryRow {
        normalize::normalize_history(raw)
    }

    fn base_tabs(&self) -> Vec<String> {
        HISTORY_ACTION_TYPES.iter().map(|tab| tab.to_string()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Receipts;

impl Resource for Receipts {
    type Raw = ReceiptRecord;
    type Row = ReceiptRow;

    fn noun(&self) -> &'static str {
        "receipts"
    }

    fn list_path(&self) -> String {
        "/uploaded-receipts".to_string()
    }

    fn filter_param(&self) -> Option<&'static str> {
        Some("caseType")
    }

    fn page_size(&self, _settings: &ListSettings) -> u32 {
        LARGE_PAGE
    }

    fn default_sort(&self) -> Option<(&'static str, SortOrder)> {
        Some(("createdAt", SortOrder::Desc))
    }

    fn normalize(&self, raw: ReceiptRecord) -> ReceiptRow {
        normalize::normalize_receipt(raw)
    }

    fn base_tabs(&self) -> Vec<String> {
        RECEIPT_CASE_TYPES.iter().map(|tab| tab.to_string()).collect()
    }
}

impl Receipts {
    /// Approving or rejecting is final and needs confirmation; resetting to pending does not
    pub fn set_status(
        &self,
        row: &ReceiptRow,
        status: ReceiptStatus,
        admin_notes: Option<&str>,
    ) -> MutationIntent {
        let update = ReceiptStatusUpdate {
            session_id: row.id.trim().to_string(),
            status,
            admin_notes: admin_notes
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_string),
        };
        let intent = MutationIntent::new(
            MutationKind::StatusTransition,
            "receipt",
            Route::patch("/update-receipt-status"),
        )
        .targeting(&row.id)
        .with_json(json!(update));
        match status {
            ReceiptStatus::Pending => intent,
            ReceiptStatus::Approved | ReceiptStatus::Rejected => intent.needs_confirmation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Filter, RedeemAction, PLACEHOLDER};

    fn redeem_row(status: &str) -> RedeemRow {
        normalize::normalize_redeem(
            serde_json::from_value(json!({"_id": "x1", "status": status})).unwrap(),
        )
    }

    #[test]
    fn list_request_carries_query_state() {
        let mut query = Users.initial_query(&ListSettings::default());
        query.commit_search(" smith ");
        query.set_filter(Filter::from_tag("consumer"));
        let request = Users.list_request(&query);
        assert_eq!(request.path, "/getAllUsers");
        assert_eq!(request.limit, 15);
        assert_eq!(request.get("search"), Some("smith"));
        assert_eq!(request.get("role"), Some("consumer"));
        assert_eq!(request.get("sortBy"), None);
    }

    #[test]
    fn history_uses_large_pages_and_business_scope() {
        let history = History::for_business("b42");
        let query = history.initial_query(&ListSettings::default());
        let request = history.list_request(&query);
        assert_eq!(request.path, "/getUserHistoryByBusinessId/b42");
        assert_eq!(request.limit, 100);
        assert_eq!(request.get("sortBy"), Some("timestamp"));
        assert_eq!(request.get("sortOrder"), Some("desc"));

        assert_eq!(History::for_business(PLACEHOLDER).business_id(), None);
        assert_eq!(History::all().list_path(), "/getAllUserHistory");
    }

    #[test]
    fn deletes_need_confirmation() {
        let row = normalize::normalize_reward(serde_json::from_value(json!({"_id": "r1"})).unwrap());
        let intent = Rewards.delete(&row);
        assert!(intent.requires_confirmation);
        assert_eq!(intent.route, Route::delete("/deleteReward/r1"));
        assert_eq!(intent.target_id.as_deref(), Some("r1"));
    }

    #[test]
    fn redeem_toggle_follows_the_offered_action() {
        let pending = redeem_row("pending");
        assert_eq!(pending.available_action(), RedeemAction::MarkDelivered);
        let intent = Redeems.toggle_status(&pending);
        assert_eq!(
            intent.payload,
            Payload::Json(json!({"redeemId": "x1", "status": "delivered"}))
        );
        assert!(!intent.requires_confirmation);

        let intent = Redeems.toggle_status(&redeem_row("cancelled"));
        assert_eq!(
            intent.payload,
            Payload::Json(json!({"redeemId": "x1", "status": "pending"}))
        );
    }

    #[test]
    fn status_change_without_id_is_blocked() {
        let row = normalize::normalize_user(serde_json::from_value(json!({})).unwrap());
        let intent = Users.toggle_status(&row);
        assert_eq!(
            intent.violations,
            vec!["Unable to update status: user identifier missing.".to_string()]
        );
    }

    #[test]
    fn receipt_decisions_need_confirmation_but_pending_does_not() {
        let row = normalize::normalize_receipt(serde_json::from_value(json!({"_id": "s1"})).unwrap());
        let approve = Receipts.set_status(&row, ReceiptStatus::Approved, Some("  "));
        assert!(approve.requires_confirmation);
        assert_eq!(
            approve.payload,
            Payload::Json(json!({"sessionId": "s1", "status": "approved"}))
        );
        assert!(!Receipts.set_status(&row, ReceiptStatus::Pending, None).requires_confirmation);
    }

    #[test]
    fn business_request_decisions() {
        let row = normalize::normalize_business_request(
            serde_json::from_value(json!({"_id": "u7"})).unwrap(),
        );
        let approve = BusinessRequests.approve(&row);
        assert_eq!(approve.route, Route::post("/approveBusiness/u7"));
        assert_eq!(approve.success_message, "Business approved successfully.");
        assert!(approve.requires_confirmation);

        let orphan = normalize::normalize_business_request(serde_json::from_value(json!({})).unwrap());
        assert_eq!(
            BusinessRequests.reject(&orphan).check().unwrap_err().to_string(),
            "Unable to reject: missing identifier."
        );
    }
}
