use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::auth::AdminSession;
use crate::model::{Pagination, SortOrder};
use crate::store::traits::{Collection, Store};

pub type AppState<S> = Arc<S>;

pub type ApiResult = Result<Json<Value>, (StatusCode, Json<ErrorResponse>)>;

const DEFAULT_LIMIT: u32 = 15;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Failure envelope shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn reply(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                success: false,
                message: message.into(),
            }),
        )
    }
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    ErrorResponse::reply(StatusCode::BAD_REQUEST, message)
}

fn not_found(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    ErrorResponse::reply(StatusCode::NOT_FOUND, message)
}

fn internal(e: anyhow::Error) -> (StatusCode, Json<ErrorResponse>) {
    error!("store failure: {e:#}");
    ErrorResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn done(message: &str, data: Option<Value>) -> ApiResult {
    let mut body = json!({"success": true, "message": message});
    if let (Some(data), Some(map)) = (data, body.as_object_mut()) {
        map.insert("data".to_string(), data);
    }
    Ok(Json(body))
}

/// Query string accepted by every list endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub role: Option<String>,
    pub business: Option<String>,
    pub action_type: Option<String>,
    pub case_type: Option<String>,
}

impl ListQuery {
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

/// The list endpoints disagree on where paging metadata lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListShape {
    /// `{data: [...], pagination: {...}}`
    PaginationObject,
    /// `{data: [...], total, page, limit, totalPages}`
    TopLevel,
    /// `{data: {data: [...], total, page, limit, totalPages}}`
    Nested,
}

fn text_at<'a>(document: &'a Value, pointer: &str) -> Option<&'a str> {
    document.pointer(pointer).and_then(Value::as_str)
}

fn matches_search(document: &Value, term: Option<&str>, pointers: &[&str]) -> bool {
    let Some(term) = term else {
        return true;
    };
    pointers.iter().any(|pointer| {
        text_at(document, pointer).is_some_and(|text| text.to_lowercase().contains(term))
    })
}

fn equals_ignoring_case(document: &Value, pointer: &str, wanted: Option<&str>) -> bool {
    match wanted.map(str::trim).filter(|wanted| !wanted.is_empty()) {
        Some(wanted) => text_at(document, pointer).is_some_and(|text| text.eq_ignore_ascii_case(wanted)),
        None => true,
    }
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Sort by `sortBy` (newest `createdAt` first by default) and cut out the requested page
fn paginate(mut documents: Vec<Value>, query: &ListQuery) -> (Vec<Value>, Pagination) {
    let sort_by = query.sort_by.as_deref().unwrap_or("createdAt");
    let order = query
        .sort_order
        .as_deref()
        .and_then(SortOrder::parse)
        .unwrap_or_default();
    documents.sort_by(|a, b| {
        let ordering = compare_field(a.get(sort_by), b.get(sort_by));
        match (order, a.get(sort_by).is_some() && b.get(sort_by).is_some()) {
            (SortOrder::Desc, true) => ordering.reverse(),
            _ => ordering,
        }
    });

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(1);
    let page = query.page.unwrap_or(1).max(1);
    let pagination = Pagination::from_total(documents.len() as u64, page, limit);
    let start = (page as usize - 1).saturating_mul(limit as usize);
    let records = documents
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .collect();
    (records, pagination)
}

fn list_body(shape: ListShape, message: &str, records: Vec<Value>, pagination: Pagination) -> Value {
    match shape {
        ListShape::PaginationObject => json!({
            "success": true,
            "message": message,
            "data": records,
            "pagination": pagination,
        }),
        ListShape::TopLevel => json!({
            "success": true,
            "message": message,
            "data": records,
            "total": pagination.total,
            "page": pagination.page,
            "limit": pagination.limit,
            "totalPages": pagination.total_pages,
        }),
        ListShape::Nested => json!({
            "success": true,
            "message": message,
            "data": {
                "data": records,
                "total": pagination.total,
                "page": pagination.page,
                "limit": pagination.limit,
                "totalPages": pagination.total_pages,
            },
        }),
    }
}

fn by_id(documents: Vec<Value>) -> HashMap<String, Value> {
    documents
        .into_iter()
        .filter_map(|doc| {
            let id = text_at(&doc, "/_id")?.to_string();
            Some((id, doc))
        })
        .collect()
}

/// Keep only `keys` (plus `_id`) of a referenced document
fn project(document: &Value, keys: &[&str]) -> Value {
    let mut projected = Map::new();
    for key in std::iter::once("_id").chain(keys.iter().copied()) {
        if let Some(value) = document.get(key) {
            projected.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(projected)
}

/// Replace a bare id in `field` with the referenced document; dangling ids stay bare
fn populate(document: &mut Value, field: &str, index: &HashMap<String, Value>, keys: &[&str]) {
    let Some(slot) = document.get_mut(field) else {
        return;
    };
    let Some(found) = slot.as_str().and_then(|id| index.get(id)) else {
        return;
    };
    *slot = project(found, keys);
}

const USER_SUMMARY: [&str; 5] = ["firstName", "lastName", "email", "phone", "role"];
const BUSINESS_SUMMARY: [&str; 1] = ["name"];
const LINKED_BUSINESS: [&str; 1] = ["businessInfo"];

fn without_password(mut user: Value) -> Value {
    if let Some(fields) = user.as_object_mut() {
        fields.remove("password");
    }
    user
}

async fn load<S: Store>(store: &S, collection: Collection) -> Result<Vec<Value>, (StatusCode, Json<ErrorResponse>)> {
    store.list_documents(collection).await.map_err(internal)
}

async fn require<S: Store>(
    store: &S,
    collection: Collection,
    id: &str,
    missing: &str,
) -> Result<Value, (StatusCode, Json<ErrorResponse>)> {
    store
        .get_document(collection, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(missing))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login<S: Store>(
    State(store): State<AppState<S>>,
    RequestJson(body): RequestJson<LoginBody>,
) -> ApiResult {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(bad_request("Email and password are required"));
    }
    let users = load(&*store, Collection::Users).await?;
    let admin = users.into_iter().find(|user| {
        text_at(user, "/role") == Some("admin")
            && text_at(user, "/email").is_some_and(|email| email.eq_ignore_ascii_case(body.email.trim()))
            && text_at(user, "/password") == Some(body.password.as_str())
    });
    let Some(admin) = admin else {
        return Err(ErrorResponse::reply(
            StatusCode::UNAUTHORIZED,
            "Invalid email or password",
        ));
    };

    let user_id = text_at(&admin, "/_id").unwrap_or_default().to_string();
    let token = store.issue_token(&user_id).await.map_err(internal)?;
    info!("admin {} logged in", user_id);
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": without_password(admin),
    })))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn get_user_by_id<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(user_id): Path<String>,
) -> ApiResult {
    let user = require(&*store, Collection::Users, &user_id, "User not found").await?;
    done("User fetched successfully", Some(without_password(user)))
}

pub async fn list_users<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let term = query.search_term();
    let users = load(&*store, Collection::Users)
        .await?
        .into_iter()
        .filter(|user| text_at(user, "/role") != Some("admin"))
        .filter(|user| equals_ignoring_case(user, "/role", query.role.as_deref()))
        .filter(|user| {
            matches_search(
                user,
                term.as_deref(),
                &["/firstName", "/lastName", "/email", "/phone", "/businessInfo/businessName"],
            )
        })
        .map(without_password)
        .collect();
    let (records, pagination) = paginate(users, &query);
    Ok(Json(list_body(
        ListShape::PaginationObject,
        "Users fetched successfully",
        records,
        pagination,
    )))
}

pub async fn delete_user_by_id<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(user_id): Path<String>,
) -> ApiResult {
    if !store
        .delete_document(Collection::Users, &user_id)
        .await
        .map_err(internal)?
    {
        return Err(not_found("User not found"));
    }
    info!("deleted user {}", user_id);
    done("User deleted successfully", None)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusBody {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub status: String,
}

pub async fn update_user_status<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    RequestJson(body): RequestJson<UserStatusBody>,
) -> ApiResult {
    if !matches!(body.status.as_str(), "active" | "blocked") {
        return Err(bad_request("Status must be active or blocked"));
    }
    let updated = store
        .update_document(Collection::Users, &body.user_id, json!({"status": body.status}))
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("User not found"))?;
    done("User status updated successfully", Some(without_password(updated)))
}

// ---------------------------------------------------------------------------
// Business requests
// ---------------------------------------------------------------------------

fn is_pending_request(user: &Value) -> bool {
    text_at(user, "/role") == Some("business")
        && user.pointer("/businessInfo/approvedByAdmin") == Some(&Value::Bool(false))
        && text_at(user, "/requestStatus") != Some("rejected")
}

pub async fn pending_business_requests<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let term = query.search_term();
    let requests = load(&*store, Collection::Users)
        .await?
        .into_iter()
        .filter(is_pending_request)
        .filter(|user| {
            matches_search(
                user,
                term.as_deref(),
                &["/businessInfo/businessName", "/businessInfo/ownerName", "/email"],
            )
        })
        .map(without_password)
        .collect();
    let (records, pagination) = paginate(requests, &query);
    Ok(Json(list_body(
        ListShape::TopLevel,
        "Pending business requests fetched successfully",
        records,
        pagination,
    )))
}

async fn decide_business_request<S: Store>(store: &S, user_id: &str, approve: bool) -> ApiResult {
    let user = require(store, Collection::Users, user_id, "Business request not found").await?;
    if !is_pending_request(&user) {
        return Err(bad_request("Business request is no longer pending"));
    }
    let mut profile = user.get("businessInfo").cloned().unwrap_or_else(|| json!({}));
    if let Some(fields) = profile.as_object_mut() {
        fields.insert("approvedByAdmin".to_string(), Value::Bool(approve));
    }
    let changes = json!({
        "businessInfo": profile,
        "requestStatus": if approve { "approved" } else { "rejected" },
    });
    store
        .update_document(Collection::Users, user_id, changes)
        .await
        .map_err(internal)?;
    info!(
        "business request {} {}",
        user_id,
        if approve { "approved" } else { "rejected" }
    );
    if approve {
        done("Business approved successfully", None)
    } else {
        done("Business rejected successfully", None)
    }
}

pub async fn approve_business<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(user_id): Path<String>,
) -> ApiResult {
    decide_business_request(&*store, &user_id, true).await
}

pub async fn reject_business<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(user_id): Path<String>,
) -> ApiResult {
    decide_business_request(&*store, &user_id, false).await
}

// ---------------------------------------------------------------------------
// Businesses
// ---------------------------------------------------------------------------

pub async fn list_businesses<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let term = query.search_term();
    let businesses = load(&*store, Collection::Businesses)
        .await?
        .into_iter()
        .filter(|business| matches_search(business, term.as_deref(), &["/name", "/description"]))
        .collect();
    let (records, pagination) = paginate(businesses, &query);
    Ok(Json(list_body(
        ListShape::PaginationObject,
        "Businesses fetched successfully",
        records,
        pagination,
    )))
}

fn business_violation(body: &Value, creating: bool) -> Option<&'static str> {
    let name = text_at(body, "/name").map(str::trim).unwrap_or_default();
    if (creating || body.get("name").is_some()) && name.is_empty() {
        return Some("Business name is required");
    }
    if let Some(value) = body.pointer("/earnPoints/value") {
        if !value.as_f64().is_some_and(|value| value > 0.0) {
            return Some("Earn points value must be greater than 0");
        }
    } else if creating {
        return Some("Earn points value must be greater than 0");
    }
    None
}

pub async fn create_business<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    RequestJson(body): RequestJson<Value>,
) -> ApiResult {
    if let Some(message) = business_violation(&body, true) {
        return Err(bad_request(message));
    }
    let mut document = body;
    if let Some(fields) = document.as_object_mut() {
        fields.remove("_id");
        fields.entry("isActive").or_insert(Value::Bool(true));
    }
    let created = store
        .insert_document(Collection::Businesses, document)
        .await
        .map_err(internal)?;
    done("Business created successfully", Some(created))
}

pub async fn update_business<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(business_id): Path<String>,
    RequestJson(body): RequestJson<Value>,
) -> ApiResult {
    if let Some(message) = business_violation(&body, false) {
        return Err(bad_request(message));
    }
    let updated = store
        .update_document(Collection::Businesses, &business_id, body)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Business not found"))?;
    done("Business updated successfully", Some(updated))
}

pub async fn delete_business<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(business_id): Path<String>,
) -> ApiResult {
    if !store
        .delete_document(Collection::Businesses, &business_id)
        .await
        .map_err(internal)?
    {
        return Err(not_found("Business not found"));
    }
    done("Business deleted successfully", None)
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

pub async fn list_rewards<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let businesses = by_id(load(&*store, Collection::Businesses).await?);
    let term = query.search_term();
    let rewards = load(&*store, Collection::Rewards)
        .await?
        .into_iter()
        .map(|mut reward| {
            populate(&mut reward, "business", &businesses, &BUSINESS_SUMMARY);
            reward
        })
        .filter(|reward| equals_ignoring_case(reward, "/business/name", query.business.as_deref()))
        .filter(|reward| {
            matches_search(reward, term.as_deref(), &["/rewardName", "/rewardType", "/business/name"])
        })
        .collect();
    let (records, pagination) = paginate(rewards, &query);
    Ok(Json(list_body(
        ListShape::PaginationObject,
        "Rewards fetched successfully",
        records,
        pagination,
    )))
}

/// Text fields of a reward form plus the uploaded image, if any
#[derive(Debug, Default)]
struct RewardForm {
    fields: HashMap<String, String>,
    image: Option<(String, usize)>,
}

async fn read_reward_form(mut multipart: Multipart) -> Result<RewardForm, (StatusCode, Json<ErrorResponse>)> {
    let mut form = RewardForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or("reward.png").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Invalid image upload: {e}")))?;
            form.image = Some((file_name, bytes.len()));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| bad_request(format!("Invalid form field {name}: {e}")))?;
            form.fields.insert(name, text.trim().to_string());
        }
    }
    Ok(form)
}

impl RewardForm {
    fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Fields to store; `creating` makes every field mandatory
    fn to_changes(&self, reward_id: &str, creating: bool) -> Result<Value, &'static str> {
        let mut changes = Map::new();
        let required = [
            ("rewardName", "Reward name is required"),
            ("business", "Business is required"),
            ("pointsRequired", "Points required is required"),
            ("rewardType", "Reward type is required"),
        ];
        for (key, message) in required {
            match self.text(key) {
                Some(value) => {
                    changes.insert(key.to_string(), Value::String(value.to_string()));
                }
                None if creating => return Err(message),
                None => {}
            }
        }
        if let Some(points) = self.text("pointsRequired") {
            match points.parse::<i64>() {
                Ok(points) if points > 0 => {
                    changes.insert("pointsRequired".to_string(), json!(points));
                }
                _ => return Err("Points required must be a positive number"),
            }
        }
        if let Some(active) = self.text("isActive") {
            changes.insert("isActive".to_string(), Value::Bool(active == "true"));
        }
        match &self.image {
            Some((file_name, _)) => {
                changes.insert(
                    "image".to_string(),
                    Value::String(format!("/uploads/rewards/{reward_id}-{file_name}")),
                );
            }
            None if creating => return Err("Reward image is required"),
            None => {}
        }
        Ok(Value::Object(changes))
    }
}

async fn ensure_business<S: Store>(store: &S, changes: &Value) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if let Some(business_id) = text_at(changes, "/business") {
        require(store, Collection::Businesses, business_id, "Business not found").await?;
    }
    Ok(())
}

pub async fn create_reward<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    multipart: Multipart,
) -> ApiResult {
    let form = read_reward_form(multipart).await?;
    let reward_id = crate::model::generate_id();
    let mut changes = form.to_changes(&reward_id, true).map_err(bad_request)?;
    ensure_business(&*store, &changes).await?;
    if let Some(fields) = changes.as_object_mut() {
        fields.insert("_id".to_string(), Value::String(reward_id));
        fields.entry("isActive").or_insert(Value::Bool(true));
    }
    let created = store
        .insert_document(Collection::Rewards, changes)
        .await
        .map_err(internal)?;
    done("Reward created successfully", Some(created))
}

pub async fn update_reward<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(reward_id): Path<String>,
    multipart: Multipart,
) -> ApiResult {
    let form = read_reward_form(multipart).await?;
    let changes = form.to_changes(&reward_id, false).map_err(bad_request)?;
    ensure_business(&*store, &changes).await?;
    let updated = store
        .update_document(Collection::Rewards, &reward_id, changes)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Reward not found"))?;
    done("Reward updated successfully", Some(updated))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardStatusBody {
    pub is_active: Option<bool>,
}

pub async fn update_reward_status<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(reward_id): Path<String>,
    RequestJson(body): RequestJson<RewardStatusBody>,
) -> ApiResult {
    let Some(active) = body.is_active else {
        return Err(bad_request("isActive must be a boolean"));
    };
    let updated = store
        .update_document(Collection::Rewards, &reward_id, json!({"isActive": active}))
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Reward not found"))?;
    done("Reward status updated successfully", Some(updated))
}

pub async fn delete_reward<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(reward_id): Path<String>,
) -> ApiResult {
    if !store
        .delete_document(Collection::Rewards, &reward_id)
        .await
        .map_err(internal)?
    {
        return Err(not_found("Reward not found"));
    }
    done("Reward deleted successfully", None)
}

// ---------------------------------------------------------------------------
// Redeems
// ---------------------------------------------------------------------------

pub async fn list_redeems<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let users = by_id(load(&*store, Collection::Users).await?);
    let businesses = by_id(load(&*store, Collection::Businesses).await?);
    let rewards: HashMap<String, Value> = by_id(load(&*store, Collection::Rewards).await?)
        .into_iter()
        .map(|(id, mut reward)| {
            populate(&mut reward, "business", &businesses, &BUSINESS_SUMMARY);
            (id, reward)
        })
        .collect();

    let term = query.search_term();
    let redeems = load(&*store, Collection::Redeems)
        .await?
        .into_iter()
        .map(|mut redeem| {
            populate(&mut redeem, "user", &users, &USER_SUMMARY);
            populate(
                &mut redeem,
                "reward",
                &rewards,
                &["rewardName", "pointsRequired", "rewardType", "business"],
            );
            populate(&mut redeem, "business", &businesses, &BUSINESS_SUMMARY);
            redeem
        })
        .filter(|redeem| equals_ignoring_case(redeem, "/business/name", query.business.as_deref()))
        .filter(|redeem| {
            matches_search(
                redeem,
                term.as_deref(),
                &[
                    "/redeemCode",
                    "/reward/rewardName",
                    "/user/firstName",
                    "/user/lastName",
                    "/user/email",
                ],
            )
        })
        .collect();
    let (records, pagination) = paginate(redeems, &query);
    Ok(Json(list_body(
        ListShape::TopLevel,
        "Redeems fetched successfully",
        records,
        pagination,
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemStatusBody {
    #[serde(default)]
    pub redeem_id: String,
    #[serde(default)]
    pub status: String,
}

pub async fn update_redeem_status<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    RequestJson(body): RequestJson<RedeemStatusBody>,
) -> ApiResult {
    if !matches!(body.status.as_str(), "pending" | "delivered") {
        return Err(bad_request("Status must be pending or delivered"));
    }
    let updated = store
        .update_document(Collection::Redeems, &body.redeem_id, json!({"status": body.status}))
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Redeem not found"))?;
    done("Redeem status updated successfully", Some(updated))
}

// ---------------------------------------------------------------------------
// Business details
// ---------------------------------------------------------------------------

pub async fn list_business_details<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let businesses = by_id(load(&*store, Collection::Businesses).await?);
    let term = query.search_term();
    let details = load(&*store, Collection::BusinessDetails)
        .await?
        .into_iter()
        .map(|mut info| {
            populate(&mut info, "business", &businesses, &BUSINESS_SUMMARY);
            info
        })
        .filter(|info| matches_search(info, term.as_deref(), &["/title", "/business/name"]))
        .collect();
    let (records, pagination) = paginate(details, &query);
    Ok(Json(list_body(
        ListShape::Nested,
        "Business details fetched successfully",
        records,
        pagination,
    )))
}

fn business_details_violation(body: &Value) -> Option<&'static str> {
    if text_at(body, "/business").map_or(true, |id| id.trim().is_empty()) {
        return Some("Business is required");
    }
    if text_at(body, "/title").map_or(true, |title| title.trim().is_empty()) {
        return Some("Title is required");
    }
    None
}

pub async fn create_business_details<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    RequestJson(body): RequestJson<Value>,
) -> ApiResult {
    if let Some(message) = business_details_violation(&body) {
        return Err(bad_request(message));
    }
    ensure_business(&*store, &body).await?;
    let mut document = body;
    if let Some(fields) = document.as_object_mut() {
        fields.remove("_id");
        fields.entry("isActive").or_insert(Value::Bool(true));
    }
    let created = store
        .insert_document(Collection::BusinessDetails, document)
        .await
        .map_err(internal)?;
    done("Business details created successfully", Some(created))
}

pub async fn update_business_details<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(info_id): Path<String>,
    RequestJson(body): RequestJson<Value>,
) -> ApiResult {
    if let Some(message) = business_details_violation(&body) {
        return Err(bad_request(message));
    }
    ensure_business(&*store, &body).await?;
    let updated = store
        .update_document(Collection::BusinessDetails, &info_id, body)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Business details not found"))?;
    done("Business details updated successfully", Some(updated))
}

pub async fn delete_business_details<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(info_id): Path<String>,
) -> ApiResult {
    if !store
        .delete_document(Collection::BusinessDetails, &info_id)
        .await
        .map_err(internal)?
    {
        return Err(not_found("Business details not found"));
    }
    done("Business details deleted successfully", None)
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

async fn history_page<S: Store>(store: &S, query: &ListQuery, business_id: Option<&str>) -> ApiResult {
    let users = by_id(load(store, Collection::Users).await?);
    let term = query.search_term();
    let entries = load(store, Collection::History)
        .await?
        .into_iter()
        .filter(|entry| business_id.map_or(true, |id| text_at(entry, "/relatedBusiness") == Some(id)))
        .map(|mut entry| {
            populate(&mut entry, "user", &users, &USER_SUMMARY);
            populate(&mut entry, "relatedBusiness", &users, &LINKED_BUSINESS);
            entry
        })
        .filter(|entry| equals_ignoring_case(entry, "/actionType", query.action_type.as_deref()))
        .filter(|entry| {
            matches_search(
                entry,
                term.as_deref(),
                &["/session", "/user/firstName", "/user/lastName", "/user/email", "/actionType"],
            )
        })
        .collect();
    let (records, pagination) = paginate(entries, query);
    Ok(Json(list_body(
        ListShape::Nested,
        "User history fetched successfully",
        records,
        pagination,
    )))
}

pub async fn list_all_history<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    history_page(&*store, &query, None).await
}

pub async fn list_business_history<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Path(business_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    history_page(&*store, &query, Some(&business_id)).await
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

pub async fn list_receipts<S: Store>(
    State(store): State<AppState<S>>,
    _session: AdminSession,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let users = by_id(load(&*store, Collection::Users).await?);
    let term = query.search_term();
    let receipts = load(&*store, Collection::Receipts)
        .await?
        .into_iter()
        .map(|mut receipt| {
            populate(&mut receipt, "business", &users, &LINKED_BUSINESS);
            receipt
        })
        .filter(|receipt| equals_ignoring_case(receipt, "/meta/category", query.case_type.as_deref()))
        .filter(|receipt| {
            matches_search(
                receipt,
                term.as_deref(),
                &["/value", "/status", "/business/businessInfo/businessName"],
            )
        })
        .collect();
    let (records, pagination) = paginate(receipts, &query);
    Ok(Json(list_body(
        ListShape::PaginationObject,
        "Uploaded receipts fetched successfully",
        records,
        pagination,
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptStatusBody {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub status: String,
    pub admin_notes: Option<String>,
}

pub async fn update_receipt_status<S: Store>(
    State(store): State<AppState<S>>,
    session: AdminSession,
    RequestJson(body): RequestJson<ReceiptStatusBody>,
) -> ApiResult {
    if !matches!(body.status.as_str(), "approved" | "pending" | "rejected") {
        return Err(bad_request("Status must be approved, pending or rejected"));
    }
    let mut changes = json!({
        "status": body.status,
        "reviewedBy": session.user_id,
        "reviewedAt": chrono::Utc::now().to_rfc3339(),
    });
    if let (Some(notes), Some(fields)) = (body.admin_notes, changes.as_object_mut()) {
        fields.insert("adminNotes".to_string(), Value::String(notes));
    }
    let updated = store
        .update_document(Collection::Receipts, &body.session_id, changes)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Receipt not found"))?;
    done("Receipt status updated successfully", Some(updated))
}
