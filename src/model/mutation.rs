use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AdminError;
use crate::model::{is_missing_id, EarnPerPurchase, GrandPrize, Id, ReceiptStatus, SummaryStat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    StatusTransition,
}

impl MutationKind {
    fn verb(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::StatusTransition => "update status of",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            MutationKind::Create => "created",
            MutationKind::Update => "updated",
            MutationKind::Delete => "deleted",
            MutationKind::StatusTransition => "status updated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub method: Method,
    pub path: String,
}

impl Route {
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// An uploaded file, e.g. a reward image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, upload: ImageUpload },
}

impl FormField {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        FormField::Text {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormField>),
}

/// A single requested change against one resource.
///
/// Intents are always constructible; problems found while building one are
/// collected in `violations` and block dispatch before any request is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationIntent {
    pub kind: MutationKind,
    pub resource: &'static str,
    pub target_id: Option<Id>,
    pub route: Route,
    pub payload: Payload,
    pub requires_confirmation: bool,
    pub action: String,
    pub success_message: String,
    pub failure_message: String,
    pub violations: Vec<String>,
}

impl MutationIntent {
    pub fn new(kind: MutationKind, resource: &'static str, route: Route) -> Self {
        Self {
            kind,
            resource,
            target_id: None,
            route,
            payload: Payload::Empty,
            requires_confirmation: false,
            action: format!("{} {}", kind.verb(), resource),
            success_message: format!("{} {} successfully.", capitalize(resource), kind.past_tense()),
            failure_message: format!("Failed to {} {}.", kind.verb(), resource),
            violations: Vec::new(),
        }
    }

    /// Aim the intent at an existing record; a missing id becomes a violation
    pub fn targeting(mut self, id: &str) -> Self {
        if is_missing_id(id) {
            let violation = match self.kind {
                MutationKind::StatusTransition => {
                    format!("Unable to update status: {} identifier missing.", self.resource)
                }
                MutationKind::Update => {
                    format!("Cannot update: {} ID is missing.", capitalize(self.resource))
                }
                _ => format!("Unable to {}: missing identifier.", self.kind.verb()),
            };
            self.violations.push(violation);
        } else {
            self.target_id = Some(id.trim().to_string());
        }
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_json(self, body: Value) -> Self {
        self.with_payload(Payload::Json(body))
    }

    /// Mark the intent irreversible: it only fires after an armed confirmation
    pub fn needs_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    pub fn described(mut self, action: &str, success: &str, failure: &str) -> Self {
        self.action = action.to_string();
        self.success_message = success.to_string();
        self.failure_message = failure.to_string();
        self
    }

    pub fn with_violations(mut self, violations: Vec<String>) -> Self {
        self.violations.extend(violations);
        self
    }

    pub fn check(&self) -> Result<(), AdminError> {
        match self.violations.first() {
            Some(violation) => Err(AdminError::validation(violation.clone())),
            None => Ok(()),
        }
    }

    /// Identity used to keep two mutations off the same record at once
    pub fn flight_key(&self) -> String {
        match &self.target_id {
            Some(id) => format!("{}:{}", self.resource, id),
            None => format!("{}:{:?}", self.resource, self.kind),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Editor contents for a business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessDraft {
    pub name: String,
    pub description: String,
    pub earn_points_type: String,
    pub earn_points_value: f64,
    pub method: String,
    pub is_active: Option<bool>,
}

impl BusinessDraft {
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if blank(&self.name) {
            violations.push("Business name is required.".to_string());
        }
        if blank(&self.method) {
            violations.push("Method is required.".to_string());
        }
        if blank(&self.earn_points_type) {
            violations.push("Earn points type is required.".to_string());
        }
        if !(self.earn_points_value > 0.0) {
            violations.push("Earn points value must be greater than zero.".to_string());
        }
        violations
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "name": self.name.trim(),
            "description": self.description.trim(),
            "earnPoints": {
                "type": self.earn_points_type.trim(),
                "value": self.earn_points_value,
            },
            "method": self.method.trim(),
        });
        if let (Some(active), Some(map)) = (self.is_active, body.as_object_mut()) {
            map.insert("isActive".to_string(), Value::Bool(active));
        }
        body
    }
}

/// Editor contents for a reward; sent as multipart because of the image
#[derive(Debug, Clone, PartialEq)]
pub struct RewardDraft {
    pub reward_name: String,
    pub business_id: Id,
    pub points_required: i64,
    pub reward_type: String,
    pub image: Option<ImageUpload>,
    pub is_active: Option<bool>,
}

impl RewardDraft {
    /// The image is only mandatory when creating
    pub fn violations(&self, creating: bool) -> Vec<String> {
        let mut violations = Vec::new();
        if blank(&self.reward_name) {
            violations.push("Reward name is required.".to_string());
        }
        if is_missing_id(&self.business_id) {
            violations.push("Business is required.".to_string());
        }
        if self.points_required <= 0 {
            violations.push("Points required must be a positive integer.".to_string());
        }
        if blank(&self.reward_type) {
            violations.push("Reward type is required.".to_string());
        }
        if creating && self.image.is_none() {
            violations.push("Image is required for creating a reward.".to_string());
        }
        violations
    }

    pub fn to_form(&self) -> Vec<FormField> {
        let mut fields = vec![
            FormField::text("rewardName", self.reward_name.trim()),
            FormField::text("business", self.business_id.trim()),
            FormField::text("pointsRequired", self.points_required.to_string()),
            FormField::text("rewardType", self.reward_type.trim()),
        ];
        if let Some(image) = &self.image {
            fields.push(FormField::File {
                name: "image".to_string(),
                upload: image.clone(),
            });
        }
        if let Some(active) = self.is_active {
            fields.push(FormField::text("isActive", active.to_string()));
        }
        fields
    }
}

/// Editor contents for a business info page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusinessInfoDraft {
    pub business_id: Id,
    pub title: String,
    pub summary_stats: Vec<SummaryStat>,
    pub grand_prize: GrandPrize,
    pub earn_per_purchase: Vec<EarnPerPurchase>,
    pub is_active: Option<bool>,
}

impl BusinessInfoDraft {
    fn valid_stats(&self) -> impl Iterator<Item = &SummaryStat> {
        self.summary_stats
            .iter()
            .filter(|stat| stat.label.as_deref().is_some_and(|label| !blank(label)))
    }

    fn valid_products(&self) -> impl Iterator<Item = &EarnPerPurchase> {
        self.earn_per_purchase.iter().filter(|item| {
            item.product_name.as_deref().is_some_and(|name| !blank(name))
                && item.points.is_some_and(|points| points > 0)
        })
    }

    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if is_missing_id(&self.business_id) {
            violations.push("Please select a business.".to_string());
        }
        if blank(&self.title) {
            violations.push("Title is required.".to_string());
        }
        if self.valid_stats().next().is_none() {
            violations.push("At least one valid summary stat is required.".to_string());
        }
        if self.grand_prize.title.as_deref().map_or(true, blank) {
            violations.push("Grand prize title is required.".to_string());
        }
        if self.valid_products().next().is_none() {
            violations.push("At least one valid earn per purchase item is required.".to_string());
        }
        violations
    }

    /// Incomplete stat and product rows are left out of the body
    pub fn to_json(&self) -> Value {
        let stats: Vec<&SummaryStat> = self.valid_stats().collect();
        let products: Vec<&EarnPerPurchase> = self.valid_products().collect();
        let mut body = json!({
            "business": self.business_id.trim(),
            "title": self.title.trim(),
            "summaryStats": stats,
            "grandPrize": self.grand_prize,
            "earnPerPurchase": products,
        });
        if let (Some(active), Some(map)) = (self.is_active, body.as_object_mut()) {
            map.insert("isActive".to_string(), Value::Bool(active));
        }
        body
    }
}

/// Body of `PATCH /update-receipt-status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptStatusUpdate {
    pub session_id: Id,
    pub status: ReceiptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward_draft() -> RewardDraft {
        RewardDraft {
            reward_name: "Guinness cap".to_string(),
            business_id: "b1".to_string(),
            points_required: 120,
            reward_type: "merch".to_string(),
            image: None,
            is_active: None,
        }
    }

    #[test]
    fn default_messages_follow_kind_and_resource() {
        let intent = MutationIntent::new(MutationKind::Delete, "reward", Route::delete("/deleteReward/r1"));
        assert_eq!(intent.action, "delete reward");
        assert_eq!(intent.success_message, "Reward deleted successfully.");
        assert_eq!(intent.failure_message, "Failed to delete reward.");
        assert!(!intent.requires_confirmation);
    }

    #[test]
    fn missing_target_is_a_violation() {
        let intent = MutationIntent::new(
            MutationKind::StatusTransition,
            "redeem",
            Route::put("/update-status"),
        )
        .targeting("—");
        assert_eq!(intent.target_id, None);
        assert_eq!(
            intent.check(),
            Err(AdminError::validation(
                "Unable to update status: redeem identifier missing."
            ))
        );
    }

    #[test]
    fn business_draft_checks_name_and_threshold() {
        let draft = BusinessDraft {
            name: " ".to_string(),
            description: String::new(),
            earn_points_type: "per_4_packs".to_string(),
            earn_points_value: 0.0,
            method: "upload_receipt".to_string(),
            is_active: None,
        };
        assert_eq!(
            draft.violations(),
            vec![
                "Business name is required.".to_string(),
                "Earn points value must be greater than zero.".to_string()
            ]
        );
    }

    #[test]
    fn reward_image_is_only_required_on_create() {
        let draft = reward_draft();
        assert_eq!(
            draft.violations(true),
            vec!["Image is required for creating a reward.".to_string()]
        );
        assert!(draft.violations(false).is_empty());

        let negative = RewardDraft {
            points_required: -5,
            ..reward_draft()
        };
        assert!(negative
            .violations(false)
            .contains(&"Points required must be a positive integer.".to_string()));
    }

    #[test]
    fn reward_form_carries_image_part_when_present() {
        let draft = RewardDraft {
            image: Some(ImageUpload {
                file_name: "cap.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            }),
            is_active: Some(true),
            ..reward_draft()
        };
        let form = draft.to_form();
        let names: Vec<&str> = form.iter().map(FormField::name).collect();
        assert_eq!(
            names,
            vec!["rewardName", "business", "pointsRequired", "rewardType", "image", "isActive"]
        );
    }

    #[test]
    fn business_info_drops_incomplete_rows() {
        let draft = BusinessInfoDraft {
            business_id: "b1".to_string(),
            title: "Summer draw".to_string(),
            summary_stats: vec![
                SummaryStat {
                    label: Some("Entries".to_string()),
                    value: Some(10.0),
                },
                SummaryStat {
                    label: Some(" ".to_string()),
                    value: Some(3.0),
                },
            ],
            grand_prize: GrandPrize {
                title: Some("Trip to Dublin".to_string()),
                ..GrandPrize::default()
            },
            earn_per_purchase: vec![EarnPerPurchase {
                product_name: Some("Guinness 4-pack".to_string()),
                points: Some(4),
                ..EarnPerPurchase::default()
            }],
            is_active: None,
        };
        assert!(draft.violations().is_empty());
        let body = draft.to_json();
        assert_eq!(body["summaryStats"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["grandPrize"]["title"], "Trip to Dublin");
    }

    #[test]
    fn receipt_update_omits_empty_notes() {
        let update = ReceiptStatusUpdate {
            session_id: "s1".to_string(),
            status: ReceiptStatus::Approved,
            admin_notes: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"sessionId": "s1", "status": "approved"})
        );
    }
}
