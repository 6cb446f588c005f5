//! Backend record shapes as they arrive on the wire.
//!
//! Every field is optional: the backend omits, nulls or populates fields
//! depending on the endpoint. Relationship fields use [`Reference`] because
//! the same field is a bare id on one endpoint and an embedded document on
//! another.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::model::Id;

/// Decode an optional field, treating a value of the wrong shape as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Points and counts: integers, rounded finite floats or numeric strings
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(number) => match number.as_i64() {
            Some(whole) => return Ok(Some(whole)),
            None => number.as_f64(),
        },
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number
        .filter(|number| number.is_finite() && number.abs() < i64::MAX as f64)
        .map(|number| number.round() as i64))
}

/// A list field; null or a non-array is empty and undecodable items are skipped
fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// A relationship field: either a bare identifier or the populated document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Identifier(Id),
    WithDetails(T),
}

/// Documents that carry their own `_id`
pub trait Identified {
    fn id(&self) -> Option<&str>;
}

impl<T: Identified> Reference<T> {
    pub fn id(&self) -> Option<&str> {
        match self {
            Reference::Identifier(id) => Some(id.as_str()),
            Reference::WithDetails(details) => details.id(),
        }
    }

    pub fn details(&self) -> Option<&T> {
        match self {
            Reference::Identifier(_) => None,
            Reference::WithDetails(details) => Some(details),
        }
    }
}

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }
        })*
    };
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessProfile {
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub registration_number: Option<String>,
    pub owner_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub approved_by_admin: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub age: Option<u32>,
    pub location: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "whole_number")]
    pub points: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub business_info: Option<BusinessProfile>,
    pub created_at: Option<String>,
}

/// The slice of a user embedded in redeems and history entries
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EarnPoints {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessRecord {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub earn_points: Option<EarnPoints>,
    pub method: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub is_active: Option<bool>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessSummary {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    pub name: Option<String>,
}

/// A user account acting as a business, embedded in history and receipts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkedBusiness {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    #[serde(deserialize_with = "lenient")]
    pub business_info: Option<BusinessProfile>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardRecord {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    #[serde(deserialize_with = "lenient")]
    pub business: Option<Reference<BusinessSummary>>,
    pub reward_name: Option<String>,
    #[serde(deserialize_with = "whole_number")]
    pub points_required: Option<i64>,
    pub reward_type: Option<String>,
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub is_active: Option<bool>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardSummary {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    #[serde(deserialize_with = "lenient")]
    pub business: Option<Reference<BusinessSummary>>,
    pub reward_name: Option<String>,
    #[serde(deserialize_with = "whole_number")]
    pub points_required: Option<i64>,
    pub reward_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedeemRecord {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    #[serde(deserialize_with = "lenient")]
    pub user: Option<Reference<UserSummary>>,
    #[serde(deserialize_with = "lenient")]
    pub reward: Option<Reference<RewardSummary>>,
    #[serde(deserialize_with = "lenient")]
    pub business: Option<Reference<BusinessSummary>>,
    #[serde(deserialize_with = "whole_number")]
    pub points_used: Option<i64>,
    pub status: Option<String>,
    pub redeem_code: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryStat {
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrandPrize {
    pub title: Option<String>,
    pub description: Option<String>,
    pub draw_date: Option<String>,
    pub entry_rule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EarnPerPurchase {
    pub product_name: Option<String>,
    pub size: Option<String>,
    #[serde(deserialize_with = "whole_number")]
    pub points: Option<i64>,
    #[serde(deserialize_with = "whole_number")]
    pub entries: Option<i64>,
    pub bonus_tip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessInfoRecord {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    #[serde(deserialize_with = "lenient")]
    pub business: Option<Reference<BusinessSummary>>,
    pub title: Option<String>,
    #[serde(deserialize_with = "list")]
    pub summary_stats: Vec<SummaryStat>,
    #[serde(deserialize_with = "lenient")]
    pub grand_prize: Option<GrandPrize>,
    #[serde(deserialize_with = "list")]
    pub earn_per_purchase: Vec<EarnPerPurchase>,
    #[serde(deserialize_with = "lenient")]
    pub is_active: Option<bool>,
    pub created_at: Option<String>,
}

/// History details arrive as an object, or as a string that may hold JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Details {
    Fields(Map<String, Value>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryRecord {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    #[serde(deserialize_with = "lenient")]
    pub user: Option<Reference<UserSummary>>,
    pub session: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub related_business: Option<Reference<LinkedBusiness>>,
    pub action_type: Option<String>,
    #[serde(deserialize_with = "whole_number")]
    pub points: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub details: Option<Details>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedItem {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptMeta {
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub extracted_data: Option<Vec<ExtractedItem>>,
    #[serde(deserialize_with = "lenient")]
    pub total_amount: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub case_quantity: Option<f64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptRecord {
    #[serde(rename = "_id")]
    pub id: Option<Id>,
    #[serde(deserialize_with = "lenient")]
    pub business: Option<Reference<LinkedBusiness>>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub value: Option<String>,
    #[serde(deserialize_with = "whole_number")]
    pub points: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub is_active: Option<bool>,
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub meta: Option<ReceiptMeta>,
    pub created_at: Option<String>,
}

identified!(
    UserRecord,
    UserSummary,
    BusinessRecord,
    BusinessSummary,
    LinkedBusiness,
    RewardRecord,
    RewardSummary,
    RedeemRecord,
    BusinessInfoRecord,
    HistoryRecord,
    ReceiptRecord,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_accepts_bare_ids_and_documents() {
        let bare: RewardRecord =
            serde_json::from_value(json!({"_id": "r1", "business": "b1"})).unwrap();
        let business = bare.business.unwrap();
        assert_eq!(business.id(), Some("b1"));
        assert!(business.details().is_none());

        let embedded: RewardRecord = serde_json::from_value(
            json!({"_id": "r2", "business": {"_id": "b2", "name": "Harbour Bar"}}),
        )
        .unwrap();
        let business = embedded.business.unwrap();
        assert_eq!(business.id(), Some("b2"));
        assert_eq!(
            business.details().and_then(|b| b.name.as_deref()),
            Some("Harbour Bar")
        );
    }

    #[test]
    fn null_and_missing_fields_decode_to_none() {
        let record: RedeemRecord =
            serde_json::from_value(json!({"_id": "x", "user": null, "reward": null})).unwrap();
        assert!(record.user.is_none());
        assert!(record.reward.is_none());
        assert!(record.status.is_none());
    }

    #[test]
    fn history_details_keep_their_shape() {
        let as_text: HistoryRecord =
            serde_json::from_value(json!({"details": "{\"qrValue\":\"abc\"}"})).unwrap();
        assert!(matches!(as_text.details, Some(Details::Text(_))));

        let as_fields: HistoryRecord =
            serde_json::from_value(json!({"details": {"category": "case_1"}})).unwrap();
        assert!(matches!(as_fields.details, Some(Details::Fields(_))));
    }

    #[test]
    fn wrongly_typed_optional_fields_decode_to_none() {
        let record: BusinessInfoRecord = serde_json::from_value(json!({
            "_id": "i1",
            "summaryStats": null,
            "earnPerPurchase": [{"productName": "Stout", "points": "12"}, "junk"],
            "isActive": "true",
        }))
        .unwrap();
        assert!(record.summary_stats.is_empty());
        assert_eq!(record.earn_per_purchase.len(), 1);
        assert_eq!(record.earn_per_purchase[0].points, Some(12));
        assert_eq!(record.is_active, None);

        let user: UserRecord =
            serde_json::from_value(json!({"age": -4, "points": 7.5, "businessInfo": "n/a"}))
                .unwrap();
        assert_eq!(user.age, None);
        assert_eq!(user.points, Some(8));
        assert!(user.business_info.is_none());
    }
}
