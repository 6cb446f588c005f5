//! Backend record to display row mapping.
//!
//! Every function here is total: absent, null or unparseable inputs turn into
//! [`PLACEHOLDER`] (or zero for counters) instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use serde_json::{Map, Value};

use crate::model::{
    first_text, text_or_placeholder, ApprovalState, BusinessInfoRecord, BusinessInfoRow,
    BusinessProfile, BusinessRecord, BusinessRequestRow, BusinessRow, Details, HistoryRecord,
    HistoryRow, Identified, LinkedBusiness, ReceiptRecord, ReceiptRow, RedeemRecord, RedeemRow,
    Reference, RewardRecord, RewardRow, UserRecord, UserRole, UserRow, UserStatus, UserSummary,
    PLACEHOLDER,
};

const DETAILS_SEPARATOR: &str = " • ";

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

/// `dd/mm/yyyy`; text that is not a date is shown as sent
pub fn format_date(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => parse_instant(raw)
            .map(|instant| instant.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| raw.to_string()),
        None => PLACEHOLDER.to_string(),
    }
}

/// `dd/mm/yyyy, HH:MM` in UTC
pub fn format_timestamp(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => parse_instant(raw)
            .map(|instant| instant.format("%d/%m/%Y, %H:%M").to_string())
            .unwrap_or_else(|| raw.to_string()),
        None => PLACEHOLDER.to_string(),
    }
}

/// `upload_receipt` -> `upload receipt`
pub fn humanize(raw: &str) -> String {
    raw.trim().replace('_', " ")
}

/// `case_0_25` -> `Case 0.25`; anything else is only humanized
pub fn case_label(tag: &str) -> String {
    match tag.trim().strip_prefix("case_") {
        Some(amount) if !amount.is_empty() => format!("Case {}", amount.replacen('_', ".", 1)),
        _ => humanize(tag),
    }
}

/// `qrValue` -> `Qr Value`
fn title_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for (index, ch) in key.chars().enumerate() {
        if index == 0 {
            spaced.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            spaced.push(' ');
            spaced.push(ch);
        } else {
            spaced.push(ch);
        }
    }
    spaced.trim().to_string()
}

fn detail_value(key: &str, value: &Value) -> String {
    match value {
        Value::String(_) if key == "imageUrl" => "View Image".to_string(),
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn format_fields(fields: &Map<String, Value>) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}: {}", title_key(key), detail_value(key, value)))
        .join(DETAILS_SEPARATOR)
}

/// Key/value pairs joined with ` • `; JSON held in a string is unpacked first
pub fn format_details(details: Option<&Details>) -> String {
    let formatted = match details {
        Some(Details::Fields(fields)) => format_fields(fields),
        Some(Details::Text(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => format_fields(&fields),
            _ => text.trim().to_string(),
        },
        None => String::new(),
    };
    if formatted.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        formatted
    }
}

fn number_text(value: Option<f64>) -> String {
    value
        .filter(|value| value.is_finite())
        .map(|value| value.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn active_label(active: bool) -> String {
    let label = if active { "Active" } else { "Inactive" };
    label.to_string()
}

fn reference_id<T: Identified>(reference: Option<&Reference<T>>) -> String {
    text_or_placeholder(reference.and_then(Reference::id))
}

/// Full name, falling back to the email
fn person_name(user: Option<&UserSummary>) -> String {
    let Some(user) = user else {
        return PLACEHOLDER.to_string();
    };
    let full = [user.first_name.as_deref(), user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .join(" ");
    if full.is_empty() {
        text_or_placeholder(user.email.as_deref())
    } else {
        full
    }
}

fn linked_profile(reference: Option<&Reference<LinkedBusiness>>) -> Option<&BusinessProfile> {
    reference
        .and_then(Reference::details)
        .and_then(|business| business.business_info.as_ref())
}

fn profile_text(
    profile: Option<&BusinessProfile>,
    field: impl Fn(&BusinessProfile) -> Option<&str>,
) -> String {
    text_or_placeholder(profile.and_then(field))
}

pub fn normalize_user(user: UserRecord) -> UserRow {
    let profile = user.business_info.as_ref();
    let business_approval = match profile {
        Some(profile) => match profile.approved_by_admin {
            Some(true) => ApprovalState::Approved,
            Some(false) => ApprovalState::Rejected,
            None => ApprovalState::Pending,
        },
        None => ApprovalState::Unknown,
    };
    let location = match profile {
        Some(profile) if profile.address.is_some() => text_or_placeholder(profile.address.as_deref()),
        _ => text_or_placeholder(user.location.as_deref()),
    };

    UserRow {
        id: text_or_placeholder(user.id.as_deref()),
        first_name: text_or_placeholder(user.first_name.as_deref()),
        last_name: text_or_placeholder(user.last_name.as_deref()),
        email: text_or_placeholder(user.email.as_deref()),
        role: UserRole::parse(user.role.as_deref()),
        phone: text_or_placeholder(user.phone.as_deref()),
        location,
        status: match user.status.as_deref() {
            Some("blocked") => UserStatus::Blocked,
            _ => UserStatus::Active,
        },
        age: user
            .age
            .map(|age| age.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        business_name: profile_text(profile, |p| p.business_name.as_deref()),
        business_approval,
        business_type: profile_text(profile, |p| p.business_type.as_deref()),
        business_registration: profile_text(profile, |p| p.registration_number.as_deref()),
        business_tax_id: profile_text(profile, |p| p.tax_id.as_deref()),
        business_owner: profile_text(profile, |p| p.owner_name.as_deref()),
    }
}

/// Pending requests describe the business, not the person behind it
pub fn normalize_business_request(user: UserRecord) -> BusinessRequestRow {
    let profile = user.business_info.as_ref();
    BusinessRequestRow {
        id: text_or_placeholder(user.id.as_deref()),
        business_name: profile_text(profile, |p| p.business_name.as_deref()),
        owner: profile_text(profile, |p| p.owner_name.as_deref()),
        email: text_or_placeholder(first_text([
            user.email.as_deref(),
            profile.and_then(|p| p.email.as_deref()),
        ])),
        phone: text_or_placeholder(first_text([
            profile.and_then(|p| p.phone.as_deref()),
            user.phone.as_deref(),
        ])),
        address: profile_text(profile, |p| p.address.as_deref()),
        business_type: profile_text(profile, |p| p.business_type.as_deref()),
        registration_number: profile_text(profile, |p| p.registration_number.as_deref()),
        tax_id: profile_text(profile, |p| p.tax_id.as_deref()),
        approval: match profile.and_then(|p| p.approved_by_admin) {
            Some(true) => ApprovalState::Approved,
            Some(false) => ApprovalState::Pending,
            None => ApprovalState::Unknown,
        },
    }
}

pub fn normalize_business(business: BusinessRecord) -> BusinessRow {
    let earn_points = business.earn_points.unwrap_or_default();
    let earn_points_type = first_text([earn_points.kind.as_deref()])
        .unwrap_or("per_4_packs")
        .to_string();
    let earn_points_value = earn_points.value.filter(|v| v.is_finite()).unwrap_or(0.0);
    let method = first_text([business.method.as_deref()])
        .unwrap_or("upload_receipt")
        .to_string();
    let is_active = business.is_active.unwrap_or(false);

    BusinessRow {
        id: text_or_placeholder(business.id.as_deref()),
        name: text_or_placeholder(business.name.as_deref()),
        description: text_or_placeholder(business.description.as_deref()),
        earn_points_display: format!("{} · {}", humanize(&earn_points_type), earn_points_value),
        earn_points_type,
        earn_points_value,
        method_display: humanize(&method),
        method,
        is_active,
        status: active_label(is_active),
        created_at: format_date(business.created_at.as_deref()),
    }
}

pub fn normalize_reward(reward: RewardRecord) -> RewardRow {
    let business = reward.business.as_ref();
    let is_active = reward.is_active.unwrap_or(false);
    RewardRow {
        id: text_or_placeholder(reward.id.as_deref()),
        reward_name: text_or_placeholder(reward.reward_name.as_deref()),
        points_required: reward.points_required.unwrap_or(0),
        reward_type: text_or_placeholder(reward.reward_type.as_deref()),
        image: reward.image.unwrap_or_default(),
        is_active,
        status: active_label(is_active),
        business_id: reference_id(business),
        business_name: text_or_placeholder(
            business
                .and_then(Reference::details)
                .and_then(|b| b.name.as_deref()),
        ),
        created_at: format_date(reward.created_at.as_deref()),
    }
}

pub fn normalize_redeem(redeem: RedeemRecord) -> RedeemRow {
    let user = redeem.user.as_ref().and_then(Reference::details);
    let reward = redeem.reward.as_ref().and_then(Reference::details);
    let business_name = first_text([
        reward
            .and_then(|r| r.business.as_ref())
            .and_then(Reference::details)
            .and_then(|b| b.name.as_deref()),
        redeem
            .business
            .as_ref()
            .and_then(Reference::details)
            .and_then(|b| b.name.as_deref()),
    ]);
    let points_required = reward.and_then(|r| r.points_required).unwrap_or(0);

    RedeemRow {
        id: text_or_placeholder(redeem.id.as_deref()),
        user_id: reference_id(redeem.user.as_ref()),
        user_name: person_name(user),
        user_email: text_or_placeholder(user.and_then(|u| u.email.as_deref())),
        user_phone: text_or_placeholder(user.and_then(|u| u.phone.as_deref())),
        reward_name: text_or_placeholder(reward.and_then(|r| r.reward_name.as_deref())),
        business_name: text_or_placeholder(business_name),
        reward_type: text_or_placeholder(reward.and_then(|r| r.reward_type.as_deref())),
        points_required,
        points_used: redeem.points_used.unwrap_or(points_required),
        redeem_code: text_or_placeholder(redeem.redeem_code.as_deref()),
        status: text_or_placeholder(redeem.status.as_deref()),
        created_at: format_date(redeem.created_at.as_deref()),
    }
}

pub fn normalize_business_info(info: BusinessInfoRecord) -> BusinessInfoRow {
    let business = info.business.as_ref();
    let prize = info.grand_prize.as_ref();
    let is_active = info.is_active.unwrap_or(true);
    BusinessInfoRow {
        id: text_or_placeholder(info.id.as_deref()),
        business_id: reference_id(business),
        business_name: text_or_placeholder(
            business
                .and_then(Reference::details)
                .and_then(|b| b.name.as_deref()),
        ),
        title: text_or_placeholder(info.title.as_deref()),
        stats_count: info.summary_stats.len(),
        grand_prize_title: text_or_placeholder(prize.and_then(|p| p.title.as_deref())),
        draw_date: text_or_placeholder(prize.and_then(|p| p.draw_date.as_deref())),
        products_count: info.earn_per_purchase.len(),
        is_active,
        status: active_label(is_active),
        created_at: format_date(info.created_at.as_deref()),
    }
}

pub fn normalize_history(entry: HistoryRecord) -> HistoryRow {
    let related = entry.related_business.as_ref();
    HistoryRow {
        id: text_or_placeholder(entry.id.as_deref()),
        user_id: reference_id(entry.user.as_ref()),
        user_name: person_name(entry.user.as_ref().and_then(Reference::details)),
        session: text_or_placeholder(entry.session.as_deref()),
        related_business_id: reference_id(related),
        related_business_name: profile_text(linked_profile(related), |p| {
            p.business_name.as_deref()
        }),
        action_type: text_or_placeholder(entry.action_type.as_deref()),
        points: entry.points.unwrap_or(0),
        details: format_details(entry.details.as_ref()),
        timestamp: format_timestamp(entry.timestamp.as_deref()),
    }
}

pub fn normalize_receipt(receipt: ReceiptRecord) -> ReceiptRow {
    let profile = linked_profile(receipt.business.as_ref());
    let meta = receipt.meta.unwrap_or_default();
    ReceiptRow {
        id: text_or_placeholder(receipt.id.as_deref()),
        business_id: reference_id(receipt.business.as_ref()),
        business_name: profile_text(profile, |p| p.business_name.as_deref()),
        business_type: profile_text(profile, |p| p.business_type.as_deref()),
        kind: text_or_placeholder(receipt.kind.as_deref()),
        value: text_or_placeholder(receipt.value.as_deref()),
        points: receipt.points.unwrap_or(0),
        status: text_or_placeholder(receipt.status.as_deref()),
        category: meta
            .category
            .as_deref()
            .map(humanize)
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        total_amount: meta
            .total_amount
            .filter(|amount| amount.is_finite())
            .map(|amount| format!("${amount:.2}"))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        case_quantity: number_text(meta.case_quantity),
        items_count: meta
            .extracted_data
            .map(|items| items.len().to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        image_url: text_or_placeholder(meta.image_url.as_deref()),
        created_at: format_timestamp(receipt.created_at.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RedeemAction, Row};
    use serde_json::json;

    fn decode<T: serde::de::DeserializeOwned>(value: Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_records_normalize_to_placeholders() {
        let redeem = normalize_redeem(decode(json!({})));
        assert_eq!(redeem.id(), PLACEHOLDER);
        assert_eq!(redeem.user_id, PLACEHOLDER);
        assert_eq!(redeem.user_name, PLACEHOLDER);
        assert_eq!(redeem.business_name, PLACEHOLDER);
        assert_eq!(redeem.created_at, PLACEHOLDER);

        let history = normalize_history(decode(json!({"user": null, "relatedBusiness": null})));
        assert_eq!(history.user_id, PLACEHOLDER);
        assert_eq!(history.related_business_id, PLACEHOLDER);
        assert_eq!(history.details, PLACEHOLDER);
        assert_eq!(history.points, 0);

        let receipt = normalize_receipt(decode(json!({"meta": null})));
        assert_eq!(receipt.total_amount, PLACEHOLDER);
        assert_eq!(receipt.items_count, PLACEHOLDER);

        let info = normalize_business_info(decode(json!({})));
        assert_eq!(info.business_id, PLACEHOLDER);
        assert_eq!(info.stats_count, 0);
    }

    #[test]
    fn relationships_yield_ids_in_both_shapes() {
        let bare = normalize_reward(decode(json!({"_id": "r1", "business": "b1"})));
        assert_eq!(bare.business_id, "b1");
        assert_eq!(bare.business_name, PLACEHOLDER);

        let embedded = normalize_reward(decode(
            json!({"_id": "r2", "business": {"_id": "b2", "name": "Harbour Bar"}}),
        ));
        assert_eq!(embedded.business_id, "b2");
        assert_eq!(embedded.business_name, "Harbour Bar");
    }

    #[test]
    fn redeem_user_name_falls_back_to_email() {
        let row = normalize_redeem(decode(json!({
            "_id": "x1",
            "user": {"_id": "u1", "email": "ann@bar.tt"},
            "reward": {"_id": "r1", "rewardName": "Cap", "pointsRequired": 40,
                       "business": {"_id": "b1", "name": "Supermarket"}},
            "status": "pending"
        })));
        assert_eq!(row.user_id, "u1");
        assert_eq!(row.user_name, "ann@bar.tt");
        assert_eq!(row.business_name, "Supermarket");
        assert_eq!(row.points_used, 40);
        assert_eq!(row.available_action(), RedeemAction::MarkDelivered);
    }

    #[test]
    fn users_map_approval_and_status() {
        let consumer = normalize_user(decode(json!({
            "_id": "u1", "firstName": "Ann", "role": "consumer", "status": "blocked", "age": 31
        })));
        assert_eq!(consumer.status, UserStatus::Blocked);
        assert_eq!(consumer.age, "31");
        assert_eq!(consumer.business_approval, ApprovalState::Unknown);
        assert_eq!(consumer.last_name, PLACEHOLDER);

        let business = normalize_user(decode(json!({
            "_id": "u2", "role": "business", "location": "Port of Spain",
            "businessInfo": {"businessName": "Harbour Bar", "approvedByAdmin": false, "address": "1 Wharf Rd"}
        })));
        assert_eq!(business.business_approval, ApprovalState::Rejected);
        assert_eq!(business.location, "1 Wharf Rd");
        assert_eq!(business.role, UserRole::Business);

        let unknown_role = normalize_user(decode(json!({"role": "auditor"})));
        assert_eq!(unknown_role.role, UserRole::Other);
    }

    #[test]
    fn business_requests_read_the_business_profile() {
        let row = normalize_business_request(decode(json!({
            "_id": "u9",
            "phone": "555-0100",
            "businessInfo": {"businessName": "Rum Shop", "ownerName": "Dee", "email": "dee@shop.tt",
                             "approvedByAdmin": false}
        })));
        assert_eq!(row.owner, "Dee");
        assert_eq!(row.email, "dee@shop.tt");
        assert_eq!(row.phone, "555-0100");
        assert_eq!(row.approval, ApprovalState::Pending);
        assert_eq!(row.tax_id, PLACEHOLDER);
    }

    #[test]
    fn business_rows_fill_earning_defaults() {
        let row = normalize_business(decode(json!({"_id": "b1", "name": "Harbour", "isActive": true})));
        assert_eq!(row.earn_points_type, "per_4_packs");
        assert_eq!(row.earn_points_display, "per 4 packs · 0");
        assert_eq!(row.method_display, "upload receipt");
        assert_eq!(row.status, "Active");
    }

    #[test]
    fn receipts_format_meta() {
        let row = normalize_receipt(decode(json!({
            "_id": "s1",
            "business": {"_id": "u5", "businessInfo": {"businessName": "Corner Shop", "businessType": "Rumshop/Small Store"}},
            "meta": {"category": "case_0_25", "totalAmount": 12.5, "caseQuantity": 2.0,
                     "extractedData": [{"name": "Guinness"}, {"name": "Malta"}]},
            "createdAt": "2024-03-05T14:07:00Z"
        })));
        assert_eq!(row.business_id, "u5");
        assert_eq!(row.business_name, "Corner Shop");
        assert_eq!(row.category, "case 0 25");
        assert_eq!(row.total_amount, "$12.50");
        assert_eq!(row.case_quantity, "2");
        assert_eq!(row.items_count, "2");
        assert_eq!(row.created_at, "05/03/2024, 14:07");
    }

    #[test]
    fn details_are_flattened_for_display() {
        let fields = Details::Fields(
            decode(json!({"qrValue": "abc", "imageUrl": "https://x/y.png", "points": 5})),
        );
        assert_eq!(
            format_details(Some(&fields)),
            "Image Url: View Image • Points: 5 • Qr Value: abc"
        );

        let text = Details::Text("{\"caseType\":\"case_1\"}".to_string());
        assert_eq!(format_details(Some(&text)), "Case Type: case_1");

        let plain = Details::Text("scanned at till".to_string());
        assert_eq!(format_details(Some(&plain)), "scanned at till");
    }

    #[test]
    fn dates_render_day_first() {
        assert_eq!(format_date(Some("2024-11-02T09:30:00.000Z")), "02/11/2024");
        assert_eq!(format_date(Some("2024-11-02")), "02/11/2024");
        assert_eq!(format_date(Some("yesterday")), "yesterday");
        assert_eq!(format_date(Some(" ")), PLACEHOLDER);
        assert_eq!(format_timestamp(None), PLACEHOLDER);
    }

    #[test]
    fn case_labels() {
        assert_eq!(case_label("case_0_25"), "Case 0.25");
        assert_eq!(case_label("case_1"), "Case 1");
        assert_eq!(case_label("qr_scan"), "qr scan");
    }
}
