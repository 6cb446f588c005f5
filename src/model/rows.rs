//! Flat, display-ready rows. Produced by the normalizer and never edited in place.

use serde::{Deserialize, Serialize};

use crate::model::Id;

/// Anything a list page can render
pub trait Row {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Consumer,
    Business,
    Admin,
    Other,
}

impl UserRole {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("consumer") => UserRole::Consumer,
            Some("business") => UserRole::Business,
            Some("admin") => UserRole::Admin,
            _ => UserRole::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            UserStatus::Active => UserStatus::Blocked,
            UserStatus::Blocked => UserStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalState {
    Approved,
    Pending,
    Rejected,
    Unknown,
}

impl ApprovalState {
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalState::Approved => "Approved",
            ApprovalState::Pending => "Pending",
            ApprovalState::Rejected => "Rejected",
            ApprovalState::Unknown => crate::model::PLACEHOLDER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedeemStatus {
    Pending,
    Delivered,
}

impl RedeemStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(RedeemStatus::Pending),
            "delivered" => Some(RedeemStatus::Delivered),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RedeemStatus::Pending => "pending",
            RedeemStatus::Delivered => "delivered",
        }
    }
}

/// The single status action a redeem row offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedeemAction {
    MarkDelivered,
    MarkPending,
}

impl RedeemAction {
    pub fn target_status(&self) -> RedeemStatus {
        match self {
            RedeemAction::MarkDelivered => RedeemStatus::Delivered,
            RedeemAction::MarkPending => RedeemStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Approved,
    Pending,
    Rejected,
}

impl ReceiptStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approved" => Some(ReceiptStatus::Approved),
            "pending" => Some(ReceiptStatus::Pending),
            "rejected" => Some(ReceiptStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Approved => "approved",
            ReceiptStatus::Pending => "pending",
            ReceiptStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: String,
    pub location: String,
    pub status: UserStatus,
    pub age: String,
    pub business_name: String,
    pub business_approval: ApprovalState,
    pub business_type: String,
    pub business_registration: String,
    pub business_tax_id: String,
    pub business_owner: String,
}

/// A business account waiting for an approval decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRequestRow {
    pub id: Id,
    pub business_name: String,
    pub owner: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub business_type: String,
    pub registration_number: String,
    pub tax_id: String,
    pub approval: ApprovalState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRow {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub earn_points_type: String,
    pub earn_points_value: f64,
    pub earn_points_display: String,
    pub method: String,
    pub method_display: String,
    pub is_active: bool,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRow {
    pub id: Id,
    pub reward_name: String,
    pub points_required: i64,
    pub reward_type: String,
    pub image: String,
    pub is_active: bool,
    pub status: String,
    pub business_id: Id,
    pub business_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemRow {
    pub id: Id,
    pub user_id: Id,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub reward_name: String,
    pub business_name: String,
    pub reward_type: String,
    pub points_required: i64,
    pub points_used: i64,
    pub redeem_code: String,
    pub status: String,
    pub created_at: String,
}

impl RedeemRow {
    pub fn parsed_status(&self) -> Option<RedeemStatus> {
        RedeemStatus::parse(&self.status)
    }

    /// Pending rows can be delivered; every other status can only go back to pending
    pub fn available_action(&self) -> RedeemAction {
        match self.parsed_status() {
            Some(RedeemStatus::Pending) => RedeemAction::MarkDelivered,
            _ => RedeemAction::MarkPending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfoRow {
    pub id: Id,
    pub business_id: Id,
    pub business_name: String,
    pub title: String,
    pub stats_count: usize,
    pub grand_prize_title: String,
    pub draw_date: String,
    pub products_count: usize,
    pub is_active: bool,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub id: Id,
    pub user_id: Id,
    pub user_name: String,
    pub session: String,
    pub related_business_id: Id,
    pub related_business_name: String,
    pub action_type: String,
    pub points: i64,
    pub details: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRow {
    pub id: Id,
    pub business_id: Id,
    pub business_name: String,
    pub business_type: String,
    pub kind: String,
    pub value: String,
    pub points: i64,
    pub status: String,
    pub category: String,
    pub total_amount: String,
    pub case_quantity: String,
    pub items_count: String,
    pub image_url: String,
    pub created_at: String,
}

macro_rules! row {
    ($($ty:ty),* $(,)?) => {
        $(impl Row for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

row!(
    UserRow,
    BusinessRequestRow,
    BusinessRow,
    RewardRow,
    RedeemRow,
    BusinessInfoRow,
    HistoryRow,
    ReceiptRow,
);
