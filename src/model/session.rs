use serde::{Deserialize, Serialize};

use crate::error::AdminError;
use crate::model::{BusinessProfile, Id};

/// Credentials posted to `/login`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), AdminError> {
        if self.email.is_empty() {
            return Err(AdminError::validation("Email is required."));
        }
        if self.password.is_empty() {
            return Err(AdminError::validation("Password is required."));
        }
        Ok(())
    }
}

/// The signed-in account returned by `/login`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminProfile {
    #[serde(alias = "_id")]
    pub id: Id,
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub business_info: Option<BusinessProfile>,
    pub points: Option<i64>,
}

impl AdminProfile {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

/// Success body of `/login`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub token: String,
    pub user: AdminProfile,
}
