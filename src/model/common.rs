use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Id = String;

/// Shown wherever a value cannot be derived from a backend record
pub const PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Backend-style document id (24 hex characters)
pub fn generate_id() -> Id {
    Uuid::new_v4().simple().to_string()[..24].to_string()
}

/// True for ids that cannot address a backend record
pub fn is_missing_id(id: &str) -> bool {
    let trimmed = id.trim();
    trimmed.is_empty() || trimmed == PLACEHOLDER
}

/// Trimmed text, or the placeholder when absent or blank
pub fn text_or_placeholder(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// First present, non-blank value
pub fn first_text<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|text| !text.is_empty())
}
