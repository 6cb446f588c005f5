use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdminError;

/// Paging metadata of one list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl Pagination {
    /// Derive `total_pages` as `max(1, ceil(total / limit))`
    pub fn from_total(total: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let total_pages = total.div_ceil(u64::from(limit)).max(1);
        Self {
            total,
            page: page.max(1),
            limit,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }

    pub fn empty(limit: u32) -> Self {
        Self::from_total(0, 1, limit)
    }
}

/// One page of records as returned by a list endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub records: Vec<T>,
    pub pagination: Pagination,
}

/// Success body of a mutation endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPagination {
    total: Option<u64>,
    page: Option<u32>,
    limit: Option<u32>,
    #[serde(rename = "totalPages")]
    total_pages: Option<u32>,
}

/// Interpret a decoded body through the `success` discriminant.
///
/// HTTP status only matters when the body carries no discriminant, except
/// for 401 which always means the session is gone.
pub fn read_envelope(status: u16, body: Value) -> Result<Value, AdminError> {
    if status == 401 {
        return Err(AdminError::Unauthenticated);
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    match body.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(body),
        Some(false) => Err(AdminError::backend(Some(status), message.unwrap_or_default())),
        None if !(200..300).contains(&status) => Err(AdminError::backend(
            Some(status),
            message.unwrap_or_else(|| format!("Server error ({status})")),
        )),
        None => Err(AdminError::transport(
            "Unexpected response format from server.",
        )),
    }
}

pub fn read_ack(body: Value) -> Ack {
    serde_json::from_value(body).unwrap_or_default()
}

/// Pull records and paging out of any of the list shapes the backend uses:
/// `{data: [...], pagination: {...}}`, `{data: [...], total, page, ...}` or
/// `{data: {data: [...], total, page, ...}}`.
pub fn read_list(
    mut body: Value,
    requested_page: u32,
    requested_limit: u32,
) -> Result<ListPage<Value>, AdminError> {
    let data = body.get_mut("data").map(Value::take).unwrap_or(Value::Null);

    let (records, meta) = match data {
        Value::Array(items) => {
            let pagination = body.get_mut("pagination").map(Value::take);
            match pagination {
                Some(meta @ Value::Object(_)) => (items, meta),
                _ => (items, body),
            }
        }
        Value::Object(mut nested) => match nested.remove("data") {
            Some(Value::Array(items)) => (items, Value::Object(nested)),
            _ => {
                return Err(AdminError::transport(
                    "list response carried no record array",
                ))
            }
        },
        _ => {
            return Err(AdminError::transport(
                "list response carried no record array",
            ))
        }
    };

    let raw: RawPagination = serde_json::from_value(meta).unwrap_or_default();
    let derived = Pagination::from_total(
        raw.total.unwrap_or(records.len() as u64),
        raw.page.unwrap_or(requested_page),
        raw.limit.unwrap_or(requested_limit),
    );
    let pagination = Pagination {
        total_pages: raw
            .total_pages
            .filter(|pages| *pages > 0)
            .unwrap_or(derived.total_pages),
        ..derived
    };

    Ok(ListPage {
        records,
        pagination,
    })
}
