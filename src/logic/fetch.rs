use log::{debug, warn};
use serde_json::Value;

use crate::client::Resource;
use crate::error::AdminError;
use crate::model::Pagination;

/// What happened to one list response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Rows and paging were replaced
    Applied,
    /// A newer request was issued meanwhile; the response was ignored
    Stale,
    /// The request failed; rows from the last success are kept
    Failed,
    /// Nothing changed, so no request was sent
    Skipped,
}

/// Owns the visible rows of one list and decides which response may replace them.
///
/// Every request gets the next sequence number from [`begin`](Self::begin).
/// Only a response carrying the latest number is applied, so a slow reply to
/// a superseded query can never overwrite a newer one.
#[derive(Debug)]
pub struct FetchCoordinator<T> {
    issued: u64,
    settled: u64,
    observed_version: u64,
    rows: Vec<T>,
    pagination: Pagination,
    has_loaded: bool,
    load_error: Option<AdminError>,
}

impl<T> FetchCoordinator<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            issued: 0,
            settled: 0,
            observed_version: 0,
            rows: Vec::new(),
            pagination: Pagination::empty(page_size),
            has_loaded: false,
            load_error: None,
        }
    }

    /// Register a new request made at `refresh_version`; returns its sequence number
    pub fn begin(&mut self, refresh_version: u64) -> u64 {
        self.issued += 1;
        self.observed_version = refresh_version;
        debug!("list request #{} (refresh version {})", self.issued, refresh_version);
        self.issued
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.issued
    }

    pub fn apply(&mut self, seq: u64, rows: Vec<T>, pagination: Pagination) -> FetchOutcome {
        if !self.is_latest(seq) {
            debug!("discarding stale list response #{} (latest #{})", seq, self.issued);
            return FetchOutcome::Stale;
        }
        self.rows = rows;
        self.pagination = pagination;
        self.has_loaded = true;
        self.load_error = None;
        self.settled = seq;
        FetchOutcome::Applied
    }

    /// Record a failure. Only the very first load turns it into an error state.
    pub fn fail(&mut self, seq: u64, error: &AdminError) -> FetchOutcome {
        if !self.is_latest(seq) {
            debug!("discarding stale list failure #{}: {:?}", seq, error);
            return FetchOutcome::Stale;
        }
        if !self.has_loaded {
            self.load_error = Some(error.clone());
        }
        self.settled = seq;
        FetchOutcome::Failed
    }

    pub fn is_loading(&self) -> bool {
        self.settled < self.issued
    }

    pub fn latest_seq(&self) -> u64 {
        self.issued
    }

    /// Refresh version the latest request was issued for
    pub fn observed_version(&self) -> u64 {
        self.observed_version
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn total_pages(&self) -> u32 {
        self.pagination.total_pages.max(1)
    }

    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    pub fn load_error(&self) -> Option<&AdminError> {
        self.load_error.as_ref()
    }
}

/// Decode and flatten one page of raw records; undecodable records are dropped
pub fn normalize_records<R: Resource>(resource: &R, records: Vec<Value>) -> Vec<R::Row> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<R::Raw>(record) {
            Ok(raw) => Some(resource.normalize(raw)),
            Err(error) => {
                warn!("dropping undecodable {} record: {}", resource.noun(), error);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{BusinessInfo, Rewards, Users};
    use crate::model::PLACEHOLDER;
    use serde_json::json;

    fn page(total: u64) -> Pagination {
        Pagination::from_total(total, 1, 15)
    }

    #[test]
    fn later_request_wins_regardless_of_arrival_order() {
        let mut fetch = FetchCoordinator::new(15);
        let first = fetch.begin(0);
        let second = fetch.begin(0);

        assert_eq!(fetch.apply(second, vec!["b"], page(1)), FetchOutcome::Applied);
        assert_eq!(fetch.apply(first, vec!["a"], page(1)), FetchOutcome::Stale);
        assert_eq!(fetch.rows(), &["b"]);
        assert!(!fetch.is_loading());
    }

    #[test]
    fn stale_failures_are_silent() {
        let mut fetch: FetchCoordinator<&str> = FetchCoordinator::new(15);
        let first = fetch.begin(0);
        let _second = fetch.begin(0);
        assert_eq!(
            fetch.fail(first, &AdminError::transport("timeout")),
            FetchOutcome::Stale
        );
        assert!(fetch.load_error().is_none());
        assert!(fetch.is_loading());
    }

    #[test]
    fn failure_after_success_keeps_rows() {
        let mut fetch = FetchCoordinator::new(15);
        let seq = fetch.begin(0);
        fetch.apply(seq, vec!["kept"], page(1));

        let seq = fetch.begin(1);
        assert_eq!(
            fetch.fail(seq, &AdminError::backend(Some(500), "boom")),
            FetchOutcome::Failed
        );
        assert_eq!(fetch.rows(), &["kept"]);
        assert!(fetch.load_error().is_none());
        assert_eq!(fetch.observed_version(), 1);
    }

    #[test]
    fn first_load_failure_is_remembered_until_a_success() {
        let mut fetch: FetchCoordinator<&str> = FetchCoordinator::new(15);
        let seq = fetch.begin(0);
        fetch.fail(seq, &AdminError::transport("refused"));
        assert!(fetch.load_error().is_some());
        assert!(!fetch.has_loaded());

        let seq = fetch.begin(0);
        fetch.apply(seq, vec![], page(0));
        assert!(fetch.load_error().is_none());
        assert_eq!(fetch.total_pages(), 1);
    }

    #[test]
    fn only_non_records_are_dropped() {
        let rows = normalize_records(
            &Rewards,
            vec![
                json!({"_id": "r1", "rewardName": "Cap"}),
                json!({"_id": "r2", "pointsRequired": "lots", "isActive": "yes"}),
                json!("not a record"),
                json!(42),
            ],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reward_name, "Cap");
        assert_eq!(rows[1].points_required, 0);
        assert!(!rows[1].is_active);
    }

    #[test]
    fn null_collections_keep_the_row() {
        let rows = normalize_records(
            &BusinessInfo,
            vec![json!({
                "_id": "i1",
                "title": "Summer draw",
                "summaryStats": null,
                "earnPerPurchase": null,
                "grandPrize": null,
            })],
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Summer draw");
        assert_eq!(rows[0].stats_count, 0);
        assert_eq!(rows[0].products_count, 0);
        assert_eq!(rows[0].grand_prize_title, PLACEHOLDER);
    }

    #[test]
    fn unusable_scalars_become_placeholders() {
        let users = normalize_records(
            &Users,
            vec![
                json!({"_id": "u1", "email": "a@b.c", "age": -1}),
                json!({"_id": "u2", "age": "thirty", "points": 12.6}),
            ],
        );
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].age, PLACEHOLDER);
        assert_eq!(users[0].email, "a@b.c");
        assert_eq!(users[1].age, PLACEHOLDER);

        let rewards = normalize_records(
            &Rewards,
            vec![json!({"_id": "r1", "pointsRequired": 100.5, "business": 7})],
        );
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].points_required, 101);
        assert_eq!(rewards[0].business_name, PLACEHOLDER);
    }
}
