use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use guinness_admin::client::{Backend, ListRequest, MemoryNotifier, Redeems, Resource, Rewards};
use guinness_admin::config::ListSettings;
use guinness_admin::error::AdminError;
use guinness_admin::logic::{EmptyState, FetchOutcome, ListContext, ListController};
use guinness_admin::model::{
    Ack, ImageUpload, ListPage, Method, MutationIntent, Pagination, Payload, RedeemAction,
    RewardDraft, Route, PLACEHOLDER,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

/// Backend double: serves in-memory collections keyed by list path and
/// records every call. Calls can be held back with a gate to reorder replies.
#[derive(Default)]
struct ScriptedBackend {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    requests: Mutex<Vec<ListRequest>>,
    mutations: Mutex<Vec<MutationIntent>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    list_failures: Mutex<VecDeque<AdminError>>,
    mutation_failures: Mutex<VecDeque<AdminError>>,
}

impl ScriptedBackend {
    fn with(path: &str, records: Vec<Value>) -> Arc<Self> {
        let backend = Self::default();
        backend.collections.lock().insert(path.to_string(), records);
        Arc::new(backend)
    }

    fn requests(&self) -> Vec<ListRequest> {
        self.requests.lock().clone()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_request(&self) -> ListRequest {
        self.requests.lock().last().cloned().expect("no list request yet")
    }

    fn mutations(&self) -> Vec<MutationIntent> {
        self.mutations.lock().clone()
    }

    /// Hold back the call whose search term or route path is `key`
    fn gate(&self, key: &str) {
        self.gates.lock().insert(key.to_string(), Arc::new(Notify::new()));
    }

    fn release(&self, key: &str) {
        if let Some(gate) = self.gates.lock().remove(key) {
            gate.notify_one();
        }
    }

    fn fail_next_list(&self, error: AdminError) {
        self.list_failures.lock().push_back(error);
    }

    fn fail_next_mutation(&self, error: AdminError) {
        self.mutation_failures.lock().push_back(error);
    }

    async fn wait_at_gate(&self, key: Option<&str>) {
        let gate = key.and_then(|key| self.gates.lock().get(key).cloned());
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn apply(&self, intent: &MutationIntent) -> Ack {
        let mut collections = self.collections.lock();
        match (&intent.route.method, &intent.payload) {
            (Method::Delete, _) => {
                for records in collections.values_mut() {
                    records.retain(|record| {
                        record["_id"].as_str() != intent.target_id.as_deref()
                    });
                }
                Ack::default()
            }
            (Method::Put | Method::Patch, Payload::Json(body)) => {
                for records in collections.values_mut() {
                    for record in records.iter_mut() {
                        if record["_id"].as_str() != intent.target_id.as_deref() {
                            continue;
                        }
                        if let Some(status) = body.get("status") {
                            record["status"] = status.clone();
                        }
                        if let Some(active) = body.get("isActive") {
                            record["isActive"] = active.clone();
                        }
                    }
                }
                Ack {
                    message: "Status updated".to_string(),
                    data: None,
                }
            }
            _ => Ack {
                message: format!("{} saved", intent.resource),
                data: None,
            },
        }
    }
}

fn matches(record: &Value, request: &ListRequest) -> bool {
    let search_ok = request.get("search").map_or(true, |term| {
        let term = term.to_lowercase();
        record
            .as_object()
            .into_iter()
            .flat_map(|fields| fields.values())
            .filter_map(Value::as_str)
            .any(|text| text.to_lowercase().contains(&term))
    });
    let business_ok = request
        .get("business")
        .map_or(true, |name| record["business"]["name"].as_str() == Some(name));
    search_ok && business_ok
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn list(&self, request: &ListRequest) -> Result<ListPage<Value>, AdminError> {
        self.requests.lock().push(request.clone());
        self.wait_at_gate(request.get("search")).await;
        if let Some(error) = self.list_failures.lock().pop_front() {
            return Err(error);
        }

        let matching: Vec<Value> = self
            .collections
            .lock()
            .get(&request.path)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|record| matches(record, request))
            .collect();
        let pagination = Pagination::from_total(matching.len() as u64, request.page, request.limit);
        let start = (request.page as usize - 1) * request.limit as usize;
        let records = matching
            .into_iter()
            .skip(start)
            .take(request.limit as usize)
            .collect();
        Ok(ListPage {
            records,
            pagination,
        })
    }

    async fn mutate(&self, intent: &MutationIntent) -> Result<Ack, AdminError> {
        self.mutations.lock().push(intent.clone());
        self.wait_at_gate(Some(intent.route.path.as_str())).await;
        if let Some(error) = self.mutation_failures.lock().pop_front() {
            return Err(error);
        }
        Ok(self.apply(intent))
    }
}

fn reward(index: usize, business: &str) -> Value {
    json!({
        "_id": format!("r{index}"),
        "rewardName": format!("Reward {index}"),
        "pointsRequired": 100 + index,
        "rewardType": "merchandise",
        "isActive": true,
        "business": {"_id": format!("b-{business}"), "name": business},
    })
}

fn rewards(count: usize) -> Vec<Value> {
    (0..count).map(|index| reward(index, "Supermarket")).collect()
}

fn controller<R: Resource>(
    resource: R,
    backend: Arc<ScriptedBackend>,
) -> (ListController<R>, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let context = ListContext::new(backend, notifier.clone(), ListSettings::default());
    (ListController::new(resource, context), notifier)
}

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn typing_commits_only_the_last_value_after_a_pause() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(3));
    let (page, _) = controller(Rewards, backend.clone());
    page.load().await;
    assert_eq!(backend.request_count(), 1);

    for text in ["r", "re", "rew", "reward 2"] {
        page.set_search_text(text);
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
    let view = page.snapshot();
    assert_eq!(view.search_raw, "reward 2");
    assert_eq!(view.search, "");
    assert_eq!(backend.request_count(), 1);

    tokio::time::sleep(Duration::from_millis(400)).await;
    settle().await;

    assert_eq!(backend.request_count(), 2);
    assert_eq!(backend.last_request().get("search"), Some("reward 2"));
    let view = page.snapshot();
    assert_eq!(view.search, "reward 2");
    assert_eq!(view.rows.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn retyping_the_committed_text_sends_nothing() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(3));
    let (page, _) = controller(Rewards, backend.clone());
    page.load().await;

    page.set_search_text("  ");
    tokio::time::sleep(Duration::from_millis(500)).await;
    settle().await;
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn new_search_or_filter_returns_to_page_one() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(40));
    let (page, _) = controller(Rewards, backend.clone());
    page.load().await;
    assert_eq!(page.go_to_page(3).await, FetchOutcome::Applied);
    assert_eq!(backend.last_request().page, 3);

    assert_eq!(page.set_filter("Supermarket").await, FetchOutcome::Applied);
    let request = backend.last_request();
    assert_eq!(request.page, 1);
    assert_eq!(request.get("business"), Some("Supermarket"));

    page.go_to_page(2).await;
    page.set_search_text("reward 1");
    assert_eq!(page.submit_search().await, FetchOutcome::Applied);
    let request = backend.last_request();
    assert_eq!(request.page, 1);
    assert_eq!(request.get("search"), Some("reward 1"));
    assert_eq!(request.get("business"), Some("Supermarket"));
}

#[tokio::test]
async fn all_tab_drops_the_filter_parameter() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(3));
    let (page, _) = controller(Rewards, backend.clone());
    page.set_filter("Wholesaler").await;
    page.set_filter("all").await;
    assert_eq!(backend.last_request().get("business"), None);
    assert!(page.snapshot().filter.is_all());
}

#[tokio::test]
async fn slow_superseded_response_never_replaces_newer_rows() {
    let mut records = rewards(3);
    records.push(json!({"_id": "cap", "rewardName": "Guinness Cap"}));
    records.push(json!({"_id": "shirt", "rewardName": "Guinness Shirt"}));
    let backend = ScriptedBackend::with("/getAllRewards", records);
    let (page, notifier) = controller(Rewards, backend.clone());
    page.load().await;

    backend.gate("cap");
    page.set_search_text("cap");
    let slow = tokio::spawn({
        let page = page.clone();
        async move { page.submit_search().await }
    });
    while backend.request_count() < 2 {
        tokio::task::yield_now().await;
    }
    assert!(page.snapshot().loading);

    page.set_search_text("shirt");
    assert_eq!(page.submit_search().await, FetchOutcome::Applied);

    backend.release("cap");
    assert_eq!(slow.await.unwrap(), FetchOutcome::Stale);

    let view = page.snapshot();
    assert_eq!(view.search, "shirt");
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].id, "shirt");
    assert!(!view.loading);
    assert!(notifier.errors().is_empty());
}

#[tokio::test]
async fn out_of_range_pages_are_refused_without_a_request() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(42));
    let (page, _) = controller(Rewards, backend.clone());
    page.load().await;

    let view = page.snapshot();
    assert_eq!(view.total, 42);
    assert_eq!(view.total_pages, 3);
    assert!(view.has_next());
    assert!(!view.has_previous());

    assert_eq!(page.go_to_page(4).await, FetchOutcome::Skipped);
    assert_eq!(page.go_to_page(0).await, FetchOutcome::Skipped);
    assert_eq!(backend.request_count(), 1);

    assert_eq!(page.go_to_page(3).await, FetchOutcome::Applied);
    assert_eq!(page.snapshot().rows.len(), 12);
    assert_eq!(page.next_page().await, FetchOutcome::Skipped);
    assert_eq!(page.previous_page().await, FetchOutcome::Applied);
    assert_eq!(backend.last_request().page, 2);
}

#[tokio::test]
async fn delete_goes_through_confirmation_and_refreshes_once() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(5));
    let (page, notifier) = controller(Rewards, backend.clone());
    page.load().await;
    let target = page.snapshot().rows[2].clone();

    let direct = page.dispatch(Rewards.delete(&target)).await;
    assert!(matches!(direct, Err(AdminError::ConfirmationRequired { .. })));
    assert!(backend.mutations().is_empty());

    page.request_confirmation(Rewards.delete(&target)).unwrap();
    assert_eq!(page.snapshot().pending_confirmation.as_deref(), Some("delete reward"));
    assert!(page.cancel_confirmation().is_some());
    assert!(backend.mutations().is_empty());

    page.request_confirmation(Rewards.delete(&target)).unwrap();
    let lists_before = backend.request_count();
    let receipt = page.confirm().await.unwrap();

    let mutations = backend.mutations();
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].route, Route::delete(format!("/deleteReward/{}", target.id)));
    assert_eq!(receipt.refresh_version, 1);
    assert_eq!(receipt.refresh, FetchOutcome::Applied);
    assert_eq!(backend.request_count(), lists_before + 1);

    let view = page.snapshot();
    assert_eq!(view.refresh_version, 1);
    assert_eq!(view.pending_confirmation, None);
    assert_eq!(view.rows.len(), 4);
    assert!(view.rows.iter().all(|row| row.id != target.id));
    assert_eq!(notifier.successes(), vec!["Reward deleted successfully.".to_string()]);
}

#[tokio::test]
async fn failed_confirmation_stays_armed_and_keeps_rows() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(2));
    let (page, notifier) = controller(Rewards, backend.clone());
    page.load().await;
    let target = page.snapshot().rows[0].clone();

    page.request_confirmation(Rewards.delete(&target)).unwrap();
    backend.fail_next_mutation(AdminError::backend(Some(400), "Reward is in use"));
    let lists_before = backend.request_count();

    assert!(page.confirm().await.is_err());
    assert_eq!(notifier.errors(), vec!["Reward is in use".to_string()]);
    assert_eq!(backend.request_count(), lists_before);
    let view = page.snapshot();
    assert_eq!(view.refresh_version, 0);
    assert_eq!(view.pending_confirmation.as_deref(), Some("delete reward"));
    assert_eq!(view.rows.len(), 2);
}

#[tokio::test]
async fn confirming_with_nothing_armed_is_refused() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(1));
    let (page, notifier) = controller(Rewards, backend.clone());
    assert!(matches!(
        page.confirm().await,
        Err(AdminError::ConfirmationRequired { .. })
    ));
    assert_eq!(notifier.errors().len(), 1);
    assert!(backend.mutations().is_empty());
}

#[tokio::test]
async fn redeem_toggle_flips_the_offered_action() {
    let backend = ScriptedBackend::with(
        "/geAllRedeems",
        vec![json!({
            "_id": "x1",
            "status": "pending",
            "redeemCode": "GN-3100",
            "user": {"_id": "u1", "firstName": "Ava", "lastName": "Smith"},
            "reward": {"_id": "r1", "rewardName": "Cap", "pointsRequired": 150,
                       "business": {"_id": "b1", "name": "Supermarket"}},
        })],
    );
    let (page, _) = controller(Redeems, backend.clone());
    page.load().await;
    let row = page.snapshot().rows[0].clone();
    assert_eq!(row.available_action(), RedeemAction::MarkDelivered);
    assert_eq!(row.business_name, "Supermarket");

    let receipt = page.dispatch(Redeems.toggle_status(&row)).await.unwrap();
    assert_eq!(receipt.ack.message, "Status updated");

    let sent = &backend.mutations()[0];
    assert_eq!(sent.route, Route::put("/update-status"));
    assert_eq!(
        sent.payload,
        Payload::Json(json!({"redeemId": "x1", "status": "delivered"}))
    );

    let row = page.snapshot().rows[0].clone();
    assert_eq!(row.status, "delivered");
    assert_eq!(row.available_action(), RedeemAction::MarkPending);
}

#[tokio::test]
async fn second_toggle_on_a_busy_row_is_refused() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(1));
    let (page, notifier) = controller(Rewards, backend.clone());
    page.load().await;
    let row = page.snapshot().rows[0].clone();

    backend.gate("/updateRewardStatus/r0");
    let first = tokio::spawn({
        let page = page.clone();
        let intent = Rewards.toggle_status(&row);
        async move { page.dispatch(intent).await }
    });
    while backend.mutations().is_empty() {
        tokio::task::yield_now().await;
    }

    let second = page.dispatch(Rewards.toggle_status(&row)).await;
    assert_eq!(
        second.unwrap_err(),
        AdminError::validation("Please wait, the reward is still being updated.")
    );
    assert_eq!(backend.mutations().len(), 1);

    backend.release("/updateRewardStatus/r0");
    assert!(first.await.unwrap().is_ok());
    assert!(!page.snapshot().rows[0].is_active);
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn invalid_drafts_never_reach_the_backend() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(1));
    let (page, notifier) = controller(Rewards, backend.clone());
    let draft = RewardDraft {
        reward_name: " ".to_string(),
        business_id: "b1".to_string(),
        points_required: 10,
        reward_type: "merchandise".to_string(),
        image: None,
        is_active: None,
    };
    let result = page.dispatch(Rewards.create(&draft)).await;
    assert_eq!(result.unwrap_err(), AdminError::validation("Reward name is required."));
    assert!(backend.mutations().is_empty());
    assert_eq!(notifier.errors(), vec!["Reward name is required.".to_string()]);
}

#[tokio::test]
async fn creating_returns_to_the_first_page() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(20));
    let (page, notifier) = controller(Rewards, backend.clone());
    page.load().await;
    page.go_to_page(2).await;

    let draft = RewardDraft {
        reward_name: "Scarf".to_string(),
        business_id: "b1".to_string(),
        points_required: 120,
        reward_type: "merchandise".to_string(),
        image: Some(ImageUpload {
            file_name: "scarf.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }),
        is_active: Some(true),
    };
    page.dispatch(Rewards.create(&draft)).await.unwrap();
    assert_eq!(page.snapshot().page, 1);
    assert_eq!(backend.last_request().page, 1);
    assert_eq!(notifier.successes(), vec!["reward saved".to_string()]);
}

#[tokio::test]
async fn page_left_past_the_end_is_pulled_back() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(16));
    let (page, _) = controller(Rewards, backend.clone());
    page.load().await;
    page.go_to_page(2).await;
    let last = page.snapshot().rows[0].clone();

    page.request_confirmation(Rewards.delete(&last)).unwrap();
    let lists_before = backend.request_count();
    page.confirm().await.unwrap();

    let view = page.snapshot();
    assert_eq!(view.page, 1);
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.rows.len(), 15);
    assert_eq!(backend.request_count(), lists_before + 1);
    assert_eq!(backend.last_request().page, 1);
}

#[tokio::test]
async fn page_emptied_elsewhere_is_pulled_back_on_refresh() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(16));
    let (page, _) = controller(Rewards, backend.clone());
    page.load().await;
    page.go_to_page(2).await;

    backend
        .collections
        .lock()
        .insert("/getAllRewards".to_string(), rewards(15));
    let first = page.snapshot().rows[0].clone();
    page.dispatch(Rewards.toggle_status(&first)).await.unwrap();

    let requests = backend.requests();
    let pages: Vec<u32> = requests.iter().rev().take(2).map(|r| r.page).collect();
    assert_eq!(pages, vec![1, 2]);
    assert_eq!(page.snapshot().page, 1);
    assert_eq!(page.snapshot().rows.len(), 15);
}

#[tokio::test]
async fn search_without_matches_differs_from_an_empty_list() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(3));
    let (page, _) = controller(Rewards, backend.clone());
    page.load().await;
    assert_eq!(page.empty_message(), None);

    page.set_search_text("smith");
    page.submit_search().await;
    let searched = page.empty_message().unwrap();
    assert_eq!(searched, "No rewards match \"smith\".");

    let empty = ScriptedBackend::with("/getAllRewards", vec![]);
    let (blank, _) = controller(Rewards, empty);
    blank.load().await;
    let nothing = blank.empty_message().unwrap();
    assert_eq!(nothing, "No rewards available yet.");
    assert_ne!(searched, nothing);

    blank.set_filter("Wholesaler").await;
    assert_eq!(
        blank.snapshot().empty_state,
        Some(EmptyState::NoneInCategory {
            category: "Wholesaler".to_string()
        })
    );
}

#[tokio::test]
async fn first_load_failure_becomes_the_empty_state() {
    let backend = ScriptedBackend::with("/getAllRewards", rewards(3));
    let (page, notifier) = controller(Rewards, backend.clone());
    backend.fail_next_list(AdminError::transport("connection refused"));

    assert_eq!(page.load().await, FetchOutcome::Failed);
    assert_eq!(
        page.empty_message().as_deref(),
        Some("Unable to reach the server. Please try again.")
    );
    assert_eq!(notifier.errors().len(), 1);

    assert_eq!(page.load().await, FetchOutcome::Applied);
    assert_eq!(page.empty_message(), None);

    backend.fail_next_list(AdminError::backend(Some(500), ""));
    assert_eq!(page.go_to_page(1).await, FetchOutcome::Skipped);
    page.set_filter("Supermarket").await;
    assert_eq!(page.snapshot().rows.len(), 3);
    assert_eq!(
        notifier.errors().last().map(String::as_str),
        Some("Unexpected error while fetching rewards.")
    );
}

#[tokio::test]
async fn tabs_are_discovered_once() {
    let mut records = rewards(2);
    records.push(reward(7, "Harbour Duty Free"));
    records.push(reward(8, "Airport Lounge"));
    records.push(json!({"_id": "orphan", "rewardName": "Keychain", "business": "b-gone"}));
    let backend = ScriptedBackend::with("/getAllRewards", records);
    let (page, _) = controller(Rewards, backend.clone());

    let tabs = page.load_filter_tabs().await;
    assert_eq!(
        tabs,
        vec![
            "Supermarket",
            "Rumshop/Small Store",
            "Wholesaler",
            "Bar/Restaurant",
            "Airport Lounge",
            "Harbour Duty Free",
        ]
    );
    assert!(!tabs.iter().any(|tab| tab == PLACEHOLDER));
    assert_eq!(backend.request_count(), 1);
    assert_eq!(backend.requests()[0].limit, ListSettings::default().tab_snapshot_limit);

    assert_eq!(page.load_filter_tabs().await, tabs);
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn records_missing_relationships_still_render() {
    let backend = ScriptedBackend::with(
        "/geAllRedeems",
        vec![
            json!({"_id": "bare", "user": "u9", "reward": "r9", "status": "pending"}),
            json!({"_id": "empty"}),
        ],
    );
    let (page, _) = controller(Redeems, backend);
    assert_eq!(page.load().await, FetchOutcome::Applied);

    let rows = page.snapshot().rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].user_id, "u9");
    assert_eq!(rows[0].user_name, PLACEHOLDER);
    assert_eq!(rows[0].reward_name, PLACEHOLDER);
    assert_eq!(rows[1].business_name, PLACEHOLDER);
    assert_eq!(rows[1].redeem_code, PLACEHOLDER);
}

#[tokio::test]
async fn malformed_optional_fields_never_hide_a_row() {
    let backend = ScriptedBackend::with(
        "/geAllRedeems",
        vec![
            json!({"_id": "odd", "user": 17, "reward": [], "pointsUsed": "n/a", "status": null}),
            json!({"_id": "ok", "status": "delivered", "pointsUsed": 40}),
        ],
    );
    let (page, notifier) = controller(Redeems, backend);
    assert_eq!(page.load().await, FetchOutcome::Applied);

    let view = page.snapshot();
    assert_eq!(view.total, 2);
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0].user_id, PLACEHOLDER);
    assert_eq!(view.rows[0].reward_name, PLACEHOLDER);
    assert_eq!(view.rows[0].available_action(), RedeemAction::MarkPending);
    assert_eq!(view.rows[0].points_used, 0);
    assert_eq!(view.rows[1].points_used, 40);
    assert!(notifier.errors().is_empty());
}
