//! Dispatcher behaviour against in-memory collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use pushgate_common::error::AppError;
use pushgate_common::types::{
    BatchResponse, CallerContext, NotificationData, SendResponse, UserRecord,
};
use pushgate_engine::NotificationDispatcher;
use pushgate_engine::payload::PushMessage;
use pushgate_engine::store::UserRecordStore;
use pushgate_engine::transport::{MulticastSummary, PushTransport, TransportError};
use pushgate_engine::validation::{BatchParams, SendParams};

// ============================================================
// Fakes
// ============================================================

#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<String, Option<String>>>,
    gets: Mutex<Vec<String>>,
    clears: Mutex<Vec<String>>,
    fail_reads: bool,
}

impl MemoryStore {
    fn with(records: &[(&str, Option<&str>)]) -> Self {
        let store = Self::default();
        {
            let mut map = store.records.lock().unwrap();
            for (id, token) in records {
                map.insert(id.to_string(), token.map(String::from));
            }
        }
        store
    }

    fn token_of(&self, id: &str) -> Option<String> {
        self.records.lock().unwrap().get(id).cloned().flatten()
    }

    fn gets(&self) -> usize {
        self.gets.lock().unwrap().len()
    }

    fn clears(&self) -> Vec<String> {
        self.clears.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserRecordStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        self.gets.lock().unwrap().push(id.to_string());
        if self.fail_reads {
            return Err(AppError::Internal("store unavailable".into()));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(id)
            .map(|token| UserRecord {
                id: id.to_string(),
                push_token: token.clone(),
            }))
    }

    async fn clear_token(&self, id: &str) -> Result<(), AppError> {
        self.clears.lock().unwrap().push(id.to_string());
        if let Some(token) = self.records.lock().unwrap().get_mut(id) {
            *token = None;
        }
        Ok(())
    }
}

#[derive(Clone)]
enum SendBehaviour {
    Accept,
    Reject(TransportError),
}

struct RecordingTransport {
    behaviour: SendBehaviour,
    multicast_result: Result<MulticastSummary, TransportError>,
    single_calls: Mutex<Vec<(String, PushMessage)>>,
    multi_calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingTransport {
    fn new(behaviour: SendBehaviour) -> Self {
        Self {
            behaviour,
            multicast_result: Ok(MulticastSummary::default()),
            single_calls: Mutex::new(Vec::new()),
            multi_calls: Mutex::new(Vec::new()),
        }
    }

    fn with_multicast(result: Result<MulticastSummary, TransportError>) -> Self {
        Self {
            multicast_result: result,
            ..Self::new(SendBehaviour::Accept)
        }
    }

    fn single_calls(&self) -> usize {
        self.single_calls.lock().unwrap().len()
    }

    fn multi_calls(&self) -> Vec<Vec<String>> {
        self.multi_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send_one(&self, token: &str, message: &PushMessage) -> Result<String, TransportError> {
        self.single_calls
            .lock()
            .unwrap()
            .push((token.to_string(), message.clone()));
        match &self.behaviour {
            SendBehaviour::Accept => Ok(format!("projects/test/messages/{}", token)),
            SendBehaviour::Reject(err) => Err(err.clone()),
        }
    }

    async fn send_many(
        &self,
        tokens: &[String],
        _message: &PushMessage,
    ) -> Result<MulticastSummary, TransportError> {
        self.multi_calls.lock().unwrap().push(tokens.to_vec());
        self.multicast_result.clone()
    }
}

// ============================================================
// Helpers
// ============================================================

fn dispatcher(
    store: &Arc<MemoryStore>,
    transport: &Arc<RecordingTransport>,
) -> NotificationDispatcher {
    NotificationDispatcher::new(store.clone(), transport.clone())
}

fn caller() -> CallerContext {
    CallerContext::authenticated("sender-uid")
}

fn send_params(recipient: &str) -> SendParams {
    SendParams {
        recipient_id: Some(recipient.to_string()),
        title: Some("New plan".to_string()),
        body: Some("Dinner on Friday?".to_string()),
        notification_data: None,
    }
}

fn batch_params(ids: &[&str]) -> BatchParams {
    BatchParams {
        recipient_ids: Some(json!(ids)),
        title: Some("Reminder".to_string()),
        body: Some("Starts in one hour".to_string()),
        notification_data: None,
    }
}

// ============================================================
// Single-recipient dispatch
// ============================================================

#[tokio::test]
async fn test_send_success_returns_message_id_without_mutation() {
    let store = Arc::new(MemoryStore::with(&[("alice", Some("tok-alice"))]));
    let transport = Arc::new(RecordingTransport::new(SendBehaviour::Accept));

    let result = dispatcher(&store, &transport)
        .send(&caller(), &send_params("alice"))
        .await
        .unwrap();

    assert_eq!(
        result,
        SendResponse::delivered("projects/test/messages/tok-alice")
    );
    assert!(store.clears().is_empty());
    assert_eq!(store.token_of("alice").as_deref(), Some("tok-alice"));
}

#[tokio::test]
async fn test_send_builds_payload_with_defaults() {
    let store = Arc::new(MemoryStore::with(&[("alice", Some("tok-alice"))]));
    let transport = Arc::new(RecordingTransport::new(SendBehaviour::Accept));

    let mut params = send_params("alice");
    let mut data = NotificationData::new();
    data.insert("planId".into(), "p-9".into());
    params.notification_data = Some(data);

    dispatcher(&store, &transport)
        .send(&caller(), &params)
        .await
        .unwrap();

    let calls = transport.single_calls.lock().unwrap();
    let (token, message) = &calls[0];
    assert_eq!(token, "tok-alice");
    assert_eq!(message.notification.title, "New plan");
    assert_eq!(message.notification.body, "Dinner on Friday?");
    assert_eq!(message.data["planId"], "p-9");
    assert_eq!(message.apns.payload.aps.badge, 1);
}

#[tokio::test]
async fn test_send_unknown_user() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(RecordingTransport::new(SendBehaviour::Accept));

    let result = dispatcher(&store, &transport)
        .send(&caller(), &send_params("ghost"))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("User not found"));
    assert_eq!(transport.single_calls(), 0);
}

#[tokio::test]
async fn test_send_missing_or_empty_token() {
    let store = Arc::new(MemoryStore::with(&[("bob", None), ("carol", Some(""))]));
    let transport = Arc::new(RecordingTransport::new(SendBehaviour::Accept));
    let dispatcher = dispatcher(&store, &transport);

    for recipient in ["bob", "carol"] {
        let result = dispatcher
            .send(&caller(), &send_params(recipient))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("No FCM token"));
    }
    assert_eq!(transport.single_calls(), 0);
}

#[tokio::test]
async fn test_send_unauthenticated_touches_nothing() {
    let store = Arc::new(MemoryStore::with(&[("alice", Some("tok-alice"))]));
    let transport = Arc::new(RecordingTransport::new(SendBehaviour::Accept));

    let result = dispatcher(&store, &transport)
        .send(&CallerContext::anonymous(), &send_params("alice"))
        .await;

    assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    assert_eq!(store.gets(), 0);
    assert_eq!(transport.single_calls(), 0);
}

#[tokio::test]
async fn test_send_invalid_arguments_touch_nothing() {
    let store = Arc::new(MemoryStore::with(&[("alice", Some("tok-alice"))]));
    let transport = Arc::new(RecordingTransport::new(SendBehaviour::Accept));
    let dispatcher = dispatcher(&store, &transport);

    let mut no_title = send_params("alice");
    no_title.title = None;
    let mut empty_body = send_params("alice");
    empty_body.body = Some(String::new());
    let mut no_recipient = send_params("alice");
    no_recipient.recipient_id = None;

    for params in [no_title, empty_body, no_recipient] {
        let result = dispatcher.send(&caller(), &params).await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }
    assert_eq!(store.gets(), 0);
    assert_eq!(transport.single_calls(), 0);
}

#[tokio::test]
async fn test_send_dead_token_is_cleared_once() {
    for err in [
        TransportError::InvalidToken("The registration token is not valid".into()),
        TransportError::UnregisteredToken("Requested entity was not found.".into()),
    ] {
        let store = Arc::new(MemoryStore::with(&[("alice", Some("stale"))]));
        let transport = Arc::new(RecordingTransport::new(SendBehaviour::Reject(err)));

        let result = dispatcher(&store, &transport)
            .send(&caller(), &send_params("alice"))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Invalid or expired FCM token"));
        assert_eq!(store.clears(), vec!["alice".to_string()]);
        assert_eq!(store.token_of("alice"), None);
    }
}

#[tokio::test]
async fn test_send_other_transport_error_is_internal() {
    let store = Arc::new(MemoryStore::with(&[("alice", Some("tok-alice"))]));
    let transport = Arc::new(RecordingTransport::new(SendBehaviour::Reject(
        TransportError::Other("Quota exceeded".into()),
    )));

    let result = dispatcher(&store, &transport)
        .send(&caller(), &send_params("alice"))
        .await;

    match result {
        Err(AppError::Internal(msg)) => assert_eq!(msg, "Quota exceeded"),
        other => panic!("expected Internal, got {:?}", other),
    }
    assert!(store.clears().is_empty());
}

#[tokio::test]
async fn test_send_after_cleanup_is_idempotent() {
    let store = Arc::new(MemoryStore::with(&[("alice", Some("stale"))]));
    let transport = Arc::new(RecordingTransport::new(SendBehaviour::Reject(
        TransportError::UnregisteredToken("gone".into()),
    )));
    let dispatcher = dispatcher(&store, &transport);

    // First call evicts the token
    dispatcher
        .send(&caller(), &send_params("alice"))
        .await
        .unwrap();
    assert_eq!(store.clears().len(), 1);

    for _ in 0..2 {
        let result = dispatcher
            .send(&caller(), &send_params("alice"))
            .await
            .unwrap();
        assert_eq!(result.error.as_deref(), Some("No FCM token"));
    }
    assert_eq!(store.clears().len(), 1);
    assert_eq!(transport.single_calls(), 1);
}

// ============================================================
// Batch dispatch
// ============================================================

#[tokio::test]
async fn test_batch_sends_only_valid_tokens() {
    let store = Arc::new(MemoryStore::with(&[("a", Some("t1")), ("c", None)]));
    let transport = Arc::new(RecordingTransport::with_multicast(Ok(MulticastSummary {
        success_count: 1,
        failure_count: 0,
    })));

    let result = dispatcher(&store, &transport)
        .send_batch(&caller(), &batch_params(&["a", "b", "c"]))
        .await
        .unwrap();

    assert_eq!(transport.multi_calls(), vec![vec!["t1".to_string()]]);
    assert_eq!(result, BatchResponse::sent(1, 0));
    assert_eq!(store.gets(), 3);
}

#[tokio::test]
async fn test_batch_token_order_follows_input() {
    let store = Arc::new(MemoryStore::with(&[
        ("x", Some("tx")),
        ("y", Some("ty")),
        ("z", Some("tz")),
    ]));
    let transport = Arc::new(RecordingTransport::with_multicast(Ok(MulticastSummary {
        success_count: 2,
        failure_count: 1,
    })));

    let result = dispatcher(&store, &transport)
        .send_batch(&caller(), &batch_params(&["z", "x", "y"]))
        .await
        .unwrap();

    assert_eq!(
        transport.multi_calls(),
        vec![vec!["tz".to_string(), "tx".to_string(), "ty".to_string()]]
    );
    assert_eq!(result.success_count, Some(2));
    assert_eq!(result.failure_count, Some(1));
}

#[tokio::test]
async fn test_batch_without_tokens_skips_transport() {
    let store = Arc::new(MemoryStore::with(&[("c", None)]));
    let transport = Arc::new(RecordingTransport::with_multicast(Ok(
        MulticastSummary::default(),
    )));

    let result = dispatcher(&store, &transport)
        .send_batch(&caller(), &batch_params(&["b", "c"]))
        .await
        .unwrap();

    assert_eq!(result, BatchResponse::nothing_to_send());
    assert_eq!(result.error.as_deref(), Some("No valid FCM tokens found"));
    assert!(transport.multi_calls().is_empty());
}

#[tokio::test]
async fn test_batch_does_not_clear_tokens() {
    let store = Arc::new(MemoryStore::with(&[("a", Some("t1")), ("b", Some("t2"))]));
    let transport = Arc::new(RecordingTransport::with_multicast(Ok(MulticastSummary {
        success_count: 0,
        failure_count: 2,
    })));

    let result = dispatcher(&store, &transport)
        .send_batch(&caller(), &batch_params(&["a", "b"]))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.failure_count, Some(2));
    assert!(store.clears().is_empty());
}

#[tokio::test]
async fn test_batch_unauthenticated_and_invalid() {
    let store = Arc::new(MemoryStore::with(&[("a", Some("t1"))]));
    let transport = Arc::new(RecordingTransport::with_multicast(Ok(
        MulticastSummary::default(),
    )));
    let dispatcher = dispatcher(&store, &transport);

    let result = dispatcher
        .send_batch(&CallerContext::anonymous(), &batch_params(&["a"]))
        .await;
    assert!(matches!(result, Err(AppError::Unauthenticated(_))));

    let result = dispatcher.send_batch(&caller(), &batch_params(&[])).await;
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));

    let mut not_a_list = batch_params(&["a"]);
    not_a_list.recipient_ids = Some(json!("a"));
    let result = dispatcher.send_batch(&caller(), &not_a_list).await;
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));

    assert_eq!(store.gets(), 0);
    assert!(transport.multi_calls().is_empty());
}

#[tokio::test]
async fn test_batch_transport_failure_is_internal() {
    let store = Arc::new(MemoryStore::with(&[("a", Some("t1"))]));
    let transport = Arc::new(RecordingTransport::with_multicast(Err(
        TransportError::Other("tokens list must not contain more than 500 items".into()),
    )));

    let result = dispatcher(&store, &transport)
        .send_batch(&caller(), &batch_params(&["a"]))
        .await;

    match result {
        Err(AppError::Internal(msg)) => assert!(msg.contains("500")),
        other => panic!("expected Internal, got {:?}", other),
    }
}

#[tokio::test]
async fn test_batch_store_failure_is_internal() {
    let store = Arc::new(MemoryStore {
        fail_reads: true,
        ..MemoryStore::default()
    });
    let transport = Arc::new(RecordingTransport::with_multicast(Ok(
        MulticastSummary::default(),
    )));

    let result = dispatcher(&store, &transport)
        .send_batch(&caller(), &batch_params(&["a", "b"]))
        .await;

    match result {
        Err(AppError::Internal(msg)) => assert_eq!(msg, "store unavailable"),
        other => panic!("expected Internal, got {:?}", other),
    }
    // Every lookup is awaited, none short-circuits the others
    assert_eq!(store.gets(), 2);
    assert!(transport.multi_calls().is_empty());
}
