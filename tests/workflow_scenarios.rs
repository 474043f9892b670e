//! End-to-end workflow scenarios against the router, with all four
//! collaborators faked.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use outrider_common::{NodeId, NodeState};
use outrider_dispatch::{ExecutionChannel, ExecutionOptions};
use outrider_platform::ComputePlatform;
use outrider_server::{app_router, AppState, ServerConfig};
use outrider_storage::{ObjectStore, SecretStore};

/// Platform that replays a scripted state sequence, then reports running.
struct StubPlatform {
    states: Mutex<VecDeque<NodeState>>,
    describe_calls: AtomicU32,
    start_calls: AtomicU32,
}

impl StubPlatform {
    fn running() -> Self {
        Self::scripted(vec![])
    }

    fn scripted(states: Vec<NodeState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            describe_calls: AtomicU32::new(0),
            start_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ComputePlatform for StubPlatform {
    async fn describe(&self, _node: &NodeId) -> outrider_platform::Result<NodeState> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(NodeState::Running))
    }

    async fn start(&self, _node: &NodeId) -> outrider_platform::Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Submission {
    node: String,
    document: String,
    lines: Vec<String>,
    timeout_secs: u64,
    log_sink: Option<String>,
}

/// Channel that records submissions and accepts everything.
struct RecordingChannel {
    submissions: Mutex<Vec<Submission>>,
}

impl RecordingChannel {
    fn new() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
        }
    }

    fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionChannel for RecordingChannel {
    async fn submit(
        &self,
        node: &NodeId,
        document: &str,
        lines: &[String],
        options: &ExecutionOptions,
    ) -> outrider_dispatch::Result<String> {
        self.submissions.lock().unwrap().push(Submission {
            node: node.to_string(),
            document: document.to_string(),
            lines: lines.to_vec(),
            timeout_secs: options.timeout.as_secs(),
            log_sink: options.log_sink.clone(),
        });
        Ok("cmd-1".to_string())
    }
}

struct StubObjectStore {
    prefixes: Vec<String>,
}

#[async_trait]
impl ObjectStore for StubObjectStore {
    async fn list_common_prefixes(
        &self,
        _bucket: &str,
        _prefix: &str,
        _delimiter: &str,
    ) -> outrider_storage::Result<Vec<String>> {
        Ok(self.prefixes.clone())
    }
}

struct StubSecrets;

#[async_trait]
impl SecretStore for StubSecrets {
    async fn get_secret(&self, _id: &str) -> outrider_storage::Result<String> {
        Ok("dataset-bucket".to_string())
    }
}

struct Harness {
    state: AppState,
    platform: Arc<StubPlatform>,
    channel: Arc<RecordingChannel>,
}

fn harness_with(platform: StubPlatform, prefixes: Vec<&str>) -> Harness {
    let mut config = ServerConfig::from_env();
    config.transfer_node = NodeId::from("node-data-1");
    config.training_node = NodeId::from("node-gpu-1");
    config.bucket = None;
    config.readiness_poll_secs = 0;

    let platform = Arc::new(platform);
    let channel = Arc::new(RecordingChannel::new());
    let state = AppState::new(
        config,
        platform.clone(),
        channel.clone(),
        Arc::new(StubObjectStore {
            prefixes: prefixes.into_iter().map(String::from).collect(),
        }),
        Arc::new(StubSecrets),
    );

    Harness {
        state,
        platform,
        channel,
    }
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = app_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn download_discovers_filters_and_dispatches() {
    let h = harness_with(
        StubPlatform::running(),
        vec!["csv/agua/", "csv/hola/", "csv/backup/"],
    );

    let (status, body) = send(h.state.clone(), get("/download-start")).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["correlation_id"], "cmd-1");
    assert_eq!(body["node_id"], "node-data-1");
    assert_eq!(body["units_processed"], json!(["agua", "hola"]));

    let submissions = h.channel.submissions();
    assert_eq!(submissions.len(), 1);
    let submission = &submissions[0];
    assert_eq!(submission.node, "node-data-1");
    assert_eq!(submission.document, "run-shell-script");
    assert_eq!(submission.timeout_secs, 3600);
    assert_eq!(submission.log_sink, None);

    // One composite program line, per-unit groups in discovery order
    assert_eq!(submission.lines.len(), 1);
    let program = &submission.lines[0];
    let agua = program.find("csv/agua/").unwrap();
    let hola = program.find("csv/hola/").unwrap();
    assert!(agua < hola);
    assert!(program.contains("s3://dataset-bucket/csv/agua/"));
    assert!(!program.contains("csv/backup/backup"));

    // The download direction never touches the platform
    assert_eq!(h.platform.describe_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn download_with_only_backup_folder_is_404() {
    let h = harness_with(StubPlatform::running(), vec!["csv/backup/"]);

    let (status, body) = send(h.state.clone(), get("/download-start")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("no work units"));
    assert!(body["timestamp"].is_string());
    assert!(h.channel.submissions().is_empty());
}

#[tokio::test]
async fn rollback_waits_for_readiness_then_restores() {
    let h = harness_with(
        StubPlatform::scripted(vec![
            NodeState::Stopped,
            NodeState::Pending,
            NodeState::Running,
        ]),
        vec!["csv/backup/agua/"],
    );

    let (status, body) = send(h.state.clone(), get("/rollback")).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["node_id"], "node-gpu-1");
    assert_eq!(body["units_processed"], json!(["agua"]));

    // Stopped node was started exactly once before dispatch
    assert_eq!(h.platform.start_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.platform.describe_calls.load(Ordering::SeqCst), 3);

    let submissions = h.channel.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].timeout_secs, 60);
    assert_eq!(submissions[0].log_sink.as_deref(), Some("/jobs/training"));
    assert!(submissions[0].lines[0]
        .contains("aws s3 mv s3://dataset-bucket/csv/backup/agua/ s3://dataset-bucket/csv/agua/"));
}

#[tokio::test]
async fn rollback_ssm_route_is_an_alias() {
    let h = harness_with(StubPlatform::running(), vec!["csv/backup/agua/"]);
    let (status, _) = send(h.state.clone(), get("/rollback-ssm")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn training_mode_preset_is_applied() {
    let h = harness_with(StubPlatform::running(), vec![]);

    let (status, body) = send(
        h.state.clone(),
        post_json("/start-training", r#"{"mode":3}"#),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["node_id"], "node-gpu-1");
    assert_eq!(body["received_config"]["LSTM_UNITS"], 64);
    assert_eq!(body["received_config"]["TRAINING_MODE"], "3");
    assert!(body["commands_len"].as_u64().unwrap() > 10);

    let submissions = h.channel.submissions();
    assert_eq!(submissions.len(), 1);
    // Channel timeout exceeds the program's 7200 s internal bound
    assert_eq!(submissions[0].timeout_secs, 7500);
    assert!(submissions[0]
        .lines
        .iter()
        .any(|l| l == "export LSTM_UNITS=${LSTM_UNITS:-64}"));
}

#[tokio::test]
async fn training_unknown_mode_falls_back_to_baseline() {
    let h = harness_with(StubPlatform::running(), vec![]);

    let (status, body) = send(
        h.state.clone(),
        post_json("/start-training", r#"{"mode":99}"#),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["received_config"]["BATCH_SIZE"], 512);
    assert_eq!(body["received_config"]["TRAINING_MODE"], "1");
}

#[tokio::test]
async fn training_body_overrides_and_unknown_keys_echo_back() {
    let h = harness_with(StubPlatform::running(), vec![]);

    let (status, body) = send(
        h.state.clone(),
        post_json(
            "/start-training",
            r#"{"mode":3,"BATCH_SIZE":64,"GPU_WARMUP":1}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["received_config"]["BATCH_SIZE"], 64);
    assert_eq!(body["received_config"]["GPU_WARMUP"], 1);
}

#[tokio::test]
async fn training_get_without_body_uses_defaults() {
    let h = harness_with(StubPlatform::running(), vec![]);

    let (status, body) = send(h.state.clone(), get("/start-training")).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["received_config"]["BATCH_SIZE"], 512);
}

#[tokio::test]
async fn training_invalid_json_is_400_without_dispatch() {
    let h = harness_with(StubPlatform::running(), vec![]);

    let (status, body) = send(
        h.state.clone(),
        post_json("/start-training", "{not json"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not valid JSON"));
    assert!(h.channel.submissions().is_empty());
    assert_eq!(h.platform.describe_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unmatched_route_is_404_with_envelope() {
    let h = harness_with(StubPlatform::running(), vec![]);

    let (status, body) = send(h.state.clone(), get("/does-not-exist")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("GET /does-not-exist"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn cors_preflight_is_accepted() {
    let h = harness_with(StubPlatform::running(), vec![]);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/start-training")
        .header(header::ORIGIN, "https://console.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app_router(h.state.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
