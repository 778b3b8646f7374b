use std::{sync::Arc, time::Duration};

use super::*;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, Deserialize)]
struct RecordedStart {
    side: String,
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Clone)]
struct DeviceStub {
    starts: Arc<Mutex<Vec<RecordedStart>>>,
    stop_status: StatusCode,
    stop_body: &'static str,
    stop_delay: Duration,
}

impl DeviceStub {
    fn answering(stop_status: StatusCode, stop_body: &'static str) -> Self {
        Self {
            starts: Arc::new(Mutex::new(Vec::new())),
            stop_status,
            stop_body,
            stop_delay: Duration::ZERO,
        }
    }
}

async fn handle_start(
    State(stub): State<DeviceStub>,
    Query(query): Query<RecordedStart>,
) -> String {
    let ack = format!("started {}", query.side);
    stub.starts.lock().await.push(query);
    ack
}

async fn handle_stop(State(stub): State<DeviceStub>) -> (StatusCode, &'static str) {
    if !stub.stop_delay.is_zero() {
        tokio::time::sleep(stub.stop_delay).await;
    }
    (stub.stop_status, stub.stop_body)
}

async fn spawn_device(stub: DeviceStub) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/start", get(handle_start))
        .route("/stop", get(handle_stop))
        .with_state(stub);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn client_for(device_url: String, timeout_ms: u64) -> HttpDeviceClient {
    HttpDeviceClient::new(&DeviceSettings {
        device_url,
        request_timeout_ms: timeout_ms,
        ..DeviceSettings::default()
    })
    .expect("client")
}

#[test]
fn endpoints_are_resolved_below_the_device_url() {
    let client = HttpDeviceClient::with_client(Client::new(), "http://10.0.0.7/emg/")
        .expect("client");
    assert_eq!(client.start_url().as_str(), "http://10.0.0.7/emg/start");
    assert_eq!(client.stop_url().as_str(), "http://10.0.0.7/emg/stop");

    let client =
        HttpDeviceClient::with_client(Client::new(), "http://10.0.0.7").expect("client");
    assert_eq!(client.stop_url().as_str(), "http://10.0.0.7/stop");
}

#[test]
fn invalid_device_url_is_rejected() {
    let result = HttpDeviceClient::with_client(Client::new(), "not a url");
    assert!(matches!(result, Err(ClientBuildError::InvalidUrl(_))));
}

#[tokio::test]
async fn start_sends_side_and_user_id() {
    let stub = DeviceStub::answering(StatusCode::OK, "{}");
    let starts = stub.starts.clone();
    let client = client_for(spawn_device(stub).await, 2_000);

    let ack = client
        .request_start(Side::Right, &UserId::new("665f1c2a"))
        .await
        .expect("start");

    assert_eq!(ack, "started right");
    let starts = starts.lock().await;
    assert_eq!(starts.len(), 1);
    assert_eq!(starts[0].side, "right");
    assert_eq!(starts[0].user_id, "665f1c2a");
}

#[tokio::test]
async fn stop_parses_full_result() {
    let stub = DeviceStub::answering(
        StatusCode::OK,
        r#"{"left_bicep":12.4,"right_bicep":15.0,"percentage_difference":17.33,"severity_grade":"SEVERE"}"#,
    );
    let client = client_for(spawn_device(stub).await, 2_000);

    let payload = client.request_stop().await.expect("stop");
    assert_eq!(payload.left_bicep, Some(12.4));
    assert_eq!(payload.right_bicep, Some(15.0));
    assert_eq!(payload.percentage_difference, Some(17.33));
    assert_eq!(payload.severity_grade.as_deref(), Some("SEVERE"));
}

#[tokio::test]
async fn stop_without_readings_is_not_an_error() {
    let stub = DeviceStub::answering(StatusCode::OK, "{}");
    let client = client_for(spawn_device(stub).await, 2_000);

    let payload = client.request_stop().await.expect("stop");
    assert_eq!(payload, DeviceResultPayload::default());
}

#[tokio::test]
async fn stop_with_non_json_body_is_malformed() {
    let stub = DeviceStub::answering(StatusCode::OK, "done");
    let client = client_for(spawn_device(stub).await, 2_000);

    let err = client.request_stop().await.expect_err("must fail");
    assert!(matches!(err, TrialError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn stop_with_mistyped_field_is_malformed() {
    let stub = DeviceStub::answering(StatusCode::OK, r#"{"left_bicep":"12.4"}"#);
    let client = client_for(spawn_device(stub).await, 2_000);

    let err = client.request_stop().await.expect_err("must fail");
    assert!(matches!(err, TrialError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn stop_with_error_status_reports_status() {
    let stub = DeviceStub::answering(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    let client = client_for(spawn_device(stub).await, 2_000);

    let err = client.request_stop().await.expect_err("must fail");
    assert_eq!(err, TrialError::DeviceError { status: 500 });
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = client_for(format!("http://{addr}"), 2_000);
    let err = client.request_stop().await.expect_err("must fail");
    assert!(matches!(err, TrialError::DeviceUnreachable(_)), "{err:?}");

    let err = client
        .request_start(Side::Left, &UserId::new("u"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, TrialError::DeviceUnreachable(_)), "{err:?}");
}

#[tokio::test]
async fn slow_device_hits_the_request_timeout() {
    let mut stub = DeviceStub::answering(StatusCode::OK, "{}");
    stub.stop_delay = Duration::from_secs(5);
    let client = client_for(spawn_device(stub).await, 100);

    let err = client.request_stop().await.expect_err("must time out");
    match err {
        TrialError::DeviceUnreachable(message) => assert!(message.contains("timed out")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_object_bodies_are_malformed() {
    for body in ["[]", "null", "12.4", "\"left\""] {
        let err = parse_result_body(body).expect_err("must fail");
        assert!(matches!(err, TrialError::MalformedResponse(_)), "{body}");
    }
}
