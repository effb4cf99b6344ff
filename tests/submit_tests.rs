use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{extract::State, http::StatusCode, routing::post, Form, Router};
use chrono::{TimeZone, Utc};
use gh_metrics::records::{PullRequestRecord, WorkflowRunRecord};
use gh_metrics::submit::FormClient;

type CapturedRequests = Arc<Mutex<Vec<HashMap<String, String>>>>;

#[derive(Clone)]
struct Capture {
    requests: CapturedRequests,
    status: StatusCode,
}

async fn capture_form(
    State(capture): State<Capture>,
    Form(fields): Form<HashMap<String, String>>,
) -> StatusCode {
    capture.requests.lock().unwrap().push(fields);
    capture.status
}

/// Binds a local endpoint that records every form body it receives and
/// answers with the given status.
async fn spawn_form_endpoint(status: StatusCode) -> (String, CapturedRequests) {
    let requests: CapturedRequests = Arc::new(Mutex::new(Vec::new()));
    let capture = Capture {
        requests: requests.clone(),
        status,
    };
    let app = Router::new()
        .route("/", post(capture_form))
        .with_state(capture);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let url = format!("http://{}/", listener.local_addr().unwrap());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (url, requests)
}

fn run_record(run_id: u64, number: u64) -> WorkflowRunRecord {
    WorkflowRunRecord {
        number,
        run_id,
        released_at: Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        repository: "exampleRepo".to_string(),
        author: "user1".to_string(),
        jst_released_at: "2022/01/01 09:00".to_string(),
    }
}

#[tokio::test]
async fn test_submit_posts_one_request_per_record() {
    let (url, requests) = spawn_form_endpoint(StatusCode::OK).await;
    let records = vec![run_record(30433642, 1), run_record(31533642, 2)];

    FormClient::new()
        .submit_all(&url, &records)
        .await
        .expect("submission should succeed");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].get("entry.1787920898").map(String::as_str),
        Some("30433642")
    );
    assert_eq!(
        requests[1].get("entry.1787920898").map(String::as_str),
        Some("31533642")
    );
    assert_eq!(
        requests[0].get("entry.1447505964").map(String::as_str),
        Some("2022/01/01 09:00")
    );
}

#[tokio::test]
async fn test_submit_pull_request_record_fields() {
    let (url, requests) = spawn_form_endpoint(StatusCode::OK).await;
    let record = PullRequestRecord {
        number: 7,
        created_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        merged_at: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
        first_commit_at: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
        first_commit_authored_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        repository: "owner/repo".to_string(),
        author: "user1".to_string(),
        base: "main".to_string(),
        head: "feature".to_string(),
        jst_merged_at: "2024/01/10 09:00".to_string(),
        jst_first_created: "2024/01/01 09:00".to_string(),
    };

    FormClient::new()
        .submit_all(&url, &[record])
        .await
        .expect("submission should succeed");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].get("entry.1737429438").map(String::as_str),
        Some("7")
    );
    assert_eq!(
        requests[0].get("entry.696990060").map(String::as_str),
        Some("2024-01-02T00:00:00Z")
    );
    assert_eq!(
        requests[0].get("entry.1888619409").map(String::as_str),
        Some("user1")
    );
}

#[tokio::test]
async fn test_submit_failure_raises_aggregate_error_after_all_attempts() {
    let (url, requests) = spawn_form_endpoint(StatusCode::INTERNAL_SERVER_ERROR).await;
    let records = vec![run_record(30433642, 1), run_record(31533642, 2)];

    let result = FormClient::new().submit_all(&url, &records).await;

    let err = result.expect_err("submission should fail");
    assert!(err.to_string().contains("one or more records"));
    // Every record was still attempted before the error was raised.
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_submit_unreachable_endpoint_is_aggregate_error() {
    // Nothing listens here; the request itself fails rather than the status.
    let result = FormClient::new()
        .submit_all("http://127.0.0.1:1/", &[run_record(1, 1)])
        .await;
    assert!(result.is_err());
}
