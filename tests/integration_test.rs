use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use agent_testbed::api::ErrorBody;
use agent_testbed::models::{AnswerKey, TestCaseCatalog};
use agent_testbed::services::{AnswerGrader, ChatModel, CredentialStore, RunStore};
use agent_testbed::{router, AppError, AppState, Run, RunPayload, RunStatus, RunsClient};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tempfile::TempDir;

const TOKEN: &str = "integration-token";

const TEST_CASES: &str = r#"[
  {"id": "exam", "starting_url": "/cases/exam", "task_prompt": "Complete the exam and submit."},
  {"id": "hard", "starting_url": "/cases/hard/start", "task_prompt": "Place a successful order."}
]"#;

/// 忽略大小写比较提示词中的参考答案与提交答案
struct ExactMatchModel;

fn section<'a>(prompt: &'a str, heading: &str) -> &'a str {
    prompt
        .split(heading)
        .nth(1)
        .and_then(|rest| rest.trim_start().lines().next())
        .unwrap_or_default()
        .trim()
}

#[async_trait]
impl ChatModel for ExactMatchModel {
    fn model_name(&self) -> &str {
        "exact-match"
    }

    async fn complete(&self, _system_message: &str, user_message: &str) -> anyhow::Result<String> {
        let reference = section(user_message, "Reference answer:");
        let submitted = section(user_message, "Submitted answer:");
        let equivalent = reference.eq_ignore_ascii_case(submitted);
        Ok(format!(r#"{{"equivalent": {}, "reason": "compared"}}"#, equivalent))
    }
}

struct TestServer {
    addr: SocketAddr,
    http: reqwest::Client,
    _data_dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let answers: AnswerKey = [("capital".to_string(), "Paris".to_string())]
            .into_iter()
            .collect();
        let credentials = CredentialStore::new(HashMap::from([(
            TOKEN.to_string(),
            "tester".to_string(),
        )]));

        let state = Arc::new(AppState {
            grader: AnswerGrader::new(answers, Arc::new(ExactMatchModel)),
            store: RunStore::open(data_dir.path(), 50).await.unwrap(),
            credentials,
            test_cases: TestCaseCatalog::parse(TEST_CASES.to_string()).unwrap(),
            recent_limit: 50,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        Self {
            addr,
            http: reqwest::Client::new(),
            _data_dir: data_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn client(&self, token: &str) -> RunsClient {
        RunsClient::new(format!("http://{}", self.addr), token)
    }

    async fn post_json(&self, path: &str, body: Value) -> reqwest::Response {
        self.http.post(self.url(path)).json(&body).send().await.unwrap()
    }
}

fn payload(id: &str, url: &str, status: RunStatus) -> RunPayload {
    RunPayload {
        id: Some(id.to_string()),
        url: Some(url.to_string()),
        prompt: Some("Complete the exam and submit.".to_string()),
        status: Some(status),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let body = server.http.get(server.url("/health")).send().await.unwrap().text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_grade_known_task() {
    let server = TestServer::start().await;

    let response = server
        .post_json("/api/grade", json!({"answer": "paris", "taskId": "capital"}))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({"ok": true}));

    let response = server
        .post_json("/api/grade", json!({"answer": "London", "taskId": "capital"}))
        .await;
    assert_eq!(response.json::<Value>().await.unwrap(), json!({"ok": false}));
}

#[tokio::test]
async fn test_grade_rejects_unknown_task_and_missing_fields() {
    let server = TestServer::start().await;

    let response = server
        .post_json("/api/grade", json!({"answer": "Paris", "taskId": "nope"}))
        .await;
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(body.error.contains("nope"));

    let response = server.post_json("/api/grade", json!({"taskId": "capital"})).await;
    assert_eq!(response.status(), 400);

    let response = server
        .post_json("/api/grade", json!({"answer": "   ", "taskId": "capital"}))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let server = TestServer::start().await;
    let response = server
        .http
        .post(server.url("/api/grade"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_exam_scoring() {
    let server = TestServer::start().await;

    let response = server
        .post_json(
            "/api/exam/score",
            json!({"q1": "4", "q2": ["2", "3", "5"], "q3": ["2", "4"], "q4": "12", "q5": "9"}),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["score"], 5);
    assert_eq!(body["total"], 5);

    let response = server
        .post_json(
            "/api/exam/score",
            json!({"q1": "4", "q2": ["2", "3"], "q3": ["2", "4"], "q4": "12", "q5": "9"}),
        )
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["score"], 4);
    assert_eq!(body["breakdown"], json!([true, false, true, true, true]));

    let response = server
        .post_json("/api/exam/score", json!({"q1": "4", "q2": ["2"], "q3": ["2"], "q4": "12"}))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_run_upload_overwrites_same_id() {
    let server = TestServer::start().await;
    let client = server.client(TOKEN);

    client
        .upload_run(&payload("run-1", "http://localhost:3000/cases/exam", RunStatus::InProgress))
        .await
        .unwrap();
    client
        .upload_run(&payload("run-1", "http://localhost:3000/cases/exam", RunStatus::Success))
        .await
        .unwrap();

    let runs: Vec<Run> = client.list_runs().await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, "run-1");
    assert_eq!(runs[0].status, RunStatus::Success);
}

#[tokio::test]
async fn test_runs_require_valid_token() {
    let server = TestServer::start().await;

    let response = server.http.get(server.url("/api/runs")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let err = server.client("wrong-token").list_runs().await.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    let err = server
        .client("wrong-token")
        .upload_run(&payload("run-1", "/cases/exam", RunStatus::Success))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn test_upload_rejects_incomplete_payload() {
    let server = TestServer::start().await;
    let response = server
        .http
        .post(server.url("/api/runs"))
        .bearer_auth(TOKEN)
        .json(&json!({"id": "run-1", "url": "/cases/exam"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_test_cases_served_verbatim() {
    let server = TestServer::start().await;
    let response = server.http.get(server.url("/api/test-cases")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), TEST_CASES);
}

#[tokio::test]
async fn test_dashboard_correlates_runs() {
    let server = TestServer::start().await;
    let client = server.client(TOKEN);

    let mut exam = payload("run-exam", "http://localhost:3000/cases/exam", RunStatus::Success);
    exam.timestamp = Some(Utc::now());
    client.upload_run(&exam).await.unwrap();
    client
        .upload_run(&payload("run-hard", "http://localhost:3000/cases/hard/start?step=2", RunStatus::Failure))
        .await
        .unwrap();
    client
        .upload_run(&payload("run-other", "http://example.com/elsewhere", RunStatus::Success))
        .await
        .unwrap();

    let view: Value = server
        .http
        .get(server.url("/api/dashboard"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let groups = view["correlation"]["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["case"]["id"], "exam");
    assert_eq!(groups[0]["case"]["startingUrl"], "/cases/exam");
    assert_eq!(groups[0]["success"], 1);
    assert_eq!(groups[1]["case"]["id"], "hard");
    assert_eq!(groups[1]["failure"], 1);

    let unmatched = view["correlation"]["unmatched"].as_array().unwrap();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0]["id"], "run-other");

    assert_eq!(view["correlation"]["totals"]["total"], 3);
    assert_eq!(view["correlation"]["totals"]["successRate"], 67);
    assert_eq!(view["projects"][0]["project"]["id"], "default");
}

/// 读取下一个带数据的 SSE 事件（跳过 keep-alive 注释）
async fn next_event(response: &mut reqwest::Response, buffer: &mut String) -> Value {
    let read = async {
        loop {
            if let Some(end) = buffer.find("\n\n") {
                let frame: String = buffer.drain(..end + 2).collect();
                let data = frame
                    .lines()
                    .find_map(|line| line.strip_prefix("data:"))
                    .map(str::trim);
                if let Some(data) = data {
                    return serde_json::from_str(data).unwrap();
                }
                continue;
            }
            let chunk = response.chunk().await.unwrap().expect("事件流提前结束");
            buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("等待看板事件超时")
}

#[tokio::test]
async fn test_dashboard_stream_pushes_updates() {
    let server = TestServer::start().await;

    let response = server
        .http
        .get(server.url("/api/dashboard/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let mut response = server
        .http
        .get(server.url("/api/dashboard/stream"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let mut buffer = String::new();
    let initial = next_event(&mut response, &mut buffer).await;
    assert_eq!(initial["correlation"]["totals"]["total"], 0);

    server
        .client(TOKEN)
        .upload_run(&payload("run-exam", "http://localhost:3000/cases/exam", RunStatus::Success))
        .await
        .unwrap();

    let update = next_event(&mut response, &mut buffer).await;
    assert_eq!(update["correlation"]["totals"]["total"], 1);
    assert_eq!(update["correlation"]["totals"]["successRate"], 100);
    assert_eq!(update["correlation"]["groups"][0]["success"], 1);
}

#[tokio::test]
async fn test_concurrent_uploads_are_all_stored() {
    let server = TestServer::start().await;
    let client = server.client(TOKEN);

    let payloads: Vec<RunPayload> = (0..16)
        .map(|i| payload(&format!("run-{}", i), "http://localhost:3000/cases/exam", RunStatus::Success))
        .chain((0..16).map(|_| payload("shared", "http://localhost:3000/cases/hard/start", RunStatus::Failure)))
        .collect();
    let results = futures::future::join_all(payloads.iter().map(|p| client.upload_run(p))).await;
    for result in results {
        result.unwrap();
    }

    let runs = client.list_runs().await.unwrap();
    assert_eq!(runs.len(), 17);
}
