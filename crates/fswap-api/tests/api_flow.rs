//! End-to-end API tests over the full router.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use fswap_api::{AdmissionGate, ApiConfig, AppState, JobService};
use fswap_engine::scripted::{ScriptedEngine, NO_FACE_IMAGE};
use fswap_engine::SwapEngine;
use fswap_models::Tier;
use fswap_queue::{JobQueue, JobStateTracker};
use fswap_repo::{JobRepo, MemoryJobRepo, MemoryUsageLedger, MemoryUserDirectory, UsageLedger};
use fswap_storage::{ResultStore, StoreConfig};
use fswap_worker::{ProcessingContext, UnitErrorPolicy, Worker, WorkerConfig};

struct TestApp {
    app: Router,
    queue: Arc<JobQueue>,
    ctx: ProcessingContext,
    _results_dir: tempfile::TempDir,
    _work_dir: tempfile::TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let results_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();

        let queue = Arc::new(JobQueue::new());
        let tracker = Arc::new(JobStateTracker::new());
        let store = ResultStore::new(StoreConfig {
            root: results_dir.path().to_path_buf(),
            result_ttl: Duration::from_secs(3600),
        });
        let repo: Arc<dyn JobRepo> = Arc::new(MemoryJobRepo::new());
        let ledger: Arc<dyn UsageLedger> = Arc::new(MemoryUsageLedger::new());
        let engine: Arc<dyn SwapEngine> = Arc::new(ScriptedEngine::new());

        let users = MemoryUserDirectory::new();
        users.add_token("tok-premium", "user-premium", Tier::Premium).await;
        users.add_token("tok-standard", "user-standard", Tier::Standard).await;

        let ctx = ProcessingContext {
            tracker: Arc::clone(&tracker),
            store: store.clone(),
            repo: Arc::clone(&repo),
            engine: Arc::clone(&engine),
            unit_error_policy: UnitErrorPolicy::Abort,
        };

        let config = ApiConfig {
            work_dir: work_dir.path().to_path_buf(),
            ..ApiConfig::default()
        };
        let jobs = JobService::new(
            AdmissionGate::new(Arc::clone(&ledger)),
            Arc::clone(&queue),
            tracker,
            store,
            repo,
            ledger,
            engine,
            config.work_dir.clone(),
        );
        let state = AppState::new(config, jobs, Arc::new(users));

        Self {
            app: fswap_api::create_router(state),
            queue,
            ctx,
            _results_dir: results_dir,
            _work_dir: work_dir,
        }
    }

    /// Start the single worker loop against this app's queue.
    fn spawn_worker(&self) -> fswap_worker::WorkerHandle {
        let config = WorkerConfig {
            poll_interval: Duration::from_millis(50),
            unit_error_policy: self.ctx.unit_error_policy,
        };
        let (handle, _join) =
            Worker::new(Arc::clone(&self.queue), self.ctx.clone(), config).spawn();
        handle
    }

    async fn request(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, headers, json)
    }
}

const BOUNDARY: &str = "fswap-test-boundary";

fn multipart_body(source: &[u8], target: &[u8], target_name: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"source\"; \
             filename=\"face.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(source);
    body.extend_from_slice(
        format!(
            "\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"target\"; \
             filename=\"{target_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(target);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn swap_request(path: &str, source: &[u8], target: &[u8], target_name: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("cookie", "fswap_session=test-session")
        .body(Body::from(multipart_body(source, target, target_name)))
        .unwrap()
}

#[tokio::test]
async fn test_health_mints_a_session_cookie() {
    let app = TestApp::new().await;

    let (status, headers, json) = app
        .request(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("fswap_session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_existing_session_is_not_reminted() {
    let app = TestApp::new().await;

    let (_, headers, _) = app
        .request(
            Request::builder()
                .uri("/health")
                .header("cookie", "fswap_session=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert!(headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = TestApp::new().await;

    let (status, _, json) = app
        .request(
            Request::builder()
                .uri("/job/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["detail"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_image_swap_runs_to_download() {
    let app = TestApp::new().await;
    let worker = app.spawn_worker();

    let (status, _, json) = app
        .request(swap_request("/swap", b"source", b"target", "photo.jpg"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "queued");
    let job_id = json["job_id"].as_str().unwrap().to_string();

    // Poll until the worker finishes
    let mut done = false;
    for _ in 0..100 {
        let (status, _, json) = app
            .request(
                Request::builder()
                    .uri(format!("/job/{job_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        match json["status"].as_str().unwrap() {
            "done" => {
                done = true;
                break;
            }
            "failed" => panic!("job failed: {json}"),
            _ => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    assert!(done, "job did not finish in time");

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/job/{job_id}/download"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.contains("attachment"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(!bytes.is_empty());

    // Status survives the tracker entry being retired by the download
    let (status, _, json) = app
        .request(
            Request::builder()
                .uri(format!("/job/{job_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "done");

    worker.shutdown();
}

#[tokio::test]
async fn test_download_before_done_is_a_conflict() {
    let app = TestApp::new().await;
    // No worker: the job stays queued

    let (_, _, json) = app
        .request(swap_request("/swap", b"source", b"target", "photo.jpg"))
        .await;
    let job_id = json["job_id"].as_str().unwrap().to_string();

    let (status, _, json) = app
        .request(
            Request::builder()
                .uri(format!("/job/{job_id}/download"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["detail"].as_str().unwrap().contains("not done"));
}

#[tokio::test]
async fn test_faceless_source_is_rejected_before_queuing() {
    let app = TestApp::new().await;

    let (status, _, json) = app
        .request(swap_request("/swap", NO_FACE_IMAGE, b"target", "photo.jpg"))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("No face"));
    assert!(app.queue.is_empty());
}

#[tokio::test]
async fn test_sixth_image_in_a_day_hits_the_quota() {
    let app = TestApp::new().await;

    for _ in 0..5 {
        let (status, _, _) = app
            .request(swap_request("/swap", b"source", b"target", "photo.jpg"))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, headers, json) = app
        .request(swap_request("/swap", b"source", b"target", "photo.jpg"))
        .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "quota-exceeded");
    assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "86400");
    // The five admitted jobs are all still queued
    assert_eq!(app.queue.len(), 5);
}

#[tokio::test]
async fn test_oversize_anonymous_video_is_rejected() {
    let app = TestApp::new().await;

    let oversize = vec![0u8; 26 * 1024 * 1024];
    let (status, _, json) = app
        .request(swap_request("/swap/video", b"source", &oversize, "clip.mp4"))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "payload-too-large");
}

#[tokio::test]
async fn test_enhancement_requires_premium() {
    let app = TestApp::new().await;

    let mut request = swap_request("/swap?enhance=true", b"source", b"target", "photo.jpg");
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer tok-standard".parse().unwrap());
    let (status, _, json) = app.request(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "feature-not-entitled");

    let mut request = swap_request("/swap?enhance=true", b"source", b"target", "photo.jpg");
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer tok-premium".parse().unwrap());
    let (status, _, _) = app.request(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_multipart_field_is_a_bad_request() {
    let app = TestApp::new().await;

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"source\"; \
             filename=\"face.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nsource\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/swap")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, _, json) = app.request(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("target"));
}
