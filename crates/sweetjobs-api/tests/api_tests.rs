//! API integration tests against the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use sweetjobs_api::mail::LogMailer;
use sweetjobs_api::{create_router, AccessGate, ApiConfig, AppState, LocalFileStore};
use sweetjobs_store::MemoryStore;

const BOUNDARY: &str = "sweetjobs-test-boundary";

struct TestApp {
    router: Router,
    store: MemoryStore,
    gate: AccessGate,
    uploads: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(ApiConfig::default())
    }

    fn with_config(mut config: ApiConfig) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        config.upload_root = uploads.path().to_path_buf();

        let store = MemoryStore::new();
        let files = Arc::new(LocalFileStore::new(
            uploads.path(),
            config.public_base_url.clone(),
        ));
        let gate = AccessGate::new(&config.jwt_secret);
        let state = AppState::new(config, store.clone(), files, Arc::new(LogMailer));

        Self {
            router: create_router(state, None),
            store,
            gate,
            uploads,
        }
    }

    fn admin_token(&self) -> String {
        self.gate.issue("admin@example.com", "admin").unwrap()
    }

    fn user_token(&self, email: &str) -> String {
        self.gate.issue(email, "user").unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    async fn send_multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        payload: Value,
        logo: Option<(&str, &[u8])>,
    ) -> (StatusCode, Value) {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"payload\"\r\n\r\n{p}\r\n",
            b = BOUNDARY,
            p = payload
        )
        .into_bytes();
        if let Some((file_name, bytes)) = logo {
            body.extend_from_slice(
                format!(
                    "--{b}\r\nContent-Disposition: form-data; name=\"logoUrl\"; filename=\"{f}\"\r\nContent-Type: image/png\r\n\r\n",
                    b = BOUNDARY,
                    f = file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.call(request).await
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

fn success() -> Value {
    json!({ "ok": "siker" })
}

fn titles(job: &Value) -> Vec<(i64, String)> {
    let mut titles: Vec<(i64, String)> = job["translations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| {
            (
                t["languageId"].as_i64().unwrap(),
                t["title"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    titles.sort();
    titles
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_admin_routes_reject_before_store_access() {
    let app = TestApp::new();
    let user = app.user_token("bob@example.com");

    let (status, body) = app.send(Method::GET, "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AuthRejected");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/categories",
            Some("not-a-token"),
            Some(json!({ "key": "kitchen" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::DELETE, "/api/categories/1", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "AuthRejected");

    let (status, _) = app
        .send(Method::GET, "/api/jobs/public/getJobsByToken", None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(app.store.transactions_started(), 0);
}

#[tokio::test]
async fn test_admin_create_and_public_reads() {
    let app = TestApp::new();
    let admin = app.admin_token();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/categories",
            Some(&admin),
            Some(json!({
                "key": "kitchen",
                "adminName": "Konyha",
                "defaultLanguage": { "name": "Konyha" },
                "secondaryLanguage": { "name": "Kitchen", "description": "" }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, success());

    let (status, body) = app
        .send(Method::GET, "/api/categories/public", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["key"], "kitchen");
    assert_eq!(list[0]["translations"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .send(Method::GET, "/api/categories/public/1?lang=en", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let translations = body["translations"].as_array().unwrap();
    assert_eq!(translations.len(), 1);
    assert_eq!(translations[0]["name"], "Kitchen");

    let (status, body) = app
        .send(Method::GET, "/api/categories/1", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adminName"], "Konyha");
}

#[tokio::test]
async fn test_cook_cuisinier_chef_over_http() {
    let app = TestApp::new();
    let admin = app.admin_token();

    let (status, _) = app
        .send(
            Method::POST,
            "/api/jobs",
            Some(&admin),
            Some(json!({
                "companyName": "Bistro",
                "defaultLanguage": { "title": "Cook" },
                "secondaryLanguage": { "title": "" }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, job) = app.send(Method::GET, "/api/jobs/1", Some(&admin), None).await;
    assert_eq!(titles(&job), vec![(1, "Cook".to_string())]);

    for title in ["Cuisinier", "Chef"] {
        let (status, body) = app
            .send(
                Method::PUT,
                "/api/jobs/1",
                Some(&admin),
                Some(json!({ "secondaryLanguage": { "title": title } })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, success());

        let (_, job) = app.send(Method::GET, "/api/jobs/1", Some(&admin), None).await;
        assert_eq!(
            titles(&job),
            vec![(1, "Cook".to_string()), (2, title.to_string())]
        );
        assert_eq!(job["companyName"], "Bistro");
    }
}

#[tokio::test]
async fn test_delete_restricted_then_cascade() {
    let app = TestApp::new();
    let admin = app.admin_token();

    app.send(
        Method::POST,
        "/api/roles",
        Some(&admin),
        Some(json!({ "key": "employer", "defaultLanguage": { "name": "Munkáltató" } })),
    )
    .await;

    let (status, body) = app
        .send(Method::DELETE, "/api/roles/1", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ReferentialIntegrityError");

    let (status, body) = app
        .send(Method::DELETE, "/api/roles/1?cascade=true", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, success());

    let (status, body) = app
        .send(Method::GET, "/api/roles/1", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_request_errors_use_error_body() {
    let app = TestApp::new();
    let admin = app.admin_token();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/errorMessages",
            Some(&admin),
            Some(json!({ "key": "", "defaultLanguage": { "text": "Hiba" } })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ValidationError");

    let (status, body) = app
        .send(Method::GET, "/api/errorMessages/abc", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/generalMessages/5",
            Some(&admin),
            Some(json!({ "defaultLanguage": { "text": "Szia" } })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_legacy_error_status() {
    let app = TestApp::with_config(ApiConfig {
        legacy_error_status: true,
        ..ApiConfig::default()
    });

    let (status, body) = app
        .send(Method::GET, "/api/pagePlaces/public/9", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "NotFound");

    let (status, _) = app.send(Method::GET, "/api/pagePlaces", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_languages() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::GET, "/api/languages/public", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["hu", "en"]);
}

#[tokio::test]
async fn test_job_owner_flow() {
    let app = TestApp::new();
    let owner = app
        .store
        .add_user("owner@example.com", Some("Olga"), Some("Tóth"), "user")
        .await;
    app.store
        .add_user("other@example.com", None, None, "user")
        .await;
    let token = app.user_token("owner@example.com");
    let other = app.user_token("other@example.com");

    let (status, body) = app
        .send_multipart(
            Method::POST,
            "/api/jobs/public/createJob",
            &token,
            json!({
                "userId": 99,
                "companyName": "Bistro",
                "defaultLanguage": { "title": "Szakács" },
                "secondaryLanguage": { "title": "Cook" }
            }),
            Some(("logo.png", b"png-bytes")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, success());

    let expected_url = format!("http://localhost:8000/users/{}/jobs/1/logo.png", owner.id);
    let stored = app
        .uploads
        .path()
        .join(format!("users/{}/jobs/1/logo.png", owner.id));
    assert_eq!(std::fs::read(stored).unwrap(), b"png-bytes");

    let (status, body) = app
        .send(Method::GET, "/api/jobs/public/getJobsByToken", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["userId"], owner.id);
    assert_eq!(jobs[0]["logoUrl"], expected_url.as_str());

    let (_, body) = app
        .send(
            Method::GET,
            "/api/jobs/public/getJobDropdwonDataByToken",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body, json!([{ "id": 1, "companyName": "Bistro" }]));

    let (status, body) = app
        .send(Method::GET, "/api/jobs/public/getJobById/1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"]["firstName"], "Olga");
    assert!(body["owner"].get("email").is_none());

    let (status, _) = app
        .send(
            Method::GET,
            "/api/jobs/public/getJobByIdAndToken/1",
            Some(&other),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send_multipart(
            Method::PUT,
            "/api/jobs/public/modifyJob/1",
            &other,
            json!({ "companyName": "Stolen" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send_multipart(
            Method::PUT,
            "/api/jobs/public/modifyJob/1",
            &token,
            json!({ "companyName": "Bistro 2", "secondaryLanguage": { "title": "Chef" } }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, job) = app
        .send(
            Method::GET,
            "/api/jobs/public/getJobByIdAndToken/1",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(job["companyName"], "Bistro 2");
    assert_eq!(job["logoUrl"], expected_url.as_str());
    assert_eq!(
        titles(&job),
        vec![(1, "Szakács".to_string()), (2, "Chef".to_string())]
    );
}

#[tokio::test]
async fn test_job_lists_include_category() {
    let app = TestApp::new();
    let admin = app.admin_token();
    app.store
        .add_user("owner@example.com", None, None, "user")
        .await;
    let token = app.user_token("owner@example.com");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/categories",
            Some(&admin),
            Some(json!({
                "key": "kitchen",
                "defaultLanguage": { "name": "Konyha" },
                "secondaryLanguage": { "name": "Kitchen" }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send_multipart(
            Method::POST,
            "/api/jobs/public/createJob",
            &token,
            json!({ "categoryId": 1, "defaultLanguage": { "title": "Szakács" } }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send_multipart(
            Method::POST,
            "/api/jobs/public/createJob",
            &token,
            json!({ "defaultLanguage": { "title": "Pincér" } }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(Method::GET, "/api/jobs/public", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["category"]["key"], "kitchen");
    assert_eq!(
        jobs[0]["category"]["translations"].as_array().unwrap().len(),
        2
    );
    assert_eq!(jobs[0]["translations"][0]["title"], "Szakács");
    assert!(jobs[1]["category"].is_null());

    let (_, body) = app
        .send(Method::GET, "/api/jobs/public/getJobsByToken", Some(&token), None)
        .await;
    assert_eq!(body[0]["category"]["translations"][0]["name"], "Konyha");

    let (status, body) = app.send(Method::GET, "/api/jobs/public/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_rejected_job_modify_stores_no_logo() {
    let app = TestApp::new();
    app.store
        .add_user("owner@example.com", None, None, "user")
        .await;
    let other = app
        .store
        .add_user("other@example.com", None, None, "user")
        .await;
    let token = app.user_token("owner@example.com");

    let (status, _) = app
        .send_multipart(
            Method::POST,
            "/api/jobs/public/createJob",
            &token,
            json!({ "defaultLanguage": { "title": "Szakács" } }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send_multipart(
            Method::PUT,
            "/api/jobs/public/modifyJob/1",
            &app.user_token("other@example.com"),
            json!({ "companyName": "Stolen" }),
            Some(("logo.png", b"png-bytes")),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!app
        .uploads
        .path()
        .join(format!("users/{}", other.id))
        .exists());

    let (status, _) = app
        .send_multipart(
            Method::PUT,
            "/api/jobs/public/modifyJob/7",
            &token,
            json!({ "companyName": "Missing" }),
            Some(("logo.png", b"png-bytes")),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!app.uploads.path().join("users").exists());
}

#[tokio::test]
async fn test_owner_event_flow() {
    let app = TestApp::new();
    let owner = app
        .store
        .add_user("owner@example.com", Some("Olga"), Some("Tóth"), "user")
        .await;
    let guest = app
        .store
        .add_user("guest@example.com", Some("Gábor"), Some("Nagy"), "user")
        .await;
    let token = app.user_token("owner@example.com");
    let admin = app.admin_token();

    let (status, body) = app
        .send(
            Method::GET,
            "/api/events/public/getUserIdByToken",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "userId": owner.id }));

    let (status, body) = app
        .send(
            Method::POST,
            "/api/events/public/createEvent",
            Some(&token),
            Some(json!({ "jobId": 1, "users": [guest.id], "startDate": "2024-03-05T14:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, success());

    let (_, body) = app
        .send(
            Method::GET,
            "/api/events/public/getEventsByToken",
            Some(&token),
            None,
        )
        .await;
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);
    let link = events[0]["link"].as_str().unwrap().to_string();
    assert!(link.starts_with("esemeny"));
    assert_eq!(events[0]["users"][0]["email"], "guest@example.com");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/events/public/getEventByToken/{}", link),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ownerId"], owner.id);

    let (status, body) = app.send(Method::GET, "/api/events/1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"]["email"], "owner@example.com");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/events/public/sendLinkToUsers",
            Some(&token),
            Some(json!({ "eventId": 1, "pwdId": "k3y", "users": [guest.id] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::DELETE,
            "/api/events/public/delete/1",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send(Method::GET, "/api/events", Some(&admin), None).await;
    assert_eq!(body, json!([]));
}
