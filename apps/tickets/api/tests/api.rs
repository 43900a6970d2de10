//! End-to-end: HTTP router, dispatcher and services over in-memory storage.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use axum_helpers::create_cors_layer;
use chrono::{Duration, Utc};
use domain_notifications::{InMemoryMailRepository, InMemoryTransport};
use domain_suggestions::DaDataClient;
use serde_json::{Value, json};
use std::sync::Arc;
use tickets_api::config::Config;
use tickets_api::state::{AppState, Integrations, Repositories};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    outbox: InMemoryMailRepository,
}

fn test_app() -> TestApp {
    let mut config = Config::from_env().unwrap();
    config.debug.skip_sending_user_registered_mail = false;
    config.suggestions.api_key = String::new();

    let outbox = InMemoryMailRepository::new();
    let repositories = Repositories {
        mails: Arc::new(outbox.clone()),
        ..Repositories::in_memory()
    };
    let integrations = Integrations {
        mail_transport: Arc::new(InMemoryTransport::new()),
        suggestion_provider: Arc::new(DaDataClient::new(config.suggestions.clone()).unwrap()),
    };
    let (state, _mailer) = AppState::build(&config, repositories, integrations).unwrap();

    TestApp {
        router: tickets_api::app(&config, &state, create_cors_layer(Vec::new())),
        outbox,
    }
}

struct Reply {
    status: StatusCode,
    body: Value,
    set_cookie: Option<String>,
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        Reply {
            status,
            body: serde_json::from_slice(&bytes).unwrap(),
            set_cookie,
        }
    }

    async fn post(&self, path: &str, body: Value, cookie: Option<&str>) -> Reply {
        let mut request = Request::post(path).header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn execute(&self, body: Value, cookie: Option<&str>) -> Reply {
        self.post("/api/execute", body, cookie).await
    }

    /// Registers, confirms and logs in; returns the `name=value` cookie pair.
    async fn signed_in(&self, email: &str) -> String {
        let created = self
            .execute(
                json!({
                    "target": "users",
                    "action": "createUser",
                    "email": email,
                    "password": "s3cret-pass",
                    "firstName": "Anna",
                }),
                None,
            )
            .await;
        assert_eq!(created.status, StatusCode::OK, "{}", created.body);

        let mails = self.outbox.all().await;
        let link = mails
            .iter()
            .rev()
            .find_map(|m| m.data["emailConfirmLink"].as_str())
            .unwrap()
            .to_string();
        let token = link.split("token=").nth(1).unwrap();
        let confirmed = self
            .execute(
                json!({ "target": "users", "action": "confirmEmail", "token": token }),
                None,
            )
            .await;
        assert_eq!(confirmed.status, StatusCode::OK, "{}", confirmed.body);

        let login = self
            .post(
                "/api/login",
                json!({ "email": email, "password": "s3cret-pass" }),
                None,
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);
        assert_eq!(login.body["user"]["email"], email);
        assert_eq!(login.body["uiSettings"], json!({}));

        let set_cookie = login.set_cookie.unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

fn visitor() -> Value {
    json!({
        "firstName": "Ivan",
        "lastName": "Petrov",
        "middleName": "",
        "companyName": "Acme",
        "position": "CEO",
        "phone": "+7123",
        "email": "i@x.co",
    })
}

#[tokio::test]
async fn test_repeated_event_registration_returns_same_visitor() {
    let app = test_app();
    let cookie = app.signed_in("owner@example.com").await;

    let start = Utc::now() + Duration::days(2);
    let event = app
        .execute(
            json!({
                "target": "events",
                "action": "createEvent",
                "name": "Expo",
                "place": { "name": "Hall A" },
                "start": start,
                "end": start + Duration::hours(6),
            }),
            Some(&cookie),
        )
        .await;
    assert_eq!(event.status, StatusCode::OK, "{}", event.body);
    let event_id = event.body["event"]["id"].as_str().unwrap().to_string();

    let register = json!({
        "target": "events",
        "action": "registerEventVisitor",
        "eventId": event_id,
        "visitor": visitor(),
    });

    let first = app.execute(register.clone(), None).await;
    assert_eq!(first.status, StatusCode::OK, "{}", first.body);
    assert_eq!(first.body["alreadyRegistered"], false);
    assert_eq!(first.body["visitor"]["regSubmits"], 1);

    let second = app.execute(register, None).await;
    assert_eq!(second.body["alreadyRegistered"], true);
    assert_eq!(second.body["visitor"]["id"], first.body["visitor"]["id"]);
    assert_eq!(second.body["visitor"]["regSubmits"], 2);
    assert_eq!(second.body["visitor"]["eventId"], event_id.as_str());
}

#[tokio::test]
async fn test_unknown_event_is_bad_request() {
    let app = test_app();
    let reply = app
        .execute(
            json!({
                "target": "events",
                "action": "registerEventVisitor",
                "eventId": "nope",
                "visitor": visitor(),
            }),
            None,
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    assert!(reply.body["cid"].is_string());
}

#[tokio::test]
async fn test_execute_requires_target_and_action() {
    let app = test_app();

    let reply = app.execute(json!({ "action": "getEvents" }), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);

    let reply = app
        .execute(json!({ "target": "nowhere", "action": "getEvents" }), None)
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_action_without_session_is_unauthorized() {
    let app = test_app();
    let reply = app
        .execute(
            json!({ "target": "events", "action": "getEvents" }),
            None,
        )
        .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body["errorMsg"].is_string());
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = test_app();

    let anonymous = app.post("/api/check_auth", json!({}), None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let cookie = app.signed_in("visitor@example.com").await;
    let checked = app.post("/api/check_auth", json!({}), Some(&cookie)).await;
    assert_eq!(checked.status, StatusCode::OK);
    assert_eq!(checked.body["user"]["email"], "visitor@example.com");

    let logout = app
        .send(Request::get("/api/logout").body(Body::empty()).unwrap())
        .await;
    assert_eq!(logout.body, json!({ "success": true }));
    assert!(logout.set_cookie.unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = test_app();
    app.signed_in("someone@example.com").await;

    let reply = app
        .post(
            "/api/login",
            json!({ "email": "someone@example.com", "password": "nope" }),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["success"], false);
    assert!(reply.set_cookie.is_none());
}

#[tokio::test]
async fn test_fio_suggestions_without_provider_key() {
    let app = test_app();
    let reply = app
        .post("/api/suggestions/fio", json!({ "query": "Ив" }), None)
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["suggestions"], json!([]));
    assert_eq!(reply.body["stats"]["src"], "dadata");
}

#[tokio::test]
async fn test_unknown_route_envelope() {
    let app = test_app();
    let reply = app
        .send(Request::get("/api/unknown").body(Body::empty()).unwrap())
        .await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["errorMsg"], "Cannot GET '/api/unknown'");
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let reply = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "healthy");
}
