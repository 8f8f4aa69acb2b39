//! End-to-end behaviour of `ApiClient` + `SessionStore` against an
//! in-process mock of the loyalty API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use pointkeeper_core::auth::{FileStore, KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};
use pointkeeper_core::forms::{FormError, RedeemForm};
use pointkeeper_core::history::{HistoryFilter, HistorySummary};
use pointkeeper_core::models::{EarnPointsRequest, Identity, LoginCredentials};
use pointkeeper_core::{normalize_error, ApiClient, NormalizedError, SessionEvent, SessionStore};

const VALID_TOKEN: &str = "t1";

#[derive(Debug, Clone)]
struct Hit {
    path: String,
    authorization: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct Mock {
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl Mock {
    fn record(&self, uri: &Uri, headers: &HeaderMap, body: Option<Value>) -> bool {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let authorized = authorization.as_deref() == Some("Bearer t1");
        self.hits.lock().expect("hits lock").push(Hit {
            path: uri.path().to_string(),
            authorization,
            body,
        });
        authorized
    }

    fn hits_for(&self, path: &str) -> Vec<Hit> {
        self.hits
            .lock()
            .expect("hits lock")
            .iter()
            .filter(|h| h.path == path)
            .cloned()
            .collect()
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token expired"}))).into_response()
}

async fn login(State(mock): State<Mock>, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record(&uri, &headers, Some(body.clone()));
    if body["email"] == "a@b.com" && body["password"] == "x" {
        Json(json!({
            "token": VALID_TOKEN,
            "user": {"id": "1", "firstName": "A", "email": "a@b.com"}
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid email or password"}))).into_response()
    }
}

async fn balance(State(mock): State<Mock>, uri: Uri, headers: HeaderMap) -> Response {
    if !mock.record(&uri, &headers, None) {
        return unauthorized();
    }
    Json(json!({"points": 300, "balance": 300, "loyaltyAccountId": "acct-1"})).into_response()
}

async fn history(State(mock): State<Mock>, uri: Uri, headers: HeaderMap) -> Response {
    if !mock.record(&uri, &headers, None) {
        return unauthorized();
    }
    Json(json!({"transactions": [
        {"id": "1", "type": "earn", "points": 10, "description": "Daily Check-in", "createdAt": "2025-03-01T10:00:00Z"},
        {"id": "2", "type": "redeem", "points": 5, "description": "Sticker", "createdAt": "2025-03-02T10:00:00Z"}
    ]}))
    .into_response()
}

async fn earn(State(mock): State<Mock>, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !mock.record(&uri, &headers, Some(body.clone())) {
        return unauthorized();
    }
    if body["description"] == "limit" {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"message": "Daily earning limit reached"})))
            .into_response();
    }
    Json(json!({"success": true, "message": "Points earned"})).into_response()
}

async fn redeem(State(mock): State<Mock>, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !mock.record(&uri, &headers, Some(body)) {
        return unauthorized();
    }
    Json(json!({"success": true, "message": "Points redeemed", "data": {"remaining": 0}})).into_response()
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve mock") });
    addr
}

async fn spawn_mock() -> (SocketAddr, Mock) {
    let mock = Mock::default();
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/loyalty/balance", get(balance))
        .route("/api/loyalty/history", get(history))
        .route("/api/loyalty/earn", post(earn))
        .route("/api/redeem", post(redeem))
        .with_state(mock.clone());

    (serve(app).await, mock)
}

fn identity() -> Identity {
    Identity {
        id: "1".to_string(),
        first_name: "A".to_string(),
        last_name: None,
        email: "a@b.com".to_string(),
    }
}

fn client(addr: SocketAddr, storage: Arc<dyn KeyValueStore>) -> ApiClient {
    let session = SessionStore::open(storage);
    ApiClient::new(&format!("http://{}/api", addr), session).expect("build client")
}

#[tokio::test]
async fn login_then_balance_sends_bearer_token() {
    let (addr, mock) = spawn_mock().await;
    let api = client(addr, Arc::new(MemoryStore::new()));

    let response = api
        .login(&LoginCredentials {
            email: "a@b.com".to_string(),
            password: "x".to_string(),
        })
        .await
        .expect("login succeeds");
    assert_eq!(response.token, "t1");

    // The client leaves the session alone; the caller logs in
    assert!(!api.session().is_authenticated());
    api.session()
        .login(response.user.into_identity(), response.token)
        .expect("store session");

    let balance = api.get_balance().await.expect("balance");
    assert_eq!(balance.balance, 300);
    assert_eq!(balance.loyalty_account_id.as_deref(), Some("acct-1"));

    let login_hits = mock.hits_for("/api/auth/login");
    assert_eq!(login_hits.len(), 1);
    assert_eq!(login_hits[0].authorization, None);

    let balance_hits = mock.hits_for("/api/loyalty/balance");
    assert_eq!(balance_hits.len(), 1);
    assert_eq!(balance_hits[0].authorization.as_deref(), Some("Bearer t1"));
}

#[tokio::test]
async fn unauthenticated_request_is_sent_without_header() {
    let (addr, mock) = spawn_mock().await;
    let api = client(addr, Arc::new(MemoryStore::new()));

    let err = api.get_balance().await.expect_err("server rejects anonymous call");
    assert_eq!(normalize_error(&err), NormalizedError::Unauthorized);

    let hits = mock.hits_for("/api/loyalty/balance");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].authorization, None);
}

#[tokio::test]
async fn unauthorized_response_evicts_session_from_any_operation() {
    let (addr, _mock) = spawn_mock().await;
    let storage = Arc::new(MemoryStore::new());
    let api = client(addr, storage.clone());
    api.session()
        .login(identity(), "expired-token".to_string())
        .expect("store session");
    let mut events = api.session().subscribe();

    let err = api.get_history().await.expect_err("stale token rejected");

    assert_eq!(normalize_error(&err), NormalizedError::Unauthorized);
    assert!(!api.session().is_authenticated());
    assert_eq!(api.session().current_user(), None);
    assert_eq!(storage.get(USER_KEY).expect("get"), None);
    assert_eq!(storage.get(TOKEN_KEY).expect("get"), None);
    assert_eq!(events.try_recv().ok(), Some(SessionEvent::Expired));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn concurrent_unauthorized_responses_expire_once() {
    let (addr, _mock) = spawn_mock().await;
    let api = client(addr, Arc::new(MemoryStore::new()));
    api.session()
        .login(identity(), "expired-token".to_string())
        .expect("store session");
    let mut events = api.session().subscribe();

    let (balance, history) = tokio::join!(api.get_balance(), api.get_history());
    assert!(balance.is_err());
    assert!(history.is_err());

    assert!(!api.session().is_authenticated());
    assert_eq!(events.try_recv().ok(), Some(SessionEvent::Expired));
    assert!(events.try_recv().is_err(), "login navigation must be signalled exactly once");
}

#[tokio::test]
async fn server_error_message_is_passed_through() {
    let (addr, mock) = spawn_mock().await;
    let api = client(addr, Arc::new(MemoryStore::new()));
    api.session().login(identity(), VALID_TOKEN.to_string()).expect("store session");

    let err = api
        .earn_points(&EarnPointsRequest {
            points: 10,
            description: Some("limit".to_string()),
        })
        .await
        .expect_err("server refuses");

    assert_eq!(
        normalize_error(&err),
        NormalizedError::Server("Daily earning limit reached".to_string())
    );
    // Non-401 errors leave the session alone
    assert!(api.session().is_authenticated());

    let hits = mock.hits_for("/api/loyalty/earn");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].body.as_ref().map(|b| b["points"].clone()), Some(json!(10)));
}

#[tokio::test]
async fn earn_and_redeem_succeed() {
    let (addr, mock) = spawn_mock().await;
    let api = client(addr, Arc::new(MemoryStore::new()));
    api.session().login(identity(), VALID_TOKEN.to_string()).expect("store session");

    let earned = api
        .earn_points(&EarnPointsRequest {
            points: 25,
            description: None,
        })
        .await
        .expect("earn");
    assert!(earned.success);
    assert_eq!(earned.message, "Points earned");

    let form = RedeemForm {
        points_input: "100".to_string(),
        description: "Free Coffee".to_string(),
    };
    let redeemed = form.submit(&api, 300).await.expect("redeem");
    assert!(redeemed.success);
    assert!(redeemed.data.is_some());

    let hits = mock.hits_for("/api/redeem");
    assert_eq!(hits.len(), 1);
    let body = hits[0].body.clone().expect("redeem body");
    assert_eq!(body, json!({"points": 100, "description": "Free Coffee"}));

    let earn_body = mock.hits_for("/api/loyalty/earn")[0].body.clone().expect("earn body");
    assert_eq!(earn_body, json!({"points": 25}));
}

#[tokio::test]
async fn redeem_over_balance_is_rejected_before_network() {
    let (addr, mock) = spawn_mock().await;
    let api = client(addr, Arc::new(MemoryStore::new()));
    api.session().login(identity(), VALID_TOKEN.to_string()).expect("store session");

    let form = RedeemForm {
        points_input: "500".to_string(),
        description: String::new(),
    };
    let err = form.submit(&api, 300).await.expect_err("insufficient balance");

    assert_eq!(err.downcast_ref::<FormError>(), Some(&FormError::InsufficientBalance));
    assert_eq!(pointkeeper_core::forms::error_message(&err), "Insufficient points balance");
    assert!(mock.hits_for("/api/redeem").is_empty());
}

#[tokio::test]
async fn history_totals() {
    let (addr, _mock) = spawn_mock().await;
    let api = client(addr, Arc::new(MemoryStore::new()));
    api.session().login(identity(), VALID_TOKEN.to_string()).expect("store session");

    let history = api.get_history().await.expect("history");
    let summary = HistorySummary::from_transactions(&history.transactions);

    assert_eq!(summary.total_earned, 10);
    assert_eq!(summary.total_redeemed, 5);
    assert_eq!(summary.total_count, 2);
    assert_eq!(HistoryFilter::Earn.apply(&history.transactions).len(), 1);
}

#[tokio::test]
async fn connection_failure_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let api = client(addr, Arc::new(MemoryStore::new()));
    api.session().login(identity(), VALID_TOKEN.to_string()).expect("store session");

    let err = api.get_balance().await.expect_err("nothing is listening");
    assert_eq!(normalize_error(&err), NormalizedError::Network);
    assert_eq!(
        normalize_error(&err).message(),
        "Network error. Please check your connection."
    );
    // Network failures never touch the session
    assert!(api.session().is_authenticated());
}

#[tokio::test]
async fn persisted_session_is_used_after_restart() {
    let (addr, mock) = spawn_mock().await;
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let api = client(addr, Arc::new(FileStore::new(dir.path())));
        api.session().login(identity(), VALID_TOKEN.to_string()).expect("store session");
    }

    let api = client(addr, Arc::new(FileStore::new(dir.path())));
    assert!(api.session().is_authenticated());
    assert!(!api.session().is_loading());
    assert_eq!(api.session().current_user(), Some(identity()));

    api.get_balance().await.expect("balance with restored token");
    let hits = mock.hits_for("/api/loyalty/balance");
    assert_eq!(hits[0].authorization.as_deref(), Some("Bearer t1"));
}

#[tokio::test]
async fn earn_and_redeem_succeed_without_response_body() {
    let app = Router::new()
        .route("/api/loyalty/earn", post(|| async { StatusCode::NO_CONTENT }))
        .route("/api/redeem", post(|| async { (StatusCode::CREATED, "") }))
        .route("/api/loyalty/balance", get(|| async { (StatusCode::OK, "") }));
    let addr = serve(app).await;
    let api = client(addr, Arc::new(MemoryStore::new()));
    api.session().login(identity(), VALID_TOKEN.to_string()).expect("store session");

    let earned = api
        .earn_points(&EarnPointsRequest {
            points: 10,
            description: Some("Daily Check-in".to_string()),
        })
        .await
        .expect("204 counts as success");
    assert!(earned.success);

    let form = RedeemForm {
        points_input: "100".to_string(),
        description: "Free Coffee".to_string(),
    };
    let redeemed = form.submit(&api, 300).await.expect("201 with empty body counts as success");
    assert!(redeemed.success);
    assert!(redeemed.data.is_none());

    // Data endpoints still need a body to decode
    let err = api.get_balance().await.expect_err("empty balance body");
    assert_eq!(normalize_error(&err), NormalizedError::Unexpected);
}

#[tokio::test]
async fn slow_response_times_out_as_network_error() {
    let app = Router::new().route(
        "/api/loyalty/balance",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"balance": 1}))
        }),
    );
    let addr = serve(app).await;

    let session = SessionStore::open(Arc::new(MemoryStore::new()));
    session.login(identity(), VALID_TOKEN.to_string()).expect("store session");
    let api = ApiClient::with_timeout(
        &format!("http://{}/api", addr),
        session,
        Duration::from_millis(200),
    )
    .expect("build client");

    let err = api.get_balance().await.expect_err("no response within the timeout");
    assert_eq!(normalize_error(&err), NormalizedError::Network);
    assert!(api.session().is_authenticated());
}
