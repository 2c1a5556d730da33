//! In-process fake of the library API for driving the real client.
#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use bookshelf_lib::settings::ApiConfig;
use bookshelf_lib::{AuthenticatedClient, Session};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const FRESH_TOKEN: &str = "a-2";
pub const REFRESH_TOKEN: &str = "r-1";

pub struct FakeApi {
    valid_token: Mutex<String>,
    /// Whether /auth/refresh accepts the refresh token.
    pub refresh_ok: AtomicBool,
    /// Whether a successful refresh also makes the server accept the new token.
    pub rotate_on_refresh: AtomicBool,
    /// Whether /auth/refresh answers 200 with an empty object.
    pub refresh_empty: AtomicBool,
    pub resource_hits: AtomicUsize,
    pub refresh_hits: AtomicUsize,
    pub last_body: Mutex<Option<Value>>,
    pub last_headers: Mutex<Option<HeaderMap>>,
    pub refresh_headers: Mutex<Option<HeaderMap>>,
}

impl FakeApi {
    pub fn accepting(token: &str) -> Arc<Self> {
        Arc::new(Self {
            valid_token: Mutex::new(token.to_string()),
            refresh_ok: AtomicBool::new(true),
            rotate_on_refresh: AtomicBool::new(true),
            refresh_empty: AtomicBool::new(false),
            resource_hits: AtomicUsize::new(0),
            refresh_hits: AtomicUsize::new(0),
            last_body: Mutex::new(None),
            last_headers: Mutex::new(None),
            refresh_headers: Mutex::new(None),
        })
    }

    pub fn resource_hits(&self) -> usize {
        self.resource_hits.load(Ordering::SeqCst)
    }

    pub fn refresh_hits(&self) -> usize {
        self.refresh_hits.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().unwrap().clone()
    }

    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.last_headers.lock().unwrap().clone()
    }

    pub fn refresh_headers(&self) -> Option<HeaderMap> {
        self.refresh_headers.lock().unwrap().clone()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.resource_hits.fetch_add(1, Ordering::SeqCst);
        *self.last_headers.lock().unwrap() = Some(headers.clone());
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        let sent = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if sent == Some(expected.as_str()) {
            Ok(())
        } else {
            Err(detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
        }
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

pub fn dune() -> Value {
    json!({
        "id": 1,
        "title": "Dune",
        "author": "Frank Herbert",
        "year": 1965,
        "isbn": "9780441013593",
        "available": true
    })
}

type Api = State<Arc<FakeApi>>;

async fn list_books(State(api): Api, headers: HeaderMap) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    Json(json!([dune()])).into_response()
}

async fn create_book(State(api): Api, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    *api.last_body.lock().unwrap() = Some(body.clone());
    let mut created = body;
    created["id"] = json!(7);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn get_book(State(api): Api, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    if id != 1 {
        return detail(StatusCode::NOT_FOUND, "Book not found");
    }
    Json(dune()).into_response()
}

async fn delete_book(State(api): Api, headers: HeaderMap, Path(_id): Path<i64>) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn reserve_book(State(api): Api, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    if id != 1 {
        return detail(StatusCode::BAD_REQUEST, "Book already reserved");
    }
    Json(json!({ "message": "Book 'Dune' reserved by Ann" })).into_response()
}

async fn user_books(State(api): Api, headers: HeaderMap) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    Json(json!([{
        "book_id": 1,
        "title": "Dune",
        "author": "Frank Herbert",
        "year": 1965,
        "status": "Started",
        "current_page": 120,
        "total_pages": 412,
        "progress": 29
    }]))
    .into_response()
}

async fn update_user_book(
    State(api): Api,
    headers: HeaderMap,
    Path(_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    *api.last_body.lock().unwrap() = Some(body);
    Json(json!({ "message": "updated" })).into_response()
}

async fn add_user_book(State(api): Api, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    if id == 1 {
        return detail(StatusCode::BAD_REQUEST, "Book already in your collection");
    }
    Json(json!({ "message": "added" })).into_response()
}

async fn remove_user_book(State(api): Api, headers: HeaderMap, Path(_id): Path<i64>) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn me(State(api): Api, headers: HeaderMap) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    Json(json!({ "id": 3, "name": "Ann", "email": "ann@example.com", "role": "librarian" }))
        .into_response()
}

async fn update_me(State(api): Api, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    *api.last_body.lock().unwrap() = Some(body.clone());
    Json(json!({ "id": 3, "name": body["name"], "email": body["email"] })).into_response()
}

async fn delete_me(State(api): Api, headers: HeaderMap) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    Json(json!({ "message": "User deleted" })).into_response()
}

async fn plain(State(api): Api, headers: HeaderMap) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    "pong".into_response()
}

async fn broken_json(State(api): Api, headers: HeaderMap) -> Response {
    if let Err(denied) = api.authorize(&headers) {
        return denied;
    }
    ([(CONTENT_TYPE, "application/json")], "{not json").into_response()
}

async fn refresh(State(api): Api, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    api.refresh_hits.fetch_add(1, Ordering::SeqCst);
    *api.refresh_headers.lock().unwrap() = Some(headers);
    // Long enough for concurrent 401s to queue up behind this refresh.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let accepted = api.refresh_ok.load(Ordering::SeqCst)
        && body.get("refresh_token").and_then(|v| v.as_str()) == Some(REFRESH_TOKEN);
    if !accepted {
        return detail(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    }
    if api.refresh_empty.load(Ordering::SeqCst) {
        return Json(json!({})).into_response();
    }
    if api.rotate_on_refresh.load(Ordering::SeqCst) {
        *api.valid_token.lock().unwrap() = FRESH_TOKEN.to_string();
    }
    Json(json!({ "access_token": FRESH_TOKEN })).into_response()
}

async fn signin(Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return detail(StatusCode::BAD_REQUEST, "Invalid credentials");
    }
    Json(json!({ "access_token": "a-1", "refresh_token": REFRESH_TOKEN })).into_response()
}

async fn signup(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    Json(json!({ "message": "User created" })).into_response()
}

pub fn router(api: Arc<FakeApi>) -> Router {
    Router::new()
        .route("/auth/refresh", post(refresh))
        .route("/auth/signin", post(signin))
        .route("/auth/signup", post(signup))
        .route("/books/", get(list_books).post(create_book))
        .route("/books/user-books", get(user_books))
        .route(
            "/books/user-books/:id",
            post(add_user_book).put(update_user_book).delete(remove_user_book),
        )
        .route("/books/:id", get(get_book).delete(delete_book))
        .route("/books/:id/reserve", put(reserve_book))
        .route("/users/me", get(me))
        .route("/users/update", put(update_me))
        .route("/users/delete", axum::routing::delete(delete_me))
        .route("/plain", get(plain))
        .route("/broken", get(broken_json))
        .with_state(api)
}

pub async fn spawn(api: Arc<FakeApi>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(api);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn client_for(base_url: &str, session: Session) -> AuthenticatedClient {
    let config = ApiConfig {
        base_url: base_url.to_string(),
        ..ApiConfig::default()
    };
    AuthenticatedClient::new(&config, session).unwrap()
}

/// A `http://host:port` address with nothing listening on it.
pub async fn closed_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Fake API accepting `accepted`, plus a client whose session holds
/// `access` and `refresh`.
pub async fn setup(
    accepted: &str,
    access: &str,
    refresh: Option<&str>,
) -> (Arc<FakeApi>, AuthenticatedClient) {
    let api = FakeApi::accepting(accepted);
    let base_url = spawn(api.clone()).await;
    let session = Session::in_memory();
    session.begin(access, refresh).unwrap();
    (api, client_for(&base_url, session))
}
