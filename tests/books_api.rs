use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use shelf_app::App;
use shelf_kernel::settings::Settings;
use tower::ServiceExt;

async fn app_with(settings: Settings) -> Router {
    App::bootstrap(settings).await.unwrap().router()
}

async fn app() -> Router {
    app_with(Settings::default()).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    };

    app.clone().oneshot(request.unwrap()).await.unwrap()
}

async fn json_of(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn book(n: u32) -> Value {
    json!({
        "title": format!("Field Notes {n}"),
        "author": if n % 2 == 0 { "Annie Dillard" } else { "Barry Lopez" },
        "isbn": format!("978-1-{:08}-0", n),
        "publishedDate": "2001-03-15",
        "publisher": "Riverhead",
        "pages": 200 + n,
        "genre": "Nature",
        "description": "Essays written in the field.",
        "price": "14.95",
        "stock": n
    })
}

#[tokio::test]
async fn fifteen_books_paginate_newest_first() {
    let app = app().await;
    for n in 1..=15 {
        let response = send(&app, "POST", "/api/book", Some(book(n))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let first = json_of(send(&app, "GET", "/api/book?page=1&limit=10", None).await).await;
    assert_eq!(first["data"].as_array().unwrap().len(), 10);
    assert_eq!(first["data"][0]["title"], "Field Notes 15");
    assert_eq!(
        first["pagination"],
        json!({ "page": 1, "limit": 10, "totalBooks": 15, "totalPages": 2 })
    );

    let second = json_of(send(&app, "GET", "/api/book?page=2&limit=10", None).await).await;
    assert_eq!(second["data"].as_array().unwrap().len(), 5);
    assert_eq!(second["data"][4]["title"], "Field Notes 1");

    let search = json_of(send(&app, "GET", "/api/book?search=dillard", None).await).await;
    assert_eq!(search["pagination"]["totalBooks"], 7);
}

#[tokio::test]
async fn validation_errors_leave_store_unchanged() {
    let app = app().await;
    let mut invalid = book(1);
    invalid["isbn"] = json!("123");
    invalid["description"] = json!("short");

    let response = send(&app, "POST", "/api/book", Some(invalid)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_of(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid ISBN format");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["isbn", "description"]);
    assert!(body["trace_id"].is_string());

    let list = json_of(send(&app, "GET", "/api/book", None).await).await;
    assert_eq!(list["pagination"]["totalBooks"], 0);
}

#[tokio::test]
async fn concurrent_creates_with_same_isbn_admit_one() {
    let app = app().await;

    let attempts = (0..8).map(|n| {
        let app = app.clone();
        let mut payload = book(42);
        payload["title"] = json!(format!("Racer {n}"));
        tokio::spawn(async move { send(&app, "POST", "/api/book", Some(payload)).await.status() })
    });

    let mut created = 0;
    let mut conflicts = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        match attempt.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn books_survive_restart_with_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.database.data_dir = Some(dir.path().to_path_buf());

    let created = {
        let app = app_with(settings.clone()).await;
        json_of(send(&app, "POST", "/api/book", Some(book(3))).await).await
    };
    let id = created["data"]["id"].as_str().unwrap();

    let app = app_with(settings).await;
    let response = send(&app, "GET", &format!("/api/book/{id}"), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await["data"], created["data"]);
}

#[tokio::test]
async fn two_servers_on_one_data_dir_share_isbn_uniqueness() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.database.data_dir = Some(dir.path().to_path_buf());

    let first = app_with(settings.clone()).await;
    let second = app_with(settings.clone()).await;

    let created = send(&first, "POST", "/api/book", Some(book(8))).await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let mut same_isbn = book(8);
    same_isbn["title"] = json!("Field Notes, second printing");
    let rejected = send(&second, "POST", "/api/book", Some(same_isbn)).await;
    assert_eq!(rejected.status(), StatusCode::CONFLICT);

    let reopened = app_with(settings).await;
    let list = json_of(send(&reopened, "GET", "/api/book", None).await).await;
    assert_eq!(list["pagination"]["totalBooks"], 1);
    assert_eq!(list["data"][0]["title"], "Field Notes 8");
}

#[tokio::test]
async fn server_assigns_id_and_timestamps() {
    let app = app().await;
    let forged_id = "0190a4e2-0000-7000-8000-000000000000";

    let mut payload = book(5);
    payload["id"] = json!(forged_id);
    payload["createdAt"] = json!("1999-01-01T00:00:00Z");
    payload["updatedAt"] = json!("1999-01-01T00:00:00Z");

    let created = json_of(send(&app, "POST", "/api/book", Some(payload)).await).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_ne!(id, forged_id);
    assert_ne!(created["data"]["createdAt"], "1999-01-01T00:00:00Z");
    assert_eq!(
        send(&app, "GET", &format!("/api/book/{forged_id}"), None)
            .await
            .status(),
        StatusCode::NOT_FOUND
    );

    let patch = json!({
        "id": forged_id,
        "createdAt": "1999-01-01T00:00:00Z",
        "updatedAt": "1999-01-01T00:00:00Z",
        "stock": 9
    });
    let response = send(&app, "PATCH", &format!("/api/book/{id}"), Some(patch)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = json_of(response).await;
    assert_eq!(updated["data"]["id"], id.as_str());
    assert_eq!(updated["data"]["stock"], 9);
    assert_eq!(updated["data"]["createdAt"], created["data"]["createdAt"]);
    assert_ne!(updated["data"]["updatedAt"], "1999-01-01T00:00:00Z");
}

#[tokio::test]
async fn unknown_routes_use_error_envelope() {
    let app = app().await;

    let response = send(&app, "GET", "/api/nothing-here", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_of(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn service_endpoints_are_mounted() {
    let app = app().await;

    assert_eq!(send(&app, "GET", "/healthz", None).await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, "GET", "/api/book/health", None).await.status(),
        StatusCode::OK
    );

    let document = json_of(send(&app, "GET", "/docs/openapi.json", None).await).await;
    assert!(document["paths"]["/api/book"]["post"].is_object());
    assert!(document["paths"]["/api/book/{id}"]["patch"].is_object());
    assert!(document["components"]["schemas"]["ErrorResponse"].is_object());
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = app().await;
    let response = send(&app, "GET", "/api/book", None).await;

    assert!(response.headers().contains_key("x-request-id"));
}
