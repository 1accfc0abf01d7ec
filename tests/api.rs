use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use book_store::book::repository::memory::MemoryBookRepository;
use book_store::book::repository::BookRepository;
use book_store::book::service::BookService;
use book_store::routes;
use book_store::upload::{Rejection, UploadStore};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "book-store-boundary";
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

struct TestApp {
    router: Router,
    repository: Arc<MemoryBookRepository>,
    upload_dir: PathBuf,
}

fn upload_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("book-store-api-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn test_app(name: &str, rejection: Rejection, cleanup_on_delete: bool) -> TestApp {
    let repository = Arc::new(MemoryBookRepository::new());
    let upload_dir = upload_dir(name);
    let uploads = UploadStore::new(
        upload_dir.clone(),
        "uploads",
        &["image/png".to_owned(), "image/jpg".to_owned()],
        MAX_FILE_SIZE,
        rejection,
    );
    let service = BookService::new(repository.clone(), uploads)
        .with_cleanup_on_delete(cleanup_on_delete);

    TestApp { router: routes::router(service), repository, upload_dir }
}

fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, Vec<u8>)>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ).as_bytes());
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(format!(
            "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, file_name, content_type
        ).as_bytes());
        body.extend_from_slice(&bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/book/add")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn dune_fields() -> Vec<(&'static str, &'static str)> {
    vec![("book_name", "Dune"), ("author", "Herbert"), ("description", "Sci-fi")]
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method(Method::DELETE).uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, serde_json::from_slice(&bytes).unwrap())
}

fn stored_files(app: &TestApp) -> Vec<PathBuf> {
    std::fs::read_dir(&app.upload_dir).unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

async fn only_book_id(app: &TestApp) -> String {
    let books = app.repository.find_all().await.unwrap();
    assert_eq!(books.len(), 1);
    books[0].id.clone()
}

#[tokio::test]
async fn create_with_jpeg_stores_book_and_image() {
    let app = test_app("create", Rejection::Silent, false);

    let (status, body) = send(&app, multipart(&dune_fields(), Some(("dune.jpg", "image/jpeg", vec![1u8; 50 * 1024])))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book added"}));

    let (_, list) = send(&app, get("/book")).await;
    let books = list["data"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["book_name"], "Dune");
    let image = books[0]["image"].as_str().unwrap();
    assert!(image.starts_with("uploads/") && image.ends_with(".jpg"));

    let served = app.router.clone().oneshot(get(&format!("/{}", image))).await.unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.into_body().collect().await.unwrap().to_bytes().len(), 50 * 1024);
}

#[tokio::test]
async fn gif_is_dropped_silently_by_default() {
    let app = test_app("gif-silent", Rejection::Silent, false);

    let (status, body) = send(&app, multipart(&dune_fields(), Some(("cat.gif", "image/gif", vec![1u8; 64])))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book added"}));
    let id = only_book_id(&app).await;
    let (_, single) = send(&app, get(&format!("/book/single/{}", id))).await;
    assert!(single["data"].get("image").is_none());
    assert!(stored_files(&app).is_empty());
}

#[tokio::test]
async fn gif_fails_the_request_when_strict() {
    let app = test_app("gif-strict", Rejection::Strict, false);

    let (status, body) = send(&app, multipart(&dune_fields(), Some(("cat.gif", "image/gif", vec![1u8; 64])))).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body, json!({"message": "Only image of png and jpg are allowed"}));
    assert!(app.repository.is_empty());
}

#[tokio::test]
async fn oversized_image_creates_nothing() {
    let app = test_app("oversized", Rejection::Silent, false);
    let bytes = vec![1u8; MAX_FILE_SIZE as usize + 1];

    let (status, body) = send(&app, multipart(&dune_fields(), Some(("big.png", "image/png", bytes)))).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"message": "File too large"}));
    assert!(app.repository.is_empty());
    assert!(stored_files(&app).is_empty());
}

#[tokio::test]
async fn body_over_the_request_limit_is_too_large() {
    let app = test_app("over-body-limit", Rejection::Silent, false);
    let bytes = vec![1u8; 4 * 1024 * 1024];

    let (status, body) = send(&app, multipart(&dune_fields(), Some(("big.png", "image/png", bytes)))).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"message": "File too large"}));
    assert!(app.repository.is_empty());
    assert!(stored_files(&app).is_empty());
}

#[tokio::test]
async fn create_without_file_or_with_json_body() {
    let app = test_app("no-file", Rejection::Silent, false);

    let (_, from_form) = send(&app, multipart(&[("book_name", "Emma")], None)).await;
    let (_, from_json) = send(&app, json_request(Method::POST, "/book/add", json!({"book_name": "Persuasion"}))).await;

    assert_eq!(from_form, json!({"message": "Book added"}));
    assert_eq!(from_json, json!({"message": "Book added"}));
    let (_, list) = send(&app, get("/book/")).await;
    assert_eq!(list["data"][0]["book_name"], "Emma");
    assert_eq!(list["data"][1]["book_name"], "Persuasion");
    assert!(list["data"][0].get("author").is_none());
}

#[tokio::test]
async fn update_changes_text_fields_only() {
    let app = test_app("update", Rejection::Silent, false);
    send(&app, multipart(&dune_fields(), Some(("dune.png", "image/png", vec![1u8; 128])))).await;
    let id = only_book_id(&app).await;
    let (_, before) = send(&app, get(&format!("/book/single/{}", id))).await;

    let (status, body) = send(&app, json_request(
        Method::PUT,
        &format!("/book/update/{}", id),
        json!({"book_name": "Dune (revised)", "image": "uploads/other.png"}),
    )).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book updated"}));
    let (_, after) = send(&app, get(&format!("/book/single/{}", id))).await;
    assert_eq!(after["data"]["book_name"], "Dune (revised)");
    assert_eq!(after["data"]["author"], "Herbert");
    assert_eq!(after["data"]["image"], before["data"]["image"]);
}

#[tokio::test]
async fn show_and_single_share_one_lookup() {
    let app = test_app("show", Rejection::Silent, false);
    send(&app, multipart(&dune_fields(), None)).await;
    let id = only_book_id(&app).await;

    let (_, show) = send(&app, get(&format!("/book/show/{}", id))).await;
    let (_, single) = send(&app, get(&format!("/book/single/{}", id))).await;

    assert_eq!(show["response"]["_id"], id.as_str());
    assert_eq!(show["response"], single["data"]);
}

#[tokio::test]
async fn delete_keeps_the_uploaded_file() {
    let app = test_app("delete", Rejection::Silent, false);
    send(&app, multipart(&dune_fields(), Some(("dune.png", "image/png", vec![1u8; 128])))).await;
    let id = only_book_id(&app).await;

    let (status, body) = send(&app, delete(&format!("/book/destroy/{}", id))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book Deleted"}));
    let (_, single) = send(&app, get(&format!("/book/single/{}", id))).await;
    assert_eq!(single, json!({"data": null}));
    assert_eq!(stored_files(&app).len(), 1);
}

#[tokio::test]
async fn delete_with_cleanup_removes_the_uploaded_file() {
    let app = test_app("delete-cleanup", Rejection::Silent, true);
    send(&app, multipart(&dune_fields(), Some(("dune.png", "image/png", vec![1u8; 128])))).await;
    let id = only_book_id(&app).await;
    assert_eq!(stored_files(&app).len(), 1);

    let (_, body) = send(&app, delete(&format!("/book/destroy/{}", id))).await;

    assert_eq!(body, json!({"message": "Book Deleted"}));
    assert!(stored_files(&app).is_empty());
}

#[tokio::test]
async fn delete_of_missing_id_is_always_success() {
    let app = test_app("delete-missing", Rejection::Silent, false);

    let (status, body) = send(&app, delete("/book/destroy/65f1a2b3c4d5e6f708091a2b")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book Deleted"}));
}

#[tokio::test]
async fn malformed_id_answers_with_failure_message() {
    let app = test_app("malformed", Rejection::Silent, false);

    let (status, body) = send(&app, get("/book/show/123")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Failed to fetch the user"}));
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let app = test_app("empty", Rejection::Silent, false);

    let (status, body) = send(&app, get("/book")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": []}));
}

#[tokio::test]
async fn router_failures_are_json() {
    let app = test_app("router-failures", Rejection::Silent, false);

    let (status, body) = send(&app, get("/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Not found"}));

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/book/update/65f1a2b3c4d5e6f708091a2b")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"book_name\":"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Malformed payload"));
}
