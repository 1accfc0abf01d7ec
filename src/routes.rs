use crate::book::service::{BookService, Reply};
use crate::book::{BookChanges, NewBook};
use crate::error::AppError;
use crate::upload::UploadStore;
use axum::body::Bytes;
use axum::extract::multipart::Multipart;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub type AppState = Arc<BookService>;

/// 도서 API 라우터를 만든다.
///
/// 도서 API는 `/book` 아래에, 업로드된 이미지는 `/<public_prefix>` 아래에 제공된다.
pub fn router(service: BookService) -> Router {
    let body_limit = service.uploads().body_limit();
    let static_path = format!("/{}", service.uploads().public_prefix());
    let static_files = ServeDir::new(service.uploads().dir());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/book", get(list_handler))
        .route("/book/", get(list_handler))
        .route("/book/add", post(create_handler))
        .route("/book/update/{id}", put(update_handler))
        .route("/book/show/{id}", get(show_handler))
        .route("/book/single/{id}", get(single_handler))
        .route("/book/destroy/{id}", delete(delete_handler))
        .nest_service(&static_path, static_files)
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(service))
}

pub async fn list_handler(State(service): State<AppState>) -> Reply {
    service.list().await
}

/// 도서를 등록한다. `multipart/form-data`이면 `image` 파트를 업로드 핸들러로 먼저 처리하고,
/// 그 외에는 본문을 JSON으로 읽는다.
pub async fn create_handler(State(service): State<AppState>, request: Request) -> Result<Reply, AppError> {
    let book = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &service).await
            .map_err(|r| AppError::Rejected(r.status(), r.body_text()))?;

        read_multipart(service.uploads(), multipart).await?
    } else {
        let body = Bytes::from_request(request, &service).await
            .map_err(|r| AppError::Rejected(r.status(), r.body_text()))?;

        parse_body::<NewBook>(&body)?
    };

    Ok(service.create(book).await)
}

pub async fn update_handler(
    State(service): State<AppState>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Reply, AppError> {
    let body = body.map_err(|r| AppError::Rejected(r.status(), r.body_text()))?;
    let changes = parse_body::<BookChanges>(&body)?;

    Ok(service.update(&id, changes).await)
}

pub async fn show_handler(State(service): State<AppState>, Path(id): Path<String>) -> Reply {
    service.show(&id).await
}

pub async fn single_handler(State(service): State<AppState>, Path(id): Path<String>) -> Reply {
    service.single(&id).await
}

pub async fn delete_handler(State(service): State<AppState>, Path(id): Path<String>) -> Reply {
    service.delete(&id).await
}

pub async fn not_found_handler() -> AppError {
    AppError::NotFound
}

fn is_multipart(request: &Request) -> bool {
    request.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// 빈 본문은 아무 항목도 전달되지 않은 것으로 취급한다.
fn parse_body<T>(body: &Bytes) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| AppError::MalformedPayload(e.to_string()))
}

/// 멀티파트 본문에서 도서 정보와 표지 이미지를 읽는다.
///
/// 첫번째 `image` 파트만 업로드 대상이다. 도중에 실패하면 이미 저장한 이미지는 삭제된다.
async fn read_multipart(uploads: &UploadStore, mut multipart: Multipart) -> Result<NewBook, AppError> {
    let mut book = NewBook::default();
    let mut image_seen = false;

    let result: Result<(), AppError> = async {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "book_name" => book.book_name = Some(field.text().await?),
                "author" => book.author = Some(field.text().await?),
                "description" => book.description = Some(field.text().await?),
                "image" if !image_seen => {
                    image_seen = true;
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let content_type = field.content_type().map(str::to_owned);
                    book.image = uploads.store(&file_name, content_type.as_deref(), field).await?;
                }
                _ => {}
            }
        }
        Ok(())
    }.await;

    if let Err(e) = result {
        if let Some(image) = &book.image {
            uploads.remove(image).await;
        }
        return Err(e);
    }

    Ok(book)
}
