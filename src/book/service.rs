use crate::book::repository::SharedBookRepository;
use crate::book::{Book, BookChanges, Error, NewBook};
use crate::upload::UploadStore;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const BOOK_ADDED: &str = "Book added";
pub const BOOK_UPDATED: &str = "Book updated";
pub const BOOK_DELETED: &str = "Book Deleted";

pub const ADD_FAILED: &str = "Failed to add the book";
pub const UPDATE_FAILED: &str = "Failed to update the book";
pub const SHOW_FAILED: &str = "Failed to fetch the user";
pub const SINGLE_FAILED: &str = "Failed to fetch book";
pub const DELETE_FAILED: &str = "Failed to delete book";
pub const LIST_FAILED: &str = "Failed to fetch books";

/// 처리된 실패를 HTTP 상태 코드로 표현하는 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusMode {
    /// 실패해도 항상 200으로 응답하고 본문의 메시지로만 실패를 알린다.
    #[default]
    Compat,

    /// 잘못된 아이디는 400, 없는 도서는 404, 저장소 에러는 500으로 응답한다.
    Semantic,
}

/// 모든 응답을 감싸는 JSON 객체로 `message`, `data`, `response` 중 하나의 키를 가진다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Message(String),
    Data(Payload),
    Response(Option<Book>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Many(Vec<Book>),
    One(Option<Book>),
}

impl Envelope {
    pub fn message(message: &str) -> Self {
        Envelope::Message(message.to_owned())
    }
}

/// 도서 서비스 연산의 결과
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl Reply {
    fn ok(envelope: Envelope) -> Self {
        Self { status: StatusCode::OK, envelope }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// 도서 서비스
///
/// # Description
/// 각 연산은 요청을 저장소 호출 한번으로 변환하고 JSON 응답을 만든다.
/// 저장소 에러는 모두 여기서 처리되며 라우터로 전파되지 않는다.
pub struct BookService {
    repository: SharedBookRepository,
    uploads: UploadStore,
    status_mode: StatusMode,
    cleanup_on_delete: bool,
}

impl BookService {
    pub fn new(repository: SharedBookRepository, uploads: UploadStore) -> Self {
        Self {
            repository,
            uploads,
            status_mode: StatusMode::default(),
            cleanup_on_delete: false,
        }
    }

    pub fn with_status_mode(mut self, mode: StatusMode) -> Self {
        self.status_mode = mode;
        self
    }

    /// 도서 삭제 시 업로드된 이미지도 함께 삭제할지 설정한다.
    pub fn with_cleanup_on_delete(mut self, cleanup: bool) -> Self {
        self.cleanup_on_delete = cleanup;
        self
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub fn status_mode(&self) -> StatusMode {
        self.status_mode
    }

    pub async fn create(&self, book: NewBook) -> Reply {
        match self.repository.new_book(&book).await {
            Ok(id) => {
                info!("Book added. (ID: {})", id);
                Reply::ok(Envelope::message(BOOK_ADDED))
            }
            Err(e) => {
                if let Some(image) = &book.image {
                    self.uploads.remove(image).await;
                }
                self.failure(ADD_FAILED, e)
            }
        }
    }

    pub async fn update(&self, id: &str, changes: BookChanges) -> Reply {
        match self.repository.update_book(id, &changes).await {
            Ok(Some(_)) => Reply::ok(Envelope::message(BOOK_UPDATED)),
            Ok(None) => self.missing(id, UPDATE_FAILED, Envelope::message(BOOK_UPDATED)),
            Err(e) => self.failure(UPDATE_FAILED, e),
        }
    }

    /// 아이디로 도서를 조회해 `response` 키로 응답한다.
    pub async fn show(&self, id: &str) -> Reply {
        match self.fetch(id).await {
            Ok(Some(book)) => Reply::ok(Envelope::Response(Some(book))),
            Ok(None) => self.missing(id, SHOW_FAILED, Envelope::Response(None)),
            Err(e) => self.failure(SHOW_FAILED, e),
        }
    }

    /// 아이디로 도서를 조회해 `data` 키로 응답한다.
    pub async fn single(&self, id: &str) -> Reply {
        match self.fetch(id).await {
            Ok(Some(book)) => Reply::ok(Envelope::Data(Payload::One(Some(book)))),
            Ok(None) => self.missing(id, SINGLE_FAILED, Envelope::Data(Payload::One(None))),
            Err(e) => self.failure(SINGLE_FAILED, e),
        }
    }

    pub async fn delete(&self, id: &str) -> Reply {
        match self.repository.delete_book(id).await {
            Ok(Some(book)) => {
                if self.cleanup_on_delete {
                    if let Some(image) = &book.image {
                        self.uploads.remove(image).await;
                    }
                }
                info!("Book deleted. (ID: {})", id);
                Reply::ok(Envelope::message(BOOK_DELETED))
            }
            Ok(None) => self.missing(id, DELETE_FAILED, Envelope::message(BOOK_DELETED)),
            Err(e) => self.failure(DELETE_FAILED, e),
        }
    }

    pub async fn list(&self) -> Reply {
        match self.repository.find_all().await {
            Ok(books) => Reply::ok(Envelope::Data(Payload::Many(books))),
            Err(e) => self.failure(LIST_FAILED, e),
        }
    }

    async fn fetch(&self, id: &str) -> Result<Option<Book>, Error> {
        self.repository.find_by_id(id).await
    }

    fn missing(&self, id: &str, message: &str, compat: Envelope) -> Reply {
        match self.status_mode {
            StatusMode::Compat => Reply::ok(compat),
            StatusMode::Semantic => self.failure(message, Error::NotFound(id.to_owned())),
        }
    }

    fn failure(&self, message: &str, e: Error) -> Reply {
        error!("{} => {}", message, e);

        let status = match self.status_mode {
            StatusMode::Compat => StatusCode::OK,
            StatusMode::Semantic => match e {
                Error::InvalidId(_) => StatusCode::BAD_REQUEST,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::StoreFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };

        Reply { status, envelope: Envelope::message(message) }
    }
}
