use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt;
use std::fmt::{Display, Formatter};

pub mod repository;
pub mod service;

/// 도서 저장소 사용 중 발생한 에러 열거
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 저장소에서 사용할 수 없는 형식의 아이디
    InvalidId(String),

    /// 아이디에 해당하는 도서가 없음
    NotFound(String),

    /// 저장소 연결 혹은 쿼리 실행 중 에러가 발생함
    StoreFailed(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidId(id) => write!(f, "Invalid book id: {}", id),
            Error::NotFound(id) => write!(f, "Book not found: {}", id),
            Error::StoreFailed(message) => write!(f, "Store failed: {}", message),
        }
    }
}

impl std::error::Error for Error {}

/// 도서 정보
///
/// # Description
/// 저장소에 저장된 도서 한 권을 나타내며 클라이언트에 JSON으로 그대로 전달된다.
/// 값이 없는 항목은 JSON에서 생략된다.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// 저장소에서 생성한 아이디 (24자리 16진수)
    #[serde(rename = "_id")]
    pub id: String,

    pub book_name: Option<String>,

    pub author: Option<String>,

    pub description: Option<String>,

    /// 업로드된 표지 이미지의 상대 경로 (예: `uploads/1700000000000.png`)
    ///
    /// # Note
    /// 도서 등록 시에만 설정되며 수정 요청으로는 변경되지 않는다.
    pub image: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 새로 등록할 도서
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewBook {
    pub book_name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,

    #[serde(skip)]
    pub image: Option<String>,
}

/// 도서 수정 요청
///
/// 이미지는 수정 대상이 아니므로 필드가 없다. 요청 본문에 `image`가 포함되어 있어도 무시된다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookChanges {
    pub book_name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.book_name.is_none() && self.author.is_none() && self.description.is_none()
    }

    /// 변경 사항을 도서에 적용한다. 전달되지 않은 항목은 기존 값을 유지한다.
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(book_name) = &self.book_name {
            book.book_name = Some(book_name.clone());
        }
        if let Some(author) = &self.author {
            book.author = Some(author.clone());
        }
        if let Some(description) = &self.description {
            book.description = Some(description.clone());
        }
    }
}
