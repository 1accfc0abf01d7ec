use crate::book::Book;
use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub mod view;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    InvalidBaseUrl(String),
    InvalidFile(String),
    RequestFailed(String),
    ResponseParseFailed(String),

    /// 서버가 처리에 실패하고 메시지만 돌려줌
    Rejected(String),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidBaseUrl(url) => write!(f, "Invalid base url: {}", url),
            ClientError::InvalidFile(message) => write!(f, "Invalid file: {}", message),
            ClientError::RequestFailed(message) => write!(f, "Request failed: {}", message),
            ClientError::ResponseParseFailed(message) => write!(f, "Failed to parse response: {}", message),
            ClientError::Rejected(message) => write!(f, "Rejected by server: {}", message),
        }
    }
}

impl std::error::Error for ClientError {}

/// 서버 응답 JSON으로 `data`, `response`, `message` 중 하나만 채워진다.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    response: Option<T>,

    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_message(self) -> String {
        self.message.unwrap_or_default()
    }
}

/// 도서 등록 폼으로 입력하지 않은 항목은 빈 문자열로 전송된다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddForm {
    pub book_name: String,
    pub author: String,
    pub description: String,
}

/// 도서 수정 폼
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateForm {
    pub book_name: String,
    pub author: String,
    pub description: String,
}

impl UpdateForm {
    /// 현재 도서 정보로 폼을 채운다. 이미지는 수정 대상이 아니다.
    pub fn from_book(book: &Book) -> Self {
        Self {
            book_name: book.book_name.clone().unwrap_or_default(),
            author: book.author.clone().unwrap_or_default(),
            description: book.description.clone().unwrap_or_default(),
        }
    }

    pub fn apply(mut self, book_name: Option<String>, author: Option<String>, description: Option<String>) -> Self {
        if let Some(book_name) = book_name {
            self.book_name = book_name;
        }
        if let Some(author) = author {
            self.author = author;
        }
        if let Some(description) = description {
            self.description = description;
        }
        self
    }
}

/// 도서 API 클라이언트
pub struct ApiClient {
    base_url: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|_| ClientError::InvalidBaseUrl(base_url.to_owned()))?;
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// 저장된 이미지의 상대 경로를 접근 가능한 URL로 바꾼다.
    pub fn image_url(&self, image: &str) -> String {
        format!("{}/{}", self.base_url(), image.trim_start_matches('/'))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/book{}", self.base_url(), path)
    }

    pub fn list(&self) -> Result<Vec<Book>, ClientError> {
        let envelope: Envelope<Vec<Book>> = parse(self.client.get(self.endpoint("")).send())?;

        match envelope.data {
            Some(books) => Ok(books),
            None => Err(ClientError::Rejected(envelope.into_message())),
        }
    }

    pub fn single(&self, id: &str) -> Result<Option<Book>, ClientError> {
        let envelope: Envelope<Book> = parse(self.client.get(self.endpoint(&format!("/single/{}", id))).send())?;

        match (envelope.data, envelope.message) {
            (_, Some(message)) => Err(ClientError::Rejected(message)),
            (book, None) => Ok(book),
        }
    }

    pub fn show(&self, id: &str) -> Result<Option<Book>, ClientError> {
        let envelope: Envelope<Book> = parse(self.client.get(self.endpoint(&format!("/show/{}", id))).send())?;

        match (envelope.response, envelope.message) {
            (_, Some(message)) => Err(ClientError::Rejected(message)),
            (book, None) => Ok(book),
        }
    }

    pub fn add(&self, form: &AddForm, image: Option<&Path>) -> Result<String, ClientError> {
        let mut multipart = Form::new()
            .text("book_name", form.book_name.clone())
            .text("author", form.author.clone())
            .text("description", form.description.clone());

        if let Some(image) = image {
            multipart = multipart.file("image", image)
                .map_err(|e| ClientError::InvalidFile(format!("{}: {}", image.display(), e)))?;
        }

        let envelope: Envelope<()> = parse(self.client.post(self.endpoint("/add")).multipart(multipart).send())?;
        Ok(envelope.into_message())
    }

    pub fn update(&self, id: &str, form: &UpdateForm) -> Result<String, ClientError> {
        let request = self.client.put(self.endpoint(&format!("/update/{}", id))).json(form);

        let envelope: Envelope<()> = parse(request.send())?;
        Ok(envelope.into_message())
    }

    pub fn delete(&self, id: &str) -> Result<String, ClientError> {
        let envelope: Envelope<()> = parse(self.client.delete(self.endpoint(&format!("/destroy/{}", id))).send())?;
        Ok(envelope.into_message())
    }
}

fn parse<T>(result: reqwest::Result<Response>) -> Result<Envelope<T>, ClientError>
where
    T: DeserializeOwned,
{
    let response = result.map_err(|e| ClientError::RequestFailed(e.to_string()))?;
    let status = response.status();

    if !status.is_success() {
        let message = response.json::<Envelope<serde_json::Value>>()
            .map(|e| e.into_message())
            .unwrap_or_default();
        return Err(ClientError::Rejected(format!("{} {}", status, message)));
    }

    response.json::<Envelope<T>>()
        .map_err(|e| ClientError::ResponseParseFailed(e.to_string()))
}
