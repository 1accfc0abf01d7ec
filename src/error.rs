use crate::book::service::Envelope;
use crate::upload::UploadError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::warn;

/// 도서 서비스에 도달하기 전 라우터 단계에서 실패한 요청
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Malformed multipart body: {0}")]
    Multipart(MultipartError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("{1}")]
    Rejected(StatusCode, String),

    #[error("Not found")]
    NotFound,
}

/// 본문 크기 제한을 넘은 경우는 업로드 파일이 너무 큰 것으로 본다.
impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Upload(UploadError::TooLarge)
        } else {
            AppError::Multipart(e)
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Upload(UploadError::UnsupportedType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Upload(UploadError::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upload(UploadError::Read(_)) => StatusCode::BAD_REQUEST,
            AppError::Upload(UploadError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Rejected(status, _) => *status,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("Request failed with {} => {}", status, self);

        (status, Json(Envelope::Message(self.to_string()))).into_response()
    }
}
