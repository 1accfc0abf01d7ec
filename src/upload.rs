use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// 파일 이름 충돌 시 타임스탬프를 증가 시키며 재시도할 최대 횟수
const MAX_NAME_ATTEMPTS: i64 = 100;

/// 업로드 중 발생한 에러 열거
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only image of png and jpg are allowed")]
    UnsupportedType(String),

    #[error("File too large")]
    TooLarge,

    #[error("Failed to read the upload: {0}")]
    Read(String),

    #[error("Failed to store the upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MultipartError> for UploadError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge
        } else {
            UploadError::Read(e.body_text())
        }
    }
}

/// 허용 되지 않은 형식의 파일을 받았을 때의 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rejection {
    /// 파일만 버리고 요청은 계속 처리한다.
    #[default]
    Silent,

    /// 요청 전체를 실패 처리한다.
    Strict,
}

/// 업로드된 표지 이미지를 로컬 디스크에 저장한다.
///
/// # Description
/// 파일은 `<dir>/<밀리초 타임스탬프><원본 확장자>`로 저장되며 다음 단계에는
/// `<public_prefix>/<파일명>` 형태의 상대 경로가 전달된다.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    public_prefix: String,
    allowed_types: Vec<String>,
    max_file_size: u64,
    rejection: Rejection,
}

impl UploadStore {
    pub fn new(
        dir: PathBuf,
        public_prefix: &str,
        allowed_types: &[String],
        max_file_size: u64,
        rejection: Rejection,
    ) -> Self {
        Self {
            dir,
            public_prefix: public_prefix.trim_matches('/').to_owned(),
            allowed_types: allowed_types.iter().map(|t| normalize_mime(t)).collect(),
            max_file_size,
            rejection,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// 요청 본문 최대 크기로 텍스트 필드를 위해 파일 최대 크기에 1MiB를 더한다.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_size)
            .unwrap_or(usize::MAX)
            .saturating_add(1024 * 1024)
    }

    pub fn is_allowed(&self, content_type: Option<&str>) -> bool {
        content_type
            .map(normalize_mime)
            .map(|mime| self.allowed_types.contains(&mime))
            .unwrap_or(false)
    }

    /// 업로드된 파일을 검사하고 저장한다.
    ///
    /// # Returns
    /// - `Ok(Some(path))`: 저장된 파일의 상대 경로
    /// - `Ok(None)`: 파일이 없거나, [`Rejection::Silent`] 정책에서 형식이 허용 되지 않아 버려짐
    /// - `Err(UploadError::UnsupportedType)`: [`Rejection::Strict`] 정책에서 형식이 허용 되지 않음
    /// - `Err(UploadError::TooLarge)`: 최대 크기를 넘음, 기록 중이던 파일은 삭제된다.
    pub async fn store<S, E>(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        chunks: S,
    ) -> Result<Option<String>, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<UploadError>,
    {
        if file_name.is_empty() {
            return Ok(None);
        }

        if !self.is_allowed(content_type) {
            let mime = content_type.unwrap_or_default().to_owned();
            return match self.rejection {
                Rejection::Silent => {
                    warn!("Only image of png and jpg are allowed. (file: {}, type: {})", file_name, mime);
                    Ok(None)
                }
                Rejection::Strict => Err(UploadError::UnsupportedType(mime)),
            };
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let (stored_name, mut file) = self.create_file(&extension_of(file_name)).await?;
        let path = self.dir.join(&stored_name);

        match copy_limited(&mut file, chunks, self.max_file_size).await {
            Ok(size) => {
                debug!("Upload stored. (path: {}, size: {})", path.display(), size);
                Ok(Some(format!("{}/{}", self.public_prefix, stored_name)))
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to remove partial upload {}: {}", path.display(), remove_err);
                }
                Err(e)
            }
        }
    }

    /// 저장된 이미지를 삭제한다. 파일이 이미 없으면 경고만 남긴다.
    pub async fn remove(&self, stored: &str) {
        let Some(name) = Path::new(stored).file_name() else {
            warn!("Not a stored image path: {}", stored);
            return;
        };
        let path = self.dir.join(name);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Upload removed. (path: {})", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => warn!("Upload already missing: {}", path.display()),
            Err(e) => warn!("Failed to remove upload {}: {}", path.display(), e),
        }
    }

    async fn create_file(&self, ext: &str) -> Result<(String, File), UploadError> {
        let millis = Utc::now().timestamp_millis();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = format!("{}{}", millis + attempt, ext);
            let opened = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&name))
                .await;

            match opened {
                Ok(file) => return Ok((name, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(UploadError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("No free upload name after {} attempts", MAX_NAME_ATTEMPTS),
        )))
    }
}

async fn copy_limited<S, E>(file: &mut File, chunks: S, limit: u64) -> Result<u64, UploadError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<UploadError>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut size: u64 = 0;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(Into::into)?;
        size += chunk.len() as u64;
        if size > limit {
            return Err(UploadError::TooLarge);
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(size)
}

/// MIME 타입을 비교할 수 있는 형태로 바꾼다. 파라미터는 제거되고 `image/jpeg`는 `image/jpg`로 취급한다.
pub fn normalize_mime(mime: &str) -> String {
    let essence = mime.split(';').next().unwrap_or_default().trim().to_lowercase();
    match essence.as_str() {
        "image/jpeg" => "image/jpg".to_owned(),
        _ => essence,
    }
}

/// 점을 포함한 원본 파일의 확장자, 확장자가 없으면 빈 문자열
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}
