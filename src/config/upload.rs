use crate::upload::{Rejection, UploadStore};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Upload {
    /// 업로드 파일을 저장할 디렉토리
    dir: String,

    /// 정적 파일 경로 접두사로 저장된 이미지 경로는 `<public_prefix>/<파일명>`이 된다.
    public_prefix: String,

    max_file_size: u64,

    allowed_types: Vec<String>,

    rejection: Rejection,

    cleanup_on_delete: bool,
}

impl Upload {
    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    pub fn rejection(&self) -> Rejection {
        self.rejection
    }

    pub fn cleanup_on_delete(&self) -> bool {
        self.cleanup_on_delete
    }

    pub fn to_store(&self) -> UploadStore {
        UploadStore::new(
            PathBuf::from(&self.dir),
            &self.public_prefix,
            &self.allowed_types,
            self.max_file_size,
            self.rejection,
        )
    }
}
