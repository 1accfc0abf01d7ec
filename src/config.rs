mod database;
pub mod log;
mod upload;

use crate::book::service::StatusMode;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;
use std::env;

pub use database::{connect_to_mongo, Database};
pub use upload::Upload;

#[derive(Debug, Deserialize)]
pub struct Http {
    status_mode: StatusMode,
}

impl Http {
    pub fn status_mode(&self) -> StatusMode {
        self.status_mode
    }
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    host: String,
    port: u16,
    db: Database,
    upload: Upload,
    http: Http,
    logger: Option<log::Config>,
}

impl AppConfig {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn upload(&self) -> &Upload {
        &self.upload
    }

    pub fn http(&self) -> &Http {
        &self.http
    }

    pub fn logger(&self) -> Option<&log::Config> {
        self.logger.as_ref()
    }
}

/// 실행 환경에 따라 .env 파일을 로드한다.
pub fn load_dotenv() {
    let env_filename = env::var("RUN_MODE")
        .map(|env| format!(".env.{}", env))
        .unwrap_or_else(|_| ".env".into());

    dotenvy::from_filename(env_filename).ok();
}

/// 설정을 로드한다.
///
/// # Description
/// 기본값 위에 `config/<RUN_MODE>.json` 파일(없어도 무관)과 `APP_`으로 시작하는 환경 변수를 순서대로 덮어쓴다.
/// 중첩된 키는 `__`로 구분한다. (예: `APP_PORT`, `APP_DB__URL`)
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    let config = defaults()?
        .add_source(config::File::with_name(&format!("config/{}.json", env)).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("upload.allowed_types")
                .try_parsing(true),
        )
        .build()?;

    validate(config.try_deserialize()?)
}

/// 값의 형식만으로 확인할 수 없는 설정을 검사한다.
fn validate(config: AppConfig) -> Result<AppConfig, ConfigError> {
    if config.upload.public_prefix().trim_matches('/').is_empty() {
        return Err(ConfigError::Message("upload.public_prefix must not be empty".to_owned()));
    }

    Ok(config)
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", 5000)?
        .set_default("db.url", "mongodb://127.0.0.1:27017")?
        .set_default("db.name", "book_store")?
        .set_default("db.collection", "books")?
        .set_default("db.connect_retries", 5)?
        .set_default("db.retry_backoff_ms", 500)?
        .set_default("upload.dir", "uploads")?
        .set_default("upload.public_prefix", "uploads")?
        .set_default("upload.max_file_size", 2 * 1024 * 1024)?
        .set_default("upload.allowed_types", vec!["image/png", "image/jpg"])?
        .set_default("upload.rejection", "silent")?
        .set_default("upload.cleanup_on_delete", false)?
        .set_default("http.status_mode", "compat")
}
