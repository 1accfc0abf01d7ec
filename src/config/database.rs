use mongodb::bson::doc;
use mongodb::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
pub struct Database {
    url: String,
    name: String,
    collection: String,

    /// 시작 시 연결 확인(ping)을 시도할 횟수
    connect_retries: u32,

    /// 첫 재시도 전 대기 시간으로 재시도 때마다 두 배가 된다.
    retry_backoff_ms: u64,
}

impl Database {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn connect_retries(&self) -> u32 {
        self.connect_retries
    }

    pub fn retry_backoff_ms(&self) -> u64 {
        self.retry_backoff_ms
    }
}

/// MongoDB 클라이언트를 생성하고 연결을 확인한다.
///
/// 연결 문자열이 잘못된 경우에만 에러를 반환한다. 모든 재시도가 실패해도 클라이언트는 그대로 반환되며
/// 이후 요청들은 저장소 에러로 처리된다.
pub async fn connect_to_mongo(db: &Database) -> Result<Client, mongodb::error::Error> {
    let client = Client::with_uri_str(db.url()).await?;
    let attempts = db.connect_retries().max(1);
    let mut backoff = Duration::from_millis(db.retry_backoff_ms());

    for attempt in 1..=attempts {
        match client.database(db.name()).run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                info!("Database connected. (database: {})", db.name());
                return Ok(client);
            }
            Err(e) if attempt < attempts => {
                warn!("Database ping failed, retrying in {:?}. ({}/{}) => {}", backoff, attempt, attempts, e);
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => error!("Failed to connect to database after {} attempts => {}", attempts, e),
        }
    }

    Ok(client)
}
