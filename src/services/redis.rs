//! Redis service holding per-session visit counters

use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

/// Visit counters expire after 30 days without a visit
const VISITS_TTL_SECONDS: i64 = 30 * 24 * 3600;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service and check the server answers
    pub async fn new(url: &str) -> AppResult<Self> {
        let service = Self::open(url)?;

        let mut conn = service.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(service)
    }

    /// Create the client without connecting; connections are made on first use
    pub fn open(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    /// Count one more visit for a session and return the new total
    pub async fn increment_visits(&self, session_id: &str) -> AppResult<i64> {
        let mut conn = self.connection().await?;

        let key = visits_key(session_id);
        let visits: i64 = conn
            .incr(&key, 1)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count visit in Redis: {}", e)))?;
        conn.expire::<_, ()>(&key, VISITS_TTL_SECONDS)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to set visit expiry in Redis: {}", e)))?;

        Ok(visits)
    }
}

fn visits_key(session_id: &str) -> String {
    format!("visits:{}", session_id)
}
