use anyhow::Context as _;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Connection, Pool};

use crate::domain::repository::Cache;
use crate::error::AuthServiceError;

// KEYS[1] is removed only while it still holds ARGV[1].
const REMOVE_IF_EQ: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

#[derive(Clone)]
pub struct RedisCache {
    pub pool: Pool,
}

impl RedisCache {
    async fn conn(&self) -> Result<Connection, AuthServiceError> {
        self.pool
            .get()
            .await
            .context("redis pool checkout")
            .map_err(AuthServiceError::upstream)
    }

    /// Round-trip PING for readiness checks.
    pub async fn ping(&self) -> Result<(), AuthServiceError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("redis ping")
            .map_err(AuthServiceError::upstream)?;
        Ok(())
    }
}

impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthServiceError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .context("redis get")
            .map_err(AuthServiceError::upstream)?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AuthServiceError> {
        let mut conn = self.conn().await?;
        let (): () = conn
            .set_ex(key, value, ttl_secs)
            .await
            .context("redis set_ex")
            .map_err(AuthServiceError::upstream)?;
        Ok(())
    }

    async fn set_nx_ex(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<bool, AuthServiceError> {
        let mut conn = self.conn().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .context("redis set nx")
            .map_err(AuthServiceError::upstream)?;
        Ok(reply.is_some())
    }

    async fn remove_if_eq(&self, key: &str, expected: &str) -> Result<bool, AuthServiceError> {
        let mut conn = self.conn().await?;
        let removed: i64 = redis::cmd("EVAL")
            .arg(REMOVE_IF_EQ)
            .arg(1)
            .arg(key)
            .arg(expected)
            .query_async(&mut conn)
            .await
            .context("redis remove_if_eq")
            .map_err(AuthServiceError::upstream)?;
        Ok(removed == 1)
    }
}
