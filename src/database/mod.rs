use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serenity::prelude::TypeMapKey;

pub mod engagement;
pub mod users;

/// Thin wrapper around the shared key-value store. All documents are JSON
/// strings; malformed documents are rejected at this boundary and treated
/// as missing rather than propagated into the business logic.
#[derive(Clone)]
pub struct Database {
    con: ConnectionManager,
}

impl Database {
    pub async fn new() -> Database {
        let url = std::env::var("REDIS_URL").expect("Expected REDIS_URL in the environment");
        let client = redis::Client::open(url).expect("Invalid REDIS_URL");
        let con = client
            .get_connection_manager()
            .await
            .expect("Failed to connect to the store");
        Self { con }
    }

    fn con(&self) -> ConnectionManager {
        self.con.clone()
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, anyhow::Error> {
        let raw: Option<String> = self.con().get(key).await?;
        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str(&raw) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                warn!("Discarding malformed document at {}: {}", key, e);
                Ok(None)
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), anyhow::Error> {
        let raw = serde_json::to_string(value)?;
        self.con().set::<_, _, ()>(key, raw).await?;
        Ok(())
    }

    pub async fn set_json_ex<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        expiry_secs: u64,
    ) -> Result<(), anyhow::Error> {
        let raw = serde_json::to_string(value)?;
        self.con().set_ex::<_, _, ()>(key, raw, expiry_secs).await?;
        Ok(())
    }

    pub async fn get_string(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        Ok(self.con().get(key).await?)
    }

    pub async fn set_string(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        self.con().set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), anyhow::Error> {
        self.con().del::<_, ()>(key).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, anyhow::Error> {
        Ok(self.con().exists(key).await?)
    }

    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, anyhow::Error> {
        Ok(self.con().keys(pattern).await?)
    }

    pub async fn set_members(&self, key: &str) -> Result<Vec<String>, anyhow::Error> {
        Ok(self.con().smembers(key).await?)
    }

    /// Atomic increment with a refreshed expiry. The increment itself is
    /// atomic; callers doing check-then-increment accept the race.
    pub async fn incr_with_expiry(
        &self,
        key: &str,
        expiry_secs: i64,
    ) -> Result<u32, anyhow::Error> {
        let mut con = self.con();
        let count: u32 = con.incr(key, 1u32).await?;
        con.expire::<_, ()>(key, expiry_secs).await?;
        Ok(count)
    }

    pub async fn get_counter(&self, key: &str) -> Result<u32, anyhow::Error> {
        let value: Option<u32> = self.con().get(key).await?;
        Ok(value.unwrap_or(0))
    }

    pub async fn sorted_set_add(
        &self,
        key: &str,
        member: &str,
        score: i64,
    ) -> Result<(), anyhow::Error> {
        self.con().zadd::<_, _, _, ()>(key, member, score).await?;
        Ok(())
    }

    /// Members of a sorted set, highest score first. Asking for zero
    /// members yields an empty list rather than a ZREVRANGE over 0..0.
    pub async fn sorted_set_newest(
        &self,
        key: &str,
        count: usize,
    ) -> Result<Vec<String>, anyhow::Error> {
        let stop = match newest_stop_index(count) {
            Some(stop) => stop,
            None => return Ok(Vec::new()),
        };
        Ok(self.con().zrevrange(key, 0, stop).await?)
    }
}

/// Inclusive stop index for a newest-first range of `count` members, or
/// `None` when the range is empty.
fn newest_stop_index(count: usize) -> Option<isize> {
    if count == 0 {
        None
    } else {
        Some(count as isize - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::newest_stop_index;

    #[test]
    fn zero_count_asks_for_nothing() {
        assert_eq!(newest_stop_index(0), None);
    }

    #[test]
    fn stop_index_is_inclusive() {
        assert_eq!(newest_stop_index(1), Some(0));
        assert_eq!(newest_stop_index(10), Some(9));
    }
}

impl TypeMapKey for Database {
    type Value = Arc<Database>;
}
