//! SQLx-based key record repository
//!
//! Persists encrypted key records in the `key_records` table

use async_trait::async_trait;
use tracing::info;

use keygen_core::{Error, KeyRecord, KeyRecordStore, Result};

use crate::database::connection::DatabasePool;

const EXISTS_QUERY: &str = "SELECT 1 FROM key_records WHERE user_id = $1 AND network = $2 LIMIT 1";

const GET_QUERY: &str = r#"
    SELECT address, public_key, encrypted_private_key
    FROM key_records
    WHERE user_id = $1 AND network = $2
"#;

const UPSERT_QUERY: &str = r#"
    INSERT INTO key_records (user_id, network, address, public_key, encrypted_private_key)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (user_id, network) DO UPDATE SET
        address = excluded.address,
        public_key = excluded.public_key,
        encrypted_private_key = excluded.encrypted_private_key
"#;

const UNIQUE_INDEX_QUERY: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_key_records_user_network ON key_records (user_id, network)";

/// SQLx-based key record repository implementation
pub struct SqlxKeyRecordRepository {
    pool: DatabasePool,
}

impl SqlxKeyRecordRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

/// Both backends store ids as signed 64-bit integers
fn to_db_id(user_id: u64) -> Result<i64> {
    i64::try_from(user_id)
        .map_err(|_| Error::InvalidInput(format!("userId {} exceeds the storable range", user_id)))
}

/// Stored columns of a key record
#[derive(sqlx::FromRow)]
struct KeyRecordRow {
    address: String,
    public_key: String,
    encrypted_private_key: String,
}

impl KeyRecordRow {
    fn into_record(self, user_id: u64, network: &str) -> KeyRecord {
        KeyRecord {
            user_id,
            network: network.to_string(),
            address: self.address,
            public_key: self.public_key,
            encrypted_private_key: self.encrypted_private_key,
        }
    }
}

#[async_trait]
impl KeyRecordStore for SqlxKeyRecordRepository {
    async fn exists(&self, user_id: u64, network: &str) -> Result<bool> {
        let id = to_db_id(user_id)?;

        let found = match &self.pool {
            DatabasePool::Postgres(pool) => sqlx::query(EXISTS_QUERY)
                .bind(id)
                .bind(network)
                .fetch_optional(pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to check key record: {}", e)))?
                .is_some(),
            DatabasePool::Sqlite(pool) => sqlx::query(EXISTS_QUERY)
                .bind(id)
                .bind(network)
                .fetch_optional(pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to check key record: {}", e)))?
                .is_some(),
        };

        Ok(found)
    }

    async fn get(&self, user_id: u64, network: &str) -> Result<KeyRecord> {
        let id = to_db_id(user_id)?;
        let not_found = || Error::NotFound {
            user_id,
            network: network.to_string(),
        };

        match &self.pool {
            DatabasePool::Postgres(pool) => {
                let row = sqlx::query_as::<_, KeyRecordRow>(GET_QUERY)
                    .bind(id)
                    .bind(network)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| Error::Storage(format!("Failed to fetch key record: {}", e)))?
                    .ok_or_else(not_found)?;
                Ok(row.into_record(user_id, network))
            }
            DatabasePool::Sqlite(pool) => {
                let row = sqlx::query_as::<_, KeyRecordRow>(GET_QUERY)
                    .bind(id)
                    .bind(network)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| Error::Storage(format!("Failed to fetch key record: {}", e)))?
                    .ok_or_else(not_found)?;
                Ok(row.into_record(user_id, network))
            }
        }
    }

    async fn upsert(&self, record: &KeyRecord) -> Result<()> {
        let id = to_db_id(record.user_id)?;

        match &self.pool {
            DatabasePool::Postgres(pool) => {
                sqlx::query(UPSERT_QUERY)
                    .bind(id)
                    .bind(&record.network)
                    .bind(&record.address)
                    .bind(&record.public_key)
                    .bind(&record.encrypted_private_key)
                    .execute(pool)
                    .await
                    .map_err(|e| Error::Storage(format!("Failed to save key record: {}", e)))?;
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query(UPSERT_QUERY)
                    .bind(id)
                    .bind(&record.network)
                    .bind(&record.address)
                    .bind(&record.public_key)
                    .bind(&record.encrypted_private_key)
                    .execute(pool)
                    .await
                    .map_err(|e| Error::Storage(format!("Failed to save key record: {}", e)))?;
            }
        }

        Ok(())
    }

    async fn ensure_unique_index(&self) -> Result<()> {
        match &self.pool {
            DatabasePool::Postgres(pool) => {
                sqlx::query(UNIQUE_INDEX_QUERY)
                    .execute(pool)
                    .await
                    .map_err(|e| Error::Storage(format!("Failed to create unique index: {}", e)))?;
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query(UNIQUE_INDEX_QUERY)
                    .execute(pool)
                    .await
                    .map_err(|e| Error::Storage(format!("Failed to create unique index: {}", e)))?;
            }
        }

        info!(backend = self.pool.backend(), "Unique index on (user_id, network) ensured");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        self.pool.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_range() {
        assert_eq!(to_db_id(1).unwrap(), 1);
        assert_eq!(to_db_id(i64::MAX as u64).unwrap(), i64::MAX);
        assert!(matches!(to_db_id(u64::MAX), Err(Error::InvalidInput(_))));
    }
}
