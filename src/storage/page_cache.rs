//! Raw playlist pages already fetched from the radio, so a re-run of the
//! same day never goes back to the network.

use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{OptionalExtension, params};

use crate::{
    config::PageCacheConfig,
    storage::{
        db::{self, i64_seconds_to_local_time, system_time_to_i64},
        error::StorageError,
        schema::{columns::*, tables::*},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    pub body: String,
    pub fetched_at: DateTime<Local>,
}

pub struct PageCache {
    db: rusqlite::Connection,
}

impl PageCache {
    pub fn open(config: &PageCacheConfig) -> Result<Self, StorageError> {
        Ok(Self::from_existing_conn(db::open(config)?))
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::open(&PageCacheConfig {
            in_memory: true,
            path: None,
        })
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    pub fn get(&self, day: NaiveDate, page: u32) -> Result<Option<CachedPage>, StorageError> {
        let row: Option<(String, i64)> = self
            .db
            .query_row(
                &format!("SELECT {BODY}, {FETCHED_AT} FROM {PAGES} WHERE {DAY} = ?1 AND {PAGE} = ?2"),
                params![day_key(day), page],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((body, fetched_at)) = row else {
            return Ok(None);
        };
        Ok(Some(CachedPage {
            body,
            fetched_at: i64_seconds_to_local_time(fetched_at).map_err(StorageError::Internal)?,
        }))
    }

    pub fn put(&self, day: NaiveDate, page: u32, body: &str) -> Result<(), StorageError> {
        let now = system_time_to_i64(SystemTime::now()).map_err(StorageError::Internal)?;
        self.db.execute(
            &format!(
                "INSERT OR REPLACE INTO {PAGES} ({DAY}, {PAGE}, {BODY}, {FETCHED_AT}) VALUES (?1, ?2, ?3, ?4)"
            ),
            params![day_key(day), page, body, now],
        )?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        let n: i64 = self
            .db
            .query_row(&format!("SELECT COUNT(*) FROM {PAGES}"), [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
