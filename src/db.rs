use crate::error::KvError;
use crate::shards::{self, is_shard_name, shard_dir_name};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the database inside every shard directory.
pub const SHARD_DB_NAME: &str = "cache.db";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache (
    rowid INTEGER PRIMARY KEY,
    key TEXT NOT NULL UNIQUE,
    value TEXT NOT NULL,
    size INTEGER NOT NULL,
    store_time REAL NOT NULL,
    expire_time REAL,
    tag TEXT
);
CREATE INDEX IF NOT EXISTS cache_expire_time ON cache(expire_time) WHERE expire_time IS NOT NULL;
CREATE INDEX IF NOT EXISTS cache_tag ON cache(tag) WHERE tag IS NOT NULL;
"#;

const ENTRY_COLUMNS: &str = "key, value, size, store_time, expire_time, tag";

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Value,
    pub size: i64,
    pub store_time: DateTime<Utc>,
    pub expire_time: Option<DateTime<Utc>>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Seconds from now until the entry expires.
    pub expire: Option<f64>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkResult {
    pub written: u64,
    pub skipped: u64,
}

struct Shard {
    name: String,
    conn: Connection,
}

/// A key-value store fanned out over a fixed number of SQLite shards.
///
/// Layout: `<root>/<NNN>/cache.db`, one database per shard. A key always lands in the
/// same shard (SHA-256 of the key modulo the shard count), so the shard count must not
/// change once data has been written.
pub struct Store {
    root: PathBuf,
    shards: Vec<Shard>,
}

impl Store {
    /// Open the store at `root`.
    ///
    /// The shard directories already under `root` are used as they are, in numeric
    /// order, whatever their padding; `shard_count` only applies to a new store, whose
    /// shards are created as `000`, `001`, ...
    pub fn open(root: &Path, shard_count: u32, timeout: f64) -> Result<Self, KvError> {
        if shard_count == 0 {
            return Err(KvError::InvalidInput("shard count must be at least 1".into()));
        }
        let timeout = Duration::try_from_secs_f64(timeout)
            .map_err(|_| KvError::InvalidInput(format!("invalid timeout: {}", timeout)))?;

        let mut names = shards::discover(root)?;
        if names.is_empty() {
            names = (0..shard_count).map(shard_dir_name).collect();
        } else if names.len() != shard_count as usize {
            tracing::debug!(
                path = %root.display(),
                found = names.len(),
                requested = shard_count,
                "using the shards already on disk"
            );
        }

        let mut shards = Vec::with_capacity(names.len());
        for name in names {
            let dir = root.join(&name);
            fs::create_dir_all(&dir)?;

            let conn = Connection::open(dir.join(SHARD_DB_NAME))?;
            conn.busy_timeout(timeout)?;
            conn.execute_batch(SCHEMA)?;
            shards.push(Shard { name, conn });
        }

        tracing::debug!(path = %root.display(), shards = shards.len(), ?timeout, "opened store");

        Ok(Self {
            root: root.to_path_buf(),
            shards,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shard_count(&self) -> u32 {
        self.shards.len() as u32
    }

    fn shard_for(&self, key: &str) -> &Shard {
        let digest = Sha256::digest(key.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let index = u64::from_be_bytes(head) % self.shards.len() as u64;
        &self.shards[index as usize]
    }

    /// Total bytes used by all shard databases.
    pub fn volume(&self) -> Result<u64, KvError> {
        let mut total = 0u64;
        for shard in &self.shards {
            let pages: i64 = shard.conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
            let page_size: i64 = shard.conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
            total += (pages * page_size) as u64;
        }
        Ok(total)
    }

    /// Structural problems found in the store. With `fix`, size bookkeeping is
    /// repaired and every shard is vacuumed.
    pub fn check(&self, fix: bool) -> Result<Vec<String>, KvError> {
        let mut warnings = Vec::new();

        for shard in &self.shards {
            let problems = {
                let mut stmt = shard.conn.prepare("PRAGMA integrity_check")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            for message in problems.into_iter().filter(|m| m != "ok") {
                warnings.push(format!("shard {}: {}", shard.name, message));
            }

            let mismatched: i64 = shard.conn.query_row(
                "SELECT COUNT(*) FROM cache WHERE size != length(CAST(value AS BLOB))",
                [],
                |row| row.get(0),
            )?;
            if mismatched > 0 {
                warnings.push(format!(
                    "shard {}: {} entries with incorrect size",
                    shard.name, mismatched
                ));
                if fix {
                    shard.conn.execute(
                        "UPDATE cache SET size = length(CAST(value AS BLOB)) WHERE size != length(CAST(value AS BLOB))",
                        [],
                    )?;
                }
            }

            if fix {
                shard.conn.execute_batch("VACUUM")?;
            }
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_shard_name(&name) || !entry.path().is_dir() {
                continue;
            }
            if !self.shards.iter().any(|shard| shard.name == name) {
                warnings.push(format!(
                    "directory {} is not one of the {} shards of this store",
                    name,
                    self.shard_count()
                ));
            }
        }

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        Ok(warnings)
    }

    /// Remove every entry carrying `tag`.
    pub fn evict(&self, tag: &str) -> Result<u64, KvError> {
        let mut removed = 0u64;
        for shard in &self.shards {
            removed += shard.conn.execute("DELETE FROM cache WHERE tag = ?1", [tag])? as u64;
        }
        Ok(removed)
    }

    /// Remove every entry whose expire time has passed.
    pub fn expire(&self) -> Result<u64, KvError> {
        let now = epoch(Utc::now());
        let mut removed = 0u64;
        for shard in &self.shards {
            removed += shard.conn.execute(
                "DELETE FROM cache WHERE expire_time IS NOT NULL AND expire_time <= ?1",
                [now],
            )? as u64;
        }
        Ok(removed)
    }

    pub fn get(&self, key: &str) -> Result<Option<Entry>, KvError> {
        let sql = format!(
            "SELECT {} FROM cache WHERE key = ?1 AND (expire_time IS NULL OR expire_time > ?2)",
            ENTRY_COLUMNS
        );
        self.shard_for(key)
            .conn
            .query_row(&sql, params![key, epoch(Utc::now())], Self::row_to_entry)
            .optional()
            .map_err(Into::into)
    }

    pub fn contains(&self, key: &str) -> Result<bool, KvError> {
        let found: bool = self.shard_for(key).conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cache WHERE key = ?1 AND (expire_time IS NULL OR expire_time > ?2))",
            params![key, epoch(Utc::now())],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// Every live entry, ordered by key.
    pub fn items(&self) -> Result<Vec<Entry>, KvError> {
        let sql = format!(
            "SELECT {} FROM cache WHERE expire_time IS NULL OR expire_time > ?1",
            ENTRY_COLUMNS
        );
        self.collect(&sql, &[&epoch(Utc::now())])
    }

    pub fn len(&self) -> Result<u64, KvError> {
        let now = epoch(Utc::now());
        let mut total = 0u64;
        for shard in &self.shards {
            let count: i64 = shard.conn.query_row(
                "SELECT COUNT(*) FROM cache WHERE expire_time IS NULL OR expire_time > ?1",
                [now],
                |row| row.get(0),
            )?;
            total += count as u64;
        }
        Ok(total)
    }

    pub fn is_empty(&self) -> Result<bool, KvError> {
        Ok(self.len()? == 0)
    }

    /// Live entries whose key starts with `prefix`, ordered by key.
    pub fn starting_with(&self, prefix: &str) -> Result<Vec<Entry>, KvError> {
        let sql = format!(
            "SELECT {} FROM cache
             WHERE substr(key, 1, length(?1)) = ?1 AND (expire_time IS NULL OR expire_time > ?2)",
            ENTRY_COLUMNS
        );
        self.collect(&sql, &[&prefix, &epoch(Utc::now())])
    }

    fn collect(&self, sql: &str, args: &[&dyn ToSql]) -> Result<Vec<Entry>, KvError> {
        let mut entries = Vec::new();
        for shard in &self.shards {
            let mut stmt = shard.conn.prepare(sql)?;
            let rows = stmt.query_map(args, Self::row_to_entry)?;
            for row in rows {
                entries.push(row?);
            }
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        let text: String = row.get(1)?;
        let value = serde_json::from_str(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        let store_time: f64 = row.get(3)?;
        let expire_time: Option<f64> = row.get(4)?;

        Ok(Entry {
            key: row.get(0)?,
            value,
            size: row.get(2)?,
            store_time: from_epoch(store_time).unwrap_or_else(Utc::now),
            expire_time: expire_time.and_then(from_epoch),
            tag: row.get(5)?,
        })
    }

    /// Write `value` under `key`, replacing whatever was there.
    pub fn set(&self, key: &str, value: &Value, options: &WriteOptions) -> Result<(), KvError> {
        let (text, now, expire_time) = Self::encode(value, options)?;
        self.shard_for(key).conn.execute(
            "INSERT INTO cache (key, value, size, store_time, expire_time, tag)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                size = excluded.size,
                store_time = excluded.store_time,
                expire_time = excluded.expire_time,
                tag = excluded.tag",
            params![key, text, text.len() as i64, now, expire_time, options.tag],
        )?;
        Ok(())
    }

    /// Write `value` only if `key` holds no live entry. An expired entry is replaced.
    pub fn add(&self, key: &str, value: &Value, options: &WriteOptions) -> Result<(), KvError> {
        let (text, now, expire_time) = Self::encode(value, options)?;
        let changed = self.shard_for(key).conn.execute(
            "INSERT INTO cache (key, value, size, store_time, expire_time, tag)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                size = excluded.size,
                store_time = excluded.store_time,
                expire_time = excluded.expire_time,
                tag = excluded.tag
             WHERE cache.expire_time IS NOT NULL AND cache.expire_time <= ?4",
            params![key, text, text.len() as i64, now, expire_time, options.tag],
        )?;
        if changed == 0 {
            return Err(KvError::KeyExists(key.to_string()));
        }
        Ok(())
    }

    fn encode(value: &Value, options: &WriteOptions) -> Result<(String, f64, Option<f64>), KvError> {
        // SQLite stores a NaN REAL as NULL, which would read back as "never expires"
        if let Some(secs) = options.expire.filter(|secs| !secs.is_finite()) {
            return Err(KvError::InvalidInput(format!("expire must be a finite number of seconds: {}", secs)));
        }
        let now = epoch(Utc::now());
        Ok((value.to_string(), now, options.expire.map(|secs| now + secs)))
    }

    /// One write per pair. With `add`, keys that already hold a live entry are skipped.
    pub fn set_from_dict(&self, pairs: &[(String, Value)], add: bool) -> Result<BulkResult, KvError> {
        let options = WriteOptions::default();
        let mut result = BulkResult::default();
        for (key, value) in pairs {
            if add {
                match self.add(key, value, &options) {
                    Ok(()) => result.written += 1,
                    Err(KvError::KeyExists(_)) => result.skipped += 1,
                    Err(e) => return Err(e),
                }
            } else {
                self.set(key, value, &options)?;
                result.written += 1;
            }
        }
        Ok(result)
    }

    pub fn delete(&self, key: &str) -> Result<(), KvError> {
        let removed = self
            .shard_for(key)
            .conn
            .execute("DELETE FROM cache WHERE key = ?1", [key])?;
        if removed == 0 {
            return Err(KvError::KeyNotFound(key.to_string()));
        }
        Ok(())
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<u64, KvError> {
        let mut removed = 0u64;
        for shard in &self.shards {
            removed += shard.conn.execute("DELETE FROM cache", [])? as u64;
        }
        Ok(removed)
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn clear_keys(&self, prefix: &str) -> Result<u64, KvError> {
        let mut removed = 0u64;
        for shard in &self.shards {
            removed += shard
                .conn
                .execute("DELETE FROM cache WHERE substr(key, 1, length(?1)) = ?1", [prefix])?
                as u64;
        }
        Ok(removed)
    }
}

fn epoch(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

fn from_epoch(secs: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
}
