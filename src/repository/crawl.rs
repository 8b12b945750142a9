//! Crawl state repository.
//!
//! Tracks discovered URLs through their fetch lifecycle and keeps a log
//! of every request for debugging polite-crawling behavior.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, Row};

use super::{parse_datetime, parse_datetime_opt, OptionalExt, Result};
use crate::models::{CrawlUrl, DiscoveryMethod, RequestLog, UrlStatus};

/// Retries before a URL is marked failed for good.
const MAX_RETRIES: u32 = 2;

/// Per-source crawl counters.
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    pub discovered: u64,
    pub fetched: u64,
    pub failed: u64,
    pub skipped: u64,
    pub requests: u64,
}

/// SQLite-backed crawl state repository.
pub struct CrawlRepository {
    db_path: PathBuf,
}

impl CrawlRepository {
    /// Create a new crawl repository.
    pub fn new(db_path: &Path) -> Result<Self> {
        let repo = Self {
            db_path: db_path.to_path_buf(),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    fn connect(&self) -> Result<Connection> {
        super::connect(&self.db_path)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS crawl_urls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                source_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'discovered',
                discovery_method TEXT NOT NULL DEFAULT 'seed',
                parent_url TEXT,
                depth INTEGER NOT NULL DEFAULT 0,
                discovered_at TEXT NOT NULL,
                fetched_at TEXT,
                retry_count INTEGER NOT NULL DEFAULT 0,
                last_error TEXT,
                etag TEXT,
                last_modified TEXT,
                content_hash TEXT,
                UNIQUE(source_id, url)
            );

            CREATE TABLE IF NOT EXISTS crawl_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id TEXT NOT NULL,
                url TEXT NOT NULL,
                method TEXT NOT NULL,
                status INTEGER,
                duration_ms INTEGER,
                response_size INTEGER,
                error TEXT,
                was_conditional INTEGER NOT NULL DEFAULT 0,
                was_not_modified INTEGER NOT NULL DEFAULT 0,
                requested_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_crawl_urls_status
                ON crawl_urls(source_id, status);
        "#,
        )?;
        Ok(())
    }

    fn row_to_url(row: &Row<'_>) -> rusqlite::Result<CrawlUrl> {
        Ok(CrawlUrl {
            id: row.get("id")?,
            url: row.get("url")?,
            source_id: row.get("source_id")?,
            status: UrlStatus::parse(&row.get::<_, String>("status")?)
                .unwrap_or(UrlStatus::Discovered),
            discovery_method: DiscoveryMethod::parse(
                &row.get::<_, String>("discovery_method")?,
            )
            .unwrap_or(DiscoveryMethod::Seed),
            parent_url: row.get("parent_url")?,
            depth: row.get("depth")?,
            discovered_at: parse_datetime(&row.get::<_, String>("discovered_at")?),
            fetched_at: parse_datetime_opt(row.get::<_, Option<String>>("fetched_at")?),
            retry_count: row.get("retry_count")?,
            last_error: row.get("last_error")?,
            etag: row.get("etag")?,
            last_modified: row.get("last_modified")?,
            content_hash: row.get("content_hash")?,
        })
    }

    /// Add discovered URLs, ignoring ones already tracked.
    /// Returns the number of new rows.
    pub fn add_urls(&self, urls: &[CrawlUrl]) -> Result<u64> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut added = 0u64;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO crawl_urls
                    (url, source_id, status, discovery_method, parent_url, depth, discovered_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for url in urls {
                added += stmt.execute(params![
                    url.url,
                    url.source_id,
                    url.status.as_str(),
                    url.discovery_method.as_str(),
                    url.parent_url,
                    url.depth,
                    url.discovered_at.to_rfc3339(),
                ])? as u64;
            }
        }
        tx.commit()?;
        Ok(added)
    }

    /// URLs ready to fetch for a source, oldest first.
    ///
    /// With `include_fetched`, already-fetched URLs are returned too so a
    /// refresh run can re-check them with conditional requests.
    pub fn pending(
        &self,
        source_id: &str,
        limit: Option<u32>,
        include_fetched: bool,
    ) -> Result<Vec<CrawlUrl>> {
        let conn = self.connect()?;
        let sql = if include_fetched {
            "SELECT * FROM crawl_urls
             WHERE source_id = ?1 AND status IN ('discovered', 'fetched')
             ORDER BY discovered_at, id LIMIT ?2"
        } else {
            "SELECT * FROM crawl_urls
             WHERE source_id = ?1 AND status = 'discovered'
             ORDER BY discovered_at, id LIMIT ?2"
        };
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(sql)?;
        let urls = stmt
            .query_map(params![source_id, limit], Self::row_to_url)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(urls)
    }

    /// Get one tracked URL.
    pub fn get(&self, source_id: &str, url: &str) -> Result<Option<CrawlUrl>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT * FROM crawl_urls WHERE source_id = ?1 AND url = ?2")?;
        Ok(stmt
            .query_row(params![source_id, url], Self::row_to_url)
            .optional()?)
    }

    /// Mark a URL as currently being fetched.
    pub fn mark_fetching(&self, source_id: &str, url: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE crawl_urls SET status = 'fetching' WHERE source_id = ?1 AND url = ?2",
            params![source_id, url],
        )?;
        Ok(())
    }

    /// Mark a URL fetched, recording validators for conditional re-fetches.
    pub fn mark_fetched(
        &self,
        source_id: &str,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
        content_hash: Option<&str>,
    ) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            UPDATE crawl_urls SET
                status = 'fetched',
                fetched_at = ?1,
                last_error = NULL,
                etag = COALESCE(?2, etag),
                last_modified = COALESCE(?3, last_modified),
                content_hash = COALESCE(?4, content_hash)
            WHERE source_id = ?5 AND url = ?6
            "#,
            params![
                Utc::now().to_rfc3339(),
                etag,
                last_modified,
                content_hash,
                source_id,
                url
            ],
        )?;
        Ok(())
    }

    /// Record a failure. The URL goes back to `discovered` until it has
    /// exhausted its retries, then sticks at `failed`.
    pub fn mark_failed(&self, source_id: &str, url: &str, error: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            UPDATE crawl_urls SET
                retry_count = retry_count + 1,
                last_error = ?1,
                status = CASE WHEN retry_count + 1 > ?2 THEN 'failed' ELSE 'discovered' END
            WHERE source_id = ?3 AND url = ?4
            "#,
            params![error, MAX_RETRIES, source_id, url],
        )?;
        Ok(())
    }

    /// Mark a URL as deliberately skipped.
    pub fn mark_skipped(&self, source_id: &str, url: &str, reason: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            UPDATE crawl_urls SET status = 'skipped', last_error = ?1
            WHERE source_id = ?2 AND url = ?3
            "#,
            params![reason, source_id, url],
        )?;
        Ok(())
    }

    /// Append to the request log.
    pub fn record_request(&self, log: &RequestLog) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO crawl_requests
                (source_id, url, method, status, duration_ms, response_size,
                 error, was_conditional, was_not_modified, requested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                log.source_id,
                log.url,
                log.method,
                log.status,
                log.duration_ms.map(|d| d as i64),
                log.response_size.map(|s| s as i64),
                log.error,
                log.was_conditional,
                log.was_not_modified,
                log.requested_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Per-source counters.
    pub fn stats(&self, source_id: &str) -> Result<CrawlStats> {
        let conn = self.connect()?;
        let mut stats = CrawlStats::default();

        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM crawl_urls WHERE source_id = ? GROUP BY status",
        )?;
        let rows = stmt.query_map(params![source_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            let count = count as u64;
            match UrlStatus::parse(&status) {
                Some(UrlStatus::Fetched) => stats.fetched = count,
                Some(UrlStatus::Failed) => stats.failed = count,
                Some(UrlStatus::Skipped) => stats.skipped = count,
                Some(UrlStatus::Discovered) | Some(UrlStatus::Fetching) => {
                    stats.discovered += count
                }
                None => {}
            }
        }

        stats.requests = conn.query_row(
            "SELECT COUNT(*) FROM crawl_requests WHERE source_id = ?",
            params![source_id],
            |row| row.get::<_, i64>(0),
        )? as u64;

        Ok(stats)
    }
}
