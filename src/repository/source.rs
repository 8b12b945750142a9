//! Source repository.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, Row};

use super::{parse_datetime, parse_datetime_opt, OptionalExt, Result};
use crate::models::{Source, SourceKind};

/// SQLite-backed source repository.
pub struct SourceRepository {
    db_path: PathBuf,
}

impl SourceRepository {
    /// Create a new source repository.
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
            CREATE TABLE IF NOT EXISTS sources (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                base_url TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_scraped TEXT
            );
        "#,
        )?;
        Ok(())
    }

    fn row_to_source(row: &Row<'_>) -> rusqlite::Result<Source> {
        Ok(Source {
            id: row.get("id")?,
            kind: SourceKind::parse(&row.get::<_, String>("kind")?)
                .unwrap_or(SourceKind::Manufacturer),
            name: row.get("name")?,
            base_url: row.get("base_url")?,
            metadata: serde_json::from_str(&row.get::<_, String>("metadata")?)
                .unwrap_or_default(),
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
            last_scraped: parse_datetime_opt(row.get::<_, Option<String>>("last_scraped")?),
        })
    }

    /// Get a source by ID.
    pub fn get(&self, id: &str) -> Result<Option<Source>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM sources WHERE id = ?")?;
        Ok(stmt.query_row(params![id], Self::row_to_source).optional()?)
    }

    /// Check whether a source exists.
    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Get all sources, ordered by ID.
    pub fn get_all(&self) -> Result<Vec<Source>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM sources ORDER BY id")?;
        let sources = stmt
            .query_map([], Self::row_to_source)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    /// Insert or replace a source.
    pub fn save(&self, source: &Source) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO sources (id, kind, name, base_url, metadata, created_at, last_scraped)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                name = excluded.name,
                base_url = excluded.base_url,
                metadata = excluded.metadata,
                last_scraped = excluded.last_scraped
            "#,
            params![
                source.id,
                source.kind.as_str(),
                source.name,
                source.base_url,
                serde_json::to_string(&source.metadata)?,
                source.created_at.to_rfc3339(),
                source.last_scraped.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Record that a scrape run just completed for a source.
    pub fn touch_last_scraped(&self, id: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE sources SET last_scraped = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Delete a source.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let n = conn.execute("DELETE FROM sources WHERE id = ?", params![id])?;
        Ok(n > 0)
    }
}
