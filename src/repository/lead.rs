//! Lead repository.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, Row};

use super::{parse_datetime, Result};
use crate::models::{Lead, LeadStatus};

/// SQLite-backed lead repository.
pub struct LeadRepository {
    db_path: PathBuf,
}

impl LeadRepository {
    /// Create a new lead repository.
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
            CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                listing_id TEXT,
                profile_id TEXT,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT,
                message TEXT NOT NULL,
                source TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_leads_profile ON leads(profile_id);
        "#,
        )?;
        Ok(())
    }

    fn row_to_lead(row: &Row<'_>) -> rusqlite::Result<Lead> {
        Ok(Lead {
            id: row.get("id")?,
            listing_id: row.get("listing_id")?,
            profile_id: row.get("profile_id")?,
            name: row.get("name")?,
            phone: row.get("phone")?,
            email: row.get("email")?,
            message: row.get("message")?,
            source: row.get("source")?,
            status: LeadStatus::parse(&row.get::<_, String>("status")?)
                .unwrap_or(LeadStatus::New),
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        })
    }

    /// Insert a lead.
    pub fn insert(&self, lead: &Lead) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO leads (id, listing_id, profile_id, name, phone, email,
                               message, source, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                lead.id,
                lead.listing_id,
                lead.profile_id,
                lead.name,
                lead.phone,
                lead.email,
                lead.message,
                lead.source,
                lead.status.as_str(),
                lead.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent leads for a dealer, newest first.
    pub fn recent_for_profile(&self, profile_id: &str, limit: u32) -> Result<Vec<Lead>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM leads WHERE profile_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )?;
        let leads = stmt
            .query_map(params![profile_id, limit], Self::row_to_lead)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(leads)
    }

    /// All leads, newest first.
    pub fn list_all(&self) -> Result<Vec<Lead>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM leads ORDER BY created_at DESC")?;
        let leads = stmt
            .query_map([], Self::row_to_lead)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(leads)
    }
}
