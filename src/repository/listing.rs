//! Listing and profile repository.
//!
//! Enforces the marketplace's one-listing-per-(profile, title) rule at
//! the upsert seam: scraped inventory re-runs update rows instead of
//! duplicating them.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use super::{parse_datetime, OptionalExt, Result};
use crate::models::{Condition, Listing, ListingImage, ListingStatus, Profile};

/// Filters for listing queries. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub category: Option<String>,
    pub make: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub limit: Option<u32>,
}

/// SQLite-backed listing repository.
pub struct ListingRepository {
    db_path: PathBuf,
}

impl ListingRepository {
    /// Create a new listing repository.
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
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                phone TEXT,
                email TEXT,
                website TEXT,
                city TEXT,
                state TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS listings (
                id TEXT PRIMARY KEY,
                profile_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                price_cents INTEGER,
                year INTEGER,
                make TEXT,
                model TEXT,
                condition TEXT,
                mileage INTEGER,
                hours INTEGER,
                vin TEXT,
                stock_number TEXT,
                city TEXT,
                state TEXT,
                category TEXT,
                status TEXT NOT NULL,
                source_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(profile_id, title),
                FOREIGN KEY (profile_id) REFERENCES profiles(id)
            );

            CREATE TABLE IF NOT EXISTS listing_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                listing_id TEXT NOT NULL,
                url TEXT NOT NULL,
                position INTEGER NOT NULL,
                UNIQUE(listing_id, url),
                FOREIGN KEY (listing_id) REFERENCES listings(id)
            );

            CREATE INDEX IF NOT EXISTS idx_listings_profile ON listings(profile_id);
            CREATE INDEX IF NOT EXISTS idx_listings_status ON listings(status);
        "#,
        )?;
        Ok(())
    }

    fn row_to_listing(row: &Row<'_>) -> rusqlite::Result<Listing> {
        Ok(Listing {
            id: row.get("id")?,
            profile_id: row.get("profile_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            price_cents: row.get("price_cents")?,
            year: row.get("year")?,
            make: row.get("make")?,
            model: row.get("model")?,
            condition: row
                .get::<_, Option<String>>("condition")?
                .as_deref()
                .and_then(Condition::parse),
            mileage: row.get("mileage")?,
            hours: row.get("hours")?,
            vin: row.get("vin")?,
            stock_number: row.get("stock_number")?,
            city: row.get("city")?,
            state: row.get("state")?,
            category: row.get("category")?,
            status: ListingStatus::parse(&row.get::<_, String>("status")?)
                .unwrap_or(ListingStatus::Draft),
            source_url: row.get("source_url")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
            updated_at: parse_datetime(&row.get::<_, String>("updated_at")?),
        })
    }

    fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: row.get("id")?,
            company_name: row.get("company_name")?,
            phone: row.get("phone")?,
            email: row.get("email")?,
            website: row.get("website")?,
            city: row.get("city")?,
            state: row.get("state")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        })
    }

    /// Get a listing by ID.
    pub fn get(&self, id: &str) -> Result<Option<Listing>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM listings WHERE id = ?")?;
        Ok(stmt.query_row(params![id], Self::row_to_listing).optional()?)
    }

    /// Get a listing by its upsert key.
    pub fn get_by_owner_title(&self, profile_id: &str, title: &str) -> Result<Option<Listing>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT * FROM listings WHERE profile_id = ?1 AND title = ?2")?;
        Ok(stmt
            .query_row(params![profile_id, title], Self::row_to_listing)
            .optional()?)
    }

    /// Insert a listing, or update the existing row with the same
    /// (profile, title). Returns true if a new row was created.
    pub fn upsert_by_owner_title(&self, listing: &Listing) -> Result<bool> {
        let existing = self.get_by_owner_title(&listing.profile_id, &listing.title)?;
        let conn = self.connect()?;

        match existing {
            None => {
                conn.execute(
                    r#"
                    INSERT INTO listings (
                        id, profile_id, title, description, price_cents, year,
                        make, model, condition, mileage, hours, vin, stock_number,
                        city, state, category, status, source_url, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                              ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
                    "#,
                    params![
                        listing.id,
                        listing.profile_id,
                        listing.title,
                        listing.description,
                        listing.price_cents,
                        listing.year,
                        listing.make,
                        listing.model,
                        listing.condition.map(|c| c.as_str()),
                        listing.mileage,
                        listing.hours,
                        listing.vin,
                        listing.stock_number,
                        listing.city,
                        listing.state,
                        listing.category,
                        listing.status.as_str(),
                        listing.source_url,
                        listing.created_at.to_rfc3339(),
                        listing.updated_at.to_rfc3339(),
                    ],
                )?;
                Ok(true)
            }
            Some(old) => {
                conn.execute(
                    r#"
                    UPDATE listings SET
                        description = ?1, price_cents = ?2, year = ?3, make = ?4,
                        model = ?5, condition = ?6, mileage = ?7, hours = ?8,
                        vin = ?9, stock_number = ?10, city = ?11, state = ?12,
                        category = ?13, status = ?14, source_url = ?15, updated_at = ?16
                    WHERE id = ?17
                    "#,
                    params![
                        listing.description,
                        listing.price_cents,
                        listing.year,
                        listing.make,
                        listing.model,
                        listing.condition.map(|c| c.as_str()),
                        listing.mileage,
                        listing.hours,
                        listing.vin,
                        listing.stock_number,
                        listing.city,
                        listing.state,
                        listing.category,
                        listing.status.as_str(),
                        listing.source_url,
                        Utc::now().to_rfc3339(),
                        old.id,
                    ],
                )?;
                Ok(false)
            }
        }
    }

    /// List listings matching a filter, newest first.
    pub fn list(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        let mut sql = String::from("SELECT * FROM listings WHERE 1=1");
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            values.push(Value::from(status.as_str().to_string()));
        }
        if let Some(ref category) = filter.category {
            sql.push_str(" AND category = ?");
            values.push(Value::from(category.clone()));
        }
        if let Some(ref make) = filter.make {
            sql.push_str(" AND make LIKE ?");
            values.push(Value::from(format!("%{}%", make)));
        }
        if let Some(min) = filter.min_price_cents {
            sql.push_str(" AND price_cents >= ?");
            values.push(Value::from(min));
        }
        if let Some(max) = filter.max_price_cents {
            sql.push_str(" AND price_cents <= ?");
            values.push(Value::from(max));
        }
        sql.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let listings = stmt
            .query_map(params_from_iter(values), Self::row_to_listing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(listings)
    }

    /// Count all listings.
    pub fn count(&self) -> Result<u64> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Replace a listing's image rows.
    pub fn set_images(&self, listing_id: &str, images: &[ListingImage]) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM listing_images WHERE listing_id = ?",
            params![listing_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO listing_images (listing_id, url, position) VALUES (?1, ?2, ?3)",
            )?;
            for image in images {
                stmt.execute(params![listing_id, image.url, image.position])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Get a listing's images in page order.
    pub fn get_images(&self, listing_id: &str) -> Result<Vec<ListingImage>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT * FROM listing_images WHERE listing_id = ? ORDER BY position")?;
        let images = stmt
            .query_map(params![listing_id], |row| {
                Ok(ListingImage {
                    id: row.get("id")?,
                    listing_id: row.get("listing_id")?,
                    url: row.get("url")?,
                    position: row.get("position")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(images)
    }

    /// Find a profile by exact company name.
    pub fn find_profile_by_company(&self, company_name: &str) -> Result<Option<Profile>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM profiles WHERE company_name = ?")?;
        Ok(stmt
            .query_row(params![company_name], Self::row_to_profile)
            .optional()?)
    }

    /// Get a profile by ID.
    pub fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM profiles WHERE id = ?")?;
        Ok(stmt.query_row(params![id], Self::row_to_profile).optional()?)
    }

    /// Insert or replace a profile.
    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO profiles (id, company_name, phone, email, website, city, state, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                company_name = excluded.company_name,
                phone = excluded.phone,
                email = excluded.email,
                website = excluded.website,
                city = excluded.city,
                state = excluded.state
            "#,
            params![
                profile.id,
                profile.company_name,
                profile.phone,
                profile.email,
                profile.website,
                profile.city,
                profile.state,
                profile.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List all profiles.
    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM profiles ORDER BY company_name")?;
        let profiles = stmt
            .query_map([], Self::row_to_profile)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(profiles)
    }
}
