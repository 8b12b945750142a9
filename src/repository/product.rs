//! Manufacturer product repository.
//!
//! Products are keyed by (source_id, source_url): one row per catalog
//! page. Upserts replace the categorized spec rows and merge image rows,
//! bumping `updated_at` only when something actually changed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, Row, Transaction};

use super::{parse_datetime, OptionalExt, Result};
use crate::models::{
    DeckDimensions, GooseneckType, ManufacturerProduct, ProductImage, ProductSpec, SpecCategory,
    TonnageRange,
};

/// Current schema version, stamped into storage_meta.
const SCHEMA_VERSION: i32 = 3;

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

/// SQLite-backed product repository.
pub struct ProductRepository {
    db_path: PathBuf,
}

impl ProductRepository {
    /// Create a new product repository.
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
            CREATE TABLE IF NOT EXISTS manufacturer_products (
                id TEXT PRIMARY KEY,
                source_id TEXT NOT NULL,
                name TEXT NOT NULL,
                series TEXT,
                model_number TEXT,
                category TEXT,
                tonnage_min INTEGER,
                tonnage_max INTEGER,
                axles INTEGER,
                gooseneck TEXT,
                deck_length_in REAL,
                deck_width_in REAL,
                deck_height_in REAL,
                empty_weight_lbs INTEGER,
                capacity_lbs INTEGER,
                description TEXT,
                source_url TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(source_id, source_url)
            );

            CREATE TABLE IF NOT EXISTS manufacturer_product_specs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id TEXT NOT NULL,
                category TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                unit TEXT,
                position INTEGER NOT NULL,
                FOREIGN KEY (product_id) REFERENCES manufacturer_products(id)
            );

            CREATE TABLE IF NOT EXISTS manufacturer_product_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id TEXT NOT NULL,
                url TEXT NOT NULL,
                stored_path TEXT,
                content_hash TEXT,
                position INTEGER NOT NULL,
                UNIQUE(product_id, url),
                FOREIGN KEY (product_id) REFERENCES manufacturer_products(id)
            );

            CREATE TABLE IF NOT EXISTS storage_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_products_source
                ON manufacturer_products(source_id);
            CREATE INDEX IF NOT EXISTS idx_product_specs_product
                ON manufacturer_product_specs(product_id);
        "#,
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO storage_meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;
        Ok(())
    }

    fn row_to_product(row: &Row<'_>) -> rusqlite::Result<ManufacturerProduct> {
        let tonnage_min: Option<u32> = row.get("tonnage_min")?;
        let tonnage_max: Option<u32> = row.get("tonnage_max")?;
        let tonnage = match (tonnage_min, tonnage_max) {
            (Some(min), Some(max)) => Some(TonnageRange::new(min, max)),
            (Some(t), None) | (None, Some(t)) => Some(TonnageRange::single(t)),
            (None, None) => None,
        };

        Ok(ManufacturerProduct {
            id: row.get("id")?,
            source_id: row.get("source_id")?,
            name: row.get("name")?,
            series: row.get("series")?,
            model_number: row.get("model_number")?,
            category: row.get("category")?,
            tonnage,
            axles: row.get("axles")?,
            gooseneck: row
                .get::<_, Option<String>>("gooseneck")?
                .as_deref()
                .and_then(GooseneckType::parse),
            deck: DeckDimensions {
                length_in: row.get("deck_length_in")?,
                width_in: row.get("deck_width_in")?,
                height_in: row.get("deck_height_in")?,
            },
            empty_weight_lbs: row.get("empty_weight_lbs")?,
            capacity_lbs: row.get("capacity_lbs")?,
            description: row.get("description")?,
            source_url: row.get("source_url")?,
            metadata: serde_json::from_str(&row.get::<_, String>("metadata")?)
                .unwrap_or_default(),
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
            updated_at: parse_datetime(&row.get::<_, String>("updated_at")?),
        })
    }

    fn row_to_spec(row: &Row<'_>) -> rusqlite::Result<ProductSpec> {
        Ok(ProductSpec {
            id: row.get("id")?,
            product_id: row.get("product_id")?,
            category: SpecCategory::parse(&row.get::<_, String>("category")?)
                .unwrap_or(SpecCategory::General),
            key: row.get("key")?,
            value: row.get("value")?,
            unit: row.get("unit")?,
            position: row.get("position")?,
        })
    }

    fn row_to_image(row: &Row<'_>) -> rusqlite::Result<ProductImage> {
        Ok(ProductImage {
            id: row.get("id")?,
            product_id: row.get("product_id")?,
            url: row.get("url")?,
            stored_path: row
                .get::<_, Option<String>>("stored_path")?
                .map(PathBuf::from),
            content_hash: row.get("content_hash")?,
            position: row.get("position")?,
        })
    }

    fn insert_product(tx: &Transaction<'_>, product: &ManufacturerProduct) -> Result<()> {
        tx.execute(
            r#"
            INSERT INTO manufacturer_products (
                id, source_id, name, series, model_number, category,
                tonnage_min, tonnage_max, axles, gooseneck,
                deck_length_in, deck_width_in, deck_height_in,
                empty_weight_lbs, capacity_lbs, description,
                source_url, metadata, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                      ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            "#,
            params![
                product.id,
                product.source_id,
                product.name,
                product.series,
                product.model_number,
                product.category,
                product.tonnage.map(|t| t.min),
                product.tonnage.map(|t| t.max),
                product.axles,
                product.gooseneck.map(|g| g.as_str()),
                product.deck.length_in,
                product.deck.width_in,
                product.deck.height_in,
                product.empty_weight_lbs,
                product.capacity_lbs,
                product.description,
                product.source_url,
                serde_json::to_string(&product.metadata)?,
                product.created_at.to_rfc3339(),
                product.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update_product(tx: &Transaction<'_>, id: &str, product: &ManufacturerProduct) -> Result<()> {
        tx.execute(
            r#"
            UPDATE manufacturer_products SET
                name = ?1, series = ?2, model_number = ?3, category = ?4,
                tonnage_min = ?5, tonnage_max = ?6, axles = ?7, gooseneck = ?8,
                deck_length_in = ?9, deck_width_in = ?10, deck_height_in = ?11,
                empty_weight_lbs = ?12, capacity_lbs = ?13, description = ?14,
                metadata = ?15, updated_at = ?16
            WHERE id = ?17
            "#,
            params![
                product.name,
                product.series,
                product.model_number,
                product.category,
                product.tonnage.map(|t| t.min),
                product.tonnage.map(|t| t.max),
                product.axles,
                product.gooseneck.map(|g| g.as_str()),
                product.deck.length_in,
                product.deck.width_in,
                product.deck.height_in,
                product.empty_weight_lbs,
                product.capacity_lbs,
                product.description,
                serde_json::to_string(&product.metadata)?,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        Ok(())
    }

    fn replace_specs(tx: &Transaction<'_>, product_id: &str, specs: &[ProductSpec]) -> Result<()> {
        tx.execute(
            "DELETE FROM manufacturer_product_specs WHERE product_id = ?",
            params![product_id],
        )?;
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO manufacturer_product_specs
                (product_id, category, key, value, unit, position)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        for spec in specs {
            stmt.execute(params![
                product_id,
                spec.category.as_str(),
                spec.key,
                spec.value,
                spec.unit,
                spec.position,
            ])?;
        }
        Ok(())
    }

    /// Merge image rows: add new URLs, drop ones no longer on the page,
    /// keep download state for URLs that stayed.
    fn merge_images(tx: &Transaction<'_>, product_id: &str, images: &[ProductImage]) -> Result<()> {
        let incoming: HashSet<&str> = images.iter().map(|i| i.url.as_str()).collect();

        let existing: Vec<String> = {
            let mut stmt = tx.prepare(
                "SELECT url FROM manufacturer_product_images WHERE product_id = ?",
            )?;
            let rows = stmt
                .query_map(params![product_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };
        for url in &existing {
            if !incoming.contains(url.as_str()) {
                tx.execute(
                    "DELETE FROM manufacturer_product_images WHERE product_id = ?1 AND url = ?2",
                    params![product_id, url],
                )?;
            }
        }

        let mut stmt = tx.prepare(
            r#"
            INSERT INTO manufacturer_product_images (product_id, url, position)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id, url) DO UPDATE SET position = excluded.position
            "#,
        )?;
        for image in images {
            stmt.execute(params![product_id, image.url, image.position])?;
        }
        Ok(())
    }

    /// Insert or update a product with its spec and image rows.
    ///
    /// Specs are compared against the stored rows so an identical
    /// re-scrape reports `Unchanged` and leaves `updated_at` alone.
    pub fn upsert(
        &self,
        product: &ManufacturerProduct,
        specs: &[ProductSpec],
        images: &[ProductImage],
    ) -> Result<UpsertOutcome> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let existing = {
            let mut stmt = tx.prepare(
                "SELECT * FROM manufacturer_products WHERE source_id = ?1 AND source_url = ?2",
            )?;
            stmt.query_row(
                params![product.source_id, product.source_url],
                Self::row_to_product,
            )
            .optional()?
        };

        let outcome = match existing {
            None => {
                Self::insert_product(&tx, product)?;
                Self::replace_specs(&tx, &product.id, specs)?;
                Self::merge_images(&tx, &product.id, images)?;
                UpsertOutcome::Created
            }
            Some(old) => {
                let fields_changed = old.differs_from(product);
                let specs_changed = {
                    let mut stmt = tx.prepare(
                        r#"
                        SELECT * FROM manufacturer_product_specs
                        WHERE product_id = ? ORDER BY position
                        "#,
                    )?;
                    let stored = stmt
                        .query_map(params![old.id], Self::row_to_spec)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    stored.len() != specs.len()
                        || stored.iter().zip(specs.iter()).any(|(a, b)| {
                            a.category != b.category
                                || a.key != b.key
                                || a.value != b.value
                                || a.unit != b.unit
                        })
                };

                if fields_changed {
                    Self::update_product(&tx, &old.id, product)?;
                }
                if specs_changed {
                    Self::replace_specs(&tx, &old.id, specs)?;
                }
                Self::merge_images(&tx, &old.id, images)?;

                if fields_changed || specs_changed {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Unchanged
                }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    /// Get a product by ID.
    pub fn get(&self, id: &str) -> Result<Option<ManufacturerProduct>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM manufacturer_products WHERE id = ?")?;
        Ok(stmt.query_row(params![id], Self::row_to_product).optional()?)
    }

    /// Get a product by its page URL within a source.
    pub fn get_by_url(&self, source_id: &str, url: &str) -> Result<Option<ManufacturerProduct>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM manufacturer_products WHERE source_id = ?1 AND source_url = ?2",
        )?;
        Ok(stmt
            .query_row(params![source_id, url], Self::row_to_product)
            .optional()?)
    }

    /// List products for a source, ordered by name.
    pub fn list_by_source(&self, source_id: &str) -> Result<Vec<ManufacturerProduct>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT * FROM manufacturer_products WHERE source_id = ? ORDER BY name")?;
        let products = stmt
            .query_map(params![source_id], Self::row_to_product)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(products)
    }

    /// List all products, ordered by source then name.
    pub fn list_all(&self) -> Result<Vec<ManufacturerProduct>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT * FROM manufacturer_products ORDER BY source_id, name")?;
        let products = stmt
            .query_map([], Self::row_to_product)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(products)
    }

    /// Case-insensitive substring search over name, series, and model number.
    pub fn search(&self, term: &str) -> Result<Vec<ManufacturerProduct>> {
        let conn = self.connect()?;
        let pattern = format!("%{}%", term);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM manufacturer_products
            WHERE name LIKE ?1 OR series LIKE ?1 OR model_number LIKE ?1
            ORDER BY name
            "#,
        )?;
        let products = stmt
            .query_map(params![pattern], Self::row_to_product)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(products)
    }

    /// Count products for a source.
    pub fn count_by_source(&self, source_id: &str) -> Result<u64> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM manufacturer_products WHERE source_id = ?",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Get a product's spec rows in page order.
    pub fn get_specs(&self, product_id: &str) -> Result<Vec<ProductSpec>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM manufacturer_product_specs WHERE product_id = ? ORDER BY position",
        )?;
        let specs = stmt
            .query_map(params![product_id], Self::row_to_spec)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(specs)
    }

    /// Get a product's image rows in page order.
    pub fn get_images(&self, product_id: &str) -> Result<Vec<ProductImage>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM manufacturer_product_images WHERE product_id = ? ORDER BY position",
        )?;
        let images = stmt
            .query_map(params![product_id], Self::row_to_image)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(images)
    }

    /// Images for a source that have not been downloaded yet.
    pub fn pending_images(&self, source_id: &str) -> Result<Vec<ProductImage>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT i.* FROM manufacturer_product_images i
            JOIN manufacturer_products p ON p.id = i.product_id
            WHERE p.source_id = ? AND i.stored_path IS NULL
            ORDER BY i.product_id, i.position
            "#,
        )?;
        let images = stmt
            .query_map(params![source_id], Self::row_to_image)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(images)
    }

    /// Record where an image's bytes were stored.
    pub fn mark_image_stored(
        &self,
        product_id: &str,
        url: &str,
        stored_path: &Path,
        content_hash: &str,
    ) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            UPDATE manufacturer_product_images
            SET stored_path = ?1, content_hash = ?2
            WHERE product_id = ?3 AND url = ?4
            "#,
            params![
                stored_path.to_string_lossy(),
                content_hash,
                product_id,
                url
            ],
        )?;
        Ok(())
    }
}
