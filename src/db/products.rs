//! Database queries for product records

use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::info;
use uuid::Uuid;

use super::models::{Product, ProductCategory};
use super::pool::{DbPool, DbError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL CHECK (category IN ('floor', 'wall', 'other')),
    model_url TEXT NOT NULL,
    thumbnail_url TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS products_created_at_idx ON products (created_at DESC);
"#;

/// Repository for product database operations
#[derive(Clone)]
pub struct ProductRepository {
    pool: DbPool,
}

impl ProductRepository {
    pub fn new(pool: DbPool) -> Self {
        ProductRepository { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Create the products table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), DbError> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }

    /// Get all products, newest first
    pub async fn list_newest_first(&self) -> Result<Vec<Product>, DbError> {
        let client = self.pool.get().await?;

        let rows = client.query(
            r#"
            SELECT id, name, category, model_url, thumbnail_url, created_at
            FROM products
            ORDER BY created_at DESC
            "#,
            &[]
        ).await?;

        rows.iter().map(row_to_product).collect()
    }

    /// Insert a new product record; the database assigns `created_at`.
    pub async fn create(
        &self,
        name: &str,
        category: ProductCategory,
        model_url: &str,
        thumbnail_url: &str,
    ) -> Result<Product, DbError> {
        let client = self.pool.get().await?;
        let id = Uuid::new_v4();

        let row = client.query_one(
            r#"
            INSERT INTO products (id, name, category, model_url, thumbnail_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING created_at
            "#,
            &[&id, &name, &category.as_str(), &model_url, &thumbnail_url]
        ).await?;

        let created_at: DateTime<Utc> = row.get("created_at");

        info!(product_id = %id, name = %name, "Product record created");

        Ok(Product {
            id,
            name: name.to_string(),
            category,
            model_url: model_url.to_string(),
            thumbnail_url: thumbnail_url.to_string(),
            created_at,
        })
    }

    /// Get a product by its id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DbError> {
        let client = self.pool.get().await?;

        let row = client.query_opt(
            r#"
            SELECT id, name, category, model_url, thumbnail_url, created_at
            FROM products
            WHERE id = $1
            "#,
            &[&id]
        ).await?;

        row.as_ref().map(row_to_product).transpose()
    }

    /// Delete a product record; returns whether a record was removed.
    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool, DbError> {
        let client = self.pool.get().await?;
        let deleted = client.execute("DELETE FROM products WHERE id = $1", &[&id]).await?;
        Ok(deleted > 0)
    }
}

fn row_to_product(row: &Row) -> Result<Product, DbError> {
    let raw_category: String = row.get("category");
    let category = ProductCategory::parse(&raw_category).ok_or_else(|| {
        DbError::InvalidRow(format!("unknown product category '{}'", raw_category))
    })?;

    Ok(Product {
        id: row.get("id"),
        name: row.get("name"),
        category,
        model_url: row.get("model_url"),
        thumbnail_url: row.get("thumbnail_url"),
        created_at: row.get("created_at"),
    })
}
