//! # Webshop Repository
//!
//! Database operations for webshops. Counts and product listings only look
//! at the webshop's non-deleted rows.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::product::{ProductRow, PRODUCT_COLUMNS};
use webshop_core::{Category, Product, ProductStructure, Webshop};

const WEBSHOP_COLUMNS: &str = "id, active, name, added_at, modified_at, deleted_at";

/// Input for creating a webshop.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWebshop {
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// Repository for webshop database operations.
#[derive(Debug, Clone)]
pub struct WebshopRepository {
    pool: SqlitePool,
}

impl WebshopRepository {
    /// Creates a new WebshopRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WebshopRepository { pool }
    }

    /// Lists non-deleted webshops, optionally filtered by the active flag.
    pub async fn list(&self, active: Option<bool>) -> DbResult<Vec<Webshop>> {
        let sql = format!(
            "SELECT {WEBSHOP_COLUMNS} FROM webshops \
             WHERE deleted_at IS NULL AND (?1 IS NULL OR active = ?1) \
             ORDER BY active DESC, name, id"
        );
        let webshops = sqlx::query_as::<_, Webshop>(&sql)
            .bind(active)
            .fetch_all(&self.pool)
            .await?;

        Ok(webshops)
    }

    /// Gets a webshop by ID. Soft-deleted webshops are not returned.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Webshop>> {
        let sql = format!("SELECT {WEBSHOP_COLUMNS} FROM webshops WHERE id = ?1 AND deleted_at IS NULL");
        let webshop = sqlx::query_as::<_, Webshop>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(webshop)
    }

    /// Inserts a new webshop.
    pub async fn insert(&self, new: &NewWebshop) -> DbResult<Webshop> {
        debug!(name = %new.name, "Inserting webshop");

        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO webshops (active, name, added_at, modified_at) VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(new.active)
        .bind(new.name.trim())
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Webshop", id))
    }

    /// Soft-deletes a webshop. Its categories and products are left alone.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Soft-deleting webshop");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE webshops SET deleted_at = ?2, modified_at = ?2 \
             WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Webshop", id));
        }

        Ok(())
    }

    /// Counts the webshop's non-deleted products, of any structure.
    pub async fn num_products(&self, id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE webshop_id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Counts the webshop's non-deleted categories.
    pub async fn num_categories(&self, id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories WHERE webshop_id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// The webshop's storefront products: stand-alone and parent products.
    /// Variants are reached through their parent.
    pub async fn products(&self, id: i64, active_only: bool) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE webshop_id = ?1 AND deleted_at IS NULL \
             AND structure IN (?2, ?3) AND (?4 = 0 OR active = 1) \
             ORDER BY added_at DESC, name, id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(ProductStructure::Standalone)
            .bind(ProductStructure::Parent)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// The webshop's non-deleted categories.
    pub async fn categories(&self, id: i64) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, webshop_id, parent_id, name, description, active, \
                    added_at, modified_at, deleted_at \
             FROM categories WHERE webshop_id = ?1 AND deleted_at IS NULL \
             ORDER BY name, id DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::repository::category::NewCategory;
    use crate::repository::webshop::NewWebshop;
    use webshop_core::{Product, ProductStructure};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = setup().await;
        let repo = db.webshops();

        let shop = repo
            .insert(&NewWebshop {
                name: "Yoga Studio".to_string(),
                active: true,
            })
            .await
            .unwrap();
        repo.insert(&NewWebshop {
            name: "Closed".to_string(),
            active: false,
        })
        .await
        .unwrap();

        assert_eq!(shop.name, "Yoga Studio");
        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
        // Active webshops sort first
        assert_eq!(all[0].name, "Yoga Studio");
        assert_eq!(repo.list(Some(true)).await.unwrap(), vec![shop]);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_webshop() {
        let db = setup().await;
        let repo = db.webshops();
        let shop = repo
            .insert(&NewWebshop {
                name: "Gone".to_string(),
                active: true,
            })
            .await
            .unwrap();

        repo.soft_delete(shop.id).await.unwrap();
        assert!(repo.get_by_id(shop.id).await.unwrap().is_none());
        assert!(repo.soft_delete(shop.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_counts_and_storefront_products() {
        let db = setup().await;
        let shop = db
            .webshops()
            .insert(&NewWebshop {
                name: "Shop".to_string(),
                active: true,
            })
            .await
            .unwrap();

        db.categories()
            .insert(&NewCategory {
                webshop_id: shop.id,
                parent_id: None,
                name: "Mats".to_string(),
                description: String::new(),
                active: true,
            })
            .await
            .unwrap();

        let products = db.products();
        let mut parent = Product::new(shop.id, "Course");
        parent.structure = ProductStructure::Parent;
        let parent = products.save_product(parent).await.unwrap();

        let mut child = Product::new(shop.id, "Monday");
        child.structure = ProductStructure::Child;
        child.parent_id = parent.id;
        products.save_product(child).await.unwrap();

        let mut hidden = Product::new(shop.id, "Hidden");
        hidden.active = false;
        products.save_product(hidden).await.unwrap();

        let deleted = products.save_product(Product::new(shop.id, "Deleted")).await.unwrap();
        products.delete_product(deleted.id.unwrap()).await.unwrap();

        let repo = db.webshops();
        assert_eq!(repo.num_products(shop.id).await.unwrap(), 3);
        assert_eq!(repo.num_categories(shop.id).await.unwrap(), 1);

        let storefront = repo.products(shop.id, true).await.unwrap();
        assert_eq!(storefront.len(), 1);
        assert_eq!(storefront[0].name, "Course");
        assert_eq!(repo.products(shop.id, false).await.unwrap().len(), 2);
        assert_eq!(repo.categories(shop.id).await.unwrap()[0].name, "Mats");
    }
}
