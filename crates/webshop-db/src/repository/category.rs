//! # Category Repository
//!
//! Database operations for categories.
//!
//! A category's products are the active products assigned to it directly,
//! plus the active products of its direct child categories:
//!
//! ```text
//! Clothing ─────────── products(Clothing) = {Scarf, Shirt, Hoodie}
//! ├── Scarf
//! ├── Tops
//! │   ├── Shirt
//! │   └── Hoodie
//! └── (Tops/Summer/... deeper levels are not included)
//! ```

use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::product::{ProductRow, PRODUCT_COLUMNS};
use webshop_core::{Category, Product};

const CATEGORY_COLUMNS: &str =
    "id, webshop_id, parent_id, name, description, active, added_at, modified_at, deleted_at";

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub webshop_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Listing filters for categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub webshop: Option<i64>,
    pub parent: Option<i64>,
    pub active: Option<bool>,
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists non-deleted categories matching the filter, by name.
    pub async fn list(&self, filter: &CategoryFilter) -> DbResult<Vec<Category>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE deleted_at IS NULL"
        ));
        if let Some(webshop) = filter.webshop {
            qb.push(" AND webshop_id = ").push_bind(webshop);
        }
        if let Some(parent) = filter.parent {
            qb.push(" AND parent_id = ").push_bind(parent);
        }
        if let Some(active) = filter.active {
            qb.push(" AND active = ").push_bind(active);
        }
        qb.push(" ORDER BY name, id DESC");

        let categories = qb
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    /// Gets a category by ID. Soft-deleted categories are not returned.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1 AND deleted_at IS NULL"
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// Inserts a new category.
    pub async fn insert(&self, new: &NewCategory) -> DbResult<Category> {
        debug!(name = %new.name, webshop_id = new.webshop_id, "Inserting category");

        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO categories (
                webshop_id, parent_id, name, description, active, added_at, modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(new.webshop_id)
        .bind(new.parent_id)
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.active)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Soft-deletes a category. Children and products keep their reference.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Soft-deleting category");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = ?2, modified_at = ?2 \
             WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    /// Active, non-deleted direct child categories.
    pub async fn children(&self, id: i64) -> DbResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE parent_id = ?1 AND active = 1 AND deleted_at IS NULL \
             ORDER BY name, id DESC"
        );
        let children = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(children)
    }

    /// Active products of the category and of its direct child categories,
    /// restricted to the category's webshop.
    pub async fn products(&self, category: &Category) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE webshop_id = ?1 AND active = 1 AND deleted_at IS NULL \
             AND (category_id = ?2 \
                  OR category_id IN (SELECT id FROM categories WHERE parent_id = ?2)) \
             ORDER BY added_at DESC, name, id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category.webshop_id)
            .bind(category.id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::webshop::NewWebshop;

    async fn setup() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shop = db
            .webshops()
            .insert(&NewWebshop {
                name: "Clothing store".to_string(),
                active: true,
            })
            .await
            .unwrap();
        (db, shop.id)
    }

    fn new_category(webshop_id: i64, parent_id: Option<i64>, name: &str) -> NewCategory {
        NewCategory {
            webshop_id,
            parent_id,
            name: name.to_string(),
            description: String::new(),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_insert_list_and_filter() {
        let (db, shop) = setup().await;
        let repo = db.categories();

        let clothing = repo.insert(&new_category(shop, None, "Clothing")).await.unwrap();
        let tops = repo
            .insert(&new_category(shop, Some(clothing.id), "Tops"))
            .await
            .unwrap();
        let mut hidden = new_category(shop, Some(clothing.id), "Archive");
        hidden.active = false;
        repo.insert(&hidden).await.unwrap();

        assert_eq!(clothing.description, "");
        assert!(clothing.active);

        let all = repo.list(&CategoryFilter::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Archive", "Clothing", "Tops"]);

        let under_clothing = CategoryFilter {
            parent: Some(clothing.id),
            active: Some(true),
            ..Default::default()
        };
        assert_eq!(repo.list(&under_clothing).await.unwrap(), vec![tops.clone()]);

        // children() only returns active ones
        assert_eq!(repo.children(clothing.id).await.unwrap(), vec![tops]);
    }

    #[tokio::test]
    async fn test_products_include_direct_children_only() {
        let (db, shop) = setup().await;
        let repo = db.categories();
        let products = db.products();

        let clothing = repo.insert(&new_category(shop, None, "Clothing")).await.unwrap();
        let tops = repo
            .insert(&new_category(shop, Some(clothing.id), "Tops"))
            .await
            .unwrap();
        let summer = repo
            .insert(&new_category(shop, Some(tops.id), "Summer"))
            .await
            .unwrap();

        for (name, category, active) in [
            ("Scarf", clothing.id, true),
            ("Shirt", tops.id, true),
            ("Old shirt", tops.id, false),
            ("Sandals", summer.id, true),
        ] {
            let mut p = Product::new(shop, name);
            p.category_id = Some(category);
            p.active = active;
            products.save_product(p).await.unwrap();
        }

        let mut names: Vec<_> = repo
            .products(&clothing)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Scarf", "Shirt"]);
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let (db, shop) = setup().await;
        let repo = db.categories();
        let c = repo.insert(&new_category(shop, None, "Temp")).await.unwrap();

        repo.soft_delete(c.id).await.unwrap();
        assert!(repo.get_by_id(c.id).await.unwrap().is_none());
        assert!(repo.list(&CategoryFilter::default()).await.unwrap().is_empty());
        assert!(repo.soft_delete(c.id).await.unwrap_err().is_not_found());
    }
}
