//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - `save_product`: the single write path for products
//! - `delete_product`: soft delete with parent demotion
//! - Filtered, paginated listings
//!
//! ## Save Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_product(product)                 one transaction                  │
//! │                                                                         │
//! │  1. load parent (if parent_id)   ──►  effective VAT rate               │
//! │  2. derive_prices(product)       ──►  price ⇄ price_excl_vat           │
//! │  3. INSERT or UPDATE products                                          │
//! │  4. name changed (or new)?       ──►  UPDATE children SET name = ...   │
//! │  5. COMMIT, return the stored row                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline never validates. Callers accepting untrusted input run
//! `webshop_core::validation::validate_product` first.
//!
//! ## Delete Pipeline
//! ```text
//! delete_product(id)
//!   SET deleted_at = now
//!   parent left with zero non-deleted children?  ──►  parent.structure = STANDALONE
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{decode_money, encode_money, Page};
use webshop_core::pricing::{children_min_price, derive_prices};
use webshop_core::{BarcodeType, Money, Product, ProductStructure, VatRate};

pub(crate) const PRODUCT_COLUMNS: &str = "id, webshop_id, structure, parent_id, category_id, \
     name, description, active, featured, barcode_type, barcode, pcs_in_stock, \
     price, price_excl_vat, vat, is_discountable, added_at, modified_at, deleted_at";

// =============================================================================
// Row Mapping
// =============================================================================

/// A `products` row as stored. Prices are TEXT, stock is a signed integer.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i64,
    webshop_id: i64,
    structure: ProductStructure,
    parent_id: Option<i64>,
    category_id: Option<i64>,
    name: String,
    description: String,
    active: bool,
    featured: bool,
    barcode_type: BarcodeType,
    barcode: String,
    pcs_in_stock: Option<i64>,
    price: Option<String>,
    price_excl_vat: Option<String>,
    vat: VatRate,
    is_discountable: bool,
    added_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        let pcs_in_stock = row
            .pcs_in_stock
            .map(|n| u32::try_from(n).map_err(|_| DbError::corrupt("pcs_in_stock", n.to_string())))
            .transpose()?;

        Ok(Product {
            id: Some(row.id),
            webshop_id: row.webshop_id,
            structure: row.structure,
            parent_id: row.parent_id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            active: row.active,
            featured: row.featured,
            barcode_type: row.barcode_type,
            barcode: row.barcode,
            pcs_in_stock,
            price: decode_money("price", row.price)?,
            price_excl_vat: decode_money("price_excl_vat", row.price_excl_vat)?,
            vat: row.vat,
            is_discountable: row.is_discountable,
            added_at: Some(row.added_at),
            modified_at: Some(row.modified_at),
            deleted_at: row.deleted_at,
        })
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Listing filters. Every set field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub active: Option<bool>,
    pub parent: Option<i64>,
    pub webshop: Option<i64>,
    pub structure: Option<ProductStructure>,
    pub category: Option<i64>,
    pub featured: Option<bool>,
    /// Only stand-alone and parent products (the storefront scope).
    pub default_only: bool,
}

impl ProductFilter {
    fn push_conditions<'args>(&self, qb: &mut QueryBuilder<'args, Sqlite>) {
        if let Some(active) = self.active {
            qb.push(" AND active = ").push_bind(active);
        }
        if let Some(parent) = self.parent {
            qb.push(" AND parent_id = ").push_bind(parent);
        }
        if let Some(webshop) = self.webshop {
            qb.push(" AND webshop_id = ").push_bind(webshop);
        }
        if let Some(structure) = self.structure {
            qb.push(" AND structure = ").push_bind(structure);
        }
        if let Some(category) = self.category {
            qb.push(" AND category_id = ").push_bind(category);
        }
        if let Some(featured) = self.featured {
            qb.push(" AND featured = ").push_bind(featured);
        }
        if self.default_only {
            qb.push(" AND structure IN (")
                .push_bind(ProductStructure::Standalone)
                .push(", ")
                .push_bind(ProductStructure::Parent)
                .push(")");
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let saved = repo.save_product(product).await?;
/// let (product, parent) = repo.get_with_parent(saved.id.unwrap()).await?.unwrap();
/// repo.delete_product(product.id.unwrap()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID. Soft-deleted products are not returned.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Gets a product together with its parent, for attribute resolution.
    ///
    /// The parent is `None` for non-children and for children whose parent
    /// has been deleted.
    pub async fn get_with_parent(&self, id: i64) -> DbResult<Option<(Product, Option<Product>)>> {
        let mut conn = self.pool.acquire().await?;

        let Some(product) = fetch_product(&mut conn, id).await? else {
            return Ok(None);
        };
        let parent = match product.parent_id {
            Some(parent_id) => fetch_product(&mut conn, parent_id).await?,
            None => None,
        };

        Ok(Some((product, parent)))
    }

    /// Lists one page of products matching the filter.
    ///
    /// Newest first, then by name.
    pub async fn list(&self, filter: &ProductFilter, page: Page) -> DbResult<Vec<Product>> {
        debug!(?filter, ?page, "Listing products");

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL"
        ));
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY added_at DESC, name, id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Counts products matching the filter (for pagination).
    pub async fn count(&self, filter: &ProductFilter) -> DbResult<i64> {
        let mut qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL");
        filter.push_conditions(&mut qb);

        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// IDs of all products matching the filter, ascending.
    pub async fn ids(&self, filter: &ProductFilter) -> DbResult<Vec<i64>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM products WHERE deleted_at IS NULL");
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY id");

        let ids = qb.build_query_scalar::<i64>().fetch_all(&self.pool).await?;
        Ok(ids)
    }

    /// Non-deleted children of a product, active or not.
    pub async fn children(&self, parent_id: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE parent_id = ?1 AND deleted_at IS NULL \
             ORDER BY added_at DESC, name, id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// True when the product has at least one non-deleted child.
    pub async fn has_children(&self, id: i64) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Ok(count_children(&mut conn, id).await? > 0)
    }

    /// Lowest effective price over the parent's active children.
    pub async fn children_min_price(&self, parent: &Product) -> DbResult<Option<Money>> {
        let Some(id) = parent.id else {
            return Ok(None);
        };
        let children = self.children(id).await?;
        Ok(children_min_price(parent, &children))
    }

    /// Persists a product: derives prices, writes the row and propagates a
    /// changed name to the product's children, all in one transaction.
    ///
    /// Inserts when `product.id` is `None`, updates otherwise. Returns the
    /// stored product. Updating a missing or deleted product is `NotFound`.
    pub async fn save_product(&self, mut product: Product) -> DbResult<Product> {
        debug!(id = ?product.id, name = %product.name, "Saving product");

        let mut tx = self.pool.begin().await?;

        let parent = match product.parent_id {
            Some(parent_id) => fetch_product(&mut tx, parent_id).await?,
            None => None,
        };
        derive_prices(&mut product, parent.as_ref())?;

        let now = Utc::now();
        let (id, name_changed) = match product.id {
            None => (insert_product(&mut tx, &product, now).await?, true),
            Some(id) => {
                let previous = fetch_product(&mut tx, id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Product", id))?;
                update_product(&mut tx, id, &product, now).await?;
                (id, previous.name != product.name)
            }
        };

        if name_changed {
            let renamed = sqlx::query(
                "UPDATE products SET name = ?1, modified_at = ?2 \
                 WHERE parent_id = ?3 AND deleted_at IS NULL",
            )
            .bind(&product.name)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if renamed > 0 {
                info!(id, renamed, name = %product.name, "Propagated product name to children");
            }
        }

        let saved = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        tx.commit().await?;

        Ok(saved)
    }

    /// Soft-deletes a product. A parent left without non-deleted children
    /// is demoted to stand-alone in the same transaction.
    pub async fn delete_product(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let mut tx = self.pool.begin().await?;

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let now = Utc::now();
        sqlx::query("UPDATE products SET deleted_at = ?2, modified_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        if let Some(parent_id) = product.parent_id {
            if count_children(&mut tx, parent_id).await? == 0 {
                let demoted = sqlx::query(
                    "UPDATE products SET structure = ?2, modified_at = ?3 \
                     WHERE id = ?1 AND structure = ?4",
                )
                .bind(parent_id)
                .bind(ProductStructure::Standalone)
                .bind(now)
                .bind(ProductStructure::Parent)
                .execute(&mut *tx)
                .await?
                .rows_affected();

                if demoted > 0 {
                    info!(parent_id, "Demoted childless parent to stand-alone");
                }
            }
        }

        tx.commit().await?;

        Ok(())
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================
//
// These take a plain connection so the pipelines can run them inside their
// transaction (`&mut tx`) and readers on a pooled connection.

async fn fetch_product(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND deleted_at IS NULL");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Product::try_from).transpose()
}

async fn count_children(conn: &mut SqliteConnection, parent_id: i64) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products WHERE parent_id = ?1 AND deleted_at IS NULL",
    )
    .bind(parent_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

async fn insert_product(
    conn: &mut SqliteConnection,
    product: &Product,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO products (
            webshop_id, structure, parent_id, category_id,
            name, description, active, featured,
            barcode_type, barcode, pcs_in_stock,
            price, price_excl_vat, vat, is_discountable,
            added_at, modified_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, ?10, ?11,
            ?12, ?13, ?14, ?15,
            ?16, ?16
        )
        "#,
    )
    .bind(product.webshop_id)
    .bind(product.structure)
    .bind(product.parent_id)
    .bind(product.category_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.active)
    .bind(product.featured)
    .bind(product.barcode_type)
    .bind(&product.barcode)
    .bind(product.pcs_in_stock.map(i64::from))
    .bind(encode_money(product.price))
    .bind(encode_money(product.price_excl_vat))
    .bind(product.vat)
    .bind(product.is_discountable)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn update_product(
    conn: &mut SqliteConnection,
    id: i64,
    product: &Product,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE products
        SET
            webshop_id = ?2,
            structure = ?3,
            parent_id = ?4,
            category_id = ?5,
            name = ?6,
            description = ?7,
            active = ?8,
            featured = ?9,
            barcode_type = ?10,
            barcode = ?11,
            pcs_in_stock = ?12,
            price = ?13,
            price_excl_vat = ?14,
            vat = ?15,
            is_discountable = ?16,
            modified_at = ?17
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(product.webshop_id)
    .bind(product.structure)
    .bind(product.parent_id)
    .bind(product.category_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.active)
    .bind(product.featured)
    .bind(product.barcode_type)
    .bind(&product.barcode)
    .bind(product.pcs_in_stock.map(i64::from))
    .bind(encode_money(product.price))
    .bind(encode_money(product.price_excl_vat))
    .bind(product.vat)
    .bind(product.is_discountable)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::webshop::NewWebshop;
    use rust_decimal_macros::dec;

    async fn setup() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shop = db
            .webshops()
            .insert(&NewWebshop {
                name: "Yoga Studio".to_string(),
                active: true,
            })
            .await
            .unwrap();
        (db, shop.id)
    }

    async fn save_parent(repo: &ProductRepository, shop: i64, name: &str) -> Product {
        let mut parent = Product::new(shop, name);
        parent.structure = ProductStructure::Parent;
        parent.vat = VatRate::High;
        repo.save_product(parent).await.unwrap()
    }

    async fn save_child(repo: &ProductRepository, parent: &Product, name: &str) -> Product {
        let mut child = Product::new(parent.webshop_id, name);
        child.structure = ProductStructure::Child;
        child.parent_id = parent.id;
        repo.save_product(child).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_derives_and_keeps_exact_prices() {
        let (db, shop) = setup().await;
        let repo = db.products();

        let mut tea = Product::new(shop, "Green tea");
        tea.price_excl_vat = Some(Money::new(dec!(1.3456)));
        let saved = repo.save_product(tea).await.unwrap();

        assert!(saved.id.is_some());
        assert!(saved.added_at.is_some());
        assert_eq!(saved.price, Some(Money::new(dec!(1.43))));
        // The authoritative value is stored as entered
        assert_eq!(saved.price_excl_vat, Some(Money::new(dec!(1.3456))));

        let loaded = repo.get_by_id(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn test_save_derives_excl_from_price() {
        let (db, shop) = setup().await;
        let repo = db.products();

        let mut mat = Product::new(shop, "Mat");
        mat.vat = VatRate::High;
        mat.price = Some(Money::new(dec!(100.00)));
        let saved = repo.save_product(mat).await.unwrap();
        assert_eq!(saved.price_excl_vat, Some(Money::new(dec!(82.64))));

        // Re-saving is stable
        let again = repo.save_product(saved.clone()).await.unwrap();
        assert_eq!(again.price, saved.price);
        assert_eq!(again.price_excl_vat, saved.price_excl_vat);
    }

    #[tokio::test]
    async fn test_child_prices_use_parent_vat() {
        let (db, shop) = setup().await;
        let repo = db.products();
        let parent = save_parent(&repo, shop, "Course").await;

        let mut child = Product::new(shop, "Monday");
        child.structure = ProductStructure::Child;
        child.parent_id = parent.id;
        child.vat = VatRate::Zero;
        child.price_excl_vat = Some(Money::new(dec!(10.00)));
        let child = repo.save_product(child).await.unwrap();

        assert_eq!(child.price, Some(Money::new(dec!(12.10))));
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let (db, shop) = setup().await;
        let mut ghost = Product::new(shop, "Ghost");
        ghost.id = Some(999);
        let err = db.products().save_product(ghost).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unrepresentable_price_is_rejected_before_write() {
        let (db, shop) = setup().await;
        let mut gold = Product::new(shop, "Gold");
        gold.price_excl_vat = Some(Money::new(rust_decimal::Decimal::MAX));
        let err = db.products().save_product(gold).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(db.webshops().num_products(shop).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_parent_is_rejected_by_foreign_key() {
        let (db, shop) = setup().await;
        let mut orphan = Product::new(shop, "Orphan");
        orphan.structure = ProductStructure::Child;
        orphan.parent_id = Some(404);
        let err = db.products().save_product(orphan).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_rename_parent_propagates_to_children() {
        let (db, shop) = setup().await;
        let repo = db.products();

        let mut parent = save_parent(&repo, shop, "A").await;
        let x = save_child(&repo, &parent, "X").await;
        let y = save_child(&repo, &parent, "Y").await;
        let z = save_child(&repo, &parent, "Z").await;
        repo.delete_product(z.id.unwrap()).await.unwrap();

        assert_eq!(repo.get_by_id(x.id.unwrap()).await.unwrap().unwrap().name, "X");

        parent.name = "B".to_string();
        repo.save_product(parent).await.unwrap();

        for child in [x, y] {
            let reloaded = repo.get_by_id(child.id.unwrap()).await.unwrap().unwrap();
            assert_eq!(reloaded.name, "B");
        }
    }

    #[tokio::test]
    async fn test_unchanged_name_leaves_children_alone() {
        let (db, shop) = setup().await;
        let repo = db.products();

        let mut parent = save_parent(&repo, shop, "A").await;
        let x = save_child(&repo, &parent, "X").await;

        parent.description = "Updated".to_string();
        repo.save_product(parent).await.unwrap();

        let reloaded = repo.get_by_id(x.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded.name, "X");
    }

    #[tokio::test]
    async fn test_deleting_last_child_demotes_parent() {
        let (db, shop) = setup().await;
        let repo = db.products();

        let parent = save_parent(&repo, shop, "Course").await;
        let parent_id = parent.id.unwrap();
        let a = save_child(&repo, &parent, "Monday").await;
        let b = save_child(&repo, &parent, "Tuesday").await;
        assert!(repo.has_children(parent_id).await.unwrap());

        repo.delete_product(a.id.unwrap()).await.unwrap();
        let reloaded = repo.get_by_id(parent_id).await.unwrap().unwrap();
        assert_eq!(reloaded.structure, ProductStructure::Parent);

        repo.delete_product(b.id.unwrap()).await.unwrap();
        let reloaded = repo.get_by_id(parent_id).await.unwrap().unwrap();
        assert_eq!(reloaded.structure, ProductStructure::Standalone);
        assert!(!repo.has_children(parent_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_soft_and_not_repeatable() {
        let (db, shop) = setup().await;
        let repo = db.products();
        let mug = repo.save_product(Product::new(shop, "Mug")).await.unwrap();
        let id = mug.id.unwrap();

        repo.delete_product(id).await.unwrap();
        assert!(repo.get_by_id(id).await.unwrap().is_none());
        assert!(repo.delete_product(id).await.unwrap_err().is_not_found());

        let deleted_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT deleted_at FROM products WHERE id = ?1")
                .bind(id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert!(deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_get_with_parent() {
        let (db, shop) = setup().await;
        let repo = db.products();
        let parent = save_parent(&repo, shop, "Course").await;
        let child = save_child(&repo, &parent, "Monday").await;

        let (loaded, loaded_parent) = repo
            .get_with_parent(child.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, child);
        assert_eq!(loaded_parent, Some(parent.clone()));

        let (_, none) = repo.get_with_parent(parent.id.unwrap()).await.unwrap().unwrap();
        assert!(none.is_none());
        assert!(repo.get_with_parent(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let (db, shop) = setup().await;
        let repo = db.products();

        let parent = save_parent(&repo, shop, "Course").await;
        save_child(&repo, &parent, "Monday").await;
        for i in 0..10 {
            let mut p = Product::new(shop, format!("Mat {i}"));
            p.featured = i % 2 == 0;
            p.active = i != 9;
            repo.save_product(p).await.unwrap();
        }

        let all = ProductFilter::default();
        assert_eq!(repo.count(&all).await.unwrap(), 12);
        assert_eq!(repo.list(&all, Page::default()).await.unwrap().len(), 9);
        assert_eq!(repo.list(&all, Page::new(2, 9)).await.unwrap().len(), 3);
        assert_eq!(repo.ids(&all).await.unwrap().len(), 12);

        let storefront = ProductFilter {
            default_only: true,
            ..Default::default()
        };
        assert_eq!(repo.count(&storefront).await.unwrap(), 11);

        let children = ProductFilter {
            parent: parent.id,
            ..Default::default()
        };
        assert_eq!(repo.list(&children, Page::default()).await.unwrap()[0].name, "Monday");

        let featured_active = ProductFilter {
            active: Some(true),
            featured: Some(true),
            structure: Some(ProductStructure::Standalone),
            webshop: Some(shop),
            ..Default::default()
        };
        assert_eq!(repo.count(&featured_active).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_children_min_price() {
        let (db, shop) = setup().await;
        let repo = db.products();

        let parent = save_parent(&repo, shop, "Course").await;
        assert_eq!(repo.children_min_price(&parent).await.unwrap(), None);

        save_child(&repo, &parent, "Monday").await;
        // Unpriced parent: every child counts as zero
        assert_eq!(
            repo.children_min_price(&parent).await.unwrap(),
            Some(Money::zero())
        );
    }
}
