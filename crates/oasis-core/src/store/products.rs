//! CRUD operations for the `product` table.

use super::DbPool;
use crate::error::StoreError;

/// A sellable product agents can purchase during replay.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sales: i64,
}

/// Register a product. Returns `None` if `name` is already taken
/// (`product.name` is unique).
pub async fn insert_product(pool: &DbPool, name: &str) -> Result<Option<i64>, StoreError> {
    if get_product_by_name(pool, name).await?.is_some() {
        return Ok(None);
    }
    let result = sqlx::query("INSERT INTO product (name, sales) VALUES (?, 0)")
        .bind(name)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(Some(result.last_insert_rowid()))
}

/// Fetch a product by id.
pub async fn get_product(pool: &DbPool, product_id: i64) -> Result<Option<Product>, StoreError> {
    sqlx::query_as::<_, Product>("SELECT * FROM product WHERE id = ?")
        .bind(product_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Fetch a product by name.
pub async fn get_product_by_name(
    pool: &DbPool,
    name: &str,
) -> Result<Option<Product>, StoreError> {
    sqlx::query_as::<_, Product>("SELECT * FROM product WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

/// Record one purchase, bumping `sales` by one.
pub async fn purchase_product(pool: &DbPool, product_id: i64) -> Result<(), StoreError> {
    sqlx::query("UPDATE product SET sales = sales + 1 WHERE id = ?")
        .bind(product_id)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })?;
    Ok(())
}

/// All products, ordered by `sales` descending (for popularity views).
pub async fn list_products(pool: &DbPool) -> Result<Vec<Product>, StoreError> {
    sqlx::query_as::<_, Product>("SELECT * FROM product ORDER BY sales DESC, id ASC")
        .fetch_all(pool)
        .await
        .map_err(|e| StoreError::Query { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::init_test_db;

    #[tokio::test]
    async fn insert_product_rejects_duplicate_name() {
        let pool = init_test_db().await.unwrap();
        assert!(insert_product(&pool, "widget").await.unwrap().is_some());
        assert!(insert_product(&pool, "widget").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purchase_product_increments_sales() {
        let pool = init_test_db().await.unwrap();
        let id = insert_product(&pool, "widget").await.unwrap().unwrap();
        purchase_product(&pool, id).await.unwrap();
        purchase_product(&pool, id).await.unwrap();
        let product = get_product(&pool, id).await.unwrap().unwrap();
        assert_eq!(product.sales, 2);
    }

    #[tokio::test]
    async fn list_products_orders_by_sales_desc() {
        let pool = init_test_db().await.unwrap();
        let low = insert_product(&pool, "low").await.unwrap().unwrap();
        let high = insert_product(&pool, "high").await.unwrap().unwrap();
        purchase_product(&pool, high).await.unwrap();
        purchase_product(&pool, high).await.unwrap();
        purchase_product(&pool, low).await.unwrap();
        let products = list_products(&pool).await.unwrap();
        assert_eq!(products[0].name, "high");
    }
}
