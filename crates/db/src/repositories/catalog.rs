use sqlx::Row;

use glimmer_core::domain::product::{
    resolve_in_order, CategoryId, CategoryRef, ParentCategoryId, Product, ProductId,
};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.short_description, p.description, p.metal,
            p.category_id, c.name AS category_name, pc.name AS parent_name
     FROM product p
     LEFT JOIN product_category c ON c.id = p.category_id
     LEFT JOIN parent_category_assignment a ON a.category_id = c.id
     LEFT JOIN parent_category pc ON pc.id = a.parent_id";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let short_description: Option<String> =
        row.try_get("short_description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: Option<String> =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let metal: Option<String> =
        row.try_get("metal").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category_id: Option<i64> =
        row.try_get("category_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category_name: Option<String> =
        row.try_get("category_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let parent_name: Option<String> =
        row.try_get("parent_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let category = match (category_id, category_name) {
        (Some(id), Some(name)) => Some(CategoryRef { id: CategoryId(id), name, parent_name }),
        _ => None,
    };

    Ok(Product { id: ProductId(id), name, short_description, description, metal, category })
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("{PRODUCT_SELECT} ORDER BY p.id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()
    }

    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{PRODUCT_SELECT} WHERE p.id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.0);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let products = rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()?;

        Ok(resolve_in_order(&products, ids))
    }

    async fn save_product(&self, product: Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, category_id, name, short_description, description, metal)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 category_id = excluded.category_id,
                 name = excluded.name,
                 short_description = excluded.short_description,
                 description = excluded.description,
                 metal = excluded.metal",
        )
        .bind(product.id.0)
        .bind(product.category.as_ref().map(|category| category.id.0))
        .bind(&product.name)
        .bind(&product.short_description)
        .bind(&product.description)
        .bind(&product.metal)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM product WHERE id = ?").bind(id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_category(&self, id: CategoryId, name: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product_category (id, name) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(id.0)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_parent_category(
        &self,
        id: ParentCategoryId,
        name: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO parent_category (id, name) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(id.0)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn assign_parent(
        &self,
        category: CategoryId,
        parent: ParentCategoryId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO parent_category_assignment (parent_id, category_id) VALUES (?, ?)
             ON CONFLICT(category_id) DO UPDATE SET parent_id = excluded.parent_id",
        )
        .bind(parent.0)
        .bind(category.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glimmer_core::domain::product::{
        CategoryId, CategoryRef, ParentCategoryId, Product, ProductId,
    };

    use super::SqlCatalogRepository;
    use crate::repositories::CatalogRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn in_category(id: i64, name: &str, category: i64) -> Product {
        Product {
            category: Some(CategoryRef {
                id: CategoryId(category),
                name: String::new(),
                parent_name: None,
            }),
            ..Product::new(id, name)
        }
    }

    #[tokio::test]
    async fn list_products_resolves_category_and_parent_names() {
        let repo = SqlCatalogRepository::new(setup().await);
        repo.save_parent_category(ParentCategoryId(1), "Bridal").await.expect("parent");
        repo.save_category(CategoryId(10), "Necklaces").await.expect("category");
        repo.save_category(CategoryId(11), "Rings").await.expect("category");
        repo.assign_parent(CategoryId(10), ParentCategoryId(1)).await.expect("assign");

        repo.save_product(in_category(2, "Solitaire", 11)).await.expect("save");
        repo.save_product(in_category(1, "Rani Haar", 10)).await.expect("save");
        repo.save_product(Product::new(3, "Loose Pearl")).await.expect("save");

        let products = repo.list_products().await.expect("list");

        let ids: Vec<i64> = products.iter().map(|product| product.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let haar = products[0].category.as_ref().expect("category");
        assert_eq!(haar.name, "Necklaces");
        assert_eq!(haar.parent_name.as_deref(), Some("Bridal"));

        let ring = products[1].category.as_ref().expect("category");
        assert_eq!(ring.parent_name, None);
        assert!(products[2].category.is_none());
    }

    #[tokio::test]
    async fn find_products_preserves_requested_order() {
        let repo = SqlCatalogRepository::new(setup().await);
        for (id, name) in [(1, "Kada"), (2, "Jhumka"), (3, "Nath")] {
            repo.save_product(Product::new(id, name)).await.expect("save");
        }

        let found = repo
            .find_products(&[ProductId(3), ProductId(42), ProductId(1)])
            .await
            .expect("find");

        let names: Vec<&str> = found.iter().map(|product| product.name.as_str()).collect();
        assert_eq!(names, vec!["Nath", "Kada"]);
        assert!(repo.find_products(&[]).await.expect("empty").is_empty());
    }

    #[tokio::test]
    async fn reassigning_parent_replaces_previous_assignment() {
        let repo = SqlCatalogRepository::new(setup().await);
        repo.save_parent_category(ParentCategoryId(1), "Bridal").await.expect("parent");
        repo.save_parent_category(ParentCategoryId(2), "Everyday").await.expect("parent");
        repo.save_category(CategoryId(10), "Earrings").await.expect("category");
        repo.assign_parent(CategoryId(10), ParentCategoryId(1)).await.expect("assign");
        repo.assign_parent(CategoryId(10), ParentCategoryId(2)).await.expect("reassign");
        repo.save_product(in_category(1, "Studs", 10)).await.expect("save");

        let products = repo.list_products().await.expect("list");

        let category = products[0].category.as_ref().expect("category");
        assert_eq!(category.parent_name.as_deref(), Some("Everyday"));
    }

    #[tokio::test]
    async fn delete_product_reports_whether_it_existed() {
        let repo = SqlCatalogRepository::new(setup().await);
        repo.save_product(Product::new(1, "Maang Tikka")).await.expect("save");

        assert!(repo.delete_product(ProductId(1)).await.expect("delete"));
        assert!(!repo.delete_product(ProductId(1)).await.expect("delete again"));
        assert!(repo.list_products().await.expect("list").is_empty());
    }
}
