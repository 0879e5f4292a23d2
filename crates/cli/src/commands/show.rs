use glimmer_core::config::LoadOptions;
use glimmer_core::domain::product::{Product, ProductId};
use glimmer_db::repositories::{
    CatalogRepository, RecommendationRepository, SqlCatalogRepository,
    SqlRecommendationRepository,
};

use crate::commands::{build_runtime, load_config, open_database, CommandResult, Failure};

struct ShownLists {
    product: Product,
    recommended: Vec<Product>,
    also_bought: Vec<Product>,
}

/// Prints the stored lists for one product with ids resolved to catalog
/// entries. Ids of products removed since the last job run are dropped.
pub fn run(options: &LoadOptions, product_id: i64) -> CommandResult {
    let config = match load_config("show", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("show") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result: Result<ShownLists, Failure> = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let catalog = SqlCatalogRepository::new(pool.clone());
        let recommendations = SqlRecommendationRepository::new(pool.clone());
        let shown = resolve(&catalog, &recommendations, ProductId(product_id)).await;
        pool.close().await;
        shown
    });

    match result {
        Ok(shown) => CommandResult::success("show", render(&shown)),
        Err(failure) => CommandResult::from_failure("show", failure),
    }
}

async fn resolve(
    catalog: &dyn CatalogRepository,
    recommendations: &dyn RecommendationRepository,
    id: ProductId,
) -> Result<ShownLists, Failure> {
    let db_failure = |error: glimmer_db::repositories::RepositoryError| {
        ("db_query", error.to_string(), 4u8)
    };

    let product = catalog
        .find_products(&[id])
        .await
        .map_err(db_failure)?
        .into_iter()
        .next()
        .ok_or_else(|| ("invalid_argument", format!("unknown product {}", id.0), 6u8))?;

    let lists = recommendations.lists_for_product(id).await.map_err(db_failure)?;
    let recommended = catalog.find_products(&lists.recommended).await.map_err(db_failure)?;
    let also_bought = catalog.find_products(&lists.also_bought).await.map_err(db_failure)?;

    Ok(ShownLists { product, recommended, also_bought })
}

fn render(shown: &ShownLists) -> String {
    format!(
        "{}\nrecommended: {}\nalso bought: {}",
        label(&shown.product),
        render_list(&shown.recommended),
        render_list(&shown.also_bought)
    )
}

fn render_list(products: &[Product]) -> String {
    if products.is_empty() {
        return "<none>".to_string();
    }
    products.iter().map(label).collect::<Vec<_>>().join(", ")
}

fn label(product: &Product) -> String {
    format!("{} (#{})", product.name, product.id.0)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use glimmer_core::domain::product::{Product, ProductId};
    use glimmer_core::domain::recommendation::ListWrite;
    use glimmer_db::repositories::{CatalogRepository, InMemoryStore, RecommendationRepository};

    use super::{render, resolve};

    #[tokio::test]
    async fn renders_names_in_stored_order() {
        let store = InMemoryStore::default();
        for (id, name) in [(1, "Polki Choker"), (2, "Pearl Drop Jhumka"), (3, "Kundan Bangle Pair")] {
            store.save_product(Product::new(id, name)).await.expect("save");
        }
        store
            .replace_recommended(
                &[ListWrite { product_id: ProductId(1), ids: vec![ProductId(3), ProductId(2)] }],
                Utc::now(),
            )
            .await
            .expect("write");

        let shown = resolve(&store, &store, ProductId(1)).await.expect("resolve");

        assert_eq!(
            render(&shown),
            "Polki Choker (#1)\nrecommended: Kundan Bangle Pair (#3), Pearl Drop Jhumka (#2)\nalso bought: <none>"
        );
    }

    #[tokio::test]
    async fn unknown_product_is_an_invalid_argument() {
        let store = InMemoryStore::default();

        let failure = resolve(&store, &store, ProductId(42)).await.err().expect("failure");

        assert_eq!(failure.0, "invalid_argument");
        assert_eq!(failure.2, 6);
    }
}
