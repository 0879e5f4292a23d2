use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParentCategoryId(pub i64);

/// Category as seen from a product row, with its assigned parent resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub parent_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub metal: Option<String>,
    pub category: Option<CategoryRef>,
}

impl Product {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: ProductId(id),
            name: name.into(),
            short_description: None,
            description: None,
            metal: None,
            category: None,
        }
    }
}

/// Orders `products` by the position of their id in `ids`, dropping ids that
/// have no matching product. Used when rendering stored id lists.
pub fn resolve_in_order(products: &[Product], ids: &[ProductId]) -> Vec<Product> {
    ids.iter()
        .filter_map(|id| products.iter().find(|product| product.id == *id))
        .cloned()
        .collect()
}
