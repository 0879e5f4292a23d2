use crate::domain::product::Product;

/// Text document describing one product for content similarity.
///
/// Parts are joined with single spaces in a fixed order: name, short
/// description, long description, metal, category, parent category. Empty
/// parts are skipped. A product with no usable text falls back to its name,
/// then to `product_<id>`, so the corpus never holds an empty document.
pub fn build_document(product: &Product) -> String {
    let category = product.category.as_ref();
    let parts = [
        Some(product.name.as_str()),
        product.short_description.as_deref(),
        product.description.as_deref(),
        product.metal.as_deref(),
        category.map(|category| category.name.as_str()),
        category.and_then(|category| category.parent_name.as_deref()),
    ];

    let text = parts
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if !text.trim().is_empty() {
        return text;
    }

    if !product.name.trim().is_empty() {
        product.name.clone()
    } else {
        format!("product_{}", product.id.0)
    }
}

pub fn build_corpus(products: &[Product]) -> Vec<String> {
    products.iter().map(build_document).collect()
}

#[cfg(test)]
mod tests {
    use super::{build_corpus, build_document};
    use crate::domain::product::{CategoryId, CategoryRef, Product};

    #[test]
    fn document_joins_fields_in_fixed_order() {
        let product = Product {
            short_description: Some("Temple jewellery".to_string()),
            description: Some("Hand carved lakshmi motif".to_string()),
            metal: Some("Yellow Gold".to_string()),
            category: Some(CategoryRef {
                id: CategoryId(3),
                name: "Necklaces".to_string(),
                parent_name: Some("Bridal".to_string()),
            }),
            ..Product::new(1, "Lakshmi Haram")
        };

        assert_eq!(
            build_document(&product),
            "Lakshmi Haram Temple jewellery Hand carved lakshmi motif Yellow Gold Necklaces Bridal"
        );
    }

    #[test]
    fn empty_fields_are_skipped() {
        let product = Product {
            short_description: Some(String::new()),
            metal: Some("Silver".to_string()),
            category: Some(CategoryRef {
                id: CategoryId(3),
                name: "Anklets".to_string(),
                parent_name: None,
            }),
            ..Product::new(2, "Payal")
        };

        assert_eq!(build_document(&product), "Payal Silver Anklets");
    }

    #[test]
    fn blank_product_gets_placeholder_document() {
        let named = Product::new(5, "Nath");
        let blank = Product::new(6, "");
        let whitespace = Product { short_description: Some("   ".to_string()), ..Product::new(7, "") };

        assert_eq!(build_document(&named), "Nath");
        assert_eq!(build_document(&blank), "product_6");
        assert_eq!(build_document(&whitespace), "product_7");
        assert!(build_corpus(&[named, blank, whitespace]).iter().all(|doc| !doc.is_empty()));
    }
}
