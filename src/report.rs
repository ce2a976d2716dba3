use std::collections::BTreeMap;

use crate::models::Product;

const SHOWN_PER_CATEGORY: usize = 5;

/// Groups products by category label, categories sorted, catalog order kept
/// inside each group.
pub fn group_by_category(products: &[Product]) -> BTreeMap<&'static str, Vec<&Product>> {
    let mut groups: BTreeMap<&'static str, Vec<&Product>> = BTreeMap::new();
    for product in products {
        groups.entry(product.category.label()).or_default().push(product);
    }
    groups
}

pub fn print_catalog(products: &[Product]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }

    println!("{}", "=".repeat(80));
    println!("PRODUCT CATALOG - {} TOTAL PRODUCTS", products.len());
    println!("{}", "=".repeat(80));

    for (category, items) in group_by_category(products) {
        println!("\n{} ({} items)", category, items.len());
        println!("{}", "-".repeat(80));
        for product in items.iter().take(SHOWN_PER_CATEGORY) {
            println!("  {:2}. {}", product.id, product.name);
            if !product.product_type.is_empty() {
                println!("      Type: {}", product.product_type);
            }
            println!("      Price: {}", product.price);
            println!("      Link: {}", product.link);
        }
        if items.len() > SHOWN_PER_CATEGORY {
            println!("  ... and {} more", items.len() - SHOWN_PER_CATEGORY);
        }
    }
}
