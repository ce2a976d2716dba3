use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{CatalogSummary, Product};

fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

pub fn save_catalog(products: &[Product], path: &Path) -> Result<()> {
    save_json(products, path)
}

pub fn save_summary(summary: &CatalogSummary, path: &Path) -> Result<()> {
    save_json(summary, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn catalog() -> Vec<Product> {
        vec![Product {
            id: 1,
            name: "Classic Tee".into(),
            price: "$25.00".into(),
            category: Category::TShirts,
            product_type: "Classic Tee".into(),
            image: "https://cdn.example.com/tee.jpg".into(),
            link: "https://store.example.com/listing/1".into(),
            description: "Official Classic Tee from the Demo collection.".into(),
        }]
    }

    #[test]
    fn catalog_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        save_catalog(&catalog(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Product> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, catalog());
        assert!(written.contains("\"category\": \"T-Shirts\""));
    }

    #[test]
    fn empty_catalog_is_written_as_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        save_catalog(&[], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn summary_file_has_category_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let summary = CatalogSummary::from_catalog("https://store.example.com", &catalog());
        save_summary(&summary, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total_products"], 1);
        assert_eq!(value["by_category"]["T-Shirts"], 1);
        assert_eq!(value["store_url"], "https://store.example.com");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("products.json");
        assert!(save_catalog(&catalog(), &path).is_err());
    }
}
