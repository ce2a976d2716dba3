use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

pub const PRICE_SENTINEL: &str = "See store for pricing";

/// Closed category taxonomy every product is sorted into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "T-Shirts")]
    TShirts,
    #[serde(rename = "Hoodies & Sweatshirts")]
    HoodiesSweatshirts,
    #[serde(rename = "Tank Tops")]
    TankTops,
    #[serde(rename = "Long Sleeve")]
    LongSleeve,
    Drinkware,
    Headwear,
    Merch,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::TShirts => "T-Shirts",
            Category::HoodiesSweatshirts => "Hoodies & Sweatshirts",
            Category::TankTops => "Tank Tops",
            Category::LongSleeve => "Long Sleeve",
            Category::Drinkware => "Drinkware",
            Category::Headwear => "Headwear",
            Category::Merch => "Merch",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One catalog entry. Field order is the serialized order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: String,
    pub category: Category,
    pub product_type: String,
    pub image: String,
    pub link: String,
    pub description: String,
}

impl Product {
    pub fn dedup_key(&self) -> (String, String) {
        (self.name.clone(), self.link.clone())
    }
}

/// One product container as handed over by a source adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProductRecord {
    /// Outer HTML of a product container plus the href fragment that marks
    /// its product link.
    Tile {
        html: String,
        link_marker: &'static str,
    },
    Api(ShopifyProduct),
}

/// Subset of a `products.json` entry.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ShopifyProduct {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub images: Vec<ShopifyImage>,
    #[serde(default)]
    pub variants: Vec<ShopifyVariant>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ShopifyImage {
    #[serde(default)]
    pub src: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ShopifyVariant {
    /// Shopify sends a string ("25.00"); some proxies send a number.
    #[serde(default)]
    pub price: Option<serde_json::Value>,
}

/// Fields pulled out of a raw record before categorization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedFields {
    pub name: String,
    pub price: String,
    pub image: String,
    pub product_type: String,
    /// As found in the source; may still be relative.
    pub link: String,
}

/// Per-store settings the normalizer needs.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Store root, always ending in `/` so relative paths stay under it.
    pub base: Url,
    pub collection: String,
    pub description_prefix: String,
}

impl SourceContext {
    pub fn new(
        base_url: &str,
        collection: &str,
        description_prefix: &str,
    ) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(SourceContext {
            base,
            collection: collection.to_string(),
            description_prefix: description_prefix.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    pub fn page_url(&self, path: &str) -> Result<String, url::ParseError> {
        Ok(self.base.join(path)?.to_string())
    }

    /// Resolves an href found on a store page. Empty hrefs stay empty, and
    /// ones that cannot be resolved are kept as found.
    pub fn absolutize(&self, href: &str) -> String {
        let href = href.trim();
        if href.is_empty() {
            return String::new();
        }
        match self.base.join(href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!(href, error = %e, "Keeping unresolvable href");
                href.to_string()
            }
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CatalogSummary {
    pub store_url: String,
    pub total_products: usize,
    pub by_category: BTreeMap<String, usize>,
    pub last_updated: String,
}

impl CatalogSummary {
    pub fn from_catalog(store_url: &str, products: &[Product]) -> Self {
        let mut by_category = BTreeMap::new();
        for product in products {
            *by_category
                .entry(product.category.label().to_string())
                .or_insert(0) += 1;
        }

        CatalogSummary {
            store_url: store_url.to_string(),
            total_products: products.len(),
            by_category,
            last_updated: chrono::Utc::now().format("%Y-%m-%d").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, category: Category) -> Product {
        Product {
            id: 0,
            name: name.to_string(),
            price: PRICE_SENTINEL.to_string(),
            category,
            product_type: String::new(),
            image: String::new(),
            link: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_string(&Category::HoodiesSweatshirts).unwrap();
        assert_eq!(json, "\"Hoodies & Sweatshirts\"");
        assert_eq!(Category::TShirts.to_string(), "T-Shirts");
    }

    #[test]
    fn product_fields_serialize_in_order() {
        let json = serde_json::to_string(&product("Camp Mug", Category::Drinkware)).unwrap();
        let keys = ["\"id\"", "\"name\"", "\"price\"", "\"category\"", "\"product_type\"", "\"image\"", "\"link\"", "\"description\""];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn summary_counts_per_category() {
        let products = vec![
            product("Classic Tee", Category::TShirts),
            product("Camp Mug", Category::Drinkware),
            product("Pocket Tee", Category::TShirts),
        ];
        let summary = CatalogSummary::from_catalog("https://shop.example.com", &products);
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.by_category.get("T-Shirts"), Some(&2));
        assert_eq!(summary.by_category.get("Drinkware"), Some(&1));
    }

    #[test]
    fn page_url_joins_paths() {
        let ctx = SourceContext::new("https://store.example.com/", "Demo", "Official").unwrap();
        assert_eq!(ctx.page_url("/apparel").unwrap(), "https://store.example.com/apparel");
        assert_eq!(ctx.page_url("tank-tops").unwrap(), "https://store.example.com/tank-tops");
        assert_eq!(ctx.page_url("/").unwrap(), "https://store.example.com/");
        assert_eq!(
            ctx.page_url("https://other.example.com/x").unwrap(),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn base_with_path_keeps_relative_pages_under_it() {
        let ctx = SourceContext::new("https://s.example.com/shop", "Demo", "Official").unwrap();
        assert_eq!(ctx.base_url(), "https://s.example.com/shop/");
        assert_eq!(ctx.page_url("tees").unwrap(), "https://s.example.com/shop/tees");
        assert_eq!(ctx.page_url("/tees").unwrap(), "https://s.example.com/tees");
    }

    #[test]
    fn absolutize_follows_url_resolution() {
        let ctx = SourceContext::new("https://s.example.com/shop/", "Demo", "Official").unwrap();
        assert_eq!(ctx.absolutize("../a"), "https://s.example.com/a");
        assert_eq!(ctx.absolutize("/products/a"), "https://s.example.com/products/a");
        assert_eq!(ctx.absolutize("products/a"), "https://s.example.com/shop/products/a");
        assert_eq!(ctx.absolutize("?q=mug"), "https://s.example.com/shop/?q=mug");
        assert_eq!(ctx.absolutize("#reviews"), "https://s.example.com/shop/#reviews");
        assert_eq!(ctx.absolutize("//cdn.example.com/a.jpg"), "https://cdn.example.com/a.jpg");
        assert_eq!(ctx.absolutize("https://x.example.com/p"), "https://x.example.com/p");
        assert_eq!(ctx.absolutize("  "), "");
    }

    #[test]
    fn invalid_base_is_rejected() {
        assert!(SourceContext::new("not a url", "Demo", "Official").is_err());
    }
}
