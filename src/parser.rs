//! Source adapters: turn one fetched page body into raw product records.
//!
//! Adapters only locate product containers. Field extraction happens later,
//! in [`crate::extractor`], so adapters stay thin pattern matchers over
//! markup we do not control.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{RawProductRecord, ShopifyProduct, SourceContext};

pub const SPRING_LINK_MARKER: &str = "/listing/";
pub const SHOPIFY_LINK_MARKER: &str = "/products/";

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("unexpected JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Records located on one page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPage {
    pub records: Vec<RawProductRecord>,
    /// Entries the page itself carried, before pre-filtering or skipping
    /// malformed ones. Paging decisions use this, not `records.len()`.
    pub payload_len: usize,
}

pub trait SourceAdapter {
    fn name(&self) -> &'static str;

    fn raw_records(&self, body: &str) -> Result<RawPage, AdapterError>;
}

fn selector(css: &str) -> Result<Selector, AdapterError> {
    Selector::parse(css).map_err(|_| AdapterError::Selector(css.to_string()))
}

fn product_hrefs<'a>(container: ElementRef<'a>, link_marker: &str) -> Vec<&'a str> {
    let mut hrefs: Vec<&'a str> = Vec::new();
    for el in container.descendants().filter_map(ElementRef::wrap) {
        if el.value().name() != "a" {
            continue;
        }
        if let Some(href) = el.value().attr("href") {
            if href.contains(link_marker) && !hrefs.contains(&href) {
                hrefs.push(href);
            }
        }
    }
    hrefs
}

/// Product identity of a Shopify href: the handle after the last
/// `/products/`, without query, fragment or trailing slash. Theme cards often
/// link `/collections/all/products/x` and `/products/x?variant=1` to the same
/// product.
pub fn shopify_handle(href: &str) -> Option<&str> {
    let (_, tail) = href.rsplit_once(SHOPIFY_LINK_MARKER)?;
    let handle = tail
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    if handle.is_empty() { None } else { Some(handle) }
}

/// Creator-marketplace (Spring) listing pages: one
/// `div[data-testid="product-tile"]` per product.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpringTiles;

impl SourceAdapter for SpringTiles {
    fn name(&self) -> &'static str {
        "spring-tiles"
    }

    fn raw_records(&self, body: &str) -> Result<RawPage, AdapterError> {
        let doc = Html::parse_document(body);
        let tile_selector = selector(r#"div[data-testid="product-tile"]"#)?;

        let mut seen_links = HashSet::new();
        let mut records = Vec::new();
        let mut payload_len = 0;
        for tile in doc.select(&tile_selector) {
            payload_len += 1;
            let Some(href) = product_hrefs(tile, SPRING_LINK_MARKER).first().copied() else {
                continue;
            };
            // Cheap pre-filter; the aggregator's (name, link) check is authoritative.
            if !seen_links.insert(href.to_string()) {
                continue;
            }
            records.push(RawProductRecord::Tile {
                html: tile.html(),
                link_marker: SPRING_LINK_MARKER,
            });
        }

        debug!(adapter = self.name(), records = records.len(), "Located product tiles");
        Ok(RawPage {
            records,
            payload_len,
        })
    }
}

/// Generic Shopify theme grid (`/collections/all`), used when the JSON API
/// is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShopifyGrid;

impl ShopifyGrid {
    fn is_product_container(el: ElementRef<'_>) -> bool {
        let class = el.value().attr("class").unwrap_or_default().to_lowercase();
        class.contains("product") || class.contains("item")
    }
}

impl SourceAdapter for ShopifyGrid {
    fn name(&self) -> &'static str {
        "shopify-grid"
    }

    fn raw_records(&self, body: &str) -> Result<RawPage, AdapterError> {
        let doc = Html::parse_document(body);
        let container_selector = selector("div, li, article")?;

        let mut seen_handles = HashSet::new();
        let mut records = Vec::new();
        for container in doc.select(&container_selector) {
            if !Self::is_product_container(container) {
                continue;
            }
            let mut handles: Vec<&str> = product_hrefs(container, SHOPIFY_LINK_MARKER)
                .into_iter()
                .filter_map(shopify_handle)
                .collect();
            handles.sort_unstable();
            handles.dedup();
            // Grid wrappers hold many products; only single-product cards count.
            // Cards nested in an accepted card share its handle and are skipped.
            let [handle] = handles.as_slice() else {
                continue;
            };
            if !seen_handles.insert(handle.to_string()) {
                continue;
            }
            records.push(RawProductRecord::Tile {
                html: container.html(),
                link_marker: SHOPIFY_LINK_MARKER,
            });
        }

        debug!(adapter = self.name(), records = records.len(), "Located grid cards");
        let payload_len = records.len();
        Ok(RawPage {
            records,
            payload_len,
        })
    }
}

/// Shopify `products.json`, paged with `?page=<n>&limit=<PAGE_SIZE>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShopifyApi;

#[derive(Deserialize)]
struct ProductsEnvelope {
    #[serde(default)]
    products: Vec<serde_json::Value>,
}

impl ShopifyApi {
    pub const PAGE_SIZE: usize = 250;

    pub fn page_url(ctx: &SourceContext, page: usize) -> Result<String, url::ParseError> {
        let mut url = ctx.base.join("products.json")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &Self::PAGE_SIZE.to_string());
        Ok(url.to_string())
    }

    /// A short (or empty) page means there is nothing after it.
    pub fn is_last_page(payload_len: usize) -> bool {
        payload_len < Self::PAGE_SIZE
    }
}

impl SourceAdapter for ShopifyApi {
    fn name(&self) -> &'static str {
        "shopify-api"
    }

    fn raw_records(&self, body: &str) -> Result<RawPage, AdapterError> {
        let envelope: ProductsEnvelope = serde_json::from_str(body)?;
        let payload_len = envelope.products.len();

        let mut records = Vec::with_capacity(envelope.products.len());
        for (index, value) in envelope.products.into_iter().enumerate() {
            match serde_json::from_value::<ShopifyProduct>(value) {
                Ok(product) => records.push(RawProductRecord::Api(product)),
                Err(e) => warn!(index, error = %e, "Skipping malformed product entry"),
            }
        }
        Ok(RawPage {
            records,
            payload_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_tiles_skip_repeats_and_linkless_tiles() {
        let html = r#"
            <html><body>
              <div data-testid="product-tile"><a href="/listing/1"><span class="sr-only">Classic Tee</span></a></div>
              <div data-testid="product-tile"><a href="/listing/1"><span class="sr-only">Classic Tee</span></a></div>
              <div data-testid="product-tile"><a href="/about">About us</a></div>
              <div class="other"><a href="/listing/9">Not a tile</a></div>
              <div data-testid="product-tile"><a href="/listing/2"><img alt="Camp Mug"></a></div>
            </body></html>"#;
        let page = SpringTiles.raw_records(html).unwrap();
        assert_eq!(page.payload_len, 4);
        let records = page.records;
        assert_eq!(records.len(), 2);
        match &records[1] {
            RawProductRecord::Tile { html, link_marker } => {
                assert!(html.contains("/listing/2"));
                assert_eq!(*link_marker, SPRING_LINK_MARKER);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn grid_keeps_single_product_cards() {
        let html = r#"
            <ul class="product-grid">
              <li class="grid__item">
                <div class="card-wrapper product-card">
                  <a href="/products/classic-tee">Classic Tee</a>
                </div>
              </li>
              <li class="grid__item"><a href="/products/camp-mug">Camp Mug</a></li>
            </ul>"#;
        let records = ShopifyGrid.raw_records(html).unwrap().records;
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn grid_card_with_image_and_title_links() {
        let html = r#"
            <ul class="product-grid">
              <li class="grid__item">
                <a href="/collections/all/products/classic-tee"><img src="/cdn/tee.jpg" alt="Classic Tee"></a>
                <h3 class="card__heading"><a href="/products/classic-tee">Classic Tee</a></h3>
              </li>
              <li class="grid__item">
                <a href="/products/camp-mug?variant=42"><img src="/cdn/mug.jpg" alt="Camp Mug"></a>
                <h3 class="card__heading"><a href="/products/camp-mug">Camp Mug</a></h3>
              </li>
            </ul>"#;
        let records = ShopifyGrid.raw_records(html).unwrap().records;
        assert_eq!(records.len(), 2);
        match &records[0] {
            RawProductRecord::Tile { html, .. } => assert!(html.contains("/products/classic-tee")),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn grid_wrapper_with_many_products_is_not_a_card() {
        let html = r#"
            <div class="collection product-list">
              <div class="product-card"><a href="/products/a">A</a></div>
              <div class="product-card"><a href="/products/b">B</a></div>
            </div>"#;
        let records = ShopifyGrid.raw_records(html).unwrap().records;
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn handle_ignores_collection_prefix_and_query() {
        assert_eq!(shopify_handle("/collections/all/products/tee?variant=1"), Some("tee"));
        assert_eq!(shopify_handle("https://s.example.com/products/tee/#top"), Some("tee"));
        assert_eq!(shopify_handle("/products/"), None);
        assert_eq!(shopify_handle("/pages/about"), None);
    }

    #[test]
    fn api_skips_malformed_entries() {
        let body = r#"{"products": [
            {"title": "Classic Tee", "handle": "classic-tee", "variants": [{"price": "25.00"}]},
            {"title": ["not", "a", "string"]},
            {"title": "Camp Mug", "handle": "camp-mug", "product_type": null}
        ]}"#;
        let page = ShopifyApi.raw_records(body).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.payload_len, 3);
    }

    #[test]
    fn api_rejects_non_json_body() {
        assert!(matches!(
            ShopifyApi.raw_records("<html>maintenance</html>"),
            Err(AdapterError::Json(_))
        ));
    }

    #[test]
    fn api_missing_products_key_is_empty_page() {
        assert_eq!(ShopifyApi.raw_records("{}").unwrap(), RawPage::default());
    }

    #[test]
    fn api_paging() {
        let ctx = SourceContext::new("https://shop.example.com/", "Demo", "Official").unwrap();
        assert_eq!(
            ShopifyApi::page_url(&ctx, 2).unwrap(),
            "https://shop.example.com/products.json?page=2&limit=250"
        );
        assert!(ShopifyApi::is_last_page(0));
        assert!(ShopifyApi::is_last_page(249));
        assert!(!ShopifyApi::is_last_page(250));
    }
}
