//! Sequential fetch → adapt → normalize → aggregate driver.
//!
//! Pages are processed strictly one after another, and the catalog order
//! follows the order pages are handed to [`Pipeline::ingest_page`]. A page
//! that fails to fetch or parse contributes nothing; the run carries on.

use tracing::{info, warn};

use crate::aggregator::{Aggregator, AggregatorError};
use crate::fetcher::Fetch;
use crate::models::{Product, SourceContext};
use crate::normalizer::normalize;
use crate::parser::{ShopifyApi, ShopifyGrid, SourceAdapter};

/// What one page contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageReport {
    /// Entries the page carried, including ones the adapter skipped.
    pub payload_len: usize,
    /// Raw records the adapter located, before normalization.
    pub records: usize,
    /// Records that normalized into products.
    pub found: usize,
    /// Products not already in the catalog.
    pub added: usize,
}

pub struct Pipeline<'a, F: Fetch> {
    fetcher: &'a F,
    ctx: &'a SourceContext,
    aggregator: Aggregator,
}

impl<'a, F: Fetch> Pipeline<'a, F> {
    pub fn new(fetcher: &'a F, ctx: &'a SourceContext) -> Self {
        Pipeline {
            fetcher,
            ctx,
            aggregator: Aggregator::new(),
        }
    }

    /// Runs an already fetched body through `adapter` and into the catalog.
    pub fn ingest_body<A: SourceAdapter>(
        &mut self,
        adapter: &A,
        body: &str,
    ) -> Result<PageReport, AggregatorError> {
        let page = match adapter.raw_records(body) {
            Ok(page) => page,
            Err(e) => {
                warn!(adapter = adapter.name(), error = %e, "Could not parse page");
                return Ok(PageReport::default());
            }
        };

        let products: Vec<Product> = page
            .records
            .iter()
            .filter_map(|raw| normalize(raw, self.ctx))
            .collect();
        let found = products.len();
        let ingest = self.aggregator.ingest(products)?;

        Ok(PageReport {
            payload_len: page.payload_len,
            records: page.records.len(),
            found,
            added: ingest.added,
        })
    }

    pub fn ingest_page<A: SourceAdapter>(
        &mut self,
        adapter: &A,
        url: &str,
    ) -> Result<PageReport, AggregatorError> {
        let body = match self.fetcher.fetch(url) {
            Ok(body) => body,
            Err(e) => {
                warn!(url, error = %e, "Error fetching page");
                return Ok(PageReport::default());
            }
        };

        let report = self.ingest_body(adapter, &body)?;
        info!(
            url,
            "Found {} products ({} new)",
            report.found,
            report.added
        );
        Ok(report)
    }

    pub fn catalog_len(&self) -> usize {
        self.aggregator.len()
    }

    pub fn finish(self) -> Vec<Product> {
        self.aggregator.into_catalog()
    }
}

/// Scrapes a fixed list of store paths with one adapter.
pub fn scrape_pages<F: Fetch, A: SourceAdapter>(
    fetcher: &F,
    adapter: &A,
    ctx: &SourceContext,
    paths: &[String],
) -> Result<Vec<Product>, AggregatorError> {
    let mut pipeline = Pipeline::new(fetcher, ctx);
    for path in paths {
        match ctx.page_url(path) {
            Ok(url) => {
                pipeline.ingest_page(adapter, &url)?;
            }
            Err(e) => warn!(path = path.as_str(), error = %e, "Skipping unresolvable page path"),
        }
    }
    Ok(pipeline.finish())
}

/// Walks `products.json` pages until a short or empty page, or `max_pages`.
pub fn scrape_api_pages<F: Fetch>(
    pipeline: &mut Pipeline<'_, F>,
    ctx: &SourceContext,
    max_pages: usize,
) -> Result<usize, AggregatorError> {
    let mut pages = 0;
    for page in 1..=max_pages {
        let url = match ShopifyApi::page_url(ctx, page) {
            Ok(url) => url,
            Err(e) => {
                warn!(page, error = %e, "Could not build API page URL");
                break;
            }
        };
        let report = pipeline.ingest_page(&ShopifyApi, &url)?;
        pages += 1;
        if ShopifyApi::is_last_page(report.payload_len) {
            break;
        }
    }
    Ok(pages)
}

/// JSON API first; the `/collections/all` grid only when the API gave nothing.
pub fn scrape_shopify<F: Fetch>(
    fetcher: &F,
    ctx: &SourceContext,
    max_pages: usize,
) -> Result<Vec<Product>, AggregatorError> {
    let mut pipeline = Pipeline::new(fetcher, ctx);
    let pages = scrape_api_pages(&mut pipeline, ctx, max_pages)?;

    if pipeline.catalog_len() == 0 {
        warn!(pages, "JSON API yielded no products, trying the collection grid");
        match ctx.page_url("/collections/all") {
            Ok(url) => {
                pipeline.ingest_page(&ShopifyGrid, &url)?;
            }
            Err(e) => warn!(error = %e, "Could not build collection grid URL"),
        }
    } else {
        info!(pages, products = pipeline.catalog_len(), "Fetched products from JSON API");
    }

    Ok(pipeline.finish())
}
