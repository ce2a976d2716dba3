use std::collections::HashSet;

use thiserror::Error;

use crate::models::Product;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AggregatorError {
    #[error("catalog already flushed; create a new aggregator to ingest more pages")]
    Sealed,
}

/// Counts for one `ingest` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub seen: usize,
    pub added: usize,
}

/// Merges pages into one catalog keyed on `(name, link)`.
///
/// Lifecycle is construct, any number of `ingest` calls, then `flush`.
/// First occurrence of a key wins and keeps its position. `flush` numbers
/// the catalog from 1 and seals it; later `ingest` calls are rejected with
/// [`AggregatorError::Sealed`]. Flushing without any ingest yields an empty
/// catalog.
#[derive(Debug, Default)]
pub struct Aggregator {
    seen: HashSet<(String, String)>,
    products: Vec<Product>,
    sealed: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest<I>(&mut self, page: I) -> Result<IngestReport, AggregatorError>
    where
        I: IntoIterator<Item = Product>,
    {
        if self.sealed {
            return Err(AggregatorError::Sealed);
        }

        let mut report = IngestReport::default();
        for product in page {
            report.seen += 1;
            if self.seen.insert(product.dedup_key()) {
                self.products.push(product);
                report.added += 1;
            }
        }
        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn flush(&mut self) -> &[Product] {
        if !self.sealed {
            for (position, product) in self.products.iter_mut().enumerate() {
                product.id = position as u64 + 1;
            }
            self.sealed = true;
        }
        &self.products
    }

    pub fn into_catalog(mut self) -> Vec<Product> {
        self.flush();
        self.products
    }
}
