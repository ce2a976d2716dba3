pub mod aggregator;
pub mod archiver;
pub mod categorizer;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod report;
