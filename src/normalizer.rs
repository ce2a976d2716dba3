use tracing::debug;

use crate::categorizer::categorize;
use crate::extractor::extract;
use crate::models::{Product, RawProductRecord, SourceContext};

/// Turns one raw record into a catalog entry, or `None` when it has no name.
/// The id stays 0 until the aggregator flushes.
pub fn normalize(raw: &RawProductRecord, ctx: &SourceContext) -> Option<Product> {
    let Some(fields) = extract(raw) else {
        debug!("Dropping record without a resolvable name or product link");
        return None;
    };

    let category = categorize(&fields.name, &fields.product_type);
    let link = ctx.absolutize(&fields.link);
    let image = ctx.absolutize(&fields.image);
    let description = describe(ctx, &fields.name);

    Some(Product {
        id: 0,
        name: fields.name,
        price: fields.price,
        category,
        product_type: fields.product_type,
        image,
        link,
        description,
    })
}

pub fn describe(ctx: &SourceContext, name: &str) -> String {
    format!(
        "{} {} from the {} collection.",
        ctx.description_prefix, name, ctx.collection
    )
}
