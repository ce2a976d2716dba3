//! Field extraction for raw product records.
//!
//! Each field is resolved through an ordered chain of strategies. A strategy
//! is a plain `fn` returning `Option<String>`; the first `Some` wins. Nothing
//! in here fails loudly: a missing element simply hands over to the next
//! strategy, and a record without a name comes back as `None`.

use scraper::{ElementRef, Html, Selector};

use crate::models::{ExtractedFields, PRICE_SENTINEL, RawProductRecord, ShopifyProduct};

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩', '₽', '₺', '₫', '฿'];

/// A product container together with its product link.
pub struct Tile<'a> {
    pub root: ElementRef<'a>,
    pub link: ElementRef<'a>,
}

pub type TileStrategy = fn(&Tile<'_>) -> Option<String>;
pub type ApiStrategy = fn(&ShopifyProduct) -> Option<String>;

pub const TILE_NAME_CHAIN: &[TileStrategy] = &[
    name_from_sr_only,
    name_from_image_alt,
    name_from_link_text,
    name_from_title_heading,
];

pub const TILE_PRICE_CHAIN: &[TileStrategy] = &[price_from_labeled_element];

pub const TILE_IMAGE_CHAIN: &[TileStrategy] = &[
    image_src_in_link,
    image_data_src_in_link,
    image_src_in_tile,
    image_data_src_in_tile,
];

pub const TILE_TYPE_CHAIN: &[TileStrategy] = &[type_from_labeled_element];

pub const API_NAME_CHAIN: &[ApiStrategy] = &[name_from_title];
pub const API_PRICE_CHAIN: &[ApiStrategy] = &[price_from_first_variant];
pub const API_IMAGE_CHAIN: &[ApiStrategy] = &[image_from_first_image];

pub fn extract(raw: &RawProductRecord) -> Option<ExtractedFields> {
    match raw {
        RawProductRecord::Tile { html, link_marker } => extract_tile(html, link_marker),
        RawProductRecord::Api(product) => extract_api(product),
    }
}

pub fn extract_tile(html: &str, link_marker: &str) -> Option<ExtractedFields> {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();
    let link = find_product_link(root, link_marker)?;
    let tile = Tile { root, link };

    let name = resolve(TILE_NAME_CHAIN, &tile)?;
    let price = resolve(TILE_PRICE_CHAIN, &tile).unwrap_or_else(|| PRICE_SENTINEL.to_string());
    let image = resolve(TILE_IMAGE_CHAIN, &tile)
        .map(|src| normalize_image_url(&src))
        .unwrap_or_default();
    let product_type = resolve(TILE_TYPE_CHAIN, &tile).unwrap_or_default();
    let link = tile.link.value().attr("href").unwrap_or_default().trim().to_string();

    Some(ExtractedFields {
        name,
        price,
        image,
        product_type,
        link,
    })
}

pub fn extract_api(product: &ShopifyProduct) -> Option<ExtractedFields> {
    let name = resolve_api(API_NAME_CHAIN, product)?;
    let price = resolve_api(API_PRICE_CHAIN, product).unwrap_or_else(|| PRICE_SENTINEL.to_string());
    let image = resolve_api(API_IMAGE_CHAIN, product)
        .map(|src| normalize_image_url(&src))
        .unwrap_or_default();
    let product_type = product.product_type.clone().unwrap_or_default();
    let link = product
        .handle
        .as_deref()
        .and_then(trimmed)
        .map(|handle| format!("/products/{}", handle))
        .unwrap_or_default();

    Some(ExtractedFields {
        name,
        price,
        image,
        product_type,
        link,
    })
}

fn resolve(chain: &[TileStrategy], tile: &Tile<'_>) -> Option<String> {
    chain.iter().find_map(|strategy| strategy(tile))
}

fn resolve_api(chain: &[ApiStrategy], product: &ShopifyProduct) -> Option<String> {
    chain.iter().find_map(|strategy| strategy(product))
}

/// Upgrades protocol-relative URLs (`//cdn...`) to `https:`.
pub fn normalize_image_url(src: &str) -> String {
    let src = src.trim();
    if src.starts_with("//") {
        format!("https:{}", src)
    } else {
        src.to_string()
    }
}

/// Prefixes `$` unless the price already leads with a currency symbol.
pub fn format_price(raw: &str) -> Option<String> {
    let raw = trimmed(raw)?;
    if raw.starts_with(CURRENCY_SYMBOLS) {
        Some(raw)
    } else {
        Some(format!("${}", raw))
    }
}

/// Attribute and JSON values: trimmed, otherwise kept as written.
fn trimmed(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Element text spans several nodes, so runs of whitespace collapse to one space.
fn non_empty(s: &str) -> Option<String> {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() { None } else { Some(collapsed) }
}

fn text_of(el: ElementRef<'_>) -> Option<String> {
    non_empty(&el.text().collect::<Vec<_>>().join(" "))
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn class_contains(el: ElementRef<'_>, needle: &str) -> bool {
    el.value()
        .attr("class")
        .map(|class| class.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// First descendant (self included) with one of `tags` whose class mentions `needle`.
fn find_by_class<'a>(root: ElementRef<'a>, tags: &[&str], needle: &str) -> Option<ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| tags.contains(&el.value().name()) && class_contains(*el, needle))
}

fn find_product_link<'a>(root: ElementRef<'a>, link_marker: &str) -> Option<ElementRef<'a>> {
    root.descendants().filter_map(ElementRef::wrap).find(|el| {
        el.value().name() == "a"
            && el
                .value()
                .attr("href")
                .map(|href| href.contains(link_marker))
                .unwrap_or(false)
    })
}

fn first_img<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let img = selector("img")?;
    el.select(&img).next()
}

fn name_from_sr_only(tile: &Tile<'_>) -> Option<String> {
    let sr_only = selector("span.sr-only")?;
    tile.link.select(&sr_only).find_map(text_of)
}

fn name_from_image_alt(tile: &Tile<'_>) -> Option<String> {
    first_img(tile.link)
        .and_then(|img| img.value().attr("alt"))
        .and_then(trimmed)
}

fn name_from_link_text(tile: &Tile<'_>) -> Option<String> {
    text_of(tile.link)
}

fn name_from_title_heading(tile: &Tile<'_>) -> Option<String> {
    ["h2", "h3", "h4", "div", "span"].iter().find_map(|tag| {
        tile.root
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == *tag)
            .filter(|el| class_contains(*el, "title") || class_contains(*el, "name"))
            .find_map(text_of)
    })
}

fn is_hidden_label(el: ElementRef<'_>) -> bool {
    class_contains(el, "visually-hidden") || class_contains(el, "sr-only")
}

/// Themes wrap the amount in `.price-item` next to a screen-reader label such
/// as "Regular price"; the label must never win.
fn price_from_labeled_element(tile: &Tile<'_>) -> Option<String> {
    let labeled = find_by_class(tile.root, &["span", "p", "div"], "price")?;
    let item = labeled
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| class_contains(*el, "price-item"))
        .find_map(text_of);
    let nested = || {
        labeled
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "span" && !is_hidden_label(*el))
            .find_map(text_of)
    };
    item.or_else(nested).or_else(|| text_of(labeled))
}

fn type_from_labeled_element(tile: &Tile<'_>) -> Option<String> {
    find_by_class(tile.root, &["span", "p", "div"], "producttype").and_then(text_of)
}

fn img_attr(img: Option<ElementRef<'_>>, attr: &str) -> Option<String> {
    img.and_then(|img| img.value().attr(attr)).and_then(trimmed)
}

fn image_src_in_link(tile: &Tile<'_>) -> Option<String> {
    img_attr(first_img(tile.link), "src")
}

fn image_data_src_in_link(tile: &Tile<'_>) -> Option<String> {
    img_attr(first_img(tile.link), "data-src")
}

fn image_src_in_tile(tile: &Tile<'_>) -> Option<String> {
    img_attr(first_img(tile.root), "src")
}

fn image_data_src_in_tile(tile: &Tile<'_>) -> Option<String> {
    img_attr(first_img(tile.root), "data-src")
}

fn name_from_title(product: &ShopifyProduct) -> Option<String> {
    product.title.as_deref().and_then(trimmed)
}

fn price_from_first_variant(product: &ShopifyProduct) -> Option<String> {
    let price = product.variants.first()?.price.as_ref()?;
    match price {
        serde_json::Value::String(s) => format_price(s),
        serde_json::Value::Number(n) => n.as_f64().and_then(|n| format_price(&format!("{:.2}", n))),
        _ => None,
    }
}

fn image_from_first_image(product: &ShopifyProduct) -> Option<String> {
    product.images.first()?.src.as_deref().and_then(trimmed)
}
