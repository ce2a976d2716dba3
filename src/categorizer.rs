use crate::models::Category;

/// Ordered keyword rules. Earlier rules shadow later ones, so "Tank Top Tee"
/// lands in T-Shirts.
const RULES: &[(&[&str], Category)] = &[
    (&["tee", "t-shirt", "shirt"], Category::TShirts),
    (&["hoodie", "sweatshirt"], Category::HoodiesSweatshirts),
    (&["tank"], Category::TankTops),
    (&["long sleeve"], Category::LongSleeve),
    (&["mug", "cup", "bottle"], Category::Drinkware),
    (&["hat", "cap", "beanie"], Category::Headwear),
];

pub const DEFAULT_CATEGORY: Category = Category::Merch;

pub fn categorize(name: &str, product_type: &str) -> Category {
    let name = name.to_lowercase();
    let product_type = product_type.to_lowercase();

    RULES
        .iter()
        .find(|(keywords, _)| {
            keywords
                .iter()
                .any(|kw| name.contains(kw) || product_type.contains(kw))
        })
        .map(|(_, category)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}
