//! Seed the catalog from a YAML file.
//!
//! The file is a list of products:
//!
//! ```yaml
//! - title: Waffle with Berries
//!   category: Waffle
//!   price: "6.50"
//!   thumbnail: /images/waffle-thumbnail.jpg
//!   images:
//!     - /images/waffle-desktop.jpg
//! ```
//!
//! Products whose title already exists are skipped, so seeding is safe to
//! repeat.

use std::path::Path;

use tracing::{error, info, warn};

use dessert_shop_storefront::db::{self, ProductRepository};
use dessert_shop_storefront::models::NewProduct;

/// Outcome of a seeding run.
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse the seed file and reject entries that could never be inserted.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or an entry has an empty
/// title or category.
pub fn parse_products(content: &str) -> Result<Vec<NewProduct>, Box<dyn std::error::Error>> {
    let products: Vec<NewProduct> = serde_yaml::from_str(content)?;

    let problems: Vec<String> = products
        .iter()
        .enumerate()
        .filter_map(|(index, product)| {
            if product.title.trim().is_empty() {
                Some(format!("entry {index}: title is empty"))
            } else if product.category.trim().is_empty() {
                Some(format!("entry {index} ({}): category is empty", product.title))
            } else {
                None
            }
        })
        .collect();

    if !problems.is_empty() {
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(format!("{} invalid products found", problems.len()).into());
    }

    Ok(products)
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the environment is incomplete, the file cannot be
/// read or parsed, or an insert fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_products(&content)?;
    info!(products = products.len(), "Parsed seed file");

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let repository = ProductRepository::new(pool);
    let mut summary = SeedSummary::default();

    for product in &products {
        if repository.exists_by_title(&product.title).await? {
            warn!(title = %product.title, "product already exists, skipping");
            summary.skipped += 1;
            continue;
        }

        let created = repository.create(product).await?;
        info!(id = %created.id, title = %created.title, "product inserted");
        summary.inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Products inserted: {}", summary.inserted);
    info!("  Products skipped (already exist): {}", summary.skipped);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dessert_shop_core::Price;

    use super::*;

    #[test]
    fn test_parse_products() {
        let yaml = r#"
- title: Classic Tiramisu
  category: Tiramisu
  price: "5.50"
  images:
    - /images/tiramisu-desktop.jpg
- title: Pistachio Baklava
  category: Baklava
  price: "4.00"
"#;
        let products = parse_products(yaml).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price, Price::from_cents(550));
        assert_eq!(products[0].images.len(), 1);
        assert!(products[1].thumbnail.is_empty());
    }

    #[test]
    fn test_parse_rejects_blank_titles() {
        let yaml = r#"
- title: "  "
  category: Cake
  price: "1.00"
"#;
        assert!(parse_products(yaml).is_err());
    }

    #[test]
    fn test_parse_rejects_negative_prices() {
        let yaml = r#"
- title: Free Money Cake
  category: Cake
  price: "-1.00"
"#;
        assert!(parse_products(yaml).is_err());
    }
}
