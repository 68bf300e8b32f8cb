//! Deal listing operations: tab filters, text search and trending picks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;
use crate::models::Product;

/// Number of trending deals shown by default.
pub const DEFAULT_TRENDING_LIMIT: usize = 3;

/// Listing tabs of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    All,
    Amazon,
    Flipkart,
    Electronics,
    Fashion,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::All,
        Tab::Amazon,
        Tab::Flipkart,
        Tab::Electronics,
        Tab::Fashion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::All => "all",
            Tab::Amazon => "amazon",
            Tab::Flipkart => "flipkart",
            Tab::Electronics => "electronics",
            Tab::Fashion => "fashion",
        }
    }

    /// Whether a product belongs on this tab.
    ///
    /// Merchant tabs compare `merchant`, category tabs compare `category`,
    /// both case-insensitively.
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Tab::All => true,
            Tab::Amazon | Tab::Flipkart => product.merchant.to_lowercase() == self.as_str(),
            Tab::Electronics | Tab::Fashion => product.category.to_lowercase() == self.as_str(),
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(Tab::All);
        }
        Tab::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| CatalogError::UnknownTab(s.to_string()))
    }
}

/// Keep products whose title, description, merchant or category contains
/// `query`, ignoring case. A blank query keeps everything.
pub fn search<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    products
        .iter()
        .filter(|p| contains_text(p, &needle))
        .collect()
}

/// `needle` must already be trimmed and lowercased.
fn contains_text(product: &Product, needle: &str) -> bool {
    needle.is_empty()
        || [&product.title, &product.description, &product.merchant, &product.category]
            .iter()
            .any(|f| f.to_lowercase().contains(needle))
}

/// Pick up to `limit` trending products in feed order.
///
/// When fewer than `limit` products are rated at or above
/// [`crate::models::TRENDING_RATING`], the rest is filled with the first
/// non-trending ones.
pub fn trending(products: &[Product], limit: usize) -> Vec<&Product> {
    let (hot, rest): (Vec<&Product>, Vec<&Product>) =
        products.iter().partition(|p| p.is_trending());

    hot.into_iter().chain(rest).take(limit).collect()
}

/// Filter for a deals listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealQuery {
    pub tab: Tab,
    /// Free text search
    pub q: Option<String>,
}

impl DealQuery {
    pub fn new(tab: Tab, q: Option<String>) -> Self {
        Self { tab, q }
    }

    /// Apply the tab, then the search text.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let needle = self.q.as_deref().unwrap_or("").trim().to_lowercase();
        products
            .iter()
            .filter(|p| self.tab.matches(p) && contains_text(p, &needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::products_from_records;
    use crate::parser::parse_delimited_text;

    fn feed() -> Vec<Product> {
        let csv = "Title,Description,Merchant,Category,Rating\n\
                   Earbuds,Wireless noise cancelling,Amazon,Electronics,4.7\n\
                   Sneakers,Running shoes,Flipkart,Fashion,4.1\n\
                   Kettle,Electric kettle 1.5L,amazon,Home,3.9\n\
                   Smartwatch,AMOLED display,Flipkart,electronics,4.8\n\
                   T-Shirt,Cotton tee,Myntra,Fashion,\n";
        products_from_records(&parse_delimited_text(csv).records)
    }

    fn titles(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.title.clone()).collect()
    }

    #[test]
    fn test_tab_parse() {
        assert_eq!("Amazon".parse::<Tab>().unwrap(), Tab::Amazon);
        assert_eq!(" fashion ".parse::<Tab>().unwrap(), Tab::Fashion);
        assert_eq!("".parse::<Tab>().unwrap(), Tab::All);
        assert!(matches!("toys".parse::<Tab>(), Err(CatalogError::UnknownTab(_))));
    }

    #[test]
    fn test_merchant_tab_case_insensitive() {
        let products = feed();
        let amazon = DealQuery::new(Tab::Amazon, None).apply(&products);
        assert_eq!(titles(&amazon), vec!["Earbuds", "Kettle"]);
    }

    #[test]
    fn test_category_tab() {
        let products = feed();
        let electronics = DealQuery::new(Tab::Electronics, None).apply(&products);
        assert_eq!(titles(&electronics), vec!["Earbuds", "Smartwatch"]);
    }

    #[test]
    fn test_search() {
        let products = feed();
        assert_eq!(titles(&search(&products, "KETTLE")), vec!["Kettle"]);
        assert_eq!(titles(&search(&products, "shoes")), vec!["Sneakers"]);
        assert_eq!(search(&products, "  ").len(), products.len());
    }

    #[test]
    fn test_tab_and_search_combined() {
        let products = feed();
        let query = DealQuery::new(Tab::Fashion, Some("cotton".into()));
        assert_eq!(titles(&query.apply(&products)), vec!["T-Shirt"]);
    }

    #[test]
    fn test_default_query_keeps_everything() {
        let products = feed();
        let query = DealQuery::default();
        assert_eq!(query, DealQuery::new(Tab::All, None));
        assert_eq!(query.apply(&products).len(), products.len());
    }

    #[test]
    fn test_trending_prefers_high_rating() {
        let products = feed();
        assert_eq!(titles(&trending(&products, 3)), vec!["Earbuds", "Smartwatch", "Sneakers"]);
    }

    #[test]
    fn test_trending_limit_and_empty() {
        let products = feed();
        assert_eq!(trending(&products, 1).len(), 1);
        assert!(trending(&[], DEFAULT_TRENDING_LIMIT).is_empty());
    }
}
