//! Domain models for the deals feed.
//!
//! - [`Product`] - One deal card, projected from a sheet record
//! - [`products_from_records`] - Record sequence to products with defaults
//!
//! Sheet column names are case-sensitive and must match the
//! constants in [`columns`].

use serde::{Deserialize, Serialize};

use crate::parser::Record;

/// Rating at or above which a deal counts as trending.
pub const TRENDING_RATING: f64 = 4.5;

/// Image shown when the sheet has no `Image URL`.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=300&width=300";

/// Sheet column headers.
pub mod columns {
    pub const TITLE: &str = "Title";
    pub const DESCRIPTION: &str = "Description";
    pub const ORIGINAL_PRICE: &str = "Original Price";
    pub const SALE_PRICE: &str = "Sale Price";
    pub const DISCOUNT: &str = "Discount";
    pub const IMAGE_URL: &str = "Image URL";
    pub const MERCHANT: &str = "Merchant";
    pub const CATEGORY: &str = "Category";
    pub const PRODUCT_LINK: &str = "Product Link";
    pub const DATE_ADDED: &str = "Date Added";
    pub const AVAILABILITY: &str = "Availability";
    pub const RATING: &str = "Rating";
    pub const REVIEWS: &str = "Reviews";
}

// =============================================================================
// Product
// =============================================================================

/// A single deal.
///
/// Prices, discount and rating stay as display strings, exactly as typed
/// in the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// 1-based position in the feed
    pub id: String,
    pub title: String,
    pub description: String,
    pub original_price: String,
    pub sale_price: String,
    pub discount: String,
    pub image_url: String,
    pub merchant: String,
    pub category: String,
    pub product_link: String,
    pub date_added: String,
    pub availability: String,
    pub rating: String,
    pub reviews: String,
}

impl Product {
    /// Project a record, substituting defaults for absent or blank columns.
    ///
    /// `position` is the 0-based index of the record in the feed.
    pub fn from_record(position: usize, record: &Record) -> Self {
        let field = |name: &str, default: &str| -> String {
            match record.get(name) {
                Some(v) if !v.is_empty() => v.clone(),
                _ => default.to_string(),
            }
        };

        Self {
            id: (position + 1).to_string(),
            title: field(columns::TITLE, "N/A"),
            description: field(columns::DESCRIPTION, "N/A"),
            original_price: field(columns::ORIGINAL_PRICE, "0"),
            sale_price: field(columns::SALE_PRICE, "0"),
            discount: field(columns::DISCOUNT, ""),
            image_url: field(columns::IMAGE_URL, PLACEHOLDER_IMAGE),
            merchant: field(columns::MERCHANT, "N/A"),
            category: field(columns::CATEGORY, "N/A"),
            product_link: field(columns::PRODUCT_LINK, "#"),
            date_added: field(columns::DATE_ADDED, ""),
            availability: field(columns::AVAILABILITY, ""),
            rating: field(columns::RATING, ""),
            reviews: field(columns::REVIEWS, ""),
        }
    }

    /// Numeric rating read from the start of the field, so `4.7 stars` and
    /// `4.6/5` give 4.7 and 4.6. 0.0 when no number leads the field.
    pub fn rating_value(&self) -> f64 {
        leading_number(&self.rating).unwrap_or(0.0)
    }

    pub fn is_trending(&self) -> bool {
        self.rating_value() >= TRENDING_RATING
    }
}

/// Longest decimal number at the start of `s`, after leading whitespace.
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent. An exponent without digits is left out of the number.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - end - 1;
        end = frac_end;
    }

    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Project records into products, ids following feed order.
pub fn products_from_records(records: &[Record]) -> Vec<Product> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| Product::from_record(i, r))
        .collect()
}
