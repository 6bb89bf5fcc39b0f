//! Core data records shared by the crawler and the storage layer

use crate::storage::CsvRecord;
use chrono::{NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;

/// Timestamp layout used for `createdAt` in record files
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Fully qualified page URL
    pub url: String,

    /// 1-based page ordinal
    pub page: u32,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, page: u32) -> Self {
        Self {
            url: url.into(),
            page,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Row layout of the endpoint file
#[derive(Debug, Clone, Serialize)]
pub struct EndpointRow {
    pub endpoint: String,
}

impl From<&Endpoint> for EndpointRow {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            endpoint: endpoint.url.clone(),
        }
    }
}

impl CsvRecord for EndpointRow {
    const HEADER: &'static [&'static str] = &["endpoint"];
}

/// A single product scraped from a listing page
///
/// Only `manufacturer` and `name` are mandatory. Every other field degrades
/// to `None` or an empty string when the page does not carry it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    #[serde(rename = "Product ID")]
    pub product_id: Option<String>,

    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,

    #[serde(rename = "Name")]
    pub name: String,

    /// Star rating on a 0-5 scale
    #[serde(rename = "Rating")]
    pub rating: Option<f64>,

    #[serde(rename = "Review Count")]
    pub review_count: Option<String>,

    /// Bullet points joined with `"; "`
    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Availability")]
    pub availability: String,

    #[serde(rename = "Price")]
    pub price: String,

    /// When the record was extracted
    #[serde(rename = "createdAt", serialize_with = "serialize_timestamp")]
    pub created_at: NaiveDateTime,
}

impl CsvRecord for ProductRecord {
    const HEADER: &'static [&'static str] = &[
        "Product ID",
        "Manufacturer",
        "Name",
        "Rating",
        "Review Count",
        "Description",
        "Availability",
        "Price",
        "createdAt",
    ];
}

fn serialize_timestamp<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
}

/// Current local time truncated to whole seconds
pub fn extraction_timestamp() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_record() -> ProductRecord {
        ProductRecord {
            product_id: Some("p-1".to_string()),
            manufacturer: "Fender".to_string(),
            name: "Player Stratocaster".to_string(),
            rating: Some(4.5),
            review_count: None,
            description: "Alder body; Maple neck".to_string(),
            availability: "In stock".to_string(),
            price: "£599".to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 30, 5)
                .unwrap(),
        }
    }

    #[test]
    fn test_record_serializes_in_header_order() {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.serialize(sample_record()).unwrap();
        let line = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(
            line,
            "p-1,Fender,Player Stratocaster,4.5,,Alder body; Maple neck,In stock,£599,2024-03-01 12:30:05\n"
        );
        assert_eq!(ProductRecord::HEADER.len(), 9);
    }

    #[test]
    fn test_endpoint_row_from_endpoint() {
        let endpoint = Endpoint::new("https://shop.example/list.html?ls=25&pg=2", 2);
        let row = EndpointRow::from(&endpoint);
        assert_eq!(row.endpoint, endpoint.url);
        assert_eq!(endpoint.to_string(), endpoint.url);
    }

    #[test]
    fn test_extraction_timestamp_has_no_subseconds() {
        assert_eq!(extraction_timestamp().nanosecond(), 0);
    }
}
