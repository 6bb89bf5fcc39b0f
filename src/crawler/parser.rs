//! Product record extraction
//!
//! This module turns one listing page into product records:
//! - Product blocks are located by a configurable CSS selector
//! - Manufacturer and name are required; everything else degrades
//! - The rating is read from the star filler's `width:NN%` style
//! - Description bullet points are joined with `"; "`

use crate::config::SelectorConfig;
use crate::model::{extraction_timestamp, ProductRecord};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Why a product block (or a whole page) could not be turned into records
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    /// A required element is absent inside one product block
    #[error("Missing required element: {0}")]
    MissingElement(&'static str),

    /// An element is present but its content is unusable
    #[error("Malformed {field}: '{value}'")]
    Malformed { field: &'static str, value: String },
}

impl ExtractError {
    /// Partial errors skip one product; anything else aborts the page
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::MissingElement(_))
    }
}

/// Compiled CSS selectors for a product listing
#[derive(Debug, Clone)]
pub struct ProductSelectors {
    product: Selector,
    title: Selector,
    manufacturer: Selector,
    name: Selector,
    rating_filler: Selector,
    review_count: Selector,
    description_item: Selector,
    availability: Selector,
    price: Selector,
}

impl ProductSelectors {
    /// Compiles every configured selector
    ///
    /// # Arguments
    ///
    /// * `config` - Selector strings from the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ProductSelectors)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - The first selector that did not parse
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            product: compile_selector(&config.product)?,
            title: compile_selector(&config.title)?,
            manufacturer: compile_selector(&config.manufacturer)?,
            name: compile_selector(&config.name)?,
            rating_filler: compile_selector(&config.rating_filler)?,
            review_count: compile_selector(&config.review_count)?,
            description_item: compile_selector(&config.description_item)?,
            availability: compile_selector(&config.availability)?,
            price: compile_selector(&config.price)?,
        })
    }
}

fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Converts listing HTML into product records
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    selectors: ProductSelectors,
}

impl RecordExtractor {
    pub fn new(selectors: ProductSelectors) -> Self {
        Self { selectors }
    }

    /// Builds an extractor straight from the selector configuration
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(ProductSelectors::compile(config)?))
    }

    /// Extracts every product on a page
    ///
    /// # Error Handling
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | No product blocks | `Ok(vec![])` |
    /// | Block missing title, manufacturer or name | Warn, skip block |
    /// | Optional field missing | Field absent or empty |
    /// | Unparseable rating width | `Err`, page contributes nothing |
    ///
    /// # Example
    ///
    /// ```
    /// use shelf_scraper::config::SelectorConfig;
    /// use shelf_scraper::crawler::RecordExtractor;
    ///
    /// let extractor = RecordExtractor::from_config(&SelectorConfig::default()).unwrap();
    /// assert!(extractor.extract("<html><body></body></html>").unwrap().is_empty());
    /// ```
    pub fn extract(&self, html: &str) -> Result<Vec<ProductRecord>, ExtractError> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();

        for block in document.select(&self.selectors.product) {
            match self.extract_product(block) {
                Ok(record) => records.push(record),
                Err(e) if e.is_partial() => {
                    tracing::warn!(
                        "Error processing product {}: {}",
                        block.value().attr("id").unwrap_or("<no id>"),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }

    fn extract_product(&self, block: ElementRef<'_>) -> Result<ProductRecord, ExtractError> {
        let s = &self.selectors;

        let title = block
            .select(&s.title)
            .next()
            .ok_or(ExtractError::MissingElement("title"))?;
        let manufacturer = first_text(title, &s.manufacturer)
            .ok_or(ExtractError::MissingElement("manufacturer"))?;
        let name = first_text(title, &s.name).ok_or(ExtractError::MissingElement("name"))?;

        let rating = match block.select(&s.rating_filler).next() {
            Some(filler) => match filler.value().attr("style") {
                Some(style) => parse_rating_style(style)?,
                None => None,
            },
            None => Some(0.0),
        };

        let description = block
            .select(&s.description_item)
            .map(element_text)
            .collect::<Vec<_>>()
            .join("; ");

        Ok(ProductRecord {
            product_id: block.value().attr("id").map(str::to_string),
            manufacturer,
            name,
            rating,
            review_count: first_text(block, &s.review_count),
            description,
            availability: first_text(block, &s.availability).unwrap_or_default(),
            price: first_text(block, &s.price).unwrap_or_default(),
            created_at: extraction_timestamp(),
        })
    }
}

/// Reads a `width:NN%` declaration from an inline style as a 0-5 rating
///
/// # Returns
///
/// * `Ok(Some(rating))` - `NN / 20`
/// * `Ok(None)` - The style has no width declaration
/// * `Err(ExtractError::Malformed)` - The width is not a percentage in `0..=100`
///
/// # Example
///
/// ```
/// use shelf_scraper::crawler::parse_rating_style;
///
/// assert_eq!(parse_rating_style("width: 90%;").unwrap(), Some(4.5));
/// assert_eq!(parse_rating_style("color: red").unwrap(), None);
/// ```
pub fn parse_rating_style(style: &str) -> Result<Option<f64>, ExtractError> {
    let width = style.split(';').find_map(|declaration| {
        let (property, value) = declaration.split_once(':')?;
        property
            .trim()
            .eq_ignore_ascii_case("width")
            .then(|| value.trim())
    });

    let Some(value) = width else {
        return Ok(None);
    };

    let malformed = || ExtractError::Malformed {
        field: "rating",
        value: value.to_string(),
    };

    let percent: f64 = value
        .strip_suffix('%')
        .unwrap_or(value)
        .trim()
        .parse()
        .map_err(|_| malformed())?;

    if !(0.0..=100.0).contains(&percent) {
        return Err(malformed());
    }

    Ok(Some(percent / 20.0))
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
