use shelfwise_core::ProductSnapshot;

/// Shape of a successful extractor answer, decided once.
///
/// A single product is persisted as a scraped record with structured reviews;
/// several products are persisted together as one competitor bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeResult {
    Single(ProductSnapshot),
    Bundle(Vec<ProductSnapshot>),
}

impl ScrapeResult {
    /// Classify extractor output; `None` when nothing was returned.
    #[must_use]
    pub fn from_products(mut products: Vec<ProductSnapshot>) -> Option<Self> {
        match products.len() {
            0 => None,
            1 => products.pop().map(ScrapeResult::Single),
            _ => Some(ScrapeResult::Bundle(products)),
        }
    }

    #[must_use]
    pub fn products(&self) -> &[ProductSnapshot] {
        match self {
            ScrapeResult::Single(product) => std::slice::from_ref(product),
            ScrapeResult::Bundle(products) => products,
        }
    }

    #[must_use]
    pub fn into_products(self) -> Vec<ProductSnapshot> {
        match self {
            ScrapeResult::Single(product) => vec![product],
            ScrapeResult::Bundle(products) => products,
        }
    }

    /// `true` when any product carries an extractor-reported error.
    #[must_use]
    pub fn has_item_error(&self) -> bool {
        self.products().iter().any(|p| p.error.is_some())
    }
}
