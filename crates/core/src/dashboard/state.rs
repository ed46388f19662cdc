use crate::dashboard::{filter_products, DashboardView, ProductCard};
use crate::domain::asin::Asin;
use crate::domain::product::Product;
use crate::tracker::ProductListing;
use chrono::{DateTime, Utc};

/// Client-side dashboard state. Every derived value is a pure function of these fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    products: Vec<Product>,
    search_term: String,
    selected: Option<Asin>,
    loading: bool,
    error: Option<String>,
    listing_empty: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn selected(&self) -> Option<&Asin> {
        self.selected.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin_refresh(&mut self) {
        self.loading = true;
    }

    /// Replaces the product list wholesale with a fresh listing.
    pub fn apply_listing(&mut self, listing: ProductListing) {
        self.listing_empty = listing.is_empty();
        self.products = listing.into_products();
        self.loading = false;
        self.error = None;
        if let Some(sel) = &self.selected {
            if !self.products.iter().any(|p| &p.asin == sel) {
                self.selected = None;
            }
        }
    }

    /// Any failure kind ends up here as one dismissible message; products are kept.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn clear_search(&mut self) {
        self.search_term.clear();
    }

    /// Opens the chart for `asin`, or closes it if it is already open.
    pub fn toggle_chart(&mut self, asin: &Asin) {
        if self.selected.as_ref() == Some(asin) {
            self.selected = None;
        } else {
            self.selected = Some(asin.clone());
        }
    }

    pub fn filtered(&self) -> Vec<&Product> {
        filter_products(&self.products, &self.search_term)
    }

    pub fn cards(&self) -> Vec<ProductCard> {
        self.filtered()
            .into_iter()
            .map(|p| ProductCard::from_product(p, self.selected.as_ref() == Some(&p.asin)))
            .collect()
    }

    /// Products are listed newest first, so the head carries the latest scrape time.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.products.first().map(|p| p.scraped_at)
    }

    pub fn empty_message(&self) -> Option<String> {
        if self.loading || !self.filtered().is_empty() {
            return None;
        }
        let term = self.search_term.trim();
        if !term.is_empty() {
            Some(format!("No products match \"{term}\""))
        } else if self.listing_empty {
            Some("No products found. Start scraping!".to_string())
        } else {
            Some("No products found.".to_string())
        }
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            search_term: self.search_term.clone(),
            total: self.products.len(),
            last_updated: self.last_updated(),
            cards: self.cards(),
            empty_message: self.empty_message(),
            error: self.error.clone(),
            loading: self.loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::PricePoint;
    use chrono::{Duration, TimeZone};

    fn product(asin: &str, title: &str, prices: &[f64], hours_ago: i64) -> Product {
        let now = Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap();
        let end = now - Duration::hours(hours_ago);
        let n = prices.len() as i64;
        let history: Vec<PricePoint> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                price: *p,
                rating: None,
                scraped_at: end - Duration::days(n - 1 - i as i64),
            })
            .collect();
        Product {
            asin: Asin::parse(asin).unwrap(),
            title: Some(title.to_string()),
            current_price: *prices.last().unwrap(),
            current_rating: None,
            image: None,
            url: None,
            scraped_at: end,
            history,
        }
    }

    fn listing() -> ProductListing {
        ProductListing::Products {
            products: vec![
                product("B000000001", "Kettle", &[100.0, 90.0], 0),
                product("B000000002", "Lamp", &[30.0], 5),
            ],
        }
    }

    #[test]
    fn starts_loading_and_settles_on_listing() {
        let mut state = DashboardState::new();
        assert!(state.is_loading());
        assert!(state.empty_message().is_none());

        state.apply_listing(listing());
        assert!(!state.is_loading());
        assert_eq!(state.products().len(), 2);
        assert_eq!(state.last_updated(), Some(state.products()[0].scraped_at));
    }

    #[test]
    fn empty_listing_is_distinct_from_loading_and_no_match() {
        let mut state = DashboardState::new();
        state.apply_listing(ProductListing::empty());
        assert_eq!(
            state.empty_message().as_deref(),
            Some("No products found. Start scraping!")
        );
        assert!(state.last_updated().is_none());

        let mut state = DashboardState::new();
        state.apply_listing(listing());
        state.set_search("toaster");
        assert_eq!(
            state.empty_message().as_deref(),
            Some("No products match \"toaster\"")
        );
    }

    #[test]
    fn search_filter_recomputes_from_state() {
        let mut state = DashboardState::new();
        state.apply_listing(listing());

        state.set_search("LAMP");
        assert_eq!(state.filtered().len(), 1);
        assert_eq!(state.cards()[0].asin.as_str(), "B000000002");

        state.clear_search();
        assert_eq!(state.filtered().len(), 2);
    }

    #[test]
    fn toggle_chart_opens_one_card_at_a_time() {
        let mut state = DashboardState::new();
        state.apply_listing(listing());
        let kettle = Asin::parse("B000000001").unwrap();
        let lamp = Asin::parse("B000000002").unwrap();

        state.toggle_chart(&kettle);
        let cards = state.cards();
        assert!(cards[0].chart_open);
        assert_eq!(cards[0].chart.len(), 2);
        assert_eq!(cards[0].drop_badge.as_deref(), Some("↓ $10.00 cheaper"));

        state.toggle_chart(&lamp);
        assert_eq!(state.selected(), Some(&lamp));
        // The lamp has a single observation, so nothing opens.
        assert!(state.cards().iter().all(|c| !c.chart_open));

        state.toggle_chart(&lamp);
        assert!(state.selected().is_none());
    }

    #[test]
    fn refresh_replaces_products_and_clears_stale_selection() {
        let mut state = DashboardState::new();
        state.apply_listing(listing());
        state.toggle_chart(&Asin::parse("B000000002").unwrap());

        state.begin_refresh();
        state.apply_listing(ProductListing::Products {
            products: vec![product("B000000003", "Mug", &[5.0], 0)],
        });
        assert_eq!(state.products().len(), 1);
        assert!(state.selected().is_none());
    }

    #[test]
    fn errors_are_dismissible_and_keep_products() {
        let mut state = DashboardState::new();
        state.apply_listing(listing());

        state.begin_refresh();
        state.fail("scraping failed: upstream request timed out");
        assert!(!state.is_loading());
        assert_eq!(state.products().len(), 2);
        assert_eq!(state.view().error.as_deref(), Some("scraping failed: upstream request timed out"));

        state.dismiss_error();
        assert!(state.error().is_none());
    }
}
