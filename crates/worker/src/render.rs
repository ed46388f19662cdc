use pricewatch_core::dashboard::{format_price, ChartPoint, DashboardView, ProductCard};
use pricewatch_core::domain::product::Product;
use std::fmt::Write;

const UNTITLED: &str = "(untitled)";

pub fn summary_line(p: &Product) -> String {
    format!(
        "{}  {:>10}  {} ({} observation(s))",
        p.asin,
        format_price(p.current_price),
        p.title.as_deref().unwrap_or(UNTITLED),
        p.history.len()
    )
}

pub fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();

    if let Some(err) = &view.error {
        let _ = writeln!(out, "Error: {err}");
    }
    if let Some(ts) = view.last_updated {
        let _ = writeln!(out, "Last updated: {}", ts.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if !view.search_term.trim().is_empty() {
        let _ = writeln!(
            out,
            "Showing {} of {} product(s) matching {:?}",
            view.cards.len(),
            view.total,
            view.search_term.trim()
        );
    }
    if let Some(msg) = &view.empty_message {
        let _ = writeln!(out, "{msg}");
    }

    for card in &view.cards {
        out.push('\n');
        out.push_str(&card_text(card));
    }
    out
}

fn card_text(card: &ProductCard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", card.title.as_deref().unwrap_or(UNTITLED));
    if let Some(badge) = &card.drop_badge {
        let _ = writeln!(out, "  {badge}");
    }
    let _ = writeln!(out, "  {}", card.price_label);
    let _ = writeln!(out, "  {}", card.rating_label);
    let _ = writeln!(out, "  ASIN: {}", card.asin);
    if let Some(url) = &card.url {
        let _ = writeln!(out, "  {url}");
    }
    if card.chart_open {
        out.push_str(&chart_text(&card.chart));
    } else if card.chart_available {
        let _ = writeln!(out, "  (price history available: --chart {})", card.asin);
    }
    out
}

/// One bar per observation, scaled between the series minimum and maximum.
fn chart_text(series: &[ChartPoint]) -> String {
    const WIDTH: f64 = 30.0;

    let min = series.iter().map(|c| c.price).fold(f64::INFINITY, f64::min);
    let max = series.iter().map(|c| c.price).fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let mut out = String::from("  Price history:\n");
    for point in series {
        let len = if span > 0.0 {
            1 + ((point.price - min) / span * WIDTH).round() as usize
        } else {
            1
        };
        let _ = writeln!(
            out,
            "    {}  {:>10}  {}",
            point.date,
            format_price(point.price),
            "#".repeat(len)
        );
    }
    out
}
