use crate::{aggregate::Kpis, data::format_grouped};

/// Free-shipping threshold suggested relative to the current AOV.
pub const SHIPPING_THRESHOLD_UPLIFT: f64 = 1.15;

pub fn free_shipping_threshold(kpis: &Kpis) -> Option<f64> {
    kpis.average_order_value
        .map(|aov| aov * SHIPPING_THRESHOLD_UPLIFT)
}

/// Business recommendations shown under the KPIs.
pub fn business_insights(kpis: &Kpis) -> Vec<String> {
    let shipping = match (kpis.average_order_value, free_shipping_threshold(kpis)) {
        (Some(aov), Some(threshold)) => format!(
            "Free-Shipping Threshold: Current AOV ≈ AED {}. Test threshold at {} (AOV +15%).",
            format_grouped(aov, 2),
            format_grouped(threshold, 2)
        ),
        _ => "Free-Shipping Threshold: AOV is n/a for the current filters; widen them to size a threshold.".to_string(),
    };
    vec![
        "Loyalty Flash Sales: Schedule flash sales on quiet weekdays to increase store traffic."
            .to_string(),
        shipping,
        "SKU Localization: Identify and stock top 50 SKUs per city_zone to prevent stockouts."
            .to_string(),
        "Online Strategy: In online-heavy cities, offer app-only next-day delivery and exclusive coupons."
            .to_string(),
        "Mid-Month Retention: Run loyalty-only flash sales mid-month for top customers by frequency."
            .to_string(),
    ]
}
