//! Pure summaries over a (usually filtered) [`Dataset`].
//!
//! Null `line_value_aed` cells are skipped in sums, so a group made only of
//! null lines still appears with revenue `0`. Rankings sort by revenue
//! descending and keep first-appearance order among equal revenues.
//! Undefined metrics (no orders, no loyalty flags) are `None`, never `0`.
//! Blank grouping keys (order id, city, channel, ...) form no group; their
//! revenue still counts toward [`total_sales`].

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    hash::Hash,
};

use chrono::{NaiveDate, Weekday};
use serde::Serialize;

use crate::dataset::{Dataset, OrderLine, WEEKDAYS, non_blank};

pub const TOP_GROUPS: usize = 10;
pub const TOP_SKUS: usize = 50;
pub const AOV_BINS: usize = 30;
pub const BASKET_SIZE_BINS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kpis {
    pub total_sales: f64,
    pub unique_orders: usize,
    pub average_order_value: Option<f64>,
    pub loyalty_ratio: Option<f64>,
}

pub fn kpis(dataset: &Dataset) -> Kpis {
    Kpis {
        total_sales: total_sales(dataset),
        unique_orders: unique_orders(dataset),
        average_order_value: average_order_value(dataset),
        loyalty_ratio: loyalty_ratio(dataset),
    }
}

pub fn total_sales(dataset: &Dataset) -> f64 {
    dataset
        .rows()
        .iter()
        .filter_map(|line| line.line_value_aed)
        .sum()
}

pub fn unique_orders(dataset: &Dataset) -> usize {
    dataset
        .rows()
        .iter()
        .filter_map(|line| non_blank(&line.order_id))
        .collect::<HashSet<_>>()
        .len()
}

/// Revenue per order, in order of first appearance.
pub fn order_values(dataset: &Dataset) -> Vec<(String, f64)> {
    group_revenue(dataset, |line| non_blank(&line.order_id).map(str::to_string))
}

pub fn average_order_value(dataset: &Dataset) -> Option<f64> {
    let orders = order_values(dataset);
    if orders.is_empty() {
        return None;
    }
    let total = orders.iter().map(|(_, revenue)| revenue).sum::<f64>();
    Some(total / orders.len() as f64)
}

/// Share of lines flagged as loyalty members, as a percentage.
pub fn loyalty_ratio(dataset: &Dataset) -> Option<f64> {
    let flags = dataset
        .rows()
        .iter()
        .filter_map(|line| line.loyalty_member)
        .collect::<Vec<_>>();
    if flags.is_empty() {
        return None;
    }
    let members = flags.iter().filter(|flag| **flag).count();
    Some(members as f64 / flags.len() as f64 * 100.0)
}

/// Sums revenue per key, returning groups in first-appearance order. Lines
/// whose key is `None` are left out.
pub fn group_revenue<K, F>(dataset: &Dataset, key: F) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    F: Fn(&OrderLine) -> Option<K>,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, f64)> = Vec::new();
    for line in dataset.rows() {
        let Some(k) = key(line) else {
            continue;
        };
        let value = line.line_value_aed.unwrap_or(0.0);
        match positions.get(&k) {
            Some(&idx) => groups[idx].1 += value,
            None => {
                positions.insert(k.clone(), groups.len());
                groups.push((k, value));
            }
        }
    }
    groups
}

/// Stable descending sort by revenue, truncated to `limit`.
fn rank_descending<K>(mut groups: Vec<(K, f64)>, limit: usize) -> Vec<(K, f64)> {
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups.truncate(limit);
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRevenue {
    pub month: NaiveDate,
    pub revenue: f64,
}

/// Revenue per parsed month, ascending. Lines whose month label did not
/// parse are left out.
pub fn monthly_revenue(dataset: &Dataset) -> Vec<MonthRevenue> {
    let mut months: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for line in dataset.rows() {
        if let Some(month) = line.order_month_dt {
            *months.entry(month).or_insert(0.0) += line.line_value_aed.unwrap_or(0.0);
        }
    }
    months
        .into_iter()
        .map(|(month, revenue)| MonthRevenue { month, revenue })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub revenue: f64,
    /// `None` when the overall total is zero.
    pub percent: Option<f64>,
}

pub fn channel_revenue(dataset: &Dataset) -> Vec<Share> {
    let groups = group_revenue(dataset, |line| non_blank(&line.channel).map(str::to_string));
    let total = groups.iter().map(|(_, revenue)| revenue).sum::<f64>();
    groups
        .into_iter()
        .map(|(label, revenue)| Share {
            label,
            revenue,
            percent: (total != 0.0).then(|| revenue / total * 100.0),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekdayOrders {
    pub day: Weekday,
    pub orders: usize,
}

/// Distinct orders per weekday, Monday first. Days without orders report 0.
pub fn orders_by_weekday(dataset: &Dataset) -> [WeekdayOrders; 7] {
    let mut seen: HashMap<Weekday, HashSet<&str>> = HashMap::new();
    for line in dataset.rows() {
        if let (Some(day), Some(order)) = (line.day_of_week, non_blank(&line.order_id)) {
            seen.entry(day).or_default().insert(order);
        }
    }
    WEEKDAYS.map(|day| WeekdayOrders {
        day,
        orders: seen.get(&day).map_or(0, HashSet::len),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    pub label: String,
    pub revenue: f64,
}

pub fn top_by<F>(dataset: &Dataset, key: F, limit: usize) -> Vec<Ranked>
where
    F: Fn(&OrderLine) -> &str,
{
    let groups = group_revenue(dataset, |line| non_blank(key(line)).map(str::to_string));
    rank_descending(groups, limit)
        .into_iter()
        .map(|(label, revenue)| Ranked { label, revenue })
        .collect()
}

pub fn top_cities(dataset: &Dataset) -> Vec<Ranked> {
    top_by(dataset, |line| line.city.as_str(), TOP_GROUPS)
}

pub fn top_city_zones(dataset: &Dataset) -> Vec<Ranked> {
    top_by(dataset, |line| line.city_zone.as_str(), TOP_GROUPS)
}

pub fn top_departments(dataset: &Dataset) -> Vec<Ranked> {
    top_by(dataset, |line| line.department.as_str(), TOP_GROUPS)
}

pub fn top_categories(dataset: &Dataset) -> Vec<Ranked> {
    top_by(dataset, |line| line.category.as_str(), TOP_GROUPS)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuRevenue {
    pub sku_id: String,
    pub brand: String,
    pub city_zone: String,
    pub revenue: f64,
}

pub fn top_skus(dataset: &Dataset, limit: usize) -> Vec<SkuRevenue> {
    let groups = group_revenue(dataset, |line| {
        Some((
            non_blank(&line.sku_id)?.to_string(),
            non_blank(&line.brand)?.to_string(),
            non_blank(&line.city_zone)?.to_string(),
        ))
    });
    rank_descending(groups, limit)
        .into_iter()
        .map(|((sku_id, brand, city_zone), revenue)| SkuRevenue {
            sku_id,
            brand,
            city_zone,
            revenue,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Equal-width histogram over `[min, max]`; every bin is half-open except the
/// last, which also holds `max`. Constant input is spread over `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let finite = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();
    if bins == 0 || finite.is_empty() {
        return Histogram::default();
    }
    let (mut lo, mut hi) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in &finite {
        let idx = (((value - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram {
        bins: counts
            .into_iter()
            .enumerate()
            .map(|(idx, count)| Bin {
                lower: lo + width * idx as f64,
                upper: if idx + 1 == bins {
                    hi
                } else {
                    lo + width * (idx + 1) as f64
                },
                count,
            })
            .collect(),
    }
}

pub fn aov_distribution(dataset: &Dataset) -> Histogram {
    let values = order_values(dataset)
        .into_iter()
        .map(|(_, revenue)| revenue)
        .collect::<Vec<_>>();
    histogram(&values, AOV_BINS)
}

pub fn basket_size_distribution(dataset: &Dataset) -> Histogram {
    let values = dataset
        .rows()
        .iter()
        .filter_map(|line| line.basket_size_items)
        .collect::<Vec<_>>();
    histogram(&values, BASKET_SIZE_BINS)
}
