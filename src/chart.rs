use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow};
use clap::ValueEnum;
use serde::Serialize;

use crate::{
    aggregate::{self, Histogram, MonthRevenue, Ranked, Share, WeekdayOrders},
    dataset::Dataset,
};

/// The fixed set of chart views. Each maps to exactly one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    MonthlyRevenueTrend,
    ChannelRatio,
    OrdersByDayOfWeek,
    TopCities,
    TopCityZones,
    AverageOrderValue,
    DepartmentSales,
    CategorySales,
    BasketSizeDistribution,
}

impl ChartKind {
    pub const ALL: [ChartKind; 9] = [
        ChartKind::MonthlyRevenueTrend,
        ChartKind::ChannelRatio,
        ChartKind::OrdersByDayOfWeek,
        ChartKind::TopCities,
        ChartKind::TopCityZones,
        ChartKind::AverageOrderValue,
        ChartKind::DepartmentSales,
        ChartKind::CategorySales,
        ChartKind::BasketSizeDistribution,
    ];

    /// Stable selector label.
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::MonthlyRevenueTrend => "Monthly Revenue Trend",
            ChartKind::ChannelRatio => "Channel Ratio",
            ChartKind::OrdersByDayOfWeek => "Orders by Day of Week",
            ChartKind::TopCities => "Top Cities",
            ChartKind::TopCityZones => "Top City Zones",
            ChartKind::AverageOrderValue => "Average Order Value (AOV)",
            ChartKind::DepartmentSales => "Department Sales",
            ChartKind::CategorySales => "Category Sales",
            ChartKind::BasketSizeDistribution => "Basket Size Distribution",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::MonthlyRevenueTrend => "Monthly Revenue Trend",
            ChartKind::ChannelRatio => "Online vs Offline Sales Share",
            ChartKind::OrdersByDayOfWeek => "Orders by Day of Week",
            ChartKind::TopCities => "Top Cities by Revenue",
            ChartKind::TopCityZones => "Top City Zones by Revenue",
            ChartKind::AverageOrderValue => "Average Order Value Distribution",
            ChartKind::DepartmentSales => "Department Sales",
            ChartKind::CategorySales => "Category Sales",
            ChartKind::BasketSizeDistribution => "Basket Size Distribution",
        }
    }

    pub fn slug(self) -> String {
        self.to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default()
    }

    pub fn compute(self, dataset: &Dataset) -> ChartData {
        match self {
            ChartKind::MonthlyRevenueTrend => {
                ChartData::MonthlySeries(aggregate::monthly_revenue(dataset))
            }
            ChartKind::ChannelRatio => ChartData::Shares(aggregate::channel_revenue(dataset)),
            ChartKind::OrdersByDayOfWeek => {
                ChartData::Weekdays(aggregate::orders_by_weekday(dataset).to_vec())
            }
            ChartKind::TopCities => ChartData::Ranking(aggregate::top_cities(dataset)),
            ChartKind::TopCityZones => ChartData::Ranking(aggregate::top_city_zones(dataset)),
            ChartKind::AverageOrderValue => {
                ChartData::Histogram(aggregate::aov_distribution(dataset))
            }
            ChartKind::DepartmentSales => ChartData::Ranking(aggregate::top_departments(dataset)),
            ChartKind::CategorySales => ChartData::Ranking(aggregate::top_categories(dataset)),
            ChartKind::BasketSizeDistribution => {
                ChartData::Histogram(aggregate::basket_size_distribution(dataset))
            }
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartKind {
    type Err = anyhow::Error;

    /// Accepts the display label (any case) or the kebab-case slug.
    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        ChartKind::ALL
            .into_iter()
            .find(|kind| {
                kind.label().eq_ignore_ascii_case(trimmed) || kind.slug() == trimmed
            })
            .ok_or_else(|| anyhow!("Unknown chart '{value}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChartData {
    MonthlySeries(Vec<MonthRevenue>),
    Shares(Vec<Share>),
    Weekdays(Vec<WeekdayOrders>),
    Ranking(Vec<Ranked>),
    Histogram(Histogram),
}

impl ChartData {
    /// True when there is nothing to draw. Weekday counts are always seven
    /// entries, so they are empty only when every day is zero.
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::MonthlySeries(points) => points.is_empty(),
            ChartData::Shares(shares) => shares.is_empty(),
            ChartData::Weekdays(days) => days.iter().all(|d| d.orders == 0),
            ChartData::Ranking(rows) => rows.is_empty(),
            ChartData::Histogram(hist) => hist.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{dataset, line};

    #[test]
    fn labels_and_slugs_parse_back() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.label().parse::<ChartKind>().unwrap(), kind);
            assert_eq!(kind.slug().parse::<ChartKind>().unwrap(), kind);
        }
        assert_eq!(
            "average-order-value".parse::<ChartKind>().unwrap(),
            ChartKind::AverageOrderValue
        );
        assert!("Pie of Everything".parse::<ChartKind>().is_err());
    }

    #[test]
    fn every_chart_reports_no_data_on_empty_input() {
        let empty = dataset(&[]);
        for kind in ChartKind::ALL {
            assert!(kind.compute(&empty).is_empty(), "{kind} should be empty");
        }
    }

    #[test]
    fn weekday_chart_always_has_seven_days() {
        let data = dataset(&[line("O1", "10")]);
        let ChartData::Weekdays(days) = ChartKind::OrdersByDayOfWeek.compute(&data) else {
            panic!("expected weekday data");
        };
        assert_eq!(days.len(), 7);
    }

    #[test]
    fn chart_data_serializes_with_type_tag() {
        let data = dataset(&[line("O1", "10")]);
        let json = serde_json::to_value(ChartKind::TopCities.compute(&data)).unwrap();
        assert_eq!(json["type"], "ranking");
        assert_eq!(json["data"][0]["label"], "Dubai");
    }
}
