//! Plain-text rendering of KPIs, chart data and rankings.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate};

use crate::{
    aggregate::{Kpis, SkuRevenue},
    chart::{ChartData, ChartKind},
    data::{format_grouped, format_number},
    dataset::weekday_name,
};

pub const NO_DATA: &str = "No data for the selected filters.";
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(&sanitize_cell(cell)));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, aligns));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths, aligns));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, aligns));
    }
    output
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let cell = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&cell)));
            match aligns.get(idx).copied().unwrap_or(Align::Left) {
                Align::Left => format!("{cell}{padding}"),
                Align::Right => format!("{padding}{cell}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len.max(1))
}

pub fn render_kpis(kpis: &Kpis) -> String {
    let rows = vec![
        vec![
            "Total Sales (AED)".to_string(),
            format_grouped(kpis.total_sales, 0),
        ],
        vec![
            "Unique Orders".to_string(),
            format_grouped(kpis.unique_orders as f64, 0),
        ],
        vec![
            "Avg Order Value (AED)".to_string(),
            kpis.average_order_value
                .map(|v| format_grouped(v, 2))
                .unwrap_or_else(|| "n/a".to_string()),
        ],
        vec![
            "Loyalty Members (%)".to_string(),
            kpis.loyalty_ratio
                .map(|v| format!("{v:.1}%"))
                .unwrap_or_else(|| "n/a".to_string()),
        ],
    ];
    render_table(
        &["metric".to_string(), "value".to_string()],
        &rows,
        &[Align::Left, Align::Right],
    )
}

// Buckets from full-date month cells keep their day and need it to stay distinct.
fn month_label(month: NaiveDate) -> String {
    if month.day() == 1 {
        month.format("%Y-%m").to_string()
    } else {
        month.format("%Y-%m-%d").to_string()
    }
}

pub fn render_chart(kind: ChartKind, data: &ChartData) -> String {
    let mut output = format!("{}\n\n", kind.title());
    if data.is_empty() {
        output.push_str(NO_DATA);
        output.push('\n');
        return output;
    }
    let (headers, points): (Vec<&str>, Vec<(String, f64, Option<String>)>) = match data {
        ChartData::MonthlySeries(points) => (
            vec!["month", "revenue"],
            points
                .iter()
                .map(|p| (month_label(p.month), p.revenue, None))
                .collect(),
        ),
        ChartData::Shares(shares) => (
            vec!["channel", "revenue", "share"],
            shares
                .iter()
                .map(|s| {
                    let share = s
                        .percent
                        .map(|p| format!("{p:.1}%"))
                        .unwrap_or_else(|| "n/a".to_string());
                    (s.label.clone(), s.revenue, Some(share))
                })
                .collect(),
        ),
        ChartData::Weekdays(days) => (
            vec!["day", "orders"],
            days.iter()
                .map(|d| (weekday_name(d.day).to_string(), d.orders as f64, None))
                .collect(),
        ),
        ChartData::Ranking(rows) => (
            vec!["name", "revenue"],
            rows.iter()
                .map(|r| (r.label.clone(), r.revenue, None))
                .collect(),
        ),
        ChartData::Histogram(hist) => (
            vec!["range", "count"],
            hist.bins
                .iter()
                .map(|b| {
                    (
                        format!("{:.2} - {:.2}", b.lower, b.upper),
                        b.count as f64,
                        None,
                    )
                })
                .collect(),
        ),
    };

    let max = points.iter().map(|p| p.1).fold(0.0, f64::max);
    let has_extra = points.iter().any(|p| p.2.is_some());
    let mut header_row = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    header_row.push(String::new());
    let mut aligns = vec![Align::Left, Align::Right];
    if has_extra {
        aligns.push(Align::Right);
    }
    aligns.push(Align::Left);
    let rows = points
        .into_iter()
        .map(|(label, value, extra)| {
            let mut row = vec![label, format_number(value)];
            if let Some(extra) = extra {
                row.push(extra);
            }
            row.push(bar(value, max));
            row
        })
        .collect::<Vec<_>>();
    output.push_str(&render_table(&header_row, &rows, &aligns));
    output
}

pub fn render_top_skus(skus: &[SkuRevenue]) -> String {
    if skus.is_empty() {
        return format!("{NO_DATA}\n");
    }
    let headers = ["rank", "sku_id", "brand", "city_zone", "line_value_aed"]
        .map(str::to_string)
        .to_vec();
    let rows = skus
        .iter()
        .enumerate()
        .map(|(idx, sku)| {
            vec![
                (idx + 1).to_string(),
                sku.sku_id.clone(),
                sku.brand.clone(),
                sku.city_zone.clone(),
                format_number(sku.revenue),
            ]
        })
        .collect::<Vec<_>>();
    render_table(
        &headers,
        &rows,
        &[
            Align::Right,
            Align::Left,
            Align::Left,
            Align::Left,
            Align::Right,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{MonthRevenue, Ranked, Share};

    #[test]
    fn render_table_right_aligns_numbers() {
        let headers = vec!["name".to_string(), "revenue".to_string()];
        let rows = vec![
            vec!["Dubai".to_string(), "1200".to_string()],
            vec!["Ajman".to_string(), "5".to_string()],
        ];
        let rendered = render_table(&headers, &rows, &[Align::Left, Align::Right]);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "name   revenue",
                "-----  -------",
                "Dubai     1200",
                "Ajman        5",
            ]
        );
    }

    #[test]
    fn render_table_flattens_control_characters() {
        let headers = vec!["note".to_string()];
        let rows = vec![vec!["line1\nline2\tvalue".to_string()]];
        let rendered = render_table(&headers, &rows, &[Align::Left]);
        assert_eq!(rendered.lines().nth(2), Some("line1 line2 value"));
    }

    #[test]
    fn render_kpis_marks_undefined_values() {
        let rendered = render_kpis(&Kpis {
            total_sales: 0.0,
            unique_orders: 0,
            average_order_value: None,
            loyalty_ratio: None,
        });
        assert!(rendered.contains("Avg Order Value (AED)"));
        assert_eq!(rendered.matches("n/a").count(), 2);
    }

    #[test]
    fn render_chart_reports_no_data() {
        let rendered = render_chart(ChartKind::TopCities, &ChartData::Ranking(Vec::new()));
        assert!(rendered.starts_with("Top Cities by Revenue"));
        assert!(rendered.contains(NO_DATA));
    }

    #[test]
    fn render_chart_scales_bars_to_largest_value() {
        let data = ChartData::Ranking(vec![
            Ranked {
                label: "Dubai".into(),
                revenue: 100.0,
            },
            Ranked {
                label: "Ajman".into(),
                revenue: 50.0,
            },
        ]);
        let rendered = render_chart(ChartKind::TopCities, &data);
        let dubai = rendered.lines().find(|l| l.starts_with("Dubai")).unwrap();
        let ajman = rendered.lines().find(|l| l.starts_with("Ajman")).unwrap();
        assert_eq!(dubai.matches('#').count(), BAR_WIDTH);
        assert_eq!(ajman.matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn render_chart_shows_day_for_mid_month_buckets() {
        let data = ChartData::MonthlySeries(vec![
            MonthRevenue {
                month: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                revenue: 10.0,
            },
            MonthRevenue {
                month: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                revenue: 5.0,
            },
        ]);
        let rendered = render_chart(ChartKind::MonthlyRevenueTrend, &data);
        let labels = rendered
            .lines()
            .skip(4)
            .filter_map(|l| l.split_whitespace().next())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["2024-03", "2024-03-15"]);
    }

    #[test]
    fn render_chart_includes_share_column() {
        let data = ChartData::Shares(vec![Share {
            label: "online".into(),
            revenue: 10.0,
            percent: Some(100.0),
        }]);
        let rendered = render_chart(ChartKind::ChannelRatio, &data);
        assert!(rendered.contains("100.0%"));
    }
}
