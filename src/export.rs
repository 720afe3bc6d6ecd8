//! CSV export of filtered datasets and the top-SKU table.
//!
//! Source columns are written first, in source order, followed by the derived
//! `order_month_dt`, `day_of_week` and `hour_of_day`. Coerced numeric columns
//! are written in their coerced form, so a bad `line_value_aed` cell exports
//! as an empty one.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use log::info;

use crate::{
    aggregate::SkuRevenue,
    dataset::{DERIVED_COLUMNS, Dataset, LINE_VALUE_AED, OrderLine, QUANTITY, weekday_name},
    io_utils,
};

pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut csv = io_utils::csv_writer(writer, io_utils::DEFAULT_CSV_DELIMITER);
    let mut header = dataset.headers().to_vec();
    header.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));
    csv.write_record(&header).context("Writing export header")?;

    let quantity_idx = dataset.columns().index(QUANTITY);
    let value_idx = dataset.columns().index(LINE_VALUE_AED);
    for (row_idx, line) in dataset.rows().iter().enumerate() {
        let mut record = line
            .raw
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                if Some(idx) == quantity_idx {
                    optional_number(line.quantity)
                } else if Some(idx) == value_idx {
                    optional_number(line.line_value_aed)
                } else {
                    cell.clone()
                }
            })
            .collect::<Vec<_>>();
        record.extend(derived_cells(line));
        csv.write_record(&record)
            .with_context(|| format!("Writing export row {}", row_idx + 1))?;
    }
    csv.flush().context("Flushing export")?;
    Ok(())
}

/// Writes the dataset to `path`; `-` means stdout.
pub fn export_to_path(dataset: &Dataset, path: &Path) -> Result<()> {
    let output = io_utils::open_output(Some(path))?;
    write_csv(dataset, output).with_context(|| format!("Exporting to {path:?}"))?;
    info!("Exported {} row(s) to {:?}", dataset.len(), path);
    Ok(())
}

pub fn write_top_skus_csv<W: Write>(skus: &[SkuRevenue], writer: W) -> Result<()> {
    let mut csv = io_utils::csv_writer(writer, io_utils::DEFAULT_CSV_DELIMITER);
    csv.write_record(["sku_id", "brand", "city_zone", "line_value_aed"])
        .context("Writing SKU header")?;
    for sku in skus {
        let revenue = sku.revenue.to_string();
        csv.write_record([
            sku.sku_id.as_str(),
            sku.brand.as_str(),
            sku.city_zone.as_str(),
            revenue.as_str(),
        ])
        .with_context(|| format!("Writing SKU row {}", sku.sku_id))?;
    }
    csv.flush().context("Flushing SKU export")?;
    Ok(())
}

fn derived_cells(line: &OrderLine) -> [String; 3] {
    [
        line.order_month_dt
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        line.day_of_week
            .map(|d| weekday_name(d).to_string())
            .unwrap_or_default(),
        line.hour_of_day.map(|h| h.to_string()).unwrap_or_default(),
    ]
}

// `f64::to_string` round-trips exactly.
fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
