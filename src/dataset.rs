//! Order-line dataset loading.
//!
//! [`load_dataset()`] reads a CSV source into an immutable [`Dataset`]:
//! column names are trimmed, `line_value_aed`, `quantity`, `age`,
//! `basket_size_items` and `loyalty_member` are coerced (bad cells become
//! `None`), and `order_month_dt`, `day_of_week` and `hour_of_day` are derived.
//! Only a missing source, a missing required column, or structurally broken
//! CSV is fatal.

use std::{collections::BTreeMap, io::Read, path::Path};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    data::{parse_flag, parse_integer, parse_month_label, parse_naive_datetime, parse_number},
    error::LoadError,
    io_utils,
};

pub const ORDER_ID: &str = "order_id";
pub const ORDER_DATETIME: &str = "order_datetime";
pub const ORDER_MONTH: &str = "order_month";
pub const DEPARTMENT: &str = "department";
pub const CATEGORY: &str = "category";
pub const BRAND: &str = "brand";
pub const SKU_ID: &str = "sku_id";
pub const CITY: &str = "city";
pub const CITY_ZONE: &str = "city_zone";
pub const CHANNEL: &str = "channel";
pub const NATIONALITY_GROUP: &str = "nationality_group";
pub const AGE: &str = "age";
pub const LOYALTY_MEMBER: &str = "loyalty_member";
pub const QUANTITY: &str = "quantity";
pub const LINE_VALUE_AED: &str = "line_value_aed";
pub const BASKET_SIZE_ITEMS: &str = "basket_size_items";

pub const ORDER_MONTH_DT: &str = "order_month_dt";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const HOUR_OF_DAY: &str = "hour_of_day";

pub const REQUIRED_COLUMNS: &[&str] = &[
    ORDER_ID,
    ORDER_DATETIME,
    ORDER_MONTH,
    DEPARTMENT,
    CATEGORY,
    BRAND,
    SKU_ID,
    CITY,
    CITY_ZONE,
    CHANNEL,
    NATIONALITY_GROUP,
    AGE,
    LOYALTY_MEMBER,
    QUANTITY,
    LINE_VALUE_AED,
    BASKET_SIZE_ITEMS,
];

/// Columns computed at load time. Source columns with these names are dropped.
pub const DERIVED_COLUMNS: &[&str] = &[ORDER_MONTH_DT, DAY_OF_WEEK, HOUR_OF_DAY];

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// `None` for a blank categorical cell, which never forms a group of its own.
pub fn non_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// One purchased SKU within an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub order_id: String,
    pub order_datetime: Option<NaiveDateTime>,
    pub order_month: String,
    pub order_month_dt: Option<NaiveDate>,
    pub day_of_week: Option<Weekday>,
    pub hour_of_day: Option<u32>,
    pub department: String,
    pub category: String,
    pub brand: String,
    pub sku_id: String,
    pub city: String,
    pub city_zone: String,
    pub channel: String,
    pub nationality_group: String,
    pub age: Option<i64>,
    pub loyalty_member: Option<bool>,
    pub quantity: Option<f64>,
    pub line_value_aed: Option<f64>,
    pub basket_size_items: Option<f64>,
    /// Source cells in header order, derived columns excluded.
    pub raw: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    indices: BTreeMap<&'static str, usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String], source: &Path) -> Result<Self, LoadError> {
        let mut indices = BTreeMap::new();
        for &column in REQUIRED_COLUMNS {
            let idx = headers.iter().position(|h| h == column).ok_or_else(|| {
                LoadError::MissingColumn {
                    path: source.to_path_buf(),
                    column: column.to_string(),
                }
            })?;
            indices.insert(column, idx);
        }
        Ok(Self { indices })
    }

    pub(crate) fn index(&self, column: &str) -> Option<usize> {
        self.indices.get(column).copied()
    }
}

/// Immutable table of order lines plus the source header layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    columns: ColumnMap,
    rows: Vec<OrderLine>,
}

impl Dataset {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[OrderLine] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub(crate) fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Builds a sibling table with the same layout and a new set of rows.
    pub(crate) fn derive(&self, rows: Vec<OrderLine>) -> Dataset {
        Dataset {
            headers: self.headers.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
}

pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let encoding = io_utils::resolve_encoding(options.encoding.as_deref())?;
    info!(
        "Loading order lines from '{}' (delimiter '{}', encoding {})",
        path.display(),
        crate::printable_delimiter(delimiter),
        encoding.name()
    );
    let reader = io_utils::open_source(path, delimiter)?;
    read_dataset(reader, encoding, path)
}

/// Loads from any reader; `source` is only used for error messages.
pub fn load_from_reader<R: Read>(
    reader: R,
    delimiter: u8,
    encoding: &'static Encoding,
    source: &Path,
) -> Result<Dataset> {
    read_dataset(io_utils::open_csv_reader(reader, delimiter), encoding, source)
}

fn read_dataset<R: Read>(
    mut reader: csv::Reader<R>,
    encoding: &'static Encoding,
    source: &Path,
) -> Result<Dataset> {
    let raw_headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading header row from {source:?}"))?;
    if raw_headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::EmptySource {
            path: source.to_path_buf(),
        }
        .into());
    }
    let trimmed = raw_headers
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    let kept = trimmed
        .iter()
        .enumerate()
        .filter(|(_, h)| !DERIVED_COLUMNS.contains(&h.as_str()))
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    let headers = kept.iter().map(|&idx| trimmed[idx].clone()).collect::<Vec<_>>();
    debug!("Source columns: {:?}", headers);
    let columns = ColumnMap::resolve(&headers, source)?;

    let mut report = CoercionReport::default();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|err| LoadError::Csv {
            path: source.to_path_buf(),
            source: err,
        })?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} in {source:?}", row_idx + 2))?;
        let raw = kept
            .iter()
            .map(|&idx| decoded.get(idx).cloned().unwrap_or_default())
            .collect::<Vec<_>>();
        rows.push(build_line(raw, &columns, row_idx + 2, &mut report));
    }

    report.log(source);
    info!("Loaded {} order line(s) from {:?}", rows.len(), source);
    Ok(Dataset {
        headers,
        columns,
        rows,
    })
}

#[derive(Debug, Default)]
struct CoercionReport {
    failures: BTreeMap<&'static str, usize>,
}

impl CoercionReport {
    fn record(&mut self, column: &'static str, row: usize, raw: &str) {
        debug!("Row {row}: could not coerce {column} value '{raw}', using null");
        *self.failures.entry(column).or_insert(0) += 1;
    }

    fn log(&self, source: &Path) {
        for (column, count) in &self.failures {
            info!("{count} cell(s) in column '{column}' of {source:?} were coerced to null");
        }
    }
}

fn build_line(
    raw: Vec<String>,
    columns: &ColumnMap,
    row: usize,
    report: &mut CoercionReport,
) -> OrderLine {
    let text = |column: &str| -> String {
        columns
            .index(column)
            .and_then(|idx| raw.get(idx))
            .cloned()
            .unwrap_or_default()
    };

    let order_datetime = coerce(
        &text(ORDER_DATETIME),
        ORDER_DATETIME,
        row,
        report,
        parse_naive_datetime,
    );
    let order_month = text(ORDER_MONTH);
    let order_month_dt = coerce(&order_month, ORDER_MONTH, row, report, parse_month_label);
    let age = coerce(&text(AGE), AGE, row, report, parse_integer);
    let loyalty_member = coerce(&text(LOYALTY_MEMBER), LOYALTY_MEMBER, row, report, parse_flag);
    let quantity = coerce(&text(QUANTITY), QUANTITY, row, report, parse_number);
    let line_value_aed = coerce(
        &text(LINE_VALUE_AED),
        LINE_VALUE_AED,
        row,
        report,
        parse_number,
    );
    let basket_size_items = coerce(
        &text(BASKET_SIZE_ITEMS),
        BASKET_SIZE_ITEMS,
        row,
        report,
        parse_number,
    );

    let order_id = text(ORDER_ID);
    let department = text(DEPARTMENT);
    let category = text(CATEGORY);
    let brand = text(BRAND);
    let sku_id = text(SKU_ID);
    let city = text(CITY);
    let city_zone = text(CITY_ZONE);
    let channel = text(CHANNEL);
    let nationality_group = text(NATIONALITY_GROUP);

    OrderLine {
        order_id,
        order_datetime,
        order_month,
        order_month_dt,
        day_of_week: order_datetime.map(|dt| dt.weekday()),
        hour_of_day: order_datetime.map(|dt| dt.hour()),
        department,
        category,
        brand,
        sku_id,
        city,
        city_zone,
        channel,
        nationality_group,
        age,
        loyalty_member,
        quantity,
        line_value_aed,
        basket_size_items,
        raw,
    }
}

/// Empty cells are null without being reported; anything unparsable is
/// reported and nulled.
fn coerce<T>(
    value: &str,
    column: &'static str,
    row: usize,
    report: &mut CoercionReport,
    parse: impl Fn(&str) -> Result<T>,
) -> Option<T> {
    if value.trim().is_empty() {
        return None;
    }
    match parse(value) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            report.record(column, row, value);
            None
        }
    }
}
