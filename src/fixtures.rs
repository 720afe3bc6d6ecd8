//! In-memory order-line fixtures for unit tests.

use std::path::Path;

use encoding_rs::UTF_8;

use crate::dataset::{Dataset, REQUIRED_COLUMNS, load_from_reader};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Line {
    pub order_id: &'static str,
    pub order_datetime: &'static str,
    pub order_month: &'static str,
    pub department: &'static str,
    pub category: &'static str,
    pub brand: &'static str,
    pub sku_id: &'static str,
    pub city: &'static str,
    pub city_zone: &'static str,
    pub channel: &'static str,
    pub nationality_group: &'static str,
    pub age: &'static str,
    pub loyalty_member: &'static str,
    pub quantity: &'static str,
    pub line_value_aed: &'static str,
    pub basket_size_items: &'static str,
}

pub(crate) fn line(order_id: &'static str, line_value_aed: &'static str) -> Line {
    Line {
        order_id,
        order_datetime: "2024-03-04 10:00:00",
        order_month: "2024-03",
        department: "Grocery",
        category: "Dairy",
        brand: "Almarai",
        sku_id: "SKU-1",
        city: "Dubai",
        city_zone: "Deira",
        channel: "online",
        nationality_group: "Arab",
        age: "35",
        loyalty_member: "1",
        quantity: "1",
        line_value_aed,
        basket_size_items: "3",
    }
}

pub(crate) fn dataset(lines: &[Line]) -> Dataset {
    let mut text = REQUIRED_COLUMNS.join(",");
    text.push('\n');
    for l in lines {
        let cells = [
            l.order_id,
            l.order_datetime,
            l.order_month,
            l.department,
            l.category,
            l.brand,
            l.sku_id,
            l.city,
            l.city_zone,
            l.channel,
            l.nationality_group,
            l.age,
            l.loyalty_member,
            l.quantity,
            l.line_value_aed,
            l.basket_size_items,
        ];
        text.push_str(&cells.join(","));
        text.push('\n');
    }
    load_from_reader(text.as_bytes(), b',', UTF_8, Path::new("fixture.csv"))
        .expect("fixture dataset loads")
}
