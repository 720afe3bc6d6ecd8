use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use order_insights::aggregate;
use order_insights::cache::DatasetCache;
use order_insights::chart::ChartKind;
use order_insights::dataset::{LoadOptions, load_dataset};
use order_insights::filter::{self, FilterSpec};
use tempfile::TempDir;

const DEPARTMENTS: [&str; 4] = ["Grocery", "Electronics", "Home", "Fashion"];
const CITIES: [&str; 3] = ["Dubai", "Abu Dhabi", "Sharjah"];

fn generate_orders(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("orders.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(
        file,
        "order_id,order_datetime,order_month,department,category,brand,sku_id,city,city_zone,channel,nationality_group,age,loyalty_member,quantity,line_value_aed,basket_size_items"
    )
    .expect("header");
    for i in 0..rows {
        let order = i / 3;
        let month = (order % 12) + 1;
        let day = (order % 28) + 1;
        let hour = order % 24;
        let department = DEPARTMENTS[i % DEPARTMENTS.len()];
        let city = CITIES[order % CITIES.len()];
        let channel = if order % 2 == 0 { "online" } else { "offline" };
        writeln!(
            file,
            "{order},2024-{month:02}-{day:02} {hour:02}:00:00,2024-{month:02},{department},Cat{},Brand{},SKU-{},{city},Zone{},{channel},Arab,{},{},{},{}.50,{}",
            i % 9,
            i % 17,
            i % 400,
            order % 7,
            18 + order % 50,
            order % 2,
            1 + i % 4,
            10 + i % 900,
            3 + order % 10,
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_filter_aggregate(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_orders(60_000);
    let dataset = load_dataset(&csv_path, &LoadOptions::default()).expect("load orders");
    let grocery = FilterSpec {
        department: Some("Grocery".to_string()),
        ..FilterSpec::default()
    };

    let mut group = c.benchmark_group("dashboard");

    group.bench_function("load_csv", |b| {
        b.iter_batched(
            DatasetCache::new,
            |cache| {
                cache
                    .get_or_load(&csv_path, &LoadOptions::default())
                    .expect("load through cache");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("filter_and_kpis", |b| {
        b.iter(|| {
            let filtered = filter::apply(&dataset, &grocery);
            aggregate::kpis(&filtered)
        });
    });

    group.bench_function("all_charts", |b| {
        b.iter(|| {
            for kind in ChartKind::ALL {
                kind.compute(&dataset);
            }
            aggregate::top_skus(&dataset, aggregate::TOP_SKUS)
        });
    });

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_filter_aggregate);
criterion_main!(benches);
