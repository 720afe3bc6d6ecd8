pub mod aggregate;
pub mod cache;
pub mod chart;
pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod insights;
pub mod io_utils;
pub mod report;
pub mod session;

#[cfg(test)]
mod fixtures;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde_json::json;

use crate::{
    cache::DatasetCache,
    chart::ChartKind,
    cli::{Cli, Commands, OutputFormat},
    filter::FilterOptions,
    session::Request,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(verbose: bool) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            let level = if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            builder.filter_module("order_insights", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cache = DatasetCache::global();
    match cli.command {
        Commands::Summary(args) => handle_summary(&args, cache),
        Commands::Chart(args) => handle_chart(&args, cache),
        Commands::Charts => handle_charts(),
        Commands::TopSkus(args) => handle_top_skus(&args, cache),
        Commands::Export(args) => handle_export(&args, cache),
        Commands::Options(args) => handle_options(&args, cache),
    }
}

fn handle_summary(args: &cli::SummaryArgs, cache: &DatasetCache) -> Result<()> {
    let request = Request::from_args(&args.input, Some(&args.filters))?;
    let view = request.execute(cache)?;
    let kpis = aggregate::kpis(&view.filtered);
    debug!("KPIs: {kpis:?}");
    match args.format {
        OutputFormat::Json => {
            let mut payload = json!({
                "filters": view.spec.describe(),
                "rows": view.filtered.len(),
                "kpis": kpis,
            });
            if args.insights {
                payload["insights"] = json!(insights::business_insights(&kpis));
            }
            print_json(&payload)
        }
        OutputFormat::Table => {
            print!("{}", report::render_kpis(&kpis));
            if view.filtered.is_empty() {
                println!("{}", report::NO_DATA);
            }
            if args.insights {
                println!();
                for line in insights::business_insights(&kpis) {
                    println!("• {line}");
                }
            }
            Ok(())
        }
    }
}

fn handle_chart(args: &cli::ChartArgs, cache: &DatasetCache) -> Result<()> {
    let request = Request::from_args(&args.input, Some(&args.filters))?;
    let kind = match (args.kind, request.profile.chart.as_deref()) {
        (Some(kind), _) => kind,
        (None, Some(label)) => label
            .parse::<ChartKind>()
            .context("Reading chart from profile")?,
        (None, None) => {
            return Err(anyhow!(
                "No chart selected; pass --kind or set `chart` in --config"
            ));
        }
    };
    let view = request.execute(cache)?;
    let data = kind.compute(&view.filtered);
    info!("Computed '{}' over {} row(s)", kind.label(), view.filtered.len());
    match args.format {
        OutputFormat::Json => print_json(&json!({
            "chart": kind.label(),
            "title": kind.title(),
            "filters": view.spec.describe(),
            "empty": data.is_empty(),
            "result": data,
        })),
        OutputFormat::Table => {
            print!("{}", report::render_chart(kind, &data));
            Ok(())
        }
    }
}

fn handle_charts() -> Result<()> {
    for kind in ChartKind::ALL {
        println!("{:<28} {}", kind.label(), kind.slug());
    }
    Ok(())
}

fn handle_top_skus(args: &cli::TopSkusArgs, cache: &DatasetCache) -> Result<()> {
    let request = Request::from_args(&args.input, Some(&args.filters))?;
    let view = request.execute(cache)?;
    let skus = aggregate::top_skus(&view.filtered, args.limit);
    if let Some(path) = &args.output {
        let output = io_utils::open_output(Some(path))?;
        export::write_top_skus_csv(&skus, output)
            .with_context(|| format!("Writing SKU ranking to {path:?}"))?;
        info!("Wrote {} SKU row(s) to {:?}", skus.len(), path);
        if io_utils::is_dash(path) {
            return Ok(());
        }
    }
    match args.format {
        OutputFormat::Json => print_json(&json!(skus)),
        OutputFormat::Table => {
            print!("{}", report::render_top_skus(&skus));
            Ok(())
        }
    }
}

fn handle_export(args: &cli::ExportArgs, cache: &DatasetCache) -> Result<()> {
    let request = Request::from_args(&args.input, Some(&args.filters))?;
    let view = request.execute(cache)?;
    export::export_to_path(&view.filtered, &args.output)
}

fn handle_options(args: &cli::OptionsArgs, cache: &DatasetCache) -> Result<()> {
    let request = Request::from_args(&args.input, None)?;
    let source = cache.get_or_load(&request.input, &request.load)?;
    let options = FilterOptions::from_dataset(&source);
    match args.format {
        OutputFormat::Json => print_json(&json!(options)),
        OutputFormat::Table => {
            let with_all = |values: &[String]| {
                std::iter::once(filter::ALL.to_string())
                    .chain(values.iter().cloned())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            println!("department: {}", with_all(&options.departments));
            println!("category: {}", with_all(&options.categories));
            println!("nationality: {}", with_all(&options.nationality_groups));
            println!("month: {}", with_all(&options.order_months));
            match options.age_range {
                Some(range) => println!("age: {range}"),
                None => println!("age: n/a"),
            }
            Ok(())
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).context("Writing JSON output")?;
    writeln!(handle).context("Writing JSON output")?;
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
