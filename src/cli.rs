use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{chart::ChartKind, filter::FilterSelections};

#[derive(Debug, Parser)]
#[command(author, version, about = "Slice and summarize retail order-line datasets", long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show total sales, unique orders, average order value, and loyalty share
    Summary(SummaryArgs),
    /// Compute the data behind one chart
    Chart(ChartArgs),
    /// List the available chart labels
    Charts,
    /// Rank SKUs by revenue within each city zone
    TopSkus(TopSkusArgs),
    /// Write the filtered order lines to CSV
    Export(ExportArgs),
    /// List the values each filter accepts
    Options(OptionsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Order-line CSV file (may come from --config instead)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// YAML profile providing defaults for input and filters
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Department to keep ("All" for every department)
    #[arg(long)]
    pub department: Option<String>,
    /// Category to keep ("All" for every category)
    #[arg(long)]
    pub category: Option<String>,
    /// Nationality group to keep ("All" for every group)
    #[arg(long = "nationality")]
    pub nationality: Option<String>,
    /// Raw order_month label to keep ("All" for every month)
    #[arg(long = "month")]
    pub month: Option<String>,
    /// Youngest customer age to keep (inclusive)
    #[arg(long = "age-min", allow_negative_numbers = true)]
    pub age_min: Option<i64>,
    /// Oldest customer age to keep (inclusive)
    #[arg(long = "age-max", allow_negative_numbers = true)]
    pub age_max: Option<i64>,
}

impl FilterArgs {
    pub fn selections(&self) -> FilterSelections {
        FilterSelections {
            department: self.department.clone(),
            category: self.category.clone(),
            nationality_group: self.nationality.clone(),
            order_month: self.month.clone(),
            age_min: self.age_min,
            age_max: self.age_max,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Append business recommendations derived from the KPIs
    #[arg(long)]
    pub insights: bool,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Chart label or slug, e.g. "Top Cities" or top-cities (may come from --config)
    #[arg(short = 'k', long = "kind", value_parser = parse_chart_kind)]
    pub kind: Option<ChartKind>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct TopSkusArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Number of SKUs to list
    #[arg(long, default_value_t = crate::aggregate::TOP_SKUS)]
    pub limit: usize,
    /// Also write the ranking to this CSV file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Destination CSV file ("-" for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn parse_chart_kind(value: &str) -> Result<ChartKind, String> {
    value.parse::<ChartKind>().map_err(|err| {
        let known = ChartKind::ALL
            .iter()
            .map(|kind| format!("'{}'", kind.label()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{err}; expected one of {known}")
    })
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn parse_chart_kind_lists_known_labels_on_error() {
        let err = parse_chart_kind("scatter").unwrap_err();
        assert!(err.contains("'Channel Ratio'"));
    }

    #[test]
    fn cli_parses_chart_with_filters() {
        let cli = Cli::try_parse_from([
            "order-insights",
            "chart",
            "-i",
            "orders.csv",
            "--kind",
            "Top City Zones",
            "--department",
            "Grocery",
            "--age-min",
            "20",
        ])
        .expect("parse chart args");
        let Commands::Chart(args) = cli.command else {
            panic!("expected chart command");
        };
        assert_eq!(args.kind, Some(ChartKind::TopCityZones));
        let selections = args.filters.selections();
        assert_eq!(selections.department.as_deref(), Some("Grocery"));
        assert_eq!(selections.age_min, Some(20));
        assert_eq!(selections.age_max, None);
    }
}
