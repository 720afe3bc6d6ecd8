//! One request cycle: resolve input and filters, fetch the cached dataset,
//! and produce the filtered view every command works from.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Result, anyhow};
use log::info;

use crate::{
    cache::DatasetCache,
    cli::{FilterArgs, InputArgs},
    config::Profile,
    dataset::{Dataset, LoadOptions},
    filter::{self, FilterSelections, FilterSpec},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub input: PathBuf,
    pub load: LoadOptions,
    pub selections: FilterSelections,
    pub profile: Profile,
}

impl Request {
    /// Command-line values win over the profile's.
    pub fn from_args(input: &InputArgs, filters: Option<&FilterArgs>) -> Result<Self> {
        let profile = match &input.config {
            Some(path) => Profile::load(path)?,
            None => Profile::default(),
        };
        let source = input
            .input
            .clone()
            .or_else(|| profile.input.clone())
            .ok_or_else(|| anyhow!("No input file given; pass --input or set `input` in --config"))?;
        let delimiter = match input.delimiter {
            Some(delimiter) => Some(delimiter),
            None => profile.delimiter_byte()?,
        };
        let load = LoadOptions {
            delimiter,
            encoding: input
                .input_encoding
                .clone()
                .or_else(|| profile.input_encoding.clone()),
        };
        let selections = match filters {
            Some(args) => profile.filters.merged_with(&args.selections()),
            None => profile.filters.clone(),
        };
        Ok(Self {
            input: source,
            load,
            selections,
            profile,
        })
    }

    pub fn execute(&self, cache: &DatasetCache) -> Result<View> {
        let source = cache.get_or_load(&self.input, &self.load)?;
        let spec = FilterSpec::resolve(&self.selections, &source);
        let filtered = filter::apply(&source, &spec);
        info!(
            "Filter [{}] matched {} of {} order line(s)",
            spec.describe(),
            filtered.len(),
            source.len()
        );
        Ok(View {
            source,
            spec,
            filtered,
        })
    }
}

/// The shared source snapshot plus the filtered rows derived from it.
#[derive(Debug, Clone)]
pub struct View {
    pub source: Arc<Dataset>,
    pub spec: FilterSpec,
    pub filtered: Dataset,
}
