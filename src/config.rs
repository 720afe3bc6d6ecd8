//! YAML dashboard profiles.
//!
//! A profile pins the data source and a default filter set so repeated runs
//! don't need the same flags:
//!
//! ```yaml
//! input: data/orders.csv
//! delimiter: ","
//! filters:
//!   department: Grocery
//!   age_min: 25
//!   age_max: 40
//! chart: Top Cities
//! ```
//!
//! Relative `input` paths resolve against the profile's directory.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{cli::parse_delimiter, filter::FilterSelections};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub input: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    pub filters: FilterSelections,
    pub chart: Option<String>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening profile {path:?}"))?;
        let mut profile: Profile = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing profile {path:?}"))?;
        if let Some(input) = &profile.input
            && input.is_relative()
            && let Some(base) = path.parent()
        {
            profile.input = Some(base.join(input));
        }
        Ok(profile)
    }

    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        self.delimiter
            .as_deref()
            .map(|value| parse_delimiter(value).map_err(anyhow::Error::msg))
            .transpose()
            .context("Invalid delimiter in profile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_resolves_relative_input_against_profile_dir() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("profile.yml");
        fs::write(
            &path,
            "input: orders.csv\ndelimiter: tab\nfilters:\n  department: Grocery\n  age_min: 30\n",
        )
        .expect("write profile");

        let profile = Profile::load(&path).expect("load profile");
        assert_eq!(profile.input, Some(dir.path().join("orders.csv")));
        assert_eq!(profile.delimiter_byte().unwrap(), Some(b'\t'));
        assert_eq!(profile.filters.department.as_deref(), Some("Grocery"));
        assert_eq!(profile.filters.age_min, Some(30));
    }

    #[test]
    fn filter_aliases_are_accepted() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("profile.yml");
        fs::write(&path, "filters:\n  nationality: Asian\n  month: 2024-03\n")
            .expect("write profile");
        let profile = Profile::load(&path).expect("load profile");
        assert_eq!(profile.filters.nationality_group.as_deref(), Some("Asian"));
        assert_eq!(profile.filters.order_month.as_deref(), Some("2024-03"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("profile.yml");
        fs::write(&path, "colour: blue\n").expect("write profile");
        assert!(Profile::load(&path).is_err());
    }
}
