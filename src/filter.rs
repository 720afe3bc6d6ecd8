use std::fmt;

use itertools::{Itertools, MinMaxResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, OrderLine, non_blank};

/// Selector value meaning "no constraint on this field".
pub const ALL: &str = "All";

/// Maps the `All` sentinel (any case) and blank input to `None`.
pub fn normalize_selection(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Inclusive age bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: i64,
    pub max: i64,
}

impl AgeRange {
    /// Inverted bounds are swapped rather than rejected.
    pub fn new(min: i64, max: i64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn contains(&self, age: i64) -> bool {
        age >= self.min && age <= self.max
    }

    pub fn clamp_to(self, observed: AgeRange) -> Self {
        Self {
            min: self.min.clamp(observed.min, observed.max),
            max: self.max.clamp(observed.min, observed.max),
        }
    }

    /// Resolves optional user bounds against the observed range. A missing
    /// bound defaults to the observed one; the result is clamped into it.
    pub fn resolve(
        min: Option<i64>,
        max: Option<i64>,
        observed: Option<AgeRange>,
    ) -> Option<AgeRange> {
        if min.is_none() && max.is_none() {
            return None;
        }
        let Some(observed) = observed else {
            let lower = min.or(max)?;
            let upper = max.or(min)?;
            return Some(AgeRange::new(lower, upper));
        };
        let requested = AgeRange::new(min.unwrap_or(observed.min), max.unwrap_or(observed.max));
        let clamped = requested.clamp_to(observed);
        if let (Some(lo), Some(hi)) = (min, max)
            && lo > hi
        {
            warn!("Age range {lo}..={hi} is inverted; using {}..={}", hi, lo);
        }
        if clamped != requested {
            warn!(
                "Age range {}..={} clamped to observed range {}..={}",
                requested.min, requested.max, clamped.min, clamped.max
            );
        }
        Some(clamped)
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// Raw filter input as supplied by a user or a profile file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSelections {
    pub department: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "nationality")]
    pub nationality_group: Option<String>,
    #[serde(alias = "month")]
    pub order_month: Option<String>,
    pub age_min: Option<i64>,
    pub age_max: Option<i64>,
}

impl FilterSelections {
    /// Fields set in `overrides` win; the rest fall back to `self`.
    pub fn merged_with(&self, overrides: &FilterSelections) -> FilterSelections {
        FilterSelections {
            department: overrides.department.clone().or_else(|| self.department.clone()),
            category: overrides.category.clone().or_else(|| self.category.clone()),
            nationality_group: overrides
                .nationality_group
                .clone()
                .or_else(|| self.nationality_group.clone()),
            order_month: overrides.order_month.clone().or_else(|| self.order_month.clone()),
            age_min: overrides.age_min.or(self.age_min),
            age_max: overrides.age_max.or(self.age_max),
        }
    }
}

/// Conjunction of optional predicates; `None` fields are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub department: Option<String>,
    pub category: Option<String>,
    pub nationality_group: Option<String>,
    pub order_month: Option<String>,
    pub age_range: Option<AgeRange>,
}

impl FilterSpec {
    pub fn resolve(selections: &FilterSelections, dataset: &Dataset) -> FilterSpec {
        FilterSpec {
            department: normalize_selection(selections.department.as_deref()),
            category: normalize_selection(selections.category.as_deref()),
            nationality_group: normalize_selection(selections.nationality_group.as_deref()),
            order_month: normalize_selection(selections.order_month.as_deref()),
            age_range: AgeRange::resolve(
                selections.age_min,
                selections.age_max,
                observed_age_range(dataset),
            ),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        *self == FilterSpec::default()
    }

    pub fn matches(&self, line: &OrderLine) -> bool {
        matches_exact(self.department.as_deref(), &line.department)
            && matches_exact(self.category.as_deref(), &line.category)
            && matches_exact(self.nationality_group.as_deref(), &line.nationality_group)
            && matches_exact(self.order_month.as_deref(), &line.order_month)
            && self
                .age_range
                .is_none_or(|range| line.age.is_some_and(|age| range.contains(age)))
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        for (name, value) in [
            ("department", &self.department),
            ("category", &self.category),
            ("nationality_group", &self.nationality_group),
            ("order_month", &self.order_month),
        ] {
            if let Some(value) = value {
                parts.push(format!("{name} = '{value}'"));
            }
        }
        if let Some(range) = self.age_range {
            parts.push(format!("age in {range}"));
        }
        if parts.is_empty() {
            ALL.to_string()
        } else {
            parts.join(" AND ")
        }
    }
}

fn matches_exact(expected: Option<&str>, actual: &str) -> bool {
    expected.is_none_or(|value| value == actual)
}

/// Returns a new dataset holding the rows that satisfy every predicate, in
/// their original order.
pub fn apply(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    if spec.is_unconstrained() {
        return dataset.clone();
    }
    let rows = dataset
        .rows()
        .iter()
        .filter(|line| spec.matches(line))
        .cloned()
        .collect::<Vec<_>>();
    debug!(
        "Filter [{}] kept {} of {} row(s)",
        spec.describe(),
        rows.len(),
        dataset.len()
    );
    dataset.derive(rows)
}

pub fn observed_age_range(dataset: &Dataset) -> Option<AgeRange> {
    match dataset.rows().iter().filter_map(|line| line.age).minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(age) => Some(AgeRange::new(age, age)),
        MinMaxResult::MinMax(min, max) => Some(AgeRange::new(min, max)),
    }
}

/// Values a selector can offer for each filterable field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub departments: Vec<String>,
    pub categories: Vec<String>,
    pub nationality_groups: Vec<String>,
    pub order_months: Vec<String>,
    pub age_range: Option<AgeRange>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let distinct = |field: fn(&OrderLine) -> &str| {
            dataset
                .rows()
                .iter()
                .filter_map(|line| non_blank(field(line)))
                .sorted()
                .dedup()
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        Self {
            departments: distinct(|line| line.department.as_str()),
            categories: distinct(|line| line.category.as_str()),
            nationality_groups: distinct(|line| line.nationality_group.as_str()),
            order_months: distinct(|line| line.order_month.as_str()),
            age_range: observed_age_range(dataset),
        }
    }
}
