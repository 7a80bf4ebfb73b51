//! Axis declarations and validation.
//!
//! An axis is one independent styling dimension of the generated decks — for
//! the stock configuration these are beamer's inner, outer and font themes.
//! Each axis carries an ordered list of values (the first is the axis
//! default) and a directive pattern that selects a value in the document
//! source.
//!
//! Axis declaration order is load-bearing: it fixes the nesting depth of the
//! index document's headings and the storage path of every combination, so an
//! [`AxisSet`] is immutable once constructed.
//!
//! ## Validation
//!
//! [`AxisSet::new`] enforces the rules everything downstream relies on:
//!
//! - at least one axis is declared
//! - axis names are non-empty and unique
//! - every axis has at least one value
//! - values are unique within their axis
//! - values are usable as directory names (no separators, no `.`/`..`),
//!   which is what makes the derived storage paths collision-free
//! - every directive contains the `%s` placeholder

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AxesError {
    #[error("no axes declared")]
    Empty,
    #[error("axis with an empty name")]
    UnnamedAxis,
    #[error("duplicate axis name: {0}")]
    DuplicateAxis(String),
    #[error("axis '{0}' has no values")]
    NoValues(String),
    #[error("axis '{axis}' declares value '{value}' more than once")]
    DuplicateValue { axis: String, value: String },
    #[error("axis '{axis}' value '{value}' is not usable as a directory name")]
    UnsafeValue { axis: String, value: String },
    #[error("axis '{0}' directive has no %s placeholder")]
    BadDirective(String),
}

/// One styling dimension: an ordered value list plus the directive that
/// selects a value in the document source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Axis {
    /// Axis identifier, unique across the set (e.g. `inner`).
    pub name: String,
    /// Display label for the index document's axis headers
    /// (e.g. "Inner Themes"). Falls back to `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Source directive selecting a value; `%s` is replaced by the value
    /// (e.g. `\useinnertheme{%s}`).
    pub directive: String,
    /// Ordered values. The first is the axis default.
    pub values: Vec<String>,
}

impl Axis {
    /// The directive line selecting `value` on this axis.
    pub fn directive_for(&self, value: &str) -> String {
        self.directive.replace("%s", value)
    }

    /// Display label: explicit title, or the axis name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Validated, immutable list of axes in declaration order.
#[derive(Debug, Clone)]
pub struct AxisSet {
    axes: Vec<Axis>,
}

impl AxisSet {
    /// Validate and freeze a list of axis declarations.
    pub fn new(axes: Vec<Axis>) -> Result<Self, AxesError> {
        if axes.is_empty() {
            return Err(AxesError::Empty);
        }
        let mut seen_names: Vec<&str> = Vec::new();
        for axis in &axes {
            if axis.name.is_empty() {
                return Err(AxesError::UnnamedAxis);
            }
            if seen_names.contains(&axis.name.as_str()) {
                return Err(AxesError::DuplicateAxis(axis.name.clone()));
            }
            seen_names.push(&axis.name);

            if axis.values.is_empty() {
                return Err(AxesError::NoValues(axis.name.clone()));
            }
            let mut seen_values: Vec<&str> = Vec::new();
            for value in &axis.values {
                if seen_values.contains(&value.as_str()) {
                    return Err(AxesError::DuplicateValue {
                        axis: axis.name.clone(),
                        value: value.clone(),
                    });
                }
                seen_values.push(value);
                if !is_path_safe(value) {
                    return Err(AxesError::UnsafeValue {
                        axis: axis.name.clone(),
                        value: value.clone(),
                    });
                }
            }
            if !axis.directive.contains("%s") {
                return Err(AxesError::BadDirective(axis.name.clone()));
            }
        }
        Ok(Self { axes })
    }

    /// Axes in declaration order.
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Number of axes (the index document's nesting depth).
    pub fn depth(&self) -> usize {
        self.axes.len()
    }

    /// Look up an axis by name.
    pub fn get(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name == name)
    }

    /// Size of the full combination space.
    pub fn combination_count(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }
}

/// A value is path-safe when it can serve as a single directory component:
/// ASCII alphanumerics plus `-`, `_` and `.`, and not a dot-only name.
fn is_path_safe(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
