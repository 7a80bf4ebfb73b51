//! Shared test utilities for the theme-grid test suite.
//!
//! Builders for axis fixtures used across the module tests. The `small_grid`
//! fixture is the canonical 2×3 grid (`inner={A,B}`, `outer={X,Y,Z}`) whose
//! six combinations are small enough to assert against exhaustively.

use crate::axes::{Axis, AxisSet};

/// Build an axis named `name` with a `\use<name>{%s}` directive.
pub fn axis(name: &str, values: &[&str]) -> Axis {
    Axis {
        name: name.to_string(),
        title: None,
        directive: format!("\\use{name}{{%s}}"),
        values: values.iter().map(|v| v.to_string()).collect(),
    }
}

/// Build a validated axis set from `(name, values)` pairs.
pub fn axis_set(decls: &[(&str, &[&str])]) -> AxisSet {
    AxisSet::new(decls.iter().map(|(n, vs)| axis(n, vs)).collect()).unwrap()
}

/// The canonical two-axis fixture: `inner={A,B}`, `outer={X,Y,Z}`.
pub fn small_grid() -> AxisSet {
    axis_set(&[("inner", &["A", "B"]), ("outer", &["X", "Y", "Z"])])
}
