//! Combination enumeration.
//!
//! Produces the full Cartesian product of the axis values in a fixed nesting
//! order: the first-declared axis varies slowest (outermost), the
//! last-declared axis fastest (innermost). The ordering is load-bearing: it
//! is what lets the manifest writer turn the flat sequence back into nested
//! headings, one level per axis.
//!
//! Enumeration is lazy, side-effect free and restartable: calling
//! [`AxisSet::combinations`] again yields the identical sequence.

use crate::axes::{Axis, AxisSet};
use serde::Serialize;
use std::path::PathBuf;

/// One assignment of a value to every axis, in axis-declaration order.
///
/// The value tuple doubles as the combination's storage key: joining the
/// values with a path separator yields a unique relative directory (see
/// `AxisSet` validation for why this cannot collide).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Combination {
    values: Vec<String>,
}

impl Combination {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Values in axis-declaration order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The value selected for the axis at `depth`.
    pub fn value(&self, depth: usize) -> &str {
        &self.values[depth]
    }

    /// Storage directory relative to the pipeline root.
    pub fn rel_dir(&self) -> PathBuf {
        self.values.iter().collect()
    }

    /// Display form, `inner/outer/font` style.
    pub fn label(&self) -> String {
        self.values.join("/")
    }
}

/// Lazy iterator over the full combination space of an [`AxisSet`].
///
/// Works like an odometer: the last axis is the fastest-spinning digit.
pub struct Combinations<'a> {
    axes: &'a [Axis],
    odometer: Vec<usize>,
    remaining: usize,
}

impl AxisSet {
    /// Enumerate every combination in deterministic order.
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            axes: self.axes(),
            odometer: vec![0; self.depth()],
            remaining: self.combination_count(),
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.remaining == 0 {
            return None;
        }
        let values = self
            .axes
            .iter()
            .zip(&self.odometer)
            .map(|(axis, &i)| axis.values[i].clone())
            .collect();
        for depth in (0..self.odometer.len()).rev() {
            self.odometer[depth] += 1;
            if self.odometer[depth] < self.axes[depth].values.len() {
                break;
            }
            self.odometer[depth] = 0;
        }
        self.remaining -= 1;
        Some(Combination::new(values))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

impl std::iter::FusedIterator for Combinations<'_> {}
