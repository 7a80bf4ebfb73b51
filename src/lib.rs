//! # theme-grid
//!
//! A combinatorial theme gallery generator for LaTeX beamer decks. Declare
//! a few styling axes (inner/outer/font themes by default), and theme-grid
//! renders a demo deck for every combination, compiles it, rasterizes
//! preview images, and writes an R Markdown index that shows the whole grid
//! with the reproducing source under each entry.
//!
//! # Architecture: One Sequential Pipeline
//!
//! ```text
//! enumerate   axes         →  combinations       (Cartesian product, lazy)
//! build       combination  →  <dir>/Example.*    (source → compile → rasterize)
//! index       combinations →  themes.Rmd         (nested tabbed sections)
//! ```
//!
//! Every build stage checks for its own output before doing anything, which
//! gives the pipeline its three core properties:
//!
//! - **Idempotence**: re-running over a complete grid invokes no tools.
//! - **Resumability**: a killed run resumes from the first incomplete stage
//!   of the first incomplete combination.
//! - **Hand-edit safety**: an existing source file is never overwritten, so
//!   a tweaked combination survives re-runs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`axes`] | Axis declarations: names, values, directives, validation |
//! | [`grid`] | Combination enumeration in deterministic nesting order |
//! | [`template`] | The fixed document body and per-combination rendering |
//! | [`tools`] | External compiler/rasterizer backend trait + system impl |
//! | [`build`] | The three idempotent build stages and byproduct cleanup |
//! | [`manifest`] | Incremental R Markdown index writer |
//! | [`pipeline`] | Run orchestration, failure accounting, summaries |
//! | [`config`] | `theme-grid.toml` loading, validation, stock defaults |
//! | [`output`] | CLI output formatting — pure `format_*` functions |
//!
//! # Design Decisions
//!
//! ## Presence Is Freshness
//!
//! The cache key is the combination's directory (its axis values joined as
//! a path); the freshness policy is file presence — no mtimes, no hashes.
//! This is deliberately coarse. It makes partial runs trivially resumable
//! and keeps hand-edited sources safe, at the cost that editing the
//! template does **not** invalidate artifacts already on disk. Deleting a
//! combination's directory is the invalidation story.
//!
//! ## Sequential By Design
//!
//! Builds run one at a time. Each combination is dominated by external
//! compiler/rasterizer latency and grids top out in the low hundreds, so
//! concurrency would complicate the manifest's strict section ordering for
//! no real win.
//!
//! ## External Tools Behind a Trait
//!
//! `pdflatex` and `pdftoppm` are invoked through the [`tools::DeckTools`]
//! trait with structured arguments and a per-combination working directory,
//! never through a shell string. Tests drive the full pipeline against a recording
//! mock; nothing above the trait knows whether a real compiler ran.
//! Invocations have no timeout: a hung tool stalls the run (a documented
//! limitation, not a silent one).

pub mod axes;
pub mod build;
pub mod config;
pub mod grid;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod template;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_helpers;
