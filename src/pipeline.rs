//! Run orchestration.
//!
//! The driver owns everything mutable about a run: the root directory and
//! the open manifest handle are fields, not process-wide state. One
//! [`Pipeline`] instance is constructed per run and executes sequentially:
//!
//! ```text
//! for each combination (enumeration order):
//!     build           source → compile → rasterize (skip-if-present)
//!     write section   headings + image refs + reproduction snippet
//! finalize manifest
//! ```
//!
//! Builds run strictly one at a time. Each combination is dominated by
//! external-process latency and the combination count is small, so
//! parallelism buys nothing and would break the manifest's ordering and the
//! presence-check idempotence.
//!
//! A recoverable build failure ([`BuildError`] from a tool) is recorded in
//! the [`RunSummary`] and the run moves on — one broken combination must
//! not block the rest of the grid. Its manifest section is still written,
//! so the index always has one section per combination. Fatal errors
//! (filesystem, manifest) unwind immediately; the manifest writer's drop
//! guard closes the document on the way out.

use crate::axes::AxisSet;
use crate::build::{ArtifactPaths, BuildError, Builder, StageStatus};
use crate::config::{Config, ConfigError};
use crate::grid::Combination;
use crate::manifest::{ManifestError, ManifestWriter};
use crate::template::Template;
use crate::tools::DeckTools;
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Progress notifications emitted while the run executes.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Started {
        total: usize,
    },
    /// One combination went through all stages.
    Combination {
        index: usize,
        total: usize,
        label: String,
        source: StageStatus,
        compile: StageStatus,
        rasterize: StageStatus,
    },
    /// One combination failed recoverably and was skipped.
    Failed {
        index: usize,
        total: usize,
        label: String,
        error: String,
    },
}

/// One recoverable failure, as recorded in the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub combination: String,
    pub stage: Option<String>,
    pub error: String,
}

/// End-of-run accounting; serialized to `build-report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when every attempted combination built.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A single run's worth of state: root directory, resolved axes and
/// template, and the tool backend.
pub struct Pipeline<'a, T: DeckTools> {
    root: &'a Path,
    config: &'a Config,
    axes: AxisSet,
    template: Template,
    tools: &'a T,
}

impl<'a, T: DeckTools> Pipeline<'a, T> {
    /// Resolve the axis set and template once, before any work happens.
    /// Configuration errors abort here, before anything touches the disk.
    pub fn new(root: &'a Path, config: &'a Config, tools: &'a T) -> Result<Self, ConfigError> {
        let axes = config.axis_set()?;
        let template = config.template.resolve(root)?;
        Ok(Self {
            root,
            config,
            axes,
            template,
            tools,
        })
    }

    pub fn axes(&self) -> &AxisSet {
        &self.axes
    }

    /// Execute the full run. `on_event` receives progress notifications as
    /// each combination completes or fails.
    pub fn run(&self, on_event: &mut dyn FnMut(PipelineEvent)) -> Result<RunSummary, RunError> {
        fs::create_dir_all(self.root).map_err(|source| BuildError::Filesystem {
            path: self.root.to_path_buf(),
            source,
        })?;

        let manifest_path = self.root.join(&self.config.manifest.file);
        let mut writer = ManifestWriter::create(&manifest_path, &self.config.manifest, &self.axes)?;
        let builder = Builder::new(
            self.tools,
            self.root,
            &self.axes,
            &self.template,
            &self.config.artifact,
            self.config.tools.passes,
        );

        let total = self.axes.combination_count();
        on_event(PipelineEvent::Started { total });

        let mut summary = RunSummary {
            attempted: 0,
            succeeded: 0,
            failures: Vec::new(),
        };

        for (i, combination) in self.axes.combinations().enumerate() {
            summary.attempted += 1;
            match builder.build(&combination) {
                Ok(report) => {
                    summary.succeeded += 1;
                    on_event(PipelineEvent::Combination {
                        index: i + 1,
                        total,
                        label: combination.label(),
                        source: report.source,
                        compile: report.compile,
                        rasterize: report.rasterize,
                    });
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    on_event(PipelineEvent::Failed {
                        index: i + 1,
                        total,
                        label: combination.label(),
                        error: e.to_string(),
                    });
                    summary.failures.push(FailureRecord {
                        combination: combination.label(),
                        stage: e.stage().map(|s| s.to_string()),
                        error: e.to_string(),
                    });
                }
            }
            self.write_section(&mut writer, &combination)?;
        }

        writer.finalize()?;
        Ok(summary)
    }

    /// The manifest section is written for successes and failures alike:
    /// the index must end up with one section per combination.
    fn write_section(
        &self,
        writer: &mut ManifestWriter<'_>,
        combination: &Combination,
    ) -> Result<(), ManifestError> {
        let paths = ArtifactPaths::for_combination(combination, &self.config.artifact);
        let snippet = self.template.render(&self.axes, combination);
        writer.section(combination, &paths, &snippet)
    }
}
