//! Per-combination artifact building.
//!
//! The heart of the pipeline: takes one combination through the three
//! build stages, each guarded by a presence check so the whole pipeline is
//! idempotent and resumable.
//!
//! ```text
//! 1. Source     <dir>/Example.tex        written only if absent
//! 2. Compile    <dir>/Example.pdf        two compiler passes + cleanup
//! 3. Rasterize  <dir>/Example-1..N.png   one rasterizer invocation
//! ```
//!
//! ## Freshness model
//!
//! The combination's directory is the cache key and *file presence is the
//! whole freshness policy* — no timestamps, no content hashes. This is
//! deliberately coarse: it makes a killed run resume from the first
//! incomplete stage, and it means a hand-edited source file is never
//! clobbered by a re-run. The flip side is that editing the template does
//! not invalidate decks already on disk; deleting their directories does.
//!
//! ## Byproduct cleanup
//!
//! Compilers litter their working directory (`.log`, `.aux`, `.nav`, ...).
//! Immediately after the compile passes, successful or not, every regular
//! file whose extension is outside the `{source, compiled}` allow-list is
//! deleted. The directory listing and deletions use structured path APIs;
//! filenames never pass through a shell.
//!
//! ## Failure semantics
//!
//! Filesystem failures are fatal ([`BuildError::is_fatal`]); tool failures
//! and missing tool output are recoverable: the driver records them and
//! moves on to the next combination.

use crate::axes::AxisSet;
use crate::config::ArtifactConfig;
use crate::grid::Combination;
use crate::template::Template;
use crate::tools::{DeckTools, ToolError};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The three build stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Source,
    Compile,
    Rasterize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Source => write!(f, "source"),
            Stage::Compile => write!(f, "compile"),
            Stage::Rasterize => write!(f, "rasterize"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{stage} failed for {combination}: {source}")]
    Tool {
        stage: Stage,
        combination: String,
        #[source]
        source: ToolError,
    },
    #[error("{stage} for {combination} produced no {path}")]
    MissingOutput {
        stage: Stage,
        combination: String,
        path: PathBuf,
    },
}

impl BuildError {
    /// Fatal errors abort the whole run; the rest skip one combination.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BuildError::Filesystem { .. })
    }

    /// The stage that failed, for recoverable errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BuildError::Filesystem { .. } => None,
            BuildError::Tool { stage, .. } | BuildError::MissingOutput { stage, .. } => {
                Some(*stage)
            }
        }
    }
}

/// Every file belonging to one combination, relative to the pipeline root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub source: PathBuf,
    pub compiled: PathBuf,
    pub images: Vec<PathBuf>,
}

impl ArtifactPaths {
    /// Derive the full path set for a combination. Pure, no filesystem
    /// access, so the manifest can reference artifacts that are not built
    /// yet (or failed to build).
    pub fn for_combination(combination: &Combination, layout: &ArtifactConfig) -> Self {
        let dir = combination.rel_dir();
        let source = dir.join(format!("{}.{}", layout.stem, layout.source_ext));
        let compiled = dir.join(format!("{}.{}", layout.stem, layout.compiled_ext));
        let images = (1..=layout.pages)
            .map(|page| dir.join(format!("{}-{}.{}", layout.stem, page, layout.image_ext)))
            .collect();
        Self {
            dir,
            source,
            compiled,
            images,
        }
    }
}

/// What happened to one stage during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Output was already present; nothing ran.
    Fresh,
    /// Output was produced by this run.
    Built,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Fresh => write!(f, "fresh"),
            StageStatus::Built => write!(f, "built"),
        }
    }
}

/// Result of building one combination.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub paths: ArtifactPaths,
    pub source: StageStatus,
    pub compile: StageStatus,
    pub rasterize: StageStatus,
}

impl BuildReport {
    /// True when every stage was satisfied by presence checks alone.
    pub fn all_fresh(&self) -> bool {
        self.source == StageStatus::Fresh
            && self.compile == StageStatus::Fresh
            && self.rasterize == StageStatus::Fresh
    }
}

/// Presence-check summary of one combination's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    /// Source, compiled file and all images exist.
    Complete,
    /// Some files exist — a resumable partial build.
    Partial,
    /// Nothing exists yet.
    Missing,
}

/// Builds one combination at a time against a tool backend.
pub struct Builder<'a, T: DeckTools> {
    tools: &'a T,
    root: &'a Path,
    axes: &'a AxisSet,
    template: &'a Template,
    layout: &'a ArtifactConfig,
    passes: u32,
}

impl<'a, T: DeckTools> Builder<'a, T> {
    pub fn new(
        tools: &'a T,
        root: &'a Path,
        axes: &'a AxisSet,
        template: &'a Template,
        layout: &'a ArtifactConfig,
        passes: u32,
    ) -> Self {
        Self {
            tools,
            root,
            axes,
            template,
            layout,
            passes,
        }
    }

    /// Drive one combination through the three stages.
    pub fn build(&self, combination: &Combination) -> Result<BuildReport, BuildError> {
        let paths = ArtifactPaths::for_combination(combination, self.layout);
        let dir = self.root.join(&paths.dir);
        fs::create_dir_all(&dir).map_err(|source| BuildError::Filesystem {
            path: dir.clone(),
            source,
        })?;

        let source = self.materialize_source(combination, &paths)?;
        let compile = self.compile(combination, &paths, &dir)?;
        let rasterize = self.rasterize(combination, &paths, &dir)?;

        Ok(BuildReport {
            paths,
            source,
            compile,
            rasterize,
        })
    }

    /// Stage 1: write the rendered source, unless one is already there.
    /// An existing file may be hand-edited — it is never overwritten.
    fn materialize_source(
        &self,
        combination: &Combination,
        paths: &ArtifactPaths,
    ) -> Result<StageStatus, BuildError> {
        let source_abs = self.root.join(&paths.source);
        if source_abs.exists() {
            return Ok(StageStatus::Fresh);
        }
        let text = self.template.render(self.axes, combination);
        fs::write(&source_abs, text).map_err(|source| BuildError::Filesystem {
            path: source_abs.clone(),
            source,
        })?;
        Ok(StageStatus::Built)
    }

    /// Stage 2: run the compiler passes, then sweep byproducts.
    ///
    /// Cleanup runs only when the compiler actually ran, and runs even when
    /// a pass failed: litter from a failed pass would otherwise sit behind
    /// the presence check forever.
    fn compile(
        &self,
        combination: &Combination,
        paths: &ArtifactPaths,
        dir: &Path,
    ) -> Result<StageStatus, BuildError> {
        let compiled_abs = self.root.join(&paths.compiled);
        if compiled_abs.exists() {
            return Ok(StageStatus::Fresh);
        }

        let source_name = format!("{}.{}", self.layout.stem, self.layout.source_ext);
        let mut outcome = Ok(());
        for _ in 0..self.passes {
            if let Err(e) = self.tools.compile(dir, &source_name) {
                outcome = Err(e);
                break;
            }
        }
        self.clean_byproducts(dir)?;
        outcome.map_err(|source| BuildError::Tool {
            stage: Stage::Compile,
            combination: combination.label(),
            source,
        })?;

        if !compiled_abs.exists() {
            return Err(BuildError::MissingOutput {
                stage: Stage::Compile,
                combination: combination.label(),
                path: paths.compiled.clone(),
            });
        }
        Ok(StageStatus::Built)
    }

    /// Stage 3: rasterize the compiled document into the preview images,
    /// unless the full set already exists.
    fn rasterize(
        &self,
        combination: &Combination,
        paths: &ArtifactPaths,
        dir: &Path,
    ) -> Result<StageStatus, BuildError> {
        if paths.images.iter().all(|p| self.root.join(p).exists()) {
            return Ok(StageStatus::Fresh);
        }

        let compiled_name = format!("{}.{}", self.layout.stem, self.layout.compiled_ext);
        self.tools
            .rasterize(dir, &compiled_name, &self.layout.stem)
            .map_err(|source| BuildError::Tool {
                stage: Stage::Rasterize,
                combination: combination.label(),
                source,
            })?;

        if let Some(missing) = paths.images.iter().find(|p| !self.root.join(p).exists()) {
            return Err(BuildError::MissingOutput {
                stage: Stage::Rasterize,
                combination: combination.label(),
                path: missing.clone(),
            });
        }
        Ok(StageStatus::Built)
    }

    /// Delete every regular file in `dir` whose extension is not in the
    /// `{source_ext, compiled_ext}` allow-list.
    fn clean_byproducts(&self, dir: &Path) -> Result<(), BuildError> {
        let fs_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| BuildError::Filesystem { path, source }
        };
        let entries = fs::read_dir(dir).map_err(fs_err(dir))?;
        for entry in entries {
            let entry = entry.map_err(fs_err(dir))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let keep = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.layout.source_ext || e == self.layout.compiled_ext);
            if !keep {
                fs::remove_file(&path).map_err(fs_err(&path))?;
            }
        }
        Ok(())
    }
}

/// Presence-check one combination without touching any tool.
pub fn artifact_status(
    root: &Path,
    combination: &Combination,
    layout: &ArtifactConfig,
) -> ArtifactStatus {
    let paths = ArtifactPaths::for_combination(combination, layout);
    let mut expected: Vec<&PathBuf> = vec![&paths.source, &paths.compiled];
    expected.extend(paths.images.iter());
    let present = expected
        .iter()
        .filter(|p| root.join(p).exists())
        .count();
    if present == expected.len() {
        ArtifactStatus::Complete
    } else if present == 0 {
        ArtifactStatus::Missing
    } else {
        ArtifactStatus::Partial
    }
}

/// Status of every combination in enumeration order. Powers `plan`.
pub fn survey(
    root: &Path,
    axes: &AxisSet,
    layout: &ArtifactConfig,
) -> Vec<(Combination, ArtifactStatus)> {
    axes.combinations()
        .map(|combination| {
            let status = artifact_status(root, &combination, layout);
            (combination, status)
        })
        .collect()
}
