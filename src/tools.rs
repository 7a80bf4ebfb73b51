//! External document-tool backend.
//!
//! The [`DeckTools`] trait defines the two operations the build pipeline
//! needs from the outside world: one compiler pass and one rasterizer
//! invocation. The production implementation is [`SystemTools`], which
//! shells out to the configured programs (`pdflatex` and `pdftoppm` by
//! default) with structured arguments — filenames are never interpolated
//! into a shell string.
//!
//! Invocations are synchronous and have no timeout: a hung tool stalls the
//! run. Both tools execute with the artifact directory as their working
//! directory, so byproducts land next to the source file where the cleanup
//! pass can see them.

use crate::config::ToolsConfig;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with code {code}")]
    Failed { program: String, code: i32 },
    #[error("{program} was terminated by a signal")]
    Killed { program: String },
}

/// The external tool stages of the build pipeline.
///
/// Filenames are relative to `dir`, which is the invocation's working
/// directory.
pub trait DeckTools {
    /// Run one compiler pass over `source`. The builder drives the number
    /// of passes; a single call is a single pass.
    fn compile(&self, dir: &Path, source: &str) -> Result<(), ToolError>;

    /// Produce the numbered preview images for `compiled` under `prefix`.
    fn rasterize(&self, dir: &Path, compiled: &str, prefix: &str) -> Result<(), ToolError>;
}

/// Availability of one external program, as reported by [`SystemTools::probe`].
#[derive(Debug, Clone)]
pub struct ToolProbe {
    pub program: String,
    pub available: bool,
}

/// Production backend: spawns the configured compiler and rasterizer.
pub struct SystemTools {
    config: ToolsConfig,
}

impl SystemTools {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    /// Check whether the configured programs can be spawned at all.
    ///
    /// Spawning with `--version` and ignoring the exit status sidesteps the
    /// tools' divergent version-flag conventions; only a launch failure
    /// counts as unavailable.
    pub fn probe(&self) -> Vec<ToolProbe> {
        [&self.config.compiler, &self.config.rasterizer]
            .into_iter()
            .map(|program| ToolProbe {
                program: program.clone(),
                available: Command::new(program)
                    .arg("--version")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .is_ok(),
            })
            .collect()
    }
}

impl DeckTools for SystemTools {
    fn compile(&self, dir: &Path, source: &str) -> Result<(), ToolError> {
        run(
            &self.config.compiler,
            &self.config.compiler_args,
            &[source],
            dir,
        )
    }

    fn rasterize(&self, dir: &Path, compiled: &str, prefix: &str) -> Result<(), ToolError> {
        run(
            &self.config.rasterizer,
            &self.config.rasterizer_args,
            &[compiled, prefix],
            dir,
        )
    }
}

/// Spawn `program` with its configured arguments plus `operands`, blocking
/// until it exits. Tool chatter goes to null; the pipeline's own output is
/// the progress display.
fn run(program: &str, args: &[String], operands: &[&str], dir: &Path) -> Result<(), ToolError> {
    let status = Command::new(program)
        .args(args)
        .args(operands)
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(ToolError::Failed {
            program: program.to_string(),
            code,
        }),
        None => Err(ToolError::Killed {
            program: program.to_string(),
        }),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Mock backend that records invocations and fakes the tools' file
    /// outputs so the builder's presence checks behave as they would with
    /// the real programs.
    #[derive(Default)]
    pub struct MockTools {
        /// How many preview images a rasterize call produces.
        pub pages: u32,
        /// Fail every compile pass with a non-zero exit code.
        pub fail_compile: bool,
        /// Compile "succeeds" but writes no compiled file.
        pub omit_compiled: bool,
        /// Fail rasterization with a non-zero exit code.
        pub fail_rasterize: bool,
        /// Fail compile passes only for directories ending in one of these.
        pub fail_dirs: Vec<String>,
        pub ops: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Compile { dir: PathBuf, source: String },
        Rasterize { dir: PathBuf, compiled: String, prefix: String },
    }

    impl MockTools {
        pub fn new(pages: u32) -> Self {
            Self {
                pages,
                ..Self::default()
            }
        }

        pub fn ops(&self) -> Vec<RecordedOp> {
            self.ops.lock().unwrap().clone()
        }

        pub fn op_count(&self) -> usize {
            self.ops.lock().unwrap().len()
        }

        fn fails_in(&self, dir: &Path) -> bool {
            self.fail_dirs.iter().any(|d| dir.ends_with(d))
        }
    }

    impl DeckTools for MockTools {
        fn compile(&self, dir: &Path, source: &str) -> Result<(), ToolError> {
            self.ops.lock().unwrap().push(RecordedOp::Compile {
                dir: dir.to_path_buf(),
                source: source.to_string(),
            });
            let stem = Path::new(source).file_stem().unwrap().to_string_lossy();
            // A real compiler leaves byproducts behind even when it fails.
            fs::write(dir.join(format!("{stem}.log")), "log").unwrap();
            fs::write(dir.join(format!("{stem}.aux")), "aux").unwrap();
            if self.fail_compile || self.fails_in(dir) {
                return Err(ToolError::Failed {
                    program: "pdflatex".to_string(),
                    code: 1,
                });
            }
            if !self.omit_compiled {
                fs::write(dir.join(format!("{stem}.pdf")), "%PDF").unwrap();
            }
            Ok(())
        }

        fn rasterize(&self, dir: &Path, compiled: &str, prefix: &str) -> Result<(), ToolError> {
            self.ops.lock().unwrap().push(RecordedOp::Rasterize {
                dir: dir.to_path_buf(),
                compiled: compiled.to_string(),
                prefix: prefix.to_string(),
            });
            if self.fail_rasterize {
                return Err(ToolError::Failed {
                    program: "pdftoppm".to_string(),
                    code: 1,
                });
            }
            for page in 1..=self.pages {
                fs::write(dir.join(format!("{prefix}-{page}.png")), "png").unwrap();
            }
            Ok(())
        }
    }

    #[test]
    fn mock_records_compile() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tools = MockTools::new(2);
        tools.compile(tmp.path(), "Example.tex").unwrap();

        let ops = tools.ops();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Compile { source, .. } if source == "Example.tex"));
        assert!(tmp.path().join("Example.pdf").exists());
        assert!(tmp.path().join("Example.log").exists());
    }

    #[test]
    fn mock_records_rasterize() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tools = MockTools::new(3);
        tools.rasterize(tmp.path(), "Example.pdf", "Example").unwrap();

        assert_eq!(tools.op_count(), 1);
        for page in 1..=3 {
            assert!(tmp.path().join(format!("Example-{page}.png")).exists());
        }
    }

    #[test]
    fn mock_compile_failure_still_leaves_byproducts() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tools = MockTools {
            fail_compile: true,
            ..MockTools::new(2)
        };
        let err = tools.compile(tmp.path(), "Example.tex").unwrap_err();
        assert!(matches!(err, ToolError::Failed { code: 1, .. }));
        assert!(tmp.path().join("Example.log").exists());
        assert!(!tmp.path().join("Example.pdf").exists());
    }
}
