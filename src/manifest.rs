//! Index document writing.
//!
//! The manifest is a single R Markdown file tying the whole gallery
//! together: one tabbed heading level per axis, and under every leaf the
//! preview images plus the exact source that reproduces them.
//!
//! ```text
//! ## circles {.tabset}          <- axis 0 value changed
//! **Outer Themes:**
//!
//! ### tree {.tabset}            <- axis 1 value changed
//! **Font Themes:**
//!
//! #### serif {.tabset}          <- leaf: one section per combination
//! <img src="circles/tree/serif/Example-1.png" ...>
//! **Code to reproduce these slides:**
//! (fenced text block with the full rendered source)
//! [⇦ Back](../../../latex.html)
//! ```
//!
//! Sections are written incrementally in enumeration order; because the
//! enumerator varies the first axis slowest, emitting a heading at every
//! depth whose value changed reconstructs the nested structure exactly.
//!
//! The writer owns the file handle for the duration of one run (single
//! writer, not re-entrant). [`ManifestWriter::finalize`] writes the closing
//! marker; if the run unwinds before reaching it, `Drop` writes the marker
//! instead so the document is never left unterminated.

use crate::axes::AxisSet;
use crate::build::ArtifactPaths;
use crate::config::ManifestConfig;
use crate::grid::Combination;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("manifest write failed: {0}")]
    Io(#[from] io::Error),
}

/// Inline style applied to every preview image reference.
const IMG_STYLE: &str = "width:49%; padding:4px; border:1px solid #000;";

/// Incremental writer for the gallery index.
pub struct ManifestWriter<'a> {
    out: BufWriter<File>,
    axes: &'a AxisSet,
    config: &'a ManifestConfig,
    previous: Option<Vec<String>>,
    finalized: bool,
}

impl<'a> ManifestWriter<'a> {
    /// Create the manifest file and write its front matter, intro prose and
    /// the first axis label.
    pub fn create(
        path: &Path,
        config: &'a ManifestConfig,
        axes: &'a AxisSet,
    ) -> Result<Self, ManifestError> {
        let file = File::create(path)?;
        let mut writer = Self {
            out: BufWriter::new(file),
            axes,
            config,
            previous: None,
            finalized: false,
        };
        writer.preamble()?;
        Ok(writer)
    }

    fn preamble(&mut self) -> Result<(), ManifestError> {
        writeln!(self.out, "---")?;
        writeln!(self.out, "title: '{}'", self.config.title)?;
        writeln!(self.out, "output:")?;
        writeln!(self.out, "    html_document:")?;
        writeln!(self.out, "        theme: paper")?;
        writeln!(self.out, "        highlight: textmate")?;
        writeln!(self.out, "---")?;
        writeln!(self.out)?;
        writeln!(self.out, "<font size=\"3\">")?;
        writeln!(self.out)?;
        writeln!(self.out, "[⇦ Back]({})", self.config.back_link)?;
        writeln!(self.out)?;
        if !self.config.intro.is_empty() {
            writeln!(self.out, "{}", self.config.intro.trim_end())?;
            writeln!(self.out)?;
        }
        writeln!(self.out, "{{.tabset}}")?;
        writeln!(self.out, "=========")?;
        writeln!(self.out, "**{}:**", self.axes.axes()[0].display_title())?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Write one heading at `depth` (0-based; depth 0 renders as `##`).
    /// Non-leaf headings are followed by the next axis's label line.
    pub fn begin_section(&mut self, depth: usize, value: &str) -> Result<(), ManifestError> {
        let marks = "#".repeat(depth + 2);
        writeln!(self.out, "{marks} {value} {{.tabset}}")?;
        if depth + 1 < self.axes.depth() {
            writeln!(self.out, "**{}:**", self.axes.axes()[depth + 1].display_title())?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Reference every preview image of one combination.
    pub fn artifact_refs(&mut self, paths: &ArtifactPaths) -> Result<(), ManifestError> {
        for image in &paths.images {
            writeln!(
                self.out,
                "<img src=\"{}\" style=\"{IMG_STYLE}\">",
                slash_path(image)
            )?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Emit the literal source snippet that reproduces one combination,
    /// followed by the back link.
    pub fn reproduction_snippet(&mut self, snippet: &str) -> Result<(), ManifestError> {
        writeln!(self.out, "**Code to reproduce these slides:**")?;
        writeln!(self.out)?;
        writeln!(self.out, "```text")?;
        self.out.write_all(snippet.as_bytes())?;
        if !snippet.ends_with('\n') {
            writeln!(self.out)?;
        }
        writeln!(self.out, "```")?;
        writeln!(self.out)?;
        writeln!(self.out, "[⇦ Back]({})", self.config.back_link)?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Write one combination's complete section: headings at every depth
    /// whose value changed since the previous combination, then the image
    /// references and the reproduction snippet.
    pub fn section(
        &mut self,
        combination: &Combination,
        paths: &ArtifactPaths,
        snippet: &str,
    ) -> Result<(), ManifestError> {
        let values = combination.values();
        let first_changed = match &self.previous {
            None => 0,
            Some(previous) => values
                .iter()
                .zip(previous)
                .position(|(a, b)| a != b)
                .unwrap_or(values.len()),
        };
        for depth in first_changed..values.len() {
            self.begin_section(depth, &values[depth])?;
        }
        self.artifact_refs(paths)?;
        self.reproduction_snippet(snippet)?;
        self.previous = Some(values.to_vec());
        Ok(())
    }

    /// Write the closing marker and flush. Exactly one finalization is
    /// written per run; calling this again is a no-op.
    pub fn finalize(&mut self) -> Result<(), ManifestError> {
        if self.finalized {
            return Ok(());
        }
        self.write_closing()?;
        Ok(())
    }

    fn write_closing(&mut self) -> Result<(), ManifestError> {
        writeln!(self.out, "</font>")?;
        writeln!(self.out)?;
        self.out.flush()?;
        self.finalized = true;
        Ok(())
    }
}

impl Drop for ManifestWriter<'_> {
    fn drop(&mut self) {
        if !self.finalized {
            // Unwinding from a fatal error: close the document anyway.
            let _ = self.write_closing();
        }
    }
}

/// Render a relative path with forward slashes, as the index requires.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::ArtifactPaths;
    use crate::config::{ArtifactConfig, ManifestConfig};
    use crate::test_helpers::small_grid;
    use std::fs;
    use tempfile::TempDir;

    fn write_all_sections(tmp: &TempDir) -> String {
        let axes = small_grid();
        let config = ManifestConfig::default();
        let layout = ArtifactConfig::default();
        let path = tmp.path().join("themes.Rmd");
        let mut writer = ManifestWriter::create(&path, &config, &axes).unwrap();
        for combo in axes.combinations() {
            let paths = ArtifactPaths::for_combination(&combo, &layout);
            writer.section(&combo, &paths, "\\documentclass{beamer}\n").unwrap();
        }
        writer.finalize().unwrap();
        drop(writer);
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn heading_sequence_matches_enumeration_nesting() {
        let tmp = TempDir::new().unwrap();
        let content = write_all_sections(&tmp);

        let headings: Vec<&str> = content
            .lines()
            .filter(|l| l.starts_with('#'))
            .collect();
        assert_eq!(
            headings,
            vec![
                "## A {.tabset}",
                "### X {.tabset}",
                "### Y {.tabset}",
                "### Z {.tabset}",
                "## B {.tabset}",
                "### X {.tabset}",
                "### Y {.tabset}",
                "### Z {.tabset}",
            ]
        );
    }

    #[test]
    fn one_section_per_combination() {
        let tmp = TempDir::new().unwrap();
        let content = write_all_sections(&tmp);
        // Leaf sections are exactly the snippet blocks.
        assert_eq!(content.matches("```text").count(), 6);
        assert_eq!(
            content.matches("**Code to reproduce these slides:**").count(),
            6
        );
    }

    #[test]
    fn image_refs_use_forward_slashes() {
        let tmp = TempDir::new().unwrap();
        let content = write_all_sections(&tmp);
        assert!(content.contains("<img src=\"A/X/Example-1.png\""));
        assert!(content.contains("<img src=\"B/Z/Example-4.png\""));
        assert_eq!(content.matches("<img src=").count(), 24);
    }

    #[test]
    fn axis_labels_follow_headings() {
        let tmp = TempDir::new().unwrap();
        let content = write_all_sections(&tmp);
        // Front matter labels the first axis; every depth-0 heading is
        // followed by the second axis's label.
        assert_eq!(content.matches("**inner:**").count(), 1);
        assert_eq!(content.matches("**outer:**").count(), 2);
    }

    #[test]
    fn front_matter_and_back_link() {
        let tmp = TempDir::new().unwrap();
        let content = write_all_sections(&tmp);
        assert!(content.starts_with("---\n"));
        assert!(content.contains("title: 'Built-In Beamer Themes"));
        assert!(content.contains("[⇦ Back](../../../latex.html)"));
    }

    #[test]
    fn finalize_writes_closing_marker() {
        let tmp = TempDir::new().unwrap();
        let content = write_all_sections(&tmp);
        assert!(content.trim_end().ends_with("</font>"));
    }

    #[test]
    fn drop_without_finalize_still_closes() {
        let tmp = TempDir::new().unwrap();
        let axes = small_grid();
        let config = ManifestConfig::default();
        let path = tmp.path().join("themes.Rmd");
        {
            let _writer = ManifestWriter::create(&path, &config, &axes).unwrap();
            // Dropped without finalize, as a fatal unwind would.
        }
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.trim_end().ends_with("</font>"));
    }

    #[test]
    fn finalize_twice_writes_one_marker() {
        let tmp = TempDir::new().unwrap();
        let axes = small_grid();
        let config = ManifestConfig::default();
        let path = tmp.path().join("themes.Rmd");
        let mut writer = ManifestWriter::create(&path, &config, &axes).unwrap();
        writer.finalize().unwrap();
        writer.finalize().unwrap();
        drop(writer);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("</font>").count(), 1);
    }

    #[test]
    fn intro_prose_is_written_verbatim() {
        let tmp = TempDir::new().unwrap();
        let axes = small_grid();
        let config = ManifestConfig {
            intro: "Some *prose* about the grid.".to_string(),
            ..ManifestConfig::default()
        };
        let path = tmp.path().join("themes.Rmd");
        let mut writer = ManifestWriter::create(&path, &config, &axes).unwrap();
        writer.finalize().unwrap();
        drop(writer);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Some *prose* about the grid."));
    }

    #[test]
    fn snippet_without_trailing_newline_is_terminated() {
        let tmp = TempDir::new().unwrap();
        let axes = small_grid();
        let config = ManifestConfig::default();
        let path = tmp.path().join("themes.Rmd");
        let mut writer = ManifestWriter::create(&path, &config, &axes).unwrap();
        writer.reproduction_snippet("\\documentclass{beamer}").unwrap();
        writer.finalize().unwrap();
        drop(writer);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\\documentclass{beamer}\n```"));
    }
}
