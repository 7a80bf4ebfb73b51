//! Configuration module.
//!
//! Handles loading and validating `theme-grid.toml`. Configuration is a
//! single file: when it is absent, the stock defaults (the full built-in
//! beamer inner/outer/font grid) are used unchanged.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional — defaults shown below
//!
//! # One [[axes]] table per styling dimension, in nesting order: the first
//! # axis becomes the outermost index heading and the top-level directory.
//! [[axes]]
//! name = "inner"
//! title = "Inner Themes"
//! directive = '\useinnertheme{%s}'   # %s is replaced by the value
//! values = ["default", "circles", "inmargin", "rectangles", "rounded"]
//!
//! [template]
//! document_class = '\documentclass{beamer}'
//! # Lines emitted between the document class and the per-axis directives —
//! # selections held fixed across the whole grid.
//! preamble = ['\usetheme{Madrid}', '\usecolortheme{seagull}']
//! # Path to a body file (relative to --root). Omit for the built-in deck.
//! # body_file = "body.tex"
//!
//! [artifact]
//! stem = "Example"          # Basename for every generated file
//! source_ext = "tex"
//! compiled_ext = "pdf"
//! image_ext = "png"
//! pages = 4                 # Preview images expected per deck
//!
//! [tools]
//! compiler = "pdflatex"
//! compiler_args = ["-interaction=batchmode"]
//! passes = 2                # Compiler passes (cross-reference resolution)
//! rasterizer = "pdftoppm"
//! rasterizer_args = ["-png", "-r", "100"]
//!
//! [manifest]
//! file = "themes.Rmd"
//! title = "Built-In Beamer Themes"
//! intro = ""                # Prose inserted before the first heading
//! back_link = "../../../latex.html"
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! Note the freshness model this config feeds: artifacts are considered
//! up to date purely by file presence. Editing the template, preamble or
//! tool settings does **not** invalidate decks already on disk — delete the
//! affected directories to force a rebuild.

use crate::axes::{Axis, AxesError, AxisSet};
use crate::template::{DEFAULT_BODY, Template};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("axis declaration error: {0}")]
    Axes(#[from] AxesError),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Generator configuration loaded from `theme-grid.toml`.
///
/// All fields have stock defaults; user config files need only specify the
/// values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Styling dimensions, in nesting order.
    pub axes: Vec<Axis>,
    /// Fixed document parts shared by every combination.
    pub template: TemplateConfig,
    /// Naming of the per-combination files.
    pub artifact: ArtifactConfig,
    /// External compiler and rasterizer invocations.
    pub tools: ToolsConfig,
    /// Index document settings.
    pub manifest: ManifestConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            axes: default_axes(),
            template: TemplateConfig::default(),
            artifact: ArtifactConfig::default(),
            tools: ToolsConfig::default(),
            manifest: ManifestConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to stock defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate config values, including the axis declarations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        AxisSet::new(self.axes.clone())?;
        if self.artifact.pages == 0 {
            return Err(ConfigError::Validation(
                "artifact.pages must be at least 1".into(),
            ));
        }
        if self.tools.passes == 0 {
            return Err(ConfigError::Validation(
                "tools.passes must be at least 1".into(),
            ));
        }
        if self.artifact.stem.is_empty() || self.artifact.stem.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "artifact.stem must be a plain file name".into(),
            ));
        }
        for (key, ext) in [
            ("artifact.source_ext", &self.artifact.source_ext),
            ("artifact.compiled_ext", &self.artifact.compiled_ext),
            ("artifact.image_ext", &self.artifact.image_ext),
        ] {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a bare extension like \"tex\""
                )));
            }
        }
        if self.artifact.source_ext == self.artifact.compiled_ext {
            return Err(ConfigError::Validation(
                "source_ext and compiled_ext must differ".into(),
            ));
        }
        if self.manifest.file.is_empty() {
            return Err(ConfigError::Validation(
                "manifest.file must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The validated axis set declared by this config.
    pub fn axis_set(&self) -> Result<AxisSet, ConfigError> {
        Ok(AxisSet::new(self.axes.clone())?)
    }
}

/// Fixed document parts: class line, pinned preamble, body source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// First line of every generated source.
    pub document_class: String,
    /// Lines between the document class and the per-axis directives.
    /// Styling selections held fixed across the whole grid go here.
    pub preamble: Vec<String>,
    /// Body file path, resolved relative to the pipeline root. When absent
    /// the built-in demo deck is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_file: Option<PathBuf>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            document_class: "\\documentclass{beamer}".to_string(),
            preamble: vec![
                "\\usetheme{Madrid}".to_string(),
                "\\usecolortheme{seagull}".to_string(),
            ],
            body_file: None,
        }
    }
}

impl TemplateConfig {
    /// Materialize the [`Template`], reading the body file if one is set.
    pub fn resolve(&self, base: &Path) -> Result<Template, ConfigError> {
        let body = match &self.body_file {
            Some(path) => fs::read_to_string(base.join(path))?,
            None => DEFAULT_BODY.to_string(),
        };
        Ok(Template::new(
            self.document_class.clone(),
            self.preamble.clone(),
            body,
        ))
    }
}

/// Naming scheme of the files generated per combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactConfig {
    /// Basename shared by the source, compiled and image files.
    pub stem: String,
    pub source_ext: String,
    pub compiled_ext: String,
    pub image_ext: String,
    /// Number of preview images each deck is expected to produce.
    pub pages: u32,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            stem: "Example".to_string(),
            source_ext: "tex".to_string(),
            compiled_ext: "pdf".to_string(),
            image_ext: "png".to_string(),
            pages: 4,
        }
    }
}

/// External tool invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub compiler: String,
    /// Flags placed before the source filename. Batch/non-interactive mode
    /// belongs here so a broken deck cannot stall the run at a prompt.
    pub compiler_args: Vec<String>,
    /// Compiler passes per deck. Two passes let cross-references settle.
    pub passes: u32,
    pub rasterizer: String,
    /// Flags placed before the compiled filename and output prefix.
    pub rasterizer_args: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            compiler: "pdflatex".to_string(),
            compiler_args: vec!["-interaction=batchmode".to_string()],
            passes: 2,
            rasterizer: "pdftoppm".to_string(),
            rasterizer_args: vec!["-png".to_string(), "-r".to_string(), "100".to_string()],
        }
    }
}

/// Index document settings. The surrounding prose (title, intro, back link)
/// is opaque to the pipeline; it is written through verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Index file name, created in the pipeline root.
    pub file: String,
    pub title: String,
    /// Markdown prose inserted between the back link and the first heading.
    pub intro: String,
    /// Relative hyperlink to the parent index, repeated under every section.
    pub back_link: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file: "themes.Rmd".to_string(),
            title: "Built-In Beamer Themes: Inner, Outer and Font Themes".to_string(),
            intro: String::new(),
            back_link: "../../../latex.html".to_string(),
        }
    }
}

/// The stock axes: beamer's built-in inner, outer and font themes.
fn default_axes() -> Vec<Axis> {
    vec![
        Axis {
            name: "inner".to_string(),
            title: Some("Inner Themes".to_string()),
            directive: "\\useinnertheme{%s}".to_string(),
            values: ["default", "circles", "inmargin", "rectangles", "rounded"]
                .map(String::from)
                .to_vec(),
        },
        Axis {
            name: "outer".to_string(),
            title: Some("Outer Themes".to_string()),
            directive: "\\useoutertheme{%s}".to_string(),
            values: [
                "default",
                "infolines",
                "miniframes",
                "shadow",
                "sidebar",
                "smoothbars",
                "smoothtree",
                "split",
                "tree",
            ]
            .map(String::from)
            .to_vec(),
        },
        Axis {
            name: "font".to_string(),
            title: Some("Font Themes".to_string()),
            directive: "\\usefonttheme{%s}".to_string(),
            values: [
                "default",
                "professionalfonts",
                "serif",
                "structurebold",
                "structureitalicserif",
                "structuresmallcapsserif",
            ]
            .map(String::from)
            .to_vec(),
        },
    ]
}

/// A fully documented stock config, printed by `theme-grid gen-config`.
pub fn stock_config_toml() -> String {
    let stock = Config::default();
    let axes_toml = toml::to_string_pretty(&AxesOnly { axes: stock.axes }).unwrap_or_default();
    format!(
        r#"# theme-grid configuration
#
# Every option is optional; the values below are the stock defaults, the
# full grid of beamer's built-in inner, outer and font themes.
#
# Freshness is purely file presence: a combination with all of its files on
# disk is never rebuilt. After editing the template or tool settings, delete
# the affected directories to regenerate them.

# One [[axes]] table per styling dimension, in nesting order. The first
# axis varies slowest, becomes the outermost index heading, and names the
# top-level artifact directories. `%s` in a directive is replaced by the
# selected value.
{axes_toml}
[template]
document_class = '\documentclass{{beamer}}'
# Selections held fixed across the whole grid.
preamble = ['\usetheme{{Madrid}}', '\usecolortheme{{seagull}}']
# Body file (relative to --root); omit for the built-in demo deck.
# body_file = "body.tex"

[artifact]
stem = "Example"        # basename of every generated file
source_ext = "tex"
compiled_ext = "pdf"
image_ext = "png"
pages = 4               # preview images expected per deck

[tools]
compiler = "pdflatex"
compiler_args = ["-interaction=batchmode"]
passes = 2              # compiler passes, for cross-reference resolution
rasterizer = "pdftoppm"
rasterizer_args = ["-png", "-r", "100"]

[manifest]
file = "themes.Rmd"
title = "Built-In Beamer Themes: Inner, Outer and Font Themes"
intro = ""              # prose inserted before the first heading
back_link = "../../../latex.html"
"#
    )
}

/// Serialization shim so the stock config can render just the axes tables.
#[derive(Serialize)]
struct AxesOnly {
    axes: Vec<Axis>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn default_axes_match_beamer_builtins() {
        let config = Config::default();
        let axes = config.axis_set().unwrap();
        assert_eq!(axes.depth(), 3);
        assert_eq!(axes.get("inner").unwrap().values.len(), 5);
        assert_eq!(axes.get("outer").unwrap().values.len(), 9);
        assert_eq!(axes.get("font").unwrap().values.len(), 6);
        assert_eq!(axes.combination_count(), 270);
    }

    #[test]
    fn stock_config_parses_and_validates() {
        let config: Config = toml::from_str(&stock_config_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.axes.len(), 3);
        assert_eq!(config.tools.passes, 2);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [artifact]
            pages = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.artifact.pages, 2);
        assert_eq!(config.artifact.stem, "Example");
        assert_eq!(config.axes.len(), 3);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<Config, _> = toml::from_str("unknown_key = 1");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_keys_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [tools]
            compilr = "pdflatex"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_pages_rejected() {
        let config: Config = toml::from_str("[artifact]\npages = 0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_passes_rejected() {
        let config: Config = toml::from_str("[tools]\npasses = 0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn dotted_extension_rejected() {
        let config: Config = toml::from_str("[artifact]\nsource_ext = \".tex\"").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn equal_extensions_rejected() {
        let config: Config =
            toml::from_str("[artifact]\nsource_ext = \"pdf\"\ncompiled_ext = \"pdf\"").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn bad_axis_surfaces_as_axes_error() {
        let config: Config = toml::from_str(
            r#"
            [[axes]]
            name = "inner"
            directive = '\useinnertheme{%s}'
            values = []
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Axes(_))));
    }

    #[test]
    fn load_or_default_without_file() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_or_default(&tmp.path().join("missing.toml")).unwrap();
        assert_eq!(config.axes.len(), 3);
    }

    #[test]
    fn load_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("theme-grid.toml");
        std::fs::write(&path, "[manifest]\nfile = \"index.Rmd\"").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.manifest.file, "index.Rmd");
    }

    #[test]
    fn template_resolve_prefers_body_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("deck.tex"), "\\begin{document}\\end{document}").unwrap();
        let tc = TemplateConfig {
            body_file: Some("deck.tex".into()),
            ..TemplateConfig::default()
        };
        // Rendered output should carry the custom body, not the built-in one.
        let template = tc.resolve(tmp.path()).unwrap();
        let axes = crate::test_helpers::small_grid();
        let combo = axes.combinations().next().unwrap();
        let text = template.render(&axes, &combo);
        assert!(text.contains("\\begin{document}\\end{document}"));
        assert!(!text.contains("Theme Preview"));
    }

    #[test]
    fn template_resolve_missing_body_file_errors() {
        let tmp = TempDir::new().unwrap();
        let tc = TemplateConfig {
            body_file: Some("absent.tex".into()),
            ..TemplateConfig::default()
        };
        assert!(matches!(tc.resolve(tmp.path()), Err(ConfigError::Io(_))));
    }
}
