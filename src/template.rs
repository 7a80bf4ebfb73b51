//! Document template and source rendering.
//!
//! Every combination's source file is the same fixed document with a
//! different block of styling directives spliced in:
//!
//! ```text
//! \documentclass{beamer}      ← document-class line
//!                             ← blank separator
//! \usetheme{Madrid}           ← pinned preamble lines (same for every deck)
//! \usecolortheme{seagull}
//! \useinnertheme{circles}     ← one directive per axis, in axis order
//! \useoutertheme{tree}
//! \usefonttheme{serif}
//!                             ← blank separator
//! ...                         ← fixed body (frames, bibliography, ...)
//! ```
//!
//! [`Template::render`] produces this text. The same rendering is used for
//! the source file on disk and for the index document's reproduction
//! snippet, so the two are byte-identical by construction.
//!
//! The default body is embedded at compile time; a different deck can be
//! supplied via `template.body_file` in the config.

use crate::axes::AxisSet;
use crate::grid::Combination;

/// The demo deck shipped in the binary: a title frame, a lists/columns
/// frame, a blocks/table/verbatim frame and a bibliography frame — the
/// surfaces built-in themes visibly differ on.
pub const DEFAULT_BODY: &str = include_str!("../static/body.tex");

/// Fixed document source shared read-only across all combinations.
#[derive(Debug, Clone)]
pub struct Template {
    document_class: String,
    preamble: Vec<String>,
    body: String,
}

impl Template {
    pub fn new(
        document_class: impl Into<String>,
        preamble: Vec<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            document_class: document_class.into(),
            preamble,
            body: body.into(),
        }
    }

    /// Render the complete document source for one combination.
    ///
    /// Always ends with a newline, even if the body does not.
    pub fn render(&self, axes: &AxisSet, combination: &Combination) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(&self.document_class);
        out.push_str("\n\n");
        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }
        for (axis, value) in axes.axes().iter().zip(combination.values()) {
            out.push_str(&axis.directive_for(value));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}
