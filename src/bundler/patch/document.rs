//! Patch document model and its unified-diff text form.
//!
//! The text form is whatever `diffy` writes and reads, so patches made with
//! `diff -u` or `git diff` (file headers included) load as well.

use std::{fmt, str::FromStr};

/// One line of a hunk. The text includes its line terminator, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    /// Present in both texts.
    Context(String),
    /// Present only in the original.
    Delete(String),
    /// Present only in the modified text.
    Insert(String),
}

impl HunkLine {
    /// Line text including terminator.
    pub fn text(&self) -> &str {
        match self {
            Self::Context(t) | Self::Delete(t) | Self::Insert(t) => t,
        }
    }

    /// Whether the line must be found in the original.
    pub fn is_old(&self) -> bool {
        matches!(self, Self::Context(_) | Self::Delete(_))
    }

    /// Whether the line ends up in the patched text.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Context(_) | Self::Insert(_))
    }
}

impl From<&diffy::Line<'_, str>> for HunkLine {
    fn from(line: &diffy::Line<'_, str>) -> Self {
        match *line {
            diffy::Line::Context(t) => Self::Context(t.to_owned()),
            diffy::Line::Delete(t) => Self::Delete(t.to_owned()),
            diffy::Line::Insert(t) => Self::Insert(t.to_owned()),
        }
    }
}

/// A contiguous group of edits anchored by surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 0-based index of the first old line in the original text.
    pub source_start: usize,
    /// Context, deletions and insertions in order.
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    fn from_diffy(hunk: &diffy::Hunk<'_, str>) -> Self {
        let range = hunk.old_range();
        // Unified numbering is 1-based; an empty range names the line before it.
        let source_start = if range.len() == 0 {
            range.start()
        } else {
            range.start().saturating_sub(1)
        };
        Self {
            source_start,
            lines: hunk.lines().iter().map(HunkLine::from).collect(),
        }
    }

    /// Lines the hunk expects to find in the original.
    pub fn old_lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter(|l| l.is_old()).map(HunkLine::text)
    }

    /// Number of original lines covered by the hunk.
    pub fn old_len(&self) -> usize {
        self.lines.iter().filter(|l| l.is_old()).count()
    }

    /// Leading context lines.
    pub fn leading_context(&self) -> usize {
        self.lines
            .iter()
            .take_while(|l| matches!(l, HunkLine::Context(_)))
            .count()
    }

    /// Trailing context lines.
    pub fn trailing_context(&self) -> usize {
        self.lines
            .iter()
            .rev()
            .take_while(|l| matches!(l, HunkLine::Context(_)))
            .count()
    }
}

/// An ordered, serializable description of a text transformation.
///
/// Produced by [`super::diff`] and consumed by [`super::apply`]. The text
/// form produced by `Display` parses back with `FromStr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDocument {
    text: String,
    hunks: Vec<Hunk>,
}

impl PatchDocument {
    pub(crate) fn from_diffy(patch: &diffy::Patch<'_, str>) -> Self {
        Self {
            text: patch.to_string(),
            hunks: patch.hunks().iter().map(Hunk::from_diffy).collect(),
        }
    }

    /// The hunks of this document.
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// True when the document describes no change.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

impl fmt::Display for PatchDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Failure to parse the text form of a patch.
#[derive(Debug, thiserror::Error)]
#[error("malformed patch: {0}")]
pub struct ParsePatchError(#[from] diffy::ParsePatchError);

impl FromStr for PatchDocument {
    type Err = ParsePatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let patch = diffy::Patch::from_str(s)?;
        Ok(Self {
            text: s.to_owned(),
            hunks: patch.hunks().iter().map(Hunk::from_diffy).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_headers_are_accepted() {
        let text = "--- a/flutter.js\n+++ b/flutter.js\n@@ -1,2 +1,2 @@\n a\n-b\n+c\n";
        let doc: PatchDocument = text.parse().unwrap();

        assert_eq!(doc.hunks().len(), 1);
        let hunk = &doc.hunks()[0];
        assert_eq!(hunk.source_start, 0);
        assert_eq!(
            hunk.lines,
            [
                HunkLine::Context("a\n".into()),
                HunkLine::Delete("b\n".into()),
                HunkLine::Insert("c\n".into()),
            ]
        );
        assert_eq!(doc.to_string(), text);
    }

    #[test]
    fn missing_final_newline_is_kept() {
        let text = "@@ -1,2 +1,2 @@\n a\n-b\n\\ No newline at end of file\n+c\n\\ No newline at end of file\n";
        let doc: PatchDocument = text.parse().unwrap();
        assert_eq!(
            doc.hunks()[0].lines,
            [
                HunkLine::Context("a\n".into()),
                HunkLine::Delete("b".into()),
                HunkLine::Insert("c".into()),
            ]
        );
    }

    #[test]
    fn truncated_hunk_is_rejected() {
        assert!("@@ -1,3 +1,3 @@\n a\n".parse::<PatchDocument>().is_err());
    }
}
