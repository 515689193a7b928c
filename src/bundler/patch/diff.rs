//! Line diff on top of `diffy`.

use super::document::PatchDocument;

/// Context lines kept around each change.
pub const CONTEXT_LINES: usize = 3;

/// Splits text into lines that keep their terminators.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Computes a patch turning `original` into `modified`.
pub fn diff(original: &str, modified: &str) -> PatchDocument {
    let patch = diffy::DiffOptions::new()
        .set_context_len(CONTEXT_LINES)
        .create_patch(original, modified);
    PatchDocument::from_diffy(&patch)
}
