//! Fuzzy hunk application.

use super::{
    FuzzOptions, PatchFailure,
    diff::split_lines,
    document::{Hunk, HunkLine, PatchDocument},
};

/// Applies `patch` to `original` with the default tolerance.
pub fn apply(patch: &PatchDocument, original: &str) -> Result<String, PatchFailure> {
    apply_with(patch, original, FuzzOptions::default())
}

/// Applies `patch` to `original`, all or nothing.
///
/// Hunks are placed in order. Each one is looked for nearest-first around
/// its recorded offset shifted by the drift of the hunks before it, first
/// with its full context and then with up to `options.max_fuzz` context
/// lines dropped from either end. A hunk never matches before the end of
/// the previous one.
pub fn apply_with(
    patch: &PatchDocument,
    original: &str,
    options: FuzzOptions,
) -> Result<String, PatchFailure> {
    let lines = split_lines(original);
    let mut out = String::with_capacity(original.len());
    let mut cursor = 0usize;
    let mut drift = 0isize;

    for (index, hunk) in patch.hunks().iter().enumerate() {
        let placed = locate(hunk, &lines, cursor, drift, options)
            .ok_or_else(|| PatchFailure::new(index, describe_miss(hunk, options)))?;

        if placed.fuzz > 0 || placed.position as isize != hunk.source_start as isize + drift {
            log::debug!(
                "hunk #{index} applied at line {} (recorded {}, fuzz {})",
                placed.position + 1,
                hunk.source_start + 1,
                placed.fuzz
            );
        }

        out.extend(lines[cursor..placed.position].iter().copied());
        for line in placed.lines {
            if line.is_new() {
                out.push_str(line.text());
            }
        }
        let consumed = placed.lines.iter().filter(|l| l.is_old()).count();
        cursor = placed.position + consumed;
        drift = placed.position as isize - (hunk.source_start + placed.skipped) as isize;
    }

    out.extend(lines[cursor..].iter().copied());
    Ok(out)
}

struct Placement<'a> {
    position: usize,
    lines: &'a [HunkLine],
    skipped: usize,
    fuzz: usize,
}

fn locate<'a>(
    hunk: &'a Hunk,
    lines: &[&str],
    cursor: usize,
    drift: isize,
    options: FuzzOptions,
) -> Option<Placement<'a>> {
    let leading = hunk.leading_context();
    let trailing = hunk.trailing_context();
    let full_old = hunk.old_len();

    for fuzz in 0..=options.max_fuzz {
        let skip_front = fuzz.min(leading);
        let skip_back = fuzz.min(trailing);
        if fuzz > 0 && skip_front + skip_back == 0 {
            break;
        }
        let trimmed = &hunk.lines[skip_front..hunk.lines.len() - skip_back];
        let needle: Vec<&str> = trimmed.iter().filter(|l| l.is_old()).map(HunkLine::text).collect();
        // Never let fuzz reduce a hunk to an anchorless insertion.
        if needle.is_empty() && full_old > 0 {
            break;
        }

        let expected = hunk.source_start as isize + skip_front as isize + drift;
        if let Some(position) = search(&needle, lines, expected, cursor, options.search_window) {
            return Some(Placement {
                position,
                lines: trimmed,
                skipped: skip_front,
                fuzz,
            });
        }
    }
    None
}

/// Nearest-first scan of `[expected - window, expected + window]`.
fn search(needle: &[&str], lines: &[&str], expected: isize, floor: usize, window: usize) -> Option<usize> {
    let fits = |pos: isize| -> Option<usize> {
        if pos < floor as isize {
            return None;
        }
        let pos = pos as usize;
        let end = pos.checked_add(needle.len())?;
        (end <= lines.len() && lines[pos..end] == *needle).then_some(pos)
    };

    let window = window as isize;
    (0..=window).find_map(|offset| {
        fits(expected + offset).or_else(|| if offset > 0 { fits(expected - offset) } else { None })
    })
}

fn describe_miss(hunk: &Hunk, options: FuzzOptions) -> String {
    let first = hunk
        .old_lines()
        .next()
        .map(|l| l.trim_end().chars().take(60).collect::<String>())
        .unwrap_or_default();
    format!(
        "no match for {} line(s) starting `{first}` within {} line(s) of line {} (fuzz {})",
        hunk.old_len(),
        options.search_window,
        hunk.source_start + 1,
        options.max_fuzz
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::patch::diff;

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn exact_original_reproduces_modified() {
        let original = numbered(50);
        let modified = original
            .replace("line 3\n", "line three\n")
            .replace("line 40\n", "")
            .replace("line 44\n", "line 44\nextra\n");

        let patch = diff(&original, &modified);
        assert_eq!(apply(&patch, &original).unwrap(), modified);
    }

    #[test]
    fn round_trip_through_text_form() {
        let original = "alpha\nbeta\ngamma";
        let modified = "alpha\nBETA\ngamma\ndelta";
        let patch: PatchDocument = diff(original, modified).to_string().parse().unwrap();
        assert_eq!(apply(&patch, original).unwrap(), modified);
    }

    #[test]
    fn single_line_drift_still_applies() {
        let original = numbered(30);
        let modified = original.replace("line 15\n", "line fifteen\n");
        let patch = diff(&original, &modified);

        let drifted = format!("header\n{original}");
        let expected = format!("header\n{modified}");
        assert_eq!(apply(&patch, &drifted).unwrap(), expected);
    }

    #[test]
    fn changed_context_line_is_absorbed_by_fuzz() {
        let original = numbered(30);
        let modified = original.replace("line 15\n", "line fifteen\n");
        let patch = diff(&original, &modified);

        let drifted = original.replace("line 12\n", "line twelve\n");
        let result = apply(&patch, &drifted).unwrap();
        assert!(result.contains("line fifteen\n"));
        assert!(result.contains("line twelve\n"));
    }

    #[test]
    fn drift_beyond_window_names_first_failing_operation() {
        let original = numbered(30);
        let modified = original
            .replace("line 2\n", "line two\n")
            .replace("line 25\n", "line twenty-five\n");
        let patch = diff(&original, &modified);
        assert_eq!(patch.hunks().len(), 2);

        // Push the second hunk far away while keeping the first in place.
        let padding: String = (0..200).map(|i| format!("pad {i}\n")).collect();
        let drifted = original.replacen("line 10\n", &format!("line 10\n{padding}"), 1);
        let tight = FuzzOptions {
            search_window: 16,
            max_fuzz: 2,
        };

        let failure = apply_with(&patch, &drifted, tight).unwrap_err();
        assert_eq!(failure.operation_index, 1);
    }

    #[test]
    fn changed_deleted_line_is_never_fuzzed_over() {
        let original = numbered(10);
        let modified = original.replace("line 5\n", "");
        let patch = diff(&original, &modified);

        let drifted = original.replace("line 5\n", "line FIVE\n");
        let failure = apply(&patch, &drifted).unwrap_err();
        assert_eq!(failure.operation_index, 0);
    }
}
