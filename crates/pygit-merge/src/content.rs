//! Three-way content merge using diff hunks.
//!
//! Takes base, ours, and theirs versions of a file and produces a merged
//! result, inserting conflict markers where changes overlap.

use pygit_diff::algorithm::{diff_edits, split_lines, Edit, EditOp};

use crate::ContentMergeResult;

/// Perform a three-way content merge.
///
/// Diffs base→ours and base→theirs, then interleaves non-overlapping
/// changes and reports conflicts for overlapping regions. `theirs_label` is
/// typically the ref name being merged in, used in the `>>>>>>>` marker.
pub fn merge_content(base: &[u8], ours: &[u8], theirs: &[u8], theirs_label: &str) -> ContentMergeResult {
    if ours == theirs {
        return ContentMergeResult::Clean(ours.to_vec());
    }
    if base == ours {
        return ContentMergeResult::Clean(theirs.to_vec());
    }
    if base == theirs {
        return ContentMergeResult::Clean(ours.to_vec());
    }

    let base_lines = split_lines(base);
    let ours_lines = split_lines(ours);
    let theirs_lines = split_lines(theirs);

    let edits_ours = diff_edits(base, ours);
    let edits_theirs = diff_edits(base, theirs);

    let hunks_ours = collect_change_regions(&edits_ours);
    let hunks_theirs = collect_change_regions(&edits_theirs);

    merge_regions(
        &base_lines,
        &ours_lines,
        &theirs_lines,
        &hunks_ours,
        &hunks_theirs,
        theirs_label,
    )
}

/// A contiguous region of changes relative to the base.
#[derive(Debug, Clone)]
struct ChangeRegion {
    /// Start line in base (0-indexed).
    base_start: usize,
    /// Number of lines removed from base.
    base_len: usize,
    /// Start line in the modified file (0-indexed).
    new_start: usize,
    /// Number of lines added.
    new_len: usize,
}

/// Collect contiguous change regions from a sequence of edit operations.
fn collect_change_regions(edits: &[Edit]) -> Vec<ChangeRegion> {
    let mut regions = Vec::new();
    let mut i = 0;

    while i < edits.len() {
        if edits[i].op == EditOp::Equal {
            i += 1;
            continue;
        }

        let base_start = edits[i].old_index;
        let new_start = edits[i].new_index;
        let mut base_end = base_start;
        let mut new_end = new_start;

        while i < edits.len() && edits[i].op != EditOp::Equal {
            match edits[i].op {
                EditOp::Delete => base_end = edits[i].old_index + 1,
                EditOp::Insert => new_end = edits[i].new_index + 1,
                EditOp::Equal => unreachable!(),
            }
            i += 1;
        }

        regions.push(ChangeRegion {
            base_start,
            base_len: base_end - base_start,
            new_start,
            new_len: new_end - new_start,
        });
    }

    regions
}

/// Merge change regions from ours and theirs against the base.
fn merge_regions(
    base_lines: &[&[u8]],
    ours_lines: &[&[u8]],
    theirs_lines: &[&[u8]],
    hunks_ours: &[ChangeRegion],
    hunks_theirs: &[ChangeRegion],
    theirs_label: &str,
) -> ContentMergeResult {
    let mut output: Vec<u8> = Vec::new();
    let mut conflict_count = 0;

    let mut base_pos = 0;
    let mut oi = 0;
    let mut ti = 0;

    while oi < hunks_ours.len() || ti < hunks_theirs.len() {
        let o_region = hunks_ours.get(oi);
        let t_region = hunks_theirs.get(ti);

        match (o_region, t_region) {
            (Some(o), Some(t)) => {
                let o_end = o.base_start + o.base_len;
                let t_end = t.base_start + t.base_len;

                if o_end < t.base_start || (o_end == t.base_start && o.base_start < t.base_start) {
                    emit_base_lines(&mut output, base_lines, base_pos, o.base_start);
                    emit_lines(&mut output, ours_lines, o.new_start, o.new_len);
                    base_pos = o_end;
                    oi += 1;
                } else if t_end < o.base_start || (t_end == o.base_start && t.base_start < o.base_start) {
                    emit_base_lines(&mut output, base_lines, base_pos, t.base_start);
                    emit_lines(&mut output, theirs_lines, t.new_start, t.new_len);
                    base_pos = t_end;
                    ti += 1;
                } else {
                    let ours_content = collect_lines(ours_lines, o.new_start, o.new_len);
                    let theirs_content = collect_lines(theirs_lines, t.new_start, t.new_len);

                    let overlap_base_start = o.base_start.min(t.base_start);
                    let overlap_base_end = o_end.max(t_end);

                    emit_base_lines(&mut output, base_lines, base_pos, overlap_base_start);

                    if ours_content == theirs_content {
                        output.extend_from_slice(&ours_content);
                    } else {
                        conflict_count += 1;
                        emit_conflict(&mut output, &ours_content, &theirs_content, theirs_label);
                    }

                    base_pos = overlap_base_end;
                    oi += 1;
                    ti += 1;
                }
            }
            (Some(o), None) => {
                let o_end = o.base_start + o.base_len;
                emit_base_lines(&mut output, base_lines, base_pos, o.base_start);
                emit_lines(&mut output, ours_lines, o.new_start, o.new_len);
                base_pos = o_end;
                oi += 1;
            }
            (None, Some(t)) => {
                let t_end = t.base_start + t.base_len;
                emit_base_lines(&mut output, base_lines, base_pos, t.base_start);
                emit_lines(&mut output, theirs_lines, t.new_start, t.new_len);
                base_pos = t_end;
                ti += 1;
            }
            (None, None) => unreachable!(),
        }
    }

    emit_base_lines(&mut output, base_lines, base_pos, base_lines.len());

    if conflict_count > 0 {
        ContentMergeResult::Conflict {
            content: output,
            conflict_count,
        }
    } else {
        ContentMergeResult::Clean(output)
    }
}

fn emit_base_lines(output: &mut Vec<u8>, base_lines: &[&[u8]], from: usize, to: usize) {
    for i in from..to {
        if i < base_lines.len() {
            output.extend_from_slice(base_lines[i]);
        }
    }
}

fn emit_lines(output: &mut Vec<u8>, lines: &[&[u8]], start: usize, count: usize) {
    for i in start..start + count {
        if i < lines.len() {
            output.extend_from_slice(lines[i]);
        }
    }
}

fn collect_lines(lines: &[&[u8]], start: usize, count: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    for i in start..start + count {
        if i < lines.len() {
            buf.extend_from_slice(lines[i]);
        }
    }
    buf
}

/// Emit `<<<<<<< HEAD` / `=======` / `>>>>>>> <theirs_label>` conflict markers.
fn emit_conflict(output: &mut Vec<u8>, ours_content: &[u8], theirs_content: &[u8], theirs_label: &str) {
    output.extend_from_slice(b"<<<<<<< HEAD\n");
    output.extend_from_slice(ours_content);
    output.extend_from_slice(b"=======\n");
    output.extend_from_slice(theirs_content);
    output.extend_from_slice(b">>>>>>> ");
    output.extend_from_slice(theirs_label.as_bytes());
    output.push(b'\n');
}
