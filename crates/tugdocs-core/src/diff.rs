//! Unified diff generation utilities.
//!
//! Produces standard unified diff text from the before/after contents of a
//! file. Used by dry runs to show what a rewrite would do.

use std::fmt::Write;

/// Lines of unchanged context around each hunk.
pub const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

/// One step of the edit script with the line it refers to.
#[derive(Debug, Clone, Copy)]
struct Step {
    op: Op,
    /// 0-indexed line in the old text before this step.
    old_pos: usize,
    /// 0-indexed line in the new text before this step.
    new_pos: usize,
}

/// Generate a unified diff between `old` and `new` for `path`.
///
/// Returns an empty string when the contents are identical.
pub fn generate_unified_diff(path: &str, old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }

    let a: Vec<&str> = old.split_inclusive('\n').collect();
    let b: Vec<&str> = new.split_inclusive('\n').collect();
    let steps = edit_script(&a, &b);

    let mut diff = String::new();
    let _ = writeln!(diff, "--- a/{}", path);
    let _ = writeln!(diff, "+++ b/{}", path);

    for (start, end) in hunk_ranges(&steps, CONTEXT_LINES) {
        let hunk = &steps[start..end];
        let old_len = hunk.iter().filter(|s| s.op != Op::Insert).count();
        let new_len = hunk.iter().filter(|s| s.op != Op::Delete).count();
        let old_start = if old_len == 0 {
            hunk[0].old_pos
        } else {
            hunk[0].old_pos + 1
        };
        let new_start = if new_len == 0 {
            hunk[0].new_pos
        } else {
            hunk[0].new_pos + 1
        };
        let _ = writeln!(
            diff,
            "@@ -{},{} +{},{} @@",
            old_start, old_len, new_start, new_len
        );
        for step in hunk {
            let (marker, line) = match step.op {
                Op::Equal => (' ', a[step.old_pos]),
                Op::Delete => ('-', a[step.old_pos]),
                Op::Insert => ('+', b[step.new_pos]),
            };
            diff.push(marker);
            diff.push_str(line.trim_end_matches(['\n', '\r']));
            diff.push('\n');
        }
    }

    diff
}

/// Group the steps into hunks of changes separated by more than `2 * context`
/// unchanged lines.
fn hunk_ranges(steps: &[Step], context: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < steps.len() {
        if steps[i].op == Op::Equal {
            i += 1;
            continue;
        }
        let start = i.saturating_sub(context);
        let mut last_change = i;
        let mut j = i;
        while j < steps.len() {
            if steps[j].op != Op::Equal {
                last_change = j;
            } else if j - last_change > 2 * context {
                break;
            }
            j += 1;
        }
        let end = (last_change + context + 1).min(steps.len());
        ranges.push((start, end));
        i = end;
    }
    ranges
}

/// Shortest edit script between two line sequences (Myers' O(ND) algorithm).
fn edit_script(a: &[&str], b: &[&str]) -> Vec<Step> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    let offset = max + 1;
    let mut v = vec![0isize; (2 * max + 3) as usize];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'outer: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                break 'outer;
            }
            k += 2;
        }
    }

    let mut ops = Vec::new();
    let (mut x, mut y) = (n, m);
    for d in (0..trace.len() as isize).rev() {
        let v = &trace[d as usize];
        let k = x - y;
        let prev_k = if k == -d
            || (k != d && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize])
        {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = prev_x - prev_k;
        while x > prev_x && y > prev_y {
            ops.push(Op::Equal);
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                ops.push(Op::Insert);
            } else {
                ops.push(Op::Delete);
            }
        }
        x = prev_x;
        y = prev_y;
    }
    ops.reverse();

    let mut steps = Vec::with_capacity(ops.len());
    let (mut old_pos, mut new_pos) = (0, 0);
    for op in ops {
        steps.push(Step {
            op,
            old_pos,
            new_pos,
        });
        match op {
            Op::Equal => {
                old_pos += 1;
                new_pos += 1;
            }
            Op::Delete => old_pos += 1,
            Op::Insert => new_pos += 1,
        }
    }
    steps
}

// ============================================================================
// Tests
// ============================================================================
