//! Approximate substring search under Levenshtein distance.
//!
//! Column-wise dynamic programming over the text (Sellers' variant of the
//! edit-distance table): the pattern may start anywhere, and every cell
//! remembers where its alignment started so the match range can be
//! reported without a second backwards pass. O(n*m) time, O(m) space.

/// A near match of a pattern inside a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearMatch {
    /// Start byte offset of the matched text
    pub start: usize,
    /// End byte offset (exclusive) of the matched text
    pub end: usize,
    /// Edit distance between the pattern and the matched text
    pub distance: usize,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    cost: usize,
    start: usize,
}

/// Find the leftmost near match of `pattern` in `text[from..]`.
///
/// The first end position whose distance is within `max_distance` opens
/// a lookahead window of `2 * max_distance` characters; the lowest-distance
/// end inside that window wins (earliest on ties). A match first accepted
/// by dropping trailing pattern characters is thereby extended to its full
/// length, so "discussi ons" is reported whole.
///
/// Returns `None` for an empty pattern, or when `max_distance` would let
/// the pattern match the empty string.
pub fn find_near_match(
    text: &str,
    pattern: &str,
    from: usize,
    max_distance: usize,
) -> Option<NearMatch> {
    let pattern: Vec<char> = pattern.chars().collect();
    let m = pattern.len();
    if m == 0 || m <= max_distance || from > text.len() || !text.is_char_boundary(from) {
        return None;
    }

    let mut prev: Vec<Cell> = (0..=m).map(|i| Cell { cost: i, start: from }).collect();
    let mut cur = prev.clone();
    let mut best: Option<NearMatch> = None;
    // Columns still examined after the first acceptable end
    let mut lookahead = 2 * max_distance;

    for (idx, c) in text[from..].char_indices() {
        let next = from + idx + c.len_utf8();

        cur[0] = Cell { cost: 0, start: next };
        for i in 1..=m {
            let substitution = if pattern[i - 1] == c { 0 } else { 1 };
            let diag = Cell {
                cost: prev[i - 1].cost + substitution,
                start: prev[i - 1].start,
            };
            let left = Cell {
                cost: prev[i].cost + 1,
                start: prev[i].start,
            };
            let up = Cell {
                cost: cur[i - 1].cost + 1,
                start: cur[i - 1].start,
            };

            let mut cell = diag;
            if left.cost < cell.cost {
                cell = left;
            }
            if up.cost < cell.cost {
                cell = up;
            }
            cur[i] = cell;
        }

        let last = cur[m];
        if last.start < next {
            match best {
                None if last.cost <= max_distance => {
                    best = Some(NearMatch {
                        start: last.start,
                        end: next,
                        distance: last.cost,
                    });
                }
                Some(found) if last.cost < found.distance => {
                    best = Some(NearMatch {
                        start: last.start,
                        end: next,
                        distance: last.cost,
                    });
                }
                _ => {}
            }
        }

        if best.is_some() {
            if lookahead == 0 {
                break;
            }
            lookahead -= 1;
        }

        std::mem::swap(&mut prev, &mut cur);
    }

    best
}
