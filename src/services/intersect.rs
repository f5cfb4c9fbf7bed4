use crate::services::time::TimeInterval;

/// Strict overlap test: intervals that merely touch at an endpoint do not
/// overlap.
pub fn overlaps(a: &TimeInterval, b: &TimeInterval) -> bool {
    a.start < b.end && b.start < a.end
}

/// Literal pairwise intersection of two interval lists: every overlapping
/// (a, b) pair emits `(max(starts), min(ends))`.
///
/// Neither input needs to be sorted or internally disjoint. This is not a
/// union/merge: if one list overlaps with itself, the same physical span is
/// emitted once per contributing pair, and the duplicates are kept.
pub fn intersect(left: &[TimeInterval], right: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut out = Vec::new();
    for a in left {
        for b in right {
            if overlaps(a, b) {
                out.push(TimeInterval::new(
                    a.start.clone().max(b.start.clone()),
                    a.end.clone().min(b.end.clone()),
                ));
            }
        }
    }
    out
}

/// Fold the pairwise intersection left-to-right across all users' lists.
/// An empty intermediate result short-circuits the rest.
pub fn intersect_all(lists: &[Vec<TimeInterval>]) -> Vec<TimeInterval> {
    let mut iter = lists.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut common = first.clone();
    for list in iter {
        if common.is_empty() {
            break;
        }
        common = intersect(&common, list);
    }
    common
}
