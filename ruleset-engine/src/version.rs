//! Dotted version comparison used to stamp exported artifacts.

use std::cmp::Ordering;

/// Picks the highest dotted version among the candidates.
///
/// Blank and absent entries are ignored. Ties keep the first candidate seen.
pub fn highest<'a, I>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut candidates = versions
        .into_iter()
        .flatten()
        .filter(|version| !version.trim().is_empty());

    let mut best = candidates.next()?;
    for candidate in candidates {
        if compare(candidate, best) == Ordering::Greater {
            best = candidate;
        }
    }
    Some(best.to_string())
}

/// Compares two versions component-wise. Missing trailing components and
/// components that are not non-negative integers count as zero.
pub fn compare(left: &str, right: &str) -> Ordering {
    let left = components(left);
    let right = components(right);
    let width = left.len().max(right.len());

    (0..width)
        .map(|index| {
            let a = left.get(index).copied().unwrap_or(0);
            let b = right.get(index).copied().unwrap_or(0);
            a.cmp(&b)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn components(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}
