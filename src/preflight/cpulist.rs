//! Kernel CPU-list parsing (`"1-3,5,7-8"` and friends).
//!
//! Grammar: `list := item ("," item)*`, `item := int | int "-" int`.
//! Malformed tokens are skipped silently, an inverted range is normalized,
//! empty input is the empty set.

use std::collections::BTreeSet;

pub fn parse_cpu_list(input: &str) -> BTreeSet<usize> {
    let mut cpus = BTreeSet::new();
    for token in input.trim().split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once('-') {
            None => {
                if let Ok(cpu) = token.parse::<usize>() {
                    cpus.insert(cpu);
                }
            }
            Some((start, end)) => {
                if let (Ok(start), Ok(end)) =
                    (start.trim().parse::<usize>(), end.trim().parse::<usize>())
                {
                    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
                    cpus.extend(lo..=hi);
                }
            }
        }
    }
    cpus
}
