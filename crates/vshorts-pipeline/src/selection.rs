//! Overlap-free top-K selection of finalized highlights.

use serde::{Deserialize, Serialize};
use vshorts_models::Highlight;

/// How the final set is picked from the weighted candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Walk candidates best-first, keep each one that overlaps nothing kept so far.
    #[default]
    Greedy,
    /// Maximize the summed weight of at most K pairwise-disjoint candidates.
    MaxTotalWeight,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStrategy::Greedy => "greedy",
            SelectionStrategy::MaxTotalWeight => "max_total_weight",
        }
    }

    /// Select at most `max` pairwise non-overlapping highlights, best first.
    pub fn select(&self, candidates: &[Highlight], max: usize) -> Vec<Highlight> {
        match self {
            SelectionStrategy::Greedy => select_greedy(candidates, max),
            SelectionStrategy::MaxTotalWeight => select_max_total_weight(candidates, max),
        }
    }
}

impl std::str::FromStr for SelectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greedy" => Ok(SelectionStrategy::Greedy),
            "max_total_weight" | "max-total-weight" | "dp" => Ok(SelectionStrategy::MaxTotalWeight),
            other => Err(format!("unknown selection strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable sort by descending weight; equal weights keep their input order.
pub fn sort_by_weight(highlights: &mut [Highlight]) {
    highlights.sort_by(|a, b| b.weight.total_cmp(&a.weight));
}

/// Greedy selection over `candidates` taken in descending-weight order.
pub fn select_greedy(candidates: &[Highlight], max: usize) -> Vec<Highlight> {
    let mut ordered = candidates.to_vec();
    sort_by_weight(&mut ordered);

    let mut selected: Vec<Highlight> = Vec::with_capacity(max.min(ordered.len()));
    for candidate in ordered {
        if selected.len() >= max {
            break;
        }
        if selected.iter().all(|kept| !kept.overlaps(&candidate)) {
            selected.push(candidate);
        }
    }
    selected
}

/// Weighted interval scheduling with a cardinality cap.
///
/// `best[j][k]` is the best total weight using the first `j` candidates
/// (ordered by end time) and at most `k` of them. The chosen set is returned
/// in descending-weight order like the greedy result.
pub fn select_max_total_weight(candidates: &[Highlight], max: usize) -> Vec<Highlight> {
    if candidates.is_empty() || max == 0 {
        return Vec::new();
    }

    let mut by_end: Vec<&Highlight> = candidates.iter().collect();
    by_end.sort_by(|a, b| a.end.total_cmp(&b.end).then(a.start.total_cmp(&b.start)));
    let n = by_end.len();

    // Number of candidates (in end order) that finish at or before candidate j starts.
    let compatible: Vec<usize> = by_end
        .iter()
        .map(|h| by_end.partition_point(|other| other.end <= h.start))
        .collect();

    let mut best = vec![vec![0.0_f64; max + 1]; n + 1];
    for j in 1..=n {
        let weight = by_end[j - 1].weight;
        let p = compatible[j - 1];
        for k in 1..=max {
            let skip = best[j - 1][k];
            let take = weight + best[p][k - 1];
            best[j][k] = if take > skip { take } else { skip };
        }
    }

    let mut chosen = Vec::new();
    let (mut j, mut k) = (n, max);
    while j > 0 && k > 0 {
        if best[j][k] == best[j - 1][k] {
            j -= 1;
        } else {
            chosen.push(by_end[j - 1].clone());
            j = compatible[j - 1];
            k -= 1;
        }
    }

    chosen.sort_by(|a, b| b.weight.total_cmp(&a.weight).then(a.start.total_cmp(&b.start)));
    chosen
}

/// Pairwise non-overlap check over a selection.
pub fn is_overlap_free(highlights: &[Highlight]) -> bool {
    highlights.iter().enumerate().all(|(i, a)| {
        highlights[i + 1..].iter().all(|b| !a.overlaps(b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(start: f64, end: f64, weight: f64) -> Highlight {
        Highlight {
            start,
            end,
            duration: end - start,
            average_score: weight,
            average_emotional_score: weight,
            average_viral_score: weight,
            average_motion: weight,
            average_audio: weight,
            title: format!("{}-{}", start, end),
            description: String::new(),
            weight,
            segment_times: vec![start + 5.0],
        }
    }

    #[test]
    fn test_greedy_drops_overlapping_lower_weight() {
        let candidates = vec![highlight(20.0, 70.0, 8.5), highlight(0.0, 50.0, 9.0)];
        let selected = select_greedy(&candidates, 5);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].weight, 9.0);
        assert_eq!(selected[0].start, 0.0);
    }

    #[test]
    fn test_greedy_caps_count_and_orders_by_weight() {
        let candidates: Vec<Highlight> = (0..8)
            .map(|i| highlight(i as f64 * 100.0, i as f64 * 100.0 + 30.0, 7.0 + i as f64 * 0.1))
            .collect();
        let selected = select_greedy(&candidates, 5);
        assert_eq!(selected.len(), 5);
        assert!(selected.windows(2).all(|w| w[0].weight >= w[1].weight));
        assert!((selected[0].weight - 7.7).abs() < 1e-9);
    }

    #[test]
    fn test_touching_highlights_both_selected() {
        let candidates = vec![highlight(0.0, 30.0, 8.0), highlight(30.0, 60.0, 7.5)];
        assert_eq!(select_greedy(&candidates, 5).len(), 2);
        assert_eq!(select_max_total_weight(&candidates, 5).len(), 2);
    }

    #[test]
    fn test_equal_weights_keep_input_order() {
        let candidates = vec![highlight(100.0, 130.0, 8.0), highlight(0.0, 30.0, 8.0)];
        let selected = select_greedy(&candidates, 5);
        assert_eq!(selected[0].start, 100.0);
        assert_eq!(selected[1].start, 0.0);
    }

    #[test]
    fn test_max_total_weight_beats_greedy_when_it_can() {
        // Greedy keeps the single 9.0 span; two disjoint 8.0 spans sum higher.
        let candidates = vec![
            highlight(10.0, 60.0, 9.0),
            highlight(0.0, 30.0, 8.0),
            highlight(40.0, 70.0, 8.0),
        ];

        let greedy = select_greedy(&candidates, 5);
        assert_eq!(greedy.len(), 1);

        let optimal = select_max_total_weight(&candidates, 5);
        assert_eq!(optimal.len(), 2);
        assert!(is_overlap_free(&optimal));
        let starts: Vec<f64> = optimal.iter().map(|h| h.start).collect();
        assert_eq!(starts, vec![0.0, 40.0]);
    }

    #[test]
    fn test_max_total_weight_respects_cap() {
        let candidates: Vec<Highlight> = (0..6)
            .map(|i| highlight(i as f64 * 40.0, i as f64 * 40.0 + 20.0, 7.0 + i as f64))
            .collect();
        let selected = select_max_total_weight(&candidates, 3);
        assert_eq!(selected.len(), 3);
        let weights: Vec<f64> = selected.iter().map(|h| h.weight).collect();
        assert_eq!(weights, vec![12.0, 11.0, 10.0]);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("greedy".parse::<SelectionStrategy>().unwrap(), SelectionStrategy::Greedy);
        assert_eq!(
            "max-total-weight".parse::<SelectionStrategy>().unwrap(),
            SelectionStrategy::MaxTotalWeight
        );
        assert!("best".parse::<SelectionStrategy>().is_err());
    }
}
