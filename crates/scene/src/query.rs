use std::collections::{BTreeMap, BTreeSet};

use formats::Edge;
use foundation::ids::BinId;
use foundation::math::stable_total_cmp_f64;

/// Primary directional edge filter, shared verbatim by all four views.
///
/// Steps, in order:
/// 1. Retain edges whose **Source** is selected. Target-only matches are
///    excluded; the top-K dataset stores the strongest outgoing
///    interactions per source, so the direction carries meaning.
/// 2. If `interactions` is non-empty, retain member interaction codes only.
/// 3. Stable sort descending by weight; ties keep their original order.
/// 4. Keep the first `ceil(count * weight_percentile / 100)` edges.
///
/// Ordering contract: the result is in weight-descending order, which is
/// also the render order every view uses, keeping overdraw consistent.
pub fn filter_edges(
    edges: &[Edge],
    selected: &BTreeSet<BinId>,
    interactions: &BTreeSet<i32>,
    weight_percentile: u8,
) -> Vec<Edge> {
    let mut retained: Vec<Edge> = edges
        .iter()
        .filter(|e| selected.contains(&BinId(e.source)))
        .filter(|e| interactions.is_empty() || interactions.contains(&e.interaction))
        .cloned()
        .collect();

    retained.sort_by(|a, b| stable_total_cmp_f64(b.weight, a.weight));

    let keep = percentile_count(retained.len(), weight_percentile);
    retained.truncate(keep);
    retained
}

/// Number of edges a percentile keeps: `ceil(count * p / 100)`, minimum 0.
pub fn percentile_count(count: usize, weight_percentile: u8) -> usize {
    ((count as f64) * (weight_percentile.min(100) as f64) / 100.0).ceil() as usize
}

/// Symmetric neighborhood filter for unfiltered exploration.
///
/// Unlike `filter_edges` this considers both endpoints: every edge touching
/// a selected node is grouped under each endpoint it touches, each group
/// keeps its top `ceil(len * 0.05)` edges by weight (at least one), and the
/// union is de-duplicated.
///
/// Ordering contract: the result follows the original edge order, so a
/// caller re-sorting by weight gets the same stable ordering as
/// `filter_edges`.
pub fn neighborhood_edges(edges: &[Edge], selected: &BTreeSet<BinId>) -> Vec<Edge> {
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, edge) in edges.iter().enumerate() {
        let touches = selected.contains(&BinId(edge.source)) || selected.contains(&BinId(edge.target));
        if !touches {
            continue;
        }
        groups.entry(edge.source).or_default().push(idx);
        groups.entry(edge.target).or_default().push(idx);
    }

    let mut kept: BTreeSet<usize> = BTreeSet::new();
    for indices in groups.values() {
        let mut ranked = indices.clone();
        ranked.sort_by(|&a, &b| stable_total_cmp_f64(edges[b].weight, edges[a].weight));
        let top = ((ranked.len() as f64) * 0.05).ceil().max(1.0) as usize;
        kept.extend(ranked.into_iter().take(top));
    }

    kept.into_iter().map(|idx| edges[idx].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_edges, neighborhood_edges, percentile_count};
    use formats::Edge;
    use foundation::ids::BinId;
    use std::collections::BTreeSet;

    fn edge(source: u32, target: u32, weight: f64, interaction: i32) -> Edge {
        Edge {
            source,
            target,
            weight,
            interaction,
        }
    }

    fn ids(values: &[u32]) -> BTreeSet<BinId> {
        values.iter().copied().map(BinId).collect()
    }

    fn codes(values: &[i32]) -> BTreeSet<i32> {
        values.iter().copied().collect()
    }

    #[test]
    fn source_only_matches_are_directional() {
        let edges = vec![
            edge(1, 2, 0.5, 0),
            edge(2, 1, 0.9, 0), // target-only match for {1}; must be excluded
            edge(1, 3, 0.7, 0),
        ];
        let got = filter_edges(&edges, &ids(&[1]), &codes(&[]), 100);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|e| e.source == 1));
    }

    #[test]
    fn sorted_descending_with_stable_ties() {
        let edges = vec![
            edge(1, 2, 0.5, 0),
            edge(1, 3, 0.8, 0),
            edge(1, 4, 0.5, 0), // same weight as the first; must stay after it
        ];
        let got = filter_edges(&edges, &ids(&[1]), &codes(&[]), 100);
        let order: Vec<u32> = got.iter().map(|e| e.target).collect();
        assert_eq!(order, vec![3, 2, 4]);
    }

    #[test]
    fn interaction_filter_is_membership() {
        let edges = vec![edge(1, 2, 0.5, 0), edge(1, 3, 0.6, 1), edge(1, 4, 0.7, 2)];
        let got = filter_edges(&edges, &ids(&[1]), &codes(&[0, 2]), 100);
        let kept: Vec<i32> = got.iter().map(|e| e.interaction).collect();
        assert_eq!(kept, vec![2, 0]);
    }

    #[test]
    fn percentile_truncates_after_sorting() {
        let edges = vec![edge(1, 2, 0.2, 0), edge(1, 3, 0.8, 0)];
        let got = filter_edges(&edges, &ids(&[1]), &codes(&[]), 50);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].weight, 0.8);
    }

    #[test]
    fn lower_percentile_is_a_prefix_of_higher() {
        let edges: Vec<Edge> = (0..10)
            .map(|i| edge(1, i + 2, (i as f64) * 0.1, 0))
            .collect();
        let small = filter_edges(&edges, &ids(&[1]), &codes(&[]), 30);
        let large = filter_edges(&edges, &ids(&[1]), &codes(&[]), 80);
        assert!(small.len() <= large.len());
        assert_eq!(&large[..small.len()], &small[..]);
    }

    #[test]
    fn percentile_count_rounds_up() {
        assert_eq!(percentile_count(10, 100), 10);
        assert_eq!(percentile_count(10, 50), 5);
        assert_eq!(percentile_count(3, 50), 2); // ceil(1.5)
        assert_eq!(percentile_count(10, 0), 0);
        assert_eq!(percentile_count(0, 100), 0);
    }

    #[test]
    fn neighborhood_considers_both_endpoints() {
        let edges = vec![
            edge(2, 1, 0.9, 0), // touches {1} only via target
            edge(3, 4, 0.5, 0), // unrelated
        ];
        let got = neighborhood_edges(&edges, &ids(&[1]));
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].source, 2);
    }

    #[test]
    fn neighborhood_keeps_at_least_one_per_group_and_dedupes() {
        // Twenty edges out of node 1; top 5% of twenty is exactly one.
        let mut edges: Vec<Edge> = (0..20).map(|i| edge(1, i + 2, i as f64, 0)).collect();
        // The heaviest edge also touches node 21, so it appears in two
        // groups but must come back once.
        edges.push(edge(21, 1, 100.0, 0));

        let got = neighborhood_edges(&edges, &ids(&[1]));
        let heavy: Vec<&Edge> = got.iter().filter(|e| e.weight == 100.0).collect();
        assert_eq!(heavy.len(), 1);
        assert!(!got.is_empty());
    }
}
