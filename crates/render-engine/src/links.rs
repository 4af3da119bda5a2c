//! Nearest-neighbour links between blob centres.

use std::collections::BTreeSet;

/// Edges joining each centre to up to `max_links` of its nearest other
/// centres within `max_distance` (0 = unbounded). Each unordered pair
/// appears once, as `(lower, higher)` index, in ascending order.
pub fn link_pairs(centers: &[(f32, f32)], max_links: u32, max_distance: u32) -> Vec<(usize, usize)> {
    if max_links == 0 {
        return Vec::new();
    }
    let mut edges = BTreeSet::new();
    for (i, &(x, y)) in centers.iter().enumerate() {
        let mut near: Vec<(f32, usize)> = centers
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(j, &(ox, oy))| ((ox - x).hypot(oy - y), j))
            .filter(|(d, _)| max_distance == 0 || *d <= max_distance as f32)
            .collect();
        near.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for (_, j) in near.into_iter().take(max_links as usize) {
            edges.insert((i.min(j), i.max(j)));
        }
    }
    edges.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pairs_are_deduplicated() {
        let centers = [(0.0, 0.0), (10.0, 0.0)];
        assert_eq!(link_pairs(&centers, 2, 0), vec![(0, 1)]);
    }

    #[test]
    fn test_nearest_first_with_limit() {
        let centers = [(0.0, 0.0), (5.0, 0.0), (100.0, 0.0), (103.0, 0.0)];
        assert_eq!(link_pairs(&centers, 1, 0), vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn test_distance_limit() {
        let centers = [(0.0, 0.0), (50.0, 0.0), (300.0, 0.0)];
        assert_eq!(link_pairs(&centers, 2, 200), vec![(0, 1)]);
        assert_eq!(link_pairs(&centers, 2, 0), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(link_pairs(&[], 2, 0).is_empty());
        assert!(link_pairs(&[(1.0, 1.0)], 2, 0).is_empty());
        assert!(link_pairs(&[(0.0, 0.0), (1.0, 1.0)], 0, 0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_links_are_unique_ordered_and_bounded(
            centers in prop::collection::vec((0.0f32..640.0, 0.0f32..480.0), 0..24),
            max_links in 0u32..5,
            max_distance in prop_oneof![Just(0u32), 1u32..400],
        ) {
            let edges = link_pairs(&centers, max_links, max_distance);

            prop_assert!(edges.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(edges.len() <= centers.len() * max_links as usize);
            for &(a, b) in &edges {
                prop_assert!(a < b && b < centers.len());
                if max_distance > 0 {
                    let (ax, ay) = centers[a];
                    let (bx, by) = centers[b];
                    prop_assert!((bx - ax).hypot(by - ay) <= max_distance as f32);
                }
            }
        }

        #[test]
        fn prop_every_centre_links_its_nearest(
            centers in prop::collection::vec((0.0f32..640.0, 0.0f32..480.0), 2..16),
        ) {
            let edges = link_pairs(&centers, 1, 0);
            for i in 0..centers.len() {
                prop_assert!(edges.iter().any(|&(a, b)| a == i || b == i));
            }
        }
    }
}
