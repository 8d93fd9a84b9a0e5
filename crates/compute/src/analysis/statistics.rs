use formats::Edge;

pub struct Statistics;

impl Statistics {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        Some(sum / values.len() as f64)
    }

    pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
        let first = *values.first()?;
        let mut min = first;
        let mut max = first;
        for &v in values.iter().skip(1) {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    /// Weight extent of an edge list; the color domain of every
    /// weight-keyed scale.
    pub fn weight_extent(edges: &[Edge]) -> Option<(f64, f64)> {
        let weights: Vec<f64> = edges.iter().map(|e| e.weight).collect();
        Self::min_max(&weights)
    }
}

#[cfg(test)]
mod tests {
    use super::Statistics;
    use formats::Edge;

    #[test]
    fn mean_works() {
        let m = Statistics::mean(&[1.0, 2.0, 3.0]).unwrap();
        assert!((m - 2.0).abs() < 1e-9);
        assert!(Statistics::mean(&[]).is_none());
    }

    #[test]
    fn weight_extent_spans_the_list() {
        let edges = vec![
            Edge {
                source: 1,
                target: 2,
                weight: 0.4,
                interaction: 0,
            },
            Edge {
                source: 2,
                target: 3,
                weight: 0.1,
                interaction: 0,
            },
        ];
        assert_eq!(Statistics::weight_extent(&edges), Some((0.1, 0.4)));
        assert_eq!(Statistics::weight_extent(&[]), None);
    }
}
