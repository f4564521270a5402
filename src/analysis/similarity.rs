/// Local-shape distance between a corpus window and the normalized query.
///
/// The window is divided by its own last value before comparison, so two windows with
/// the same relative shape score identically regardless of price level. The result is
/// the Euclidean norm of the difference to `query`.
///
/// A window that cannot be normalized (empty, last value zero or not finite) scores
/// `f64::INFINITY`, which always trips the divergence stop.
pub fn score(window: &[f64], query: &[f64]) -> f64 {
    debug_assert_eq!(window.len(), query.len());

    let Some(&last) = window.last() else {
        return f64::INFINITY;
    };
    if last == 0.0 || !last.is_finite() {
        return f64::INFINITY;
    }

    let distance = window
        .iter()
        .zip(query)
        .map(|(w, q)| {
            let d = w / last - q;
            d * d
        })
        .sum::<f64>()
        .sqrt();

    if distance.is_nan() {
        f64::INFINITY
    } else {
        distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY: [f64; 3] = [0.98, 0.99, 1.0];

    #[test]
    fn test_identical_shape_scores_zero() {
        assert!(score(&[49.0, 49.5, 50.0], &QUERY) < 1e-12);
    }

    #[test]
    fn test_scale_invariance() {
        let window = [10.3, 10.4, 10.2];
        let base = score(&window, &QUERY);

        for factor in [0.001, 0.5, 3.0, 1_000.0, 123_456.789] {
            let scaled: Vec<f64> = window.iter().map(|v| v * factor).collect();
            assert!(
                (score(&scaled, &QUERY) - base).abs() < 1e-12,
                "score changed under scaling by {factor}"
            );
        }
    }

    #[test]
    fn test_known_distance() {
        // [10.3, 10.4, 10.2] normalizes to [1.0098, 1.0196, 1.0]
        let d = score(&[10.3, 10.4, 10.2], &QUERY);
        assert!((d - 0.042010690497886).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_windows() {
        assert_eq!(score(&[1.0, 2.0, 0.0], &QUERY), f64::INFINITY);
        assert_eq!(score(&[1.0, 2.0, f64::NAN], &QUERY), f64::INFINITY);
        assert_eq!(score(&[f64::NAN, 2.0, 1.0], &QUERY), f64::INFINITY);
        assert_eq!(score(&[], &[]), f64::INFINITY);
    }
}
