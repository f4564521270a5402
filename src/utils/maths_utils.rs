use argminmax::ArgMinMax;

/// Largest value in a non-empty slice.
pub fn get_max(vec: &[f64]) -> f64 {
    let max_index: usize = vec.argmax();
    vec[max_index]
}

/// Smallest value in a non-empty slice.
pub fn get_min(vec: &[f64]) -> f64 {
    let min_index: usize = vec.argmin();
    vec[min_index]
}

/// (min, max) of a non-empty slice.
pub fn get_min_max(vec: &[f64]) -> (f64, f64) {
    (get_min(vec), get_max(vec))
}

/// Multiply every element by `factor` into a new vector.
#[inline]
pub fn scale(vec: &[f64], factor: f64) -> Vec<f64> {
    vec.iter().map(|&x| x * factor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max() {
        let values = [3.0, -1.5, 7.25, 0.0];
        assert_eq!(get_min_max(&values), (-1.5, 7.25));
    }

    #[test]
    fn test_scale() {
        assert_eq!(scale(&[1.0, 2.0, 4.0], 0.5), vec![0.5, 1.0, 2.0]);
    }
}
