//! Vector math shared by every provider tier: L2 normalization and MRL
//! (Matryoshka) truncation (§4.2 "MRL truncation").

/// Truncate to the first `dims` components and re-normalize. If the vector
/// is already shorter than or equal to `dims`, it is only normalized.
pub fn mrl_truncate(vector: &[f32], dims: usize) -> Vec<f32> {
    let mut truncated: Vec<f32> = vector.iter().take(dims).copied().collect();
    l2_normalize(&mut truncated);
    truncated
}

pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mrl_truncate_shrinks_and_renormalizes() {
        let v = vec![3.0, 4.0, 0.0, 0.0];
        let truncated = mrl_truncate(&v, 2);
        assert_eq!(truncated.len(), 2);
        let norm: f32 = truncated.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn l2_normalize_handles_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
