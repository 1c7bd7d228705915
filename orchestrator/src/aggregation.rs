use rayon::prelude::*;

use crate::error::{OrchestratorError, Result};

/// Reduces a cycle's gradients into their element-wise arithmetic mean.
///
/// # Arguments
/// * `gradients` - The gradients collected over a cycle, all of the same length.
///
/// # Errors
/// `EmptyReduction` if `gradients` is empty, the cycle driver never lets that happen.
/// `GradientShape` if the gradients don't share the same length.
pub fn aggregate(gradients: &[Vec<f32>]) -> Result<Vec<f32>> {
    let Some(first) = gradients.first() else {
        return Err(OrchestratorError::EmptyReduction);
    };

    let len = first.len();
    if let Some(odd) = gradients.iter().find(|grad| grad.len() != len) {
        return Err(OrchestratorError::GradientShape {
            expected: len,
            got: odd.len(),
        });
    }

    let n = gradients.len() as f32;
    let mut mean = vec![0.0; len];

    mean.par_iter_mut().enumerate().for_each(|(i, m)| {
        *m = gradients.iter().map(|grad| grad[i]).sum::<f32>() / n;
    });

    Ok(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_wise_mean() {
        let gradients = vec![vec![1.0, 2.0, 3.0], vec![3.0, 4.0, 5.0], vec![2.0, 0.0, 1.0]];
        assert_eq!(aggregate(&gradients).unwrap(), [2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_single_gradient_is_returned_as_is() {
        let gradients = vec![vec![0.5, -1.5]];
        assert_eq!(aggregate(&gradients).unwrap(), [0.5, -1.5]);
    }

    #[test]
    fn test_keeps_the_gradient_length() {
        const LEN: usize = 1_000;

        let gradients: Vec<_> = (0..4).map(|k| vec![k as f32; LEN]).collect();
        let mean = aggregate(&gradients).unwrap();
        assert_eq!(mean.len(), LEN);
        assert!(mean.iter().all(|&m| m == 1.5));
    }

    #[test]
    fn test_empty_reduction_is_an_invariant_violation() {
        assert!(matches!(
            aggregate(&[]),
            Err(OrchestratorError::EmptyReduction)
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let gradients = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            aggregate(&gradients),
            Err(OrchestratorError::GradientShape {
                expected: 2,
                got: 1
            })
        ));
    }
}
