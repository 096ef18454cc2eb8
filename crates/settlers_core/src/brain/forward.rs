use super::*;
use crate::error::{CoreError, CoreResult};
use settlers_data::Action;

/// Widest hidden layer; sizes the stack scratch buffers.
const MAX_WIDTH: usize = 64;

/// Raw output scores for one feature vector.
///
/// Hidden layers use ReLU, the output layer is linear.
pub fn scores(weights: &[f32], features: &FeatureVector) -> CoreResult<[f32; NETWORK_OUTPUTS]> {
    if weights.len() != PARAMETER_COUNT {
        return Err(CoreError::MalformedGenome {
            expected: PARAMETER_COUNT,
            actual: weights.len(),
        });
    }

    let mut current = [0.0f32; MAX_WIDTH];
    let mut next = [0.0f32; MAX_WIDTH];
    current[..NETWORK_INPUTS].copy_from_slice(features);

    let spans = topology::layer_spans();
    for (layer, span) in spans.iter().enumerate() {
        let is_output = layer + 1 == spans.len();
        for (o, value) in next.iter_mut().enumerate().take(span.outputs) {
            let row = &weights[span.weight_offset + o * span.inputs..][..span.inputs];
            let mut sum = weights[span.bias_offset + o];
            for (w, x) in row.iter().zip(&current[..span.inputs]) {
                sum += w * x;
            }
            *value = if is_output { sum } else { sum.max(0.0) };
        }
        std::mem::swap(&mut current, &mut next);
    }

    let mut out = [0.0f32; NETWORK_OUTPUTS];
    out.copy_from_slice(&current[..NETWORK_OUTPUTS]);
    Ok(out)
}

/// Index of the highest score. Ties and NaN resolve to the lowest index.
#[must_use]
pub fn argmax(values: &[f32; NETWORK_OUTPUTS]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] || (values[best].is_nan() && !v.is_nan()) {
            best = i;
        }
    }
    best
}

/// Deterministic action choice for `(weights, features)`.
pub fn evaluate(weights: &[f32], features: &FeatureVector) -> CoreResult<Action> {
    let out = scores(weights, features)?;
    Ok(Action::from_index(argmax(&out)).unwrap_or(FALLBACK_ACTION))
}

/// Like [`evaluate`], but a malformed genome yields [`FALLBACK_ACTION`].
#[must_use]
pub fn evaluate_or_fallback(weights: &[f32], features: &FeatureVector) -> (Action, Option<CoreError>) {
    match evaluate(weights, features) {
        Ok(action) => (action, None),
        Err(e) => (FALLBACK_ACTION, Some(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_prefers_lowest_index_on_tie() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 0.0, 3.0, -1.0]), 1);
        assert_eq!(argmax(&[0.0; NETWORK_OUTPUTS]), 0);
        assert_eq!(argmax(&[f32::NAN, 0.5, 0.0, 0.0, 0.0, 0.0]), 1);
    }

    #[test]
    fn test_output_bias_drives_choice() {
        let mut weights = vec![0.0; PARAMETER_COUNT];
        let last = topology::layer_spans()[LAYER_COUNT - 1];
        weights[last.bias_offset + Action::Rest.index()] = 1.0;
        let action = evaluate(&weights, &[0.0; NETWORK_INPUTS]).expect("well formed");
        assert_eq!(action, Action::Rest);
    }

    #[test]
    fn test_relu_blocks_negative_hidden_activations() {
        // Only the first hidden unit sees input, through a negative weight.
        let mut weights = vec![0.0; PARAMETER_COUNT];
        let spans = topology::layer_spans();
        weights[spans[0].weight_offset] = -1.0;
        let out = scores(&weights, &[1.0; NETWORK_INPUTS]).expect("well formed");
        assert_eq!(out, [0.0; NETWORK_OUTPUTS]);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let weights = vec![0.0; PARAMETER_COUNT + 1];
        assert_eq!(
            evaluate(&weights, &[0.0; NETWORK_INPUTS]),
            Err(CoreError::MalformedGenome {
                expected: PARAMETER_COUNT,
                actual: PARAMETER_COUNT + 1,
            })
        );
        let (action, err) = evaluate_or_fallback(&weights, &[0.0; NETWORK_INPUTS]);
        assert_eq!(action, Action::Wander);
        assert!(err.is_some());
    }
}
