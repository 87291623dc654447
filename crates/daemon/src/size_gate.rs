#[derive(Debug, Clone, PartialEq)]
pub enum SizeGateResult {
    Pass {
        savings_bytes: u64,
        compression_ratio: f64,
    },
    Fail {
        new_bytes: u64,
        threshold_bytes: u64,
    },
}

/// `new > orig * max_ratio` fails; equal to the threshold passes (the gate is "<=").
pub fn check_size_gate(original_bytes: u64, new_bytes: u64, max_ratio: f64) -> SizeGateResult {
    let threshold = (original_bytes as f64 * max_ratio) as u64;
    if new_bytes > threshold {
        SizeGateResult::Fail {
            new_bytes,
            threshold_bytes: threshold,
        }
    } else {
        let savings = original_bytes.saturating_sub(new_bytes);
        let ratio = new_bytes as f64 / original_bytes as f64;
        SizeGateResult::Pass {
            savings_bytes: savings,
            compression_ratio: ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_below_threshold_passes() {
        let result = check_size_gate(4_000_000_000, 1_800_000_000, 0.90);
        assert!(matches!(result, SizeGateResult::Pass { .. }));
    }

    #[test]
    fn output_exactly_at_threshold_passes() {
        let original = 1_000_000_000u64;
        let ratio = 0.90;
        let threshold = (original as f64 * ratio) as u64;
        let result = check_size_gate(original, threshold, ratio);
        assert!(matches!(result, SizeGateResult::Pass { .. }));
    }

    #[test]
    fn output_above_threshold_fails() {
        let result = check_size_gate(3_000_000_000, 2_900_000_000, 0.90);
        assert!(matches!(result, SizeGateResult::Fail { .. }));
    }

    #[test]
    fn savings_and_ratio_are_computed_on_pass() {
        match check_size_gate(1_000_000_000, 400_000_000, 0.90) {
            SizeGateResult::Pass {
                savings_bytes,
                compression_ratio,
            } => {
                assert_eq!(savings_bytes, 600_000_000);
                assert!((compression_ratio - 0.4).abs() < 1e-9);
            }
            other => panic!("expected Pass, got {other:?}"),
        }
    }
}
