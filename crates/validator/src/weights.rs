//! Weight math: score normalization, chain encoding and version keys

use crate::{Result, ValidatorError};

/// Clamp negative (and non-finite) scores to zero, then L1-normalize.
///
/// A vector that sums to zero stays all zeros.
pub fn normalize_scores(scores: &[f32]) -> Vec<f32> {
    let clamped: Vec<f32> = scores
        .iter()
        .map(|s| if s.is_finite() && *s > 0.0 { *s } else { 0.0 })
        .collect();

    let norm: f32 = clamped.iter().sum();
    if norm <= 0.0 {
        return vec![0.0; clamped.len()];
    }

    clamped.iter().map(|s| s / norm).collect()
}

/// Convert normalized float weights into the chain's u16 form.
///
/// Weights are scaled so the largest becomes `u16::MAX`; entries that round
/// to zero are dropped together with their UID.
pub fn to_chain_weights(uids: &[u16], weights: &[f32]) -> (Vec<u16>, Vec<u16>) {
    let max = weights
        .iter()
        .copied()
        .filter(|w| w.is_finite())
        .fold(0.0f32, f32::max);

    if max <= 0.0 {
        return (Vec::new(), Vec::new());
    }

    uids.iter()
        .zip(weights)
        .filter_map(|(uid, w)| {
            if !w.is_finite() || *w <= 0.0 {
                return None;
            }
            let scaled = ((*w / max) * u16::MAX as f32).round() as u16;
            (scaled > 0).then_some((*uid, scaled))
        })
        .unzip()
}

/// Encode a `major.minor.patch` version as `100*major + 10*minor + patch`.
///
/// Pre-release and build suffixes (`-rc1`, `+abc`) are ignored.
pub fn version_key(version: &str) -> Result<u64> {
    let core = version
        .split(['-', '+'])
        .next()
        .unwrap_or_default()
        .trim();

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() != 3 {
        return Err(ValidatorError::Config(format!(
            "Version must be major.minor.patch, got '{}'",
            version
        )));
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| {
            ValidatorError::Config(format!("Invalid version component '{}' in '{}'", part, version))
        })?;
    }

    Ok(100 * numbers[0] + 10 * numbers[1] + numbers[2])
}
