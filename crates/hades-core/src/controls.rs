//! Live control blocks shared between engines and the parameter surface.
//!
//! Engines create these at build time and keep reading them every frame; the
//! renderer publishes the same `Arc`s so UI threads can write hot parameters
//! without touching the engines themselves.

use crate::lockfree::{atomic_table, AtomicFloat};

/// Analysis-side hot parameters.
#[derive(Debug)]
pub struct AnalysisControls {
    pub covariance_averaging: AtomicFloat,
}

impl AnalysisControls {
    pub fn new(covariance_averaging: f32) -> Self {
        Self {
            covariance_averaging: AtomicFloat::new(covariance_averaging.clamp(0.0, 1.0)),
        }
    }
}

pub const DEFAULT_STREAM_BALANCE: f32 = 1.0;
pub const MAX_STREAM_BALANCE: f32 = 2.0;

/// Synthesis-side hot parameters, sized by band count.
#[derive(Debug)]
pub struct SynthesisControls {
    pub averaging: AtomicFloat,
    /// Per-band linear equalisation.
    eq: Box<[AtomicFloat]>,
    /// Per-band direct/ambient balance, 0 = ambient, 1 = balanced, 2 = direct.
    stream_balance: Box<[AtomicFloat]>,
}

impl SynthesisControls {
    pub fn new(num_bands: usize, averaging: f32) -> Self {
        Self {
            averaging: AtomicFloat::new(averaging.clamp(0.0, 1.0)),
            eq: atomic_table(num_bands, 1.0),
            stream_balance: atomic_table(num_bands, DEFAULT_STREAM_BALANCE),
        }
    }

    #[inline]
    pub fn num_bands(&self) -> usize {
        self.stream_balance.len()
    }

    pub fn eq(&self) -> &[AtomicFloat] {
        &self.eq
    }

    pub fn stream_balance(&self) -> &[AtomicFloat] {
        &self.stream_balance
    }

    pub fn eq_values(&self) -> Vec<f32> {
        self.eq.iter().map(AtomicFloat::get).collect()
    }

    pub fn stream_balance_values(&self) -> Vec<f32> {
        self.stream_balance.iter().map(AtomicFloat::get).collect()
    }

    /// Copy per-band values from a previous build. Ignored unless the band
    /// counts match.
    pub fn restore_bands(&self, eq: &[f32], stream_balance: &[f32]) -> bool {
        if eq.len() != self.eq.len() || stream_balance.len() != self.stream_balance.len() {
            return false;
        }
        for (slot, &v) in self.eq.iter().zip(eq) {
            slot.set(v);
        }
        for (slot, &v) in self.stream_balance.iter().zip(stream_balance) {
            slot.set(v);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_defaults() {
        let controls = SynthesisControls::new(5, 0.77);
        assert_eq!(controls.num_bands(), 5);
        assert!(controls.stream_balance_values().iter().all(|&v| v == 1.0));
        assert!(controls.eq_values().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_restore_bands_requires_matching_count() {
        let controls = SynthesisControls::new(3, 0.5);
        assert!(!controls.restore_bands(&[0.5; 4], &[2.0; 4]));
        assert!(controls.restore_bands(&[0.5; 3], &[2.0; 3]));
        assert_eq!(controls.stream_balance_values(), vec![2.0; 3]);
        assert_eq!(controls.eq_values(), vec![0.5; 3]);
    }

    #[test]
    fn test_averaging_is_clamped() {
        assert_eq!(AnalysisControls::new(3.0).covariance_averaging.get(), 1.0);
        assert_eq!(SynthesisControls::new(1, -1.0).averaging.get(), 0.0);
    }
}
