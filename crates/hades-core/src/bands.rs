//! Per-band parameter state published to non-audio threads.

use crate::controls::SynthesisControls;
use crate::lockfree::{atomic_table, AtomicFloat};
use std::sync::Arc;

/// Band layout of the current build plus the shadow copy of stream balance.
///
/// Replaced wholesale on every build, so the live controls, the frequency
/// vector and the shadow always agree on the band count.
#[derive(Debug)]
pub struct BandState {
    pub(crate) controls: Arc<SynthesisControls>,
    frequencies: Box<[f32]>,
    shadow: Box<[AtomicFloat]>,
}

impl BandState {
    pub(crate) fn new(controls: Arc<SynthesisControls>, frequencies: &[f32]) -> Self {
        let shadow = atomic_table(controls.num_bands(), 0.0);
        for (dst, src) in shadow.iter().zip(controls.stream_balance()) {
            dst.set(src.get());
        }
        Self {
            controls,
            frequencies: frequencies.into(),
            shadow,
        }
    }

    #[inline]
    pub fn num_bands(&self) -> usize {
        self.shadow.len()
    }

    /// Bands open to per-band edits; the top band is excluded.
    #[inline]
    pub(crate) fn is_editable(&self, band: usize) -> bool {
        band + 1 < self.num_bands()
    }

    pub(crate) fn set_stream_balance(&self, band: usize, value: f32) {
        self.controls.stream_balance()[band].set(value);
        self.shadow[band].set(value);
    }

    pub(crate) fn refresh_shadow(&self) {
        for (dst, src) in self.shadow.iter().zip(self.controls.stream_balance()) {
            dst.set(src.get());
        }
    }

    pub(crate) fn push_shadow(&self) {
        for (dst, src) in self.controls.stream_balance().iter().zip(self.shadow.iter()) {
            dst.set(src.get());
        }
    }

    pub fn shadow_values(&self) -> Vec<f32> {
        self.shadow.iter().map(AtomicFloat::get).collect()
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }
}

/// Stream balance for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamBalanceSnapshot {
    /// Band centre frequencies in Hz.
    pub frequencies: Vec<f32>,
    pub balance: Vec<f32>,
    pub num_bands: usize,
}
