//! Per-degree direct-stream gain map edited by a circular UI control.

use crate::config::RADIAL_RESOLUTION;
use crate::lockfree::{atomic_table, AtomicFloat};

pub const MIN_RADIAL_GAIN_DB: f32 = -12.0;
pub const MAX_RADIAL_GAIN_DB: f32 = 6.0;

/// Entries touched either side of the cursor by [`RadialGainMap::paint`].
const BRUSH_BEFORE: i32 = 7;
const BRUSH_AFTER: i32 = 6;

/// 360 gains in dB, one per integer degree of azimuth.
///
/// Fixed-size and pre-allocated. UI writes and per-frame reads race benignly:
/// each entry is an independent atomic, so a reader sees either the old or the
/// new value of a degree, never a torn one.
#[derive(Debug)]
pub struct RadialGainMap {
    gains_db: Box<[AtomicFloat]>,
}

impl Default for RadialGainMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RadialGainMap {
    pub fn new() -> Self {
        Self {
            gains_db: atomic_table(RADIAL_RESOLUTION, 0.0),
        }
    }

    /// Wrap any azimuth in degrees onto `0..360`.
    #[inline]
    pub fn wrap_degree(azimuth_deg: i32) -> usize {
        azimuth_deg.rem_euclid(RADIAL_RESOLUTION as i32) as usize
    }

    #[inline]
    pub fn gain_db(&self, azimuth_deg: i32) -> f32 {
        self.gains_db[Self::wrap_degree(azimuth_deg)].get_relaxed()
    }

    /// Linear gain for a (possibly fractional) azimuth, rounded to the nearest degree.
    #[inline]
    pub fn linear_gain(&self, azimuth_deg: f32) -> f32 {
        10f32.powf(self.gain_db(azimuth_deg.round() as i32) / 20.0)
    }

    pub fn set_gain_db(&self, azimuth_deg: i32, gain_db: f32) {
        self.gains_db[Self::wrap_degree(azimuth_deg)].set(gain_db);
    }

    /// Brush edit around `azimuth_deg`, clamped to the editor's range.
    pub fn paint(&self, azimuth_deg: i32, gain_db: f32) {
        let value = gain_db.clamp(MIN_RADIAL_GAIN_DB, MAX_RADIAL_GAIN_DB);
        for offset in -BRUSH_BEFORE..BRUSH_AFTER + 1 {
            self.set_gain_db(azimuth_deg + offset, value);
        }
    }

    pub fn reset(&self) {
        for gain in self.gains_db.iter() {
            gain.set(0.0);
        }
    }

    pub fn snapshot(&self) -> [f32; RADIAL_RESOLUTION] {
        let mut out = [0.0; RADIAL_RESOLUTION];
        for (dst, src) in out.iter_mut().zip(self.gains_db.iter()) {
            *dst = src.get();
        }
        out
    }

    pub fn len(&self) -> usize {
        self.gains_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gains_db.is_empty()
    }
}
