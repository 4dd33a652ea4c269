//! Impulse-response sets for the microphone array and the listener's head.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Measured impulse responses on a direction grid.
///
/// Used both for the microphone array (one channel per microphone) and for
/// binaural HRIRs (two channels). Data is laid out
/// `directions x channels x ir_length`. Sets are immutable once loaded and are
/// replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpulseResponseSet {
    sample_rate: f32,
    ir_length: usize,
    num_channels: usize,
    /// `[azimuth, elevation]` in degrees.
    directions: Vec<[f32; 2]>,
    data: Vec<f32>,
}

impl ImpulseResponseSet {
    pub fn new(
        sample_rate: f32,
        ir_length: usize,
        num_channels: usize,
        directions: Vec<[f32; 2]>,
        data: Vec<f32>,
    ) -> Result<Self> {
        let set = Self {
            sample_rate,
            ir_length,
            num_channels,
            directions,
            data,
        };
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::MalformedIrSet(format!(
                "sample rate {} must be positive",
                self.sample_rate
            )));
        }
        if self.num_channels == 0 || self.directions.is_empty() || self.ir_length == 0 {
            return Err(Error::MalformedIrSet(format!(
                "empty set: {} directions, {} channels, length {}",
                self.directions.len(),
                self.num_channels,
                self.ir_length
            )));
        }
        let expected = self.directions.len() * self.num_channels * self.ir_length;
        if self.data.len() != expected {
            return Err(Error::MalformedIrSet(format!(
                "expected {expected} samples, found {}",
                self.data.len()
            )));
        }
        if self
            .directions
            .iter()
            .flatten()
            .chain(self.data.iter())
            .any(|v| !v.is_finite())
        {
            return Err(Error::MalformedIrSet("non-finite value".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    pub fn ir_length(&self) -> usize {
        self.ir_length
    }

    /// Microphones for an array set, ears for a binaural set.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn num_directions(&self) -> usize {
        self.directions.len()
    }

    pub fn directions(&self) -> &[[f32; 2]] {
        &self.directions
    }

    /// One impulse response.
    ///
    /// # Panics
    /// If `direction` or `channel` is out of range.
    pub fn ir(&self, direction: usize, channel: usize) -> &[f32] {
        assert!(direction < self.num_directions() && channel < self.num_channels);
        let start = (direction * self.num_channels + channel) * self.ir_length;
        &self.data[start..start + self.ir_length]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Great-circle angle between two `[azimuth, elevation]` pairs, in radians.
pub fn angular_distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let (az1, el1) = (a[0].to_radians(), a[1].to_radians());
    let (az2, el2) = (b[0].to_radians(), b[1].to_radians());
    let cos = el1.sin() * el2.sin() + el1.cos() * el2.cos() * (az1 - az2).cos();
    cos.clamp(-1.0, 1.0).acos()
}

/// Index of the grid direction closest to `target`.
pub fn nearest_direction(grid: &[[f32; 2]], target: [f32; 2]) -> usize {
    grid.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            angular_distance(**a, target).total_cmp(&angular_distance(**b, target))
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_by_two() -> ImpulseResponseSet {
        ImpulseResponseSet::new(
            48000.0,
            3,
            2,
            vec![[90.0, 0.0], [-90.0, 0.0]],
            (0..12).map(|i| i as f32).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_layout() {
        let set = two_by_two();
        assert_eq!(set.num_directions(), 2);
        assert_eq!(set.ir(0, 1), &[3.0, 4.0, 5.0]);
        assert_eq!(set.ir(1, 0), &[6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let result = ImpulseResponseSet::new(48000.0, 4, 2, vec![[0.0, 0.0]], vec![0.0; 7]);
        assert!(matches!(result, Err(Error::MalformedIrSet(_))));
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(ImpulseResponseSet::new(48000.0, 1, 0, vec![[0.0, 0.0]], vec![]).is_err());
        assert!(ImpulseResponseSet::new(0.0, 1, 1, vec![[0.0, 0.0]], vec![0.0]).is_err());
        assert!(ImpulseResponseSet::new(48000.0, 1, 1, vec![[0.0, 0.0]], vec![f32::NAN]).is_err());
    }

    #[test]
    fn test_nearest_direction_wraps_azimuth() {
        let grid = [[0.0, 0.0], [90.0, 0.0], [180.0, 0.0], [270.0, 0.0]];
        assert_eq!(nearest_direction(&grid, [-85.0, 0.0]), 3);
        assert_eq!(nearest_direction(&grid, [359.0, 0.0]), 0);
        assert_relative_eq!(
            angular_distance([0.0, 90.0], [123.0, 90.0]),
            0.0,
            epsilon = 1e-3
        );
    }
}
