//! Built-in fallback HRIR set.
//!
//! A spherical-head approximation on a horizontal ring: Woodworth ITD plus a
//! frequency-smeared head-shadow ILD on the far ear. Azimuth follows the
//! usual convention (0 = front, +90 = left).

use crate::ir::ImpulseResponseSet;
use std::sync::{Arc, OnceLock};

pub const DEFAULT_HRIR_SAMPLE_RATE: f32 = 48_000.0;
pub const DEFAULT_HRIR_LENGTH: usize = 64;
pub const DEFAULT_HRIR_AZIMUTH_STEP: usize = 10;

const HEAD_RADIUS: f32 = 0.0875;
const SPEED_OF_SOUND: f32 = 343.0;
/// Bulk delay so both ears stay causal.
const BASE_DELAY: f32 = 16.0;
const MAX_SHADOW_DB: f32 = 10.0;

static DEFAULT_HRIRS: OnceLock<Arc<ImpulseResponseSet>> = OnceLock::new();

/// Shared default set, built on first use.
pub fn default_hrirs() -> Arc<ImpulseResponseSet> {
    Arc::clone(DEFAULT_HRIRS.get_or_init(|| Arc::new(build_default_hrirs())))
}

fn build_default_hrirs() -> ImpulseResponseSet {
    let directions: Vec<[f32; 2]> = (0..360)
        .step_by(DEFAULT_HRIR_AZIMUTH_STEP)
        .map(|az| [az as f32, 0.0])
        .collect();

    let mut data = vec![0.0; directions.len() * 2 * DEFAULT_HRIR_LENGTH];
    for (d, dir) in directions.iter().enumerate() {
        let lateral = (dir[0].to_radians().sin() * dir[1].to_radians().cos()).asin();
        let itd = HEAD_RADIUS / SPEED_OF_SOUND * (lateral + lateral.sin());
        let half_itd = 0.5 * itd * DEFAULT_HRIR_SAMPLE_RATE;

        // Positive lateral angle: left ear leads, right ear is shadowed.
        let ears = [
            (BASE_DELAY - half_itd, (-lateral.sin()).max(0.0)),
            (BASE_DELAY + half_itd, lateral.sin().max(0.0)),
        ];
        for (ear, (delay, shadow)) in ears.into_iter().enumerate() {
            let start = (d * 2 + ear) * DEFAULT_HRIR_LENGTH;
            write_ear(&mut data[start..start + DEFAULT_HRIR_LENGTH], delay, shadow);
        }
    }

    // Dimensions and values are fixed above and always consistent.
    ImpulseResponseSet::new(
        DEFAULT_HRIR_SAMPLE_RATE,
        DEFAULT_HRIR_LENGTH,
        2,
        directions,
        data,
    )
    .unwrap_or_else(|e| unreachable!("default HRIR set is malformed: {e}"))
}

fn write_ear(ir: &mut [f32], delay: f32, shadow: f32) {
    let gain = 10f32.powf(-shadow * MAX_SHADOW_DB / 20.0);
    let tap = (delay.round() as usize).min(ir.len() - 2).max(1);
    // Blend a unit impulse with a 3-tap smear as the shadow deepens.
    ir[tap] += gain * (1.0 - 0.5 * shadow);
    ir[tap - 1] += gain * 0.25 * shadow;
    ir[tap + 1] += gain * 0.25 * shadow;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_shape() {
        let set = default_hrirs();
        assert_eq!(set.num_channels(), 2);
        assert_eq!(set.num_directions(), 36);
        assert_eq!(set.ir_length(), DEFAULT_HRIR_LENGTH);
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_left_source_reaches_left_ear_first_and_louder() {
        let set = default_hrirs();
        let left_dir = set
            .directions()
            .iter()
            .position(|d| d[0] == 90.0)
            .unwrap();
        let onset = |ir: &[f32]| ir.iter().position(|v| v.abs() > 1e-6).unwrap();
        let energy = |ir: &[f32]| ir.iter().map(|v| v * v).sum::<f32>();

        let left = set.ir(left_dir, 0);
        let right = set.ir(left_dir, 1);
        assert!(onset(left) < onset(right));
        assert!(energy(left) > energy(right));
    }

    #[test]
    fn test_frontal_source_is_symmetric() {
        let set = default_hrirs();
        assert_eq!(set.ir(0, 0), set.ir(0, 1));
    }
}
