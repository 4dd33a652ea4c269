//! Reference radial editor.

use hades_core::{ParamContainer, RadialEditor, RadialGainMap};

/// Writes the radial map's gain at each slot and band's estimated azimuth as
/// the direct-stream gain.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceRadialEditor;

impl RadialEditor for ReferenceRadialEditor {
    fn apply(&mut self, params: &mut ParamContainer, gains: &RadialGainMap) {
        for (gain, doa) in params.direct_gain.iter_mut().zip(&params.doa_deg) {
            *gain = gains.linear_gain(doa[0]);
        }
    }
}
