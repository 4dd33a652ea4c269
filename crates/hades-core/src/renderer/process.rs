//! Real-time frame path.

use super::{Renderer, RtState};
use crate::config::{FRAME_SIZE, MAX_NUM_CHANNELS, NUM_EARS};
use crate::radial::RadialGainMap;
use parking_lot::MutexGuard;

impl RtState {
    /// Analysis, radial editor and synthesis over one frame. Returns false if
    /// there is no codec to run.
    fn render<'a>(
        &mut self,
        inputs: impl Iterator<Item = &'a [f32]>,
        gains: &RadialGainMap,
    ) -> bool {
        let RtState {
            codec,
            input_frame,
            output_frame,
        } = self;
        let Some(codec) = codec.as_mut() else {
            return false;
        };

        let num_mics = codec.num_mics.min(MAX_NUM_CHANNELS);
        let mut loaded = 0;
        for (dst, src) in input_frame[..num_mics].iter_mut().zip(inputs) {
            let n = src.len().min(FRAME_SIZE);
            dst[..n].copy_from_slice(&src[..n]);
            dst[n..].fill(0.0);
            loaded += 1;
        }
        for dst in &mut input_frame[loaded..num_mics] {
            dst.fill(0.0);
        }

        codec.analysis.apply(
            &input_frame[..num_mics],
            FRAME_SIZE,
            &mut codec.params,
            &mut codec.signals,
        );
        codec.editor.apply(&mut codec.params, gains);
        codec
            .synthesis
            .apply(&codec.params, &codec.signals, FRAME_SIZE, output_frame);
        true
    }

    /// Copy the binaural frame out. Extra output channels are left untouched.
    fn write_outputs<'a>(&self, outputs: impl Iterator<Item = &'a mut [f32]>) {
        for (dst, src) in outputs.take(NUM_EARS).zip(&self.output_frame) {
            let n = dst.len().min(FRAME_SIZE);
            dst[..n].copy_from_slice(&src[..n]);
        }
    }
}

#[inline]
fn silence<'a>(outputs: impl Iterator<Item = &'a mut [f32]>, num_samples: usize) {
    for channel in outputs {
        let n = num_samples.min(channel.len());
        channel[..n].fill(0.0);
    }
}

impl Renderer {
    /// Render one frame of `num_samples` samples.
    ///
    /// Outputs are zeroed unless `num_samples` is [`FRAME_SIZE`] and a codec
    /// is built and loaded. Missing input channels are treated as silence and
    /// inputs beyond the array's microphone count are ignored. Never blocks
    /// and never allocates.
    pub fn process(&self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], num_samples: usize) {
        match self.render_frame(num_samples, inputs.iter().copied()) {
            Some(rt) => {
                rt.write_outputs(outputs.iter_mut().map(|c| &mut **c));
                drop(rt);
                self.state.end_frame();
            }
            None => silence(outputs.iter_mut().map(|c| &mut **c), num_samples),
        }
    }

    /// [`process`](Self::process) for hosts that share input and output
    /// buffers: the first `num_inputs` channels are read, then the first
    /// `num_outputs` channels are overwritten.
    pub fn process_in_place(
        &self,
        channels: &mut [&mut [f32]],
        num_inputs: usize,
        num_outputs: usize,
        num_samples: usize,
    ) {
        let num_inputs = num_inputs.min(channels.len());
        let num_outputs = num_outputs.min(channels.len());

        let rendered =
            self.render_frame(num_samples, channels[..num_inputs].iter().map(|c| &**c));
        let outputs = channels[..num_outputs].iter_mut().map(|c| &mut **c);
        match rendered {
            Some(rt) => {
                rt.write_outputs(outputs);
                drop(rt);
                self.state.end_frame();
            }
            None => silence(outputs, num_samples),
        }
    }

    /// On success the frame is still marked ongoing; the caller copies the
    /// output, drops the guard and then ends the frame.
    fn render_frame<'a>(
        &self,
        num_samples: usize,
        inputs: impl Iterator<Item = &'a [f32]>,
    ) -> Option<MutexGuard<'_, RtState>> {
        if num_samples != FRAME_SIZE || !self.state.begin_frame() {
            return None;
        }
        let Some(mut rt) = self.rt.try_lock() else {
            self.state.end_frame();
            return None;
        };
        if !rt.render(inputs, &self.radial_gains) {
            drop(rt);
            self.state.end_frame();
            return None;
        }
        Some(rt)
    }
}
