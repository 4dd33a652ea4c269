//! Codec and processing status state machine.
//!
//! Two flags coordinate the real-time audio thread with the background build
//! task:
//!
//! - [`CodecStatus`]: `NotInitialised -> Initialising -> Initialised`, back to
//!   `NotInitialised` on any invalidating change.
//! - [`ProcStatus`]: whether a frame is currently inside analysis/synthesis.
//!
//! The audio thread only ever publishes `Ongoing` and then reads the codec
//! status; it never waits. The build task claims `Initialising` and then waits
//! for `NotOngoing` before touching engines. Both sides use `SeqCst`, so at
//! least one of them observes the other.

use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::Duration;

/// Sleep between polls on the non-real-time side.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CodecStatus {
    /// Ready to process audio.
    Initialised = 0,
    /// Not yet built, or the configuration changed since the last build.
    NotInitialised = 1,
    /// A build is running; audio is bypassed.
    Initialising = 2,
}

impl CodecStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Initialised,
            2 => Self::Initialising,
            _ => Self::NotInitialised,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcStatus {
    /// A frame is mid-flight; engines must not be rebuilt.
    Ongoing = 0,
    NotOngoing = 1,
}

/// Atomic pair of codec/proc status flags.
#[derive(Debug)]
pub struct CodecState {
    codec: AtomicU8,
    proc: AtomicU8,
}

impl Default for CodecState {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecState {
    pub fn new() -> Self {
        Self {
            codec: AtomicU8::new(CodecStatus::NotInitialised as u8),
            proc: AtomicU8::new(ProcStatus::NotOngoing as u8),
        }
    }

    #[inline]
    pub fn codec_status(&self) -> CodecStatus {
        CodecStatus::from_u8(self.codec.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn proc_status(&self) -> ProcStatus {
        if self.proc.load(Ordering::SeqCst) == ProcStatus::Ongoing as u8 {
            ProcStatus::Ongoing
        } else {
            ProcStatus::NotOngoing
        }
    }

    /// Mark the current build stale.
    ///
    /// Blocks while a build is in progress, so an invalidation is always
    /// ordered after a completed build and never lost to one that is about to
    /// finish. Never call from the audio thread.
    pub fn invalidate(&self) {
        loop {
            let current = self.codec.load(Ordering::SeqCst);
            if current == CodecStatus::Initialising as u8 {
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            if self
                .codec
                .compare_exchange(
                    current,
                    CodecStatus::NotInitialised as u8,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                return;
            }
        }
    }

    /// Claim the right to build. Succeeds only from `NotInitialised`.
    pub(crate) fn try_claim_build(&self) -> bool {
        self.codec
            .compare_exchange(
                CodecStatus::NotInitialised as u8,
                CodecStatus::Initialising as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Wait for an in-flight frame to leave the engines. Build task only.
    pub(crate) fn wait_for_frame_end(&self) {
        while self.proc_status() == ProcStatus::Ongoing {
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub(crate) fn finish_build(&self) {
        self.codec
            .store(CodecStatus::Initialised as u8, Ordering::SeqCst);
    }

    /// Publish a frame start. Returns false (and retracts) unless the codec
    /// is initialised. Never blocks.
    #[inline]
    pub(crate) fn begin_frame(&self) -> bool {
        self.proc.store(ProcStatus::Ongoing as u8, Ordering::SeqCst);
        if self.codec_status() == CodecStatus::Initialised {
            true
        } else {
            self.end_frame();
            false
        }
    }

    #[inline]
    pub(crate) fn end_frame(&self) {
        self.proc
            .store(ProcStatus::NotOngoing as u8, Ordering::SeqCst);
    }

    /// Block until no build and no frame is in flight.
    pub fn wait_until_idle(&self) {
        while self.codec_status() == CodecStatus::Initialising
            || self.proc_status() == ProcStatus::Ongoing
        {
            thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_initial_state() {
        let state = CodecState::new();
        assert_eq!(state.codec_status(), CodecStatus::NotInitialised);
        assert_eq!(state.proc_status(), ProcStatus::NotOngoing);
    }

    #[test]
    fn test_claim_only_from_not_initialised() {
        let state = CodecState::new();
        assert!(state.try_claim_build());
        assert_eq!(state.codec_status(), CodecStatus::Initialising);
        assert!(!state.try_claim_build());

        state.finish_build();
        assert!(!state.try_claim_build());

        state.invalidate();
        assert!(state.try_claim_build());
    }

    #[test]
    fn test_frame_rejected_unless_initialised() {
        let state = CodecState::new();
        assert!(!state.begin_frame());
        assert_eq!(state.proc_status(), ProcStatus::NotOngoing);

        state.try_claim_build();
        assert!(!state.begin_frame());

        state.finish_build();
        assert!(state.begin_frame());
        assert_eq!(state.proc_status(), ProcStatus::Ongoing);
        state.end_frame();
        assert_eq!(state.proc_status(), ProcStatus::NotOngoing);
    }

    #[test]
    fn test_invalidate_waits_for_build() {
        let state = Arc::new(CodecState::new());
        assert!(state.try_claim_build());

        let builder = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                state.finish_build();
            })
        };

        let start = Instant::now();
        state.invalidate();
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(state.codec_status(), CodecStatus::NotInitialised);
        builder.join().unwrap();
    }

    #[test]
    fn test_build_waits_for_frame() {
        let state = Arc::new(CodecState::new());
        state.finish_build();
        assert!(state.begin_frame());
        state.invalidate();
        assert!(state.try_claim_build());

        let audio = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                state.end_frame();
            })
        };

        state.wait_for_frame_end();
        assert_eq!(state.proc_status(), ProcStatus::NotOngoing);
        audio.join().unwrap();
    }
}
