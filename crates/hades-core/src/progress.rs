//! Build progress published for display.

use crate::lockfree::AtomicFloat;
use std::sync::atomic::{AtomicU8, Ordering};

/// Major phases of a codec build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BuildPhase {
    Idle = 0,
    Codec,
    Analysis,
    Containers,
    Synthesis,
    Done,
}

impl BuildPhase {
    pub fn text(self) -> &'static str {
        match self {
            BuildPhase::Idle => "",
            BuildPhase::Codec => "Initialising Codec",
            BuildPhase::Analysis => "Initialising Analysis",
            BuildPhase::Containers => "Initialising Containers",
            BuildPhase::Synthesis => "Initialising Synthesis",
            BuildPhase::Done => "Done!",
        }
    }

    /// Progress value reported on entering the phase.
    pub fn progress(self) -> f32 {
        match self {
            BuildPhase::Idle | BuildPhase::Codec => 0.0,
            BuildPhase::Analysis => 0.3,
            BuildPhase::Containers => 0.5,
            BuildPhase::Synthesis => 0.8,
            BuildPhase::Done => 1.0,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => BuildPhase::Codec,
            2 => BuildPhase::Analysis,
            3 => BuildPhase::Containers,
            4 => BuildPhase::Synthesis,
            5 => BuildPhase::Done,
            _ => BuildPhase::Idle,
        }
    }
}

/// Eventually-consistent progress snapshot. Display only.
#[derive(Debug, Default)]
pub struct BuildProgress {
    phase: AtomicU8,
    value: AtomicFloat,
}

impl BuildProgress {
    pub(crate) fn enter(&self, phase: BuildPhase) {
        self.phase.store(phase as u8, Ordering::Release);
        self.value.set(phase.progress());
    }

    pub fn phase(&self) -> BuildPhase {
        BuildPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// In `[0, 1]`; non-decreasing within a build.
    pub fn value(&self) -> f32 {
        self.value.get()
    }

    pub fn text(&self) -> &'static str {
        self.phase().text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_are_monotonic() {
        let phases = [
            BuildPhase::Codec,
            BuildPhase::Analysis,
            BuildPhase::Containers,
            BuildPhase::Synthesis,
            BuildPhase::Done,
        ];
        let progress = BuildProgress::default();
        let mut last = 0.0;
        for phase in phases {
            progress.enter(phase);
            assert!(progress.value() >= last);
            assert_eq!(progress.phase(), phase);
            last = progress.value();
        }
        assert_eq!(progress.text(), "Done!");
        assert_eq!(last, 1.0);
    }
}
