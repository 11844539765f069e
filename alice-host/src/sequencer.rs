//! Frame sequencing state.
//!
//! One cycle walks Idle → Packing → Recording → Executing → Submitting →
//! Idle. A cycle cannot start while another is in flight, and a fatal error
//! parks the sequencer in `Terminated` for good.

use std::time::Instant;

use alice_core::ProtocolError;
use alice_gpu::FrameStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Acquiring the target image, then writing frame state sized to it.
    /// A missing image returns to `Idle` before anything is written.
    Packing,
    /// Command stream and render pass open.
    Recording,
    /// Module's `next_frame` running.
    Executing,
    Submitting,
    Terminated,
}

/// What one presented frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub index: u64,
    /// Seconds since the previous presented frame.
    pub delta: f32,
    pub draws_issued: u32,
    pub draws_skipped: u32,
    pub draws_culled: u32,
    /// False when the module has not registered a shared memory address.
    pub frame_state_written: bool,
}

impl FrameReport {
    pub fn new(stats: FrameStats, delta: f32, frame_state_written: bool) -> Self {
        Self {
            index: stats.index,
            delta,
            draws_issued: stats.draws_issued,
            draws_skipped: stats.draws_skipped,
            draws_culled: stats.draws_culled,
            frame_state_written,
        }
    }
}

#[derive(Debug)]
pub struct Sequencer {
    phase: Phase,
    last_frame: Option<Instant>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            last_frame: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    /// Idle → Packing.
    pub fn begin(&mut self) -> Result<(), ProtocolError> {
        if self.phase != Phase::Idle {
            return Err(ProtocolError::FrameInProgress);
        }
        self.phase = Phase::Packing;
        Ok(())
    }

    /// Move one step forward within a cycle.
    pub fn advance(&mut self, to: Phase) {
        debug_assert!(
            matches!(
                (self.phase, to),
                (Phase::Packing, Phase::Recording)
                    | (Phase::Recording, Phase::Executing)
                    | (Phase::Executing, Phase::Submitting)
            ),
            "illegal transition {:?} -> {:?}",
            self.phase,
            to
        );
        self.phase = to;
    }

    /// Back to Idle without presenting (target unavailable).
    pub fn abandon(&mut self) {
        if self.phase != Phase::Terminated {
            self.phase = Phase::Idle;
        }
    }

    /// Submitting → Idle.
    pub fn finish(&mut self) {
        debug_assert_eq!(self.phase, Phase::Submitting);
        self.phase = Phase::Idle;
    }

    pub fn terminate(&mut self) {
        self.phase = Phase::Terminated;
    }

    /// Seconds since the previous call; 0 on the first frame.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        delta
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cycle_cannot_reenter() {
        let mut seq = Sequencer::new();
        seq.begin().unwrap();
        assert_eq!(seq.begin().unwrap_err(), ProtocolError::FrameInProgress);
        seq.advance(Phase::Recording);
        seq.advance(Phase::Executing);
        assert!(seq.begin().is_err());
        seq.advance(Phase::Submitting);
        seq.finish();
        assert!(seq.begin().is_ok());
    }

    #[test]
    fn test_terminated_is_final() {
        let mut seq = Sequencer::new();
        seq.terminate();
        seq.abandon();
        assert!(seq.is_terminated());
        assert!(seq.begin().is_err());
    }

    #[test]
    fn test_tick_measures_between_frames() {
        let mut seq = Sequencer::new();
        let t0 = Instant::now();
        assert_eq!(seq.tick(t0), 0.0);
        let delta = seq.tick(t0 + Duration::from_millis(250));
        assert!((delta - 0.25).abs() < 1e-6);
    }
}
