//! Input Frames and Recording
//!
//! The input-mapping collaborator hands the core one `InputFrame` per tick:
//! a movement vector with components in [-1, 1] and four action flags.
//! Axes are stored quantized to `i8` so frames compare exactly, which is
//! what makes delta-compressed recording and bit-identical replay work.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Abstract controller state for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Horizontal axis: -127 (left) to +127 (right)
    pub move_x: i8,

    /// Vertical axis: -127 (down) to +127 (up)
    pub move_y: i8,

    /// Action flags:
    /// - Bit 0: jump
    /// - Bit 1: attack
    /// - Bit 2: special attack
    /// - Bit 3: defend
    pub flags: u8,
}

impl InputFrame {
    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x01;

    /// Attack flag bit
    pub const FLAG_ATTACK: u8 = 0x02;

    /// Special attack flag bit
    pub const FLAG_SPECIAL: u8 = 0x04;

    /// Defend flag bit
    pub const FLAG_DEFEND: u8 = 0x08;

    /// Idle frame.
    pub const fn new() -> Self {
        Self {
            move_x: 0,
            move_y: 0,
            flags: 0,
        }
    }

    /// Frame from analogue axes. Values are clamped to [-1, 1].
    pub fn from_axes(x: f32, y: f32) -> Self {
        Self {
            move_x: quantize_axis(x),
            move_y: quantize_axis(y),
            flags: 0,
        }
    }

    /// Builder-style flag setter.
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Movement vector, components in [-1, 1].
    #[inline]
    pub fn movement(&self) -> Vec2 {
        Vec2::new(axis_value(self.move_x), axis_value(self.move_y))
    }

    /// Jump held.
    #[inline]
    pub fn jump(&self) -> bool {
        self.flags & Self::FLAG_JUMP != 0
    }

    /// Attack held.
    #[inline]
    pub fn attack(&self) -> bool {
        self.flags & Self::FLAG_ATTACK != 0
    }

    /// Special attack held.
    #[inline]
    pub fn special(&self) -> bool {
        self.flags & Self::FLAG_SPECIAL != 0
    }

    /// Defend held.
    #[inline]
    pub fn defend(&self) -> bool {
        self.flags & Self::FLAG_DEFEND != 0
    }

    /// Flags newly set this frame compared to `previous`.
    #[inline]
    pub fn pressed_since(&self, previous: &InputFrame) -> u8 {
        self.flags & !previous.flags
    }

    /// No movement and no actions.
    pub fn is_idle(&self) -> bool {
        self.move_x == 0 && self.move_y == 0 && self.flags == 0
    }

    /// Set or clear a flag.
    pub fn set_flag(&mut self, flag: u8, held: bool) {
        if held {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

/// Map [-1, 1] onto [-127, 127]. Non-finite input reads as centred.
fn quantize_axis(value: f32) -> i8 {
    if !value.is_finite() {
        return 0;
    }
    (value.clamp(-1.0, 1.0) * 127.0).round() as i8
}

/// Map a stored axis back to [-1, 1]. -128 is treated as -127.
#[inline]
fn axis_value(raw: i8) -> f32 {
    (raw.max(-127) as f32) / 127.0
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// An input state that began at `tick`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

/// Delta-compressed input stream for one level run.
///
/// Only ticks where the input changed are stored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputRecording {
    /// Seed the level was started with
    pub rng_seed: u64,

    /// Last recorded tick
    pub end_tick: u32,

    deltas: Vec<InputDelta>,

    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecording {
    /// Empty recording for a level seeded with `rng_seed`.
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record the input applied at `tick`. Stored only if it changed.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = self.end_tick.max(tick);
        if frame != self.last_frame {
            self.deltas.push(InputDelta { tick, frame });
            self.last_frame = frame;
        }
    }

    /// Input in effect at `tick`.
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Stored deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of stored deltas.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Iterate `(tick, frame)` from tick 1 through `end_tick`.
    pub fn replay_iter(&self) -> ReplayIter<'_> {
        ReplayIter {
            recording: self,
            current_tick: 1,
            delta_idx: 0,
            current_frame: InputFrame::new(),
        }
    }
}

/// Tick-by-tick playback of an `InputRecording`.
pub struct ReplayIter<'a> {
    recording: &'a InputRecording,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
}

impl<'a> Iterator for ReplayIter<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_tick > self.recording.end_tick {
            return None;
        }

        let deltas = &self.recording.deltas;
        while self.delta_idx < deltas.len() && deltas[self.delta_idx].tick <= self.current_tick {
            self.current_frame = deltas[self.delta_idx].frame;
            self.delta_idx += 1;
        }

        let item = (self.current_tick, self.current_frame);
        self.current_tick += 1;
        Some(item)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes_clamped_and_quantized() {
        let frame = InputFrame::from_axes(1.0, -1.0);
        assert_eq!(frame.movement(), Vec2::new(1.0, -1.0));

        let frame = InputFrame::from_axes(5.0, -9.0);
        assert_eq!(frame.movement(), Vec2::new(1.0, -1.0));

        let frame = InputFrame::from_axes(f32::NAN, 0.5);
        assert_eq!(frame.move_x, 0);
        assert!((frame.movement().y - 0.5).abs() < 0.01);

        let raw = InputFrame { move_x: -128, move_y: 0, flags: 0 };
        assert_eq!(raw.movement().x, -1.0);
    }

    #[test]
    fn test_flags() {
        let mut frame = InputFrame::new();
        assert!(frame.is_idle());

        frame.set_flag(InputFrame::FLAG_JUMP, true);
        frame.set_flag(InputFrame::FLAG_DEFEND, true);
        assert!(frame.jump());
        assert!(frame.defend());
        assert!(!frame.attack());
        assert!(!frame.special());

        frame.set_flag(InputFrame::FLAG_JUMP, false);
        assert!(!frame.jump());
        assert!(frame.defend());
    }

    #[test]
    fn test_pressed_since() {
        let prev = InputFrame::new().with_flags(InputFrame::FLAG_JUMP);
        let now = InputFrame::new().with_flags(InputFrame::FLAG_JUMP | InputFrame::FLAG_ATTACK);
        assert_eq!(now.pressed_since(&prev), InputFrame::FLAG_ATTACK);
    }

    #[test]
    fn test_recording_delta_compression() {
        let mut rec = InputRecording::new(7);
        let right = InputFrame::from_axes(1.0, 0.0);
        for tick in 1..=4 {
            rec.record(tick, right);
        }
        assert_eq!(rec.delta_count(), 1);

        rec.record(5, InputFrame::new().with_flags(InputFrame::FLAG_JUMP));
        assert_eq!(rec.delta_count(), 2);
        assert_eq!(rec.end_tick, 5);
    }

    #[test]
    fn test_get_input_at() {
        let mut rec = InputRecording::new(7);
        let a = InputFrame::from_axes(0.5, 0.0);
        let b = InputFrame::from_axes(-0.5, 0.0);
        rec.record(10, a);
        rec.record(20, b);

        assert!(rec.get_input_at(5).is_idle());
        assert_eq!(rec.get_input_at(10), a);
        assert_eq!(rec.get_input_at(19), a);
        assert_eq!(rec.get_input_at(20), b);
        assert_eq!(rec.get_input_at(99), b);
    }

    #[test]
    fn test_replay_iter_expands_deltas() {
        let mut rec = InputRecording::new(7);
        let a = InputFrame::from_axes(1.0, 0.0);
        let b = InputFrame::from_axes(-1.0, 0.0);
        rec.record(1, a);
        rec.record(2, a);
        rec.record(3, b);
        rec.record(4, b);

        let frames: Vec<_> = rec.replay_iter().collect();
        assert_eq!(frames, vec![(1, a), (2, a), (3, b), (4, b)]);
    }
}
