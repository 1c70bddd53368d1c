//! Editable on-screen placement of the bells

use bell_core::Bell;
use serde::{Deserialize, Serialize};

/// Smallest width or height a bell can be resized to, in pixels
pub const MIN_BELL_SIZE: f32 = 40.0;

/// Largest change a single drag or resize step may apply on each axis
pub const MAX_STEP: f32 = 50.0;

const DEFAULT_SIZE: f32 = 120.0;
const DEFAULT_TOP: f32 = 80.0;
const DEFAULT_MARGIN: f32 = 40.0;
const DEFAULT_SPACING: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BellFrame {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl BellFrame {
    /// Slot `index` of the default row
    fn in_row(index: usize) -> Self {
        BellFrame {
            top: DEFAULT_TOP,
            left: DEFAULT_MARGIN + index as f32 * (DEFAULT_SIZE + DEFAULT_SPACING),
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
        }
    }
}

fn bounded(delta: f32) -> f32 {
    if delta.is_finite() {
        delta.clamp(-MAX_STEP, MAX_STEP)
    } else {
        0.0
    }
}

/// One frame per bell, indexed by [`Bell::index`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BellLayout {
    frames: [BellFrame; 5],
}

impl Default for BellLayout {
    fn default() -> Self {
        BellLayout {
            frames: std::array::from_fn(BellFrame::in_row),
        }
    }
}

impl BellLayout {
    pub fn frame(&self, bell: Bell) -> BellFrame {
        self.frames[bell.index()]
    }

    pub fn frames(&self) -> impl Iterator<Item = (Bell, BellFrame)> + '_ {
        Bell::ALL.into_iter().zip(self.frames.iter().copied())
    }

    /// Move a bell; its position never goes below 0 on either axis
    pub fn drag(&mut self, bell: Bell, dx: f32, dy: f32) -> BellFrame {
        let frame = &mut self.frames[bell.index()];
        frame.left = (frame.left + bounded(dx)).max(0.0);
        frame.top = (frame.top + bounded(dy)).max(0.0);
        *frame
    }

    pub fn resize(&mut self, bell: Bell, dw: f32, dh: f32) -> BellFrame {
        let frame = &mut self.frames[bell.index()];
        frame.width = (frame.width + bounded(dw)).max(MIN_BELL_SIZE);
        frame.height = (frame.height + bounded(dh)).max(MIN_BELL_SIZE);
        *frame
    }

    pub fn reset(&mut self) {
        *self = BellLayout::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_row_does_not_overlap() {
        let layout = BellLayout::default();
        let frames: Vec<BellFrame> = layout.frames().map(|(_, f)| f).collect();
        for pair in frames.windows(2) {
            assert!(pair[0].left + pair[0].width <= pair[1].left);
            assert_eq!(pair[0].top, pair[1].top);
        }
    }

    #[test]
    fn test_drag_is_bounded_per_step() {
        let mut layout = BellLayout::default();
        let before = layout.frame(Bell::Mi);

        let after = layout.drag(Bell::Mi, 500.0, -10.0);
        assert_eq!(after.left, before.left + MAX_STEP);
        assert_eq!(after.top, before.top - 10.0);
        assert_eq!(after.width, before.width);

        // other bells are untouched
        assert_eq!(layout.frame(Bell::Do), BellLayout::default().frame(Bell::Do));
    }

    #[test]
    fn test_drag_stops_at_origin() {
        let mut layout = BellLayout::default();
        for _ in 0..10 {
            layout.drag(Bell::Do, -MAX_STEP, -MAX_STEP);
        }
        let frame = layout.frame(Bell::Do);
        assert_eq!((frame.left, frame.top), (0.0, 0.0));
    }

    #[test]
    fn test_resize_respects_minimum() {
        let mut layout = BellLayout::default();
        for _ in 0..10 {
            layout.resize(Bell::Sol, -MAX_STEP, -5.0);
        }
        let frame = layout.frame(Bell::Sol);
        assert_eq!(frame.width, MIN_BELL_SIZE);
        assert_eq!(frame.height, 70.0);
    }

    #[test]
    fn test_non_finite_deltas_are_ignored() {
        let mut layout = BellLayout::default();
        let before = layout.frame(Bell::Fa);
        assert_eq!(layout.drag(Bell::Fa, f32::NAN, f32::INFINITY), before);
    }

    #[test]
    fn test_reset_and_serde() {
        let mut layout = BellLayout::default();
        layout.drag(Bell::Re, 20.0, 20.0);
        layout.resize(Bell::Re, 10.0, 10.0);

        let json = serde_json::to_string(&layout).unwrap();
        let restored: BellLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, layout);

        layout.reset();
        assert_eq!(layout, BellLayout::default());
    }

    proptest! {
        #[test]
        fn frames_stay_valid(steps in proptest::collection::vec((0usize..5, -200f32..200.0, -200f32..200.0, any::<bool>()), 0..50)) {
            let mut layout = BellLayout::default();
            for (bell, a, b, is_drag) in steps {
                let bell = Bell::ALL[bell];
                let before = layout.frame(bell);
                let after = if is_drag { layout.drag(bell, a, b) } else { layout.resize(bell, a, b) };
                prop_assert!(after.left >= 0.0 && after.top >= 0.0);
                prop_assert!(after.width >= MIN_BELL_SIZE && after.height >= MIN_BELL_SIZE);
                prop_assert!((after.left - before.left).abs() <= MAX_STEP + 1e-3);
                prop_assert!((after.width - before.width).abs() <= MAX_STEP + 1e-3);
            }
        }
    }
}
