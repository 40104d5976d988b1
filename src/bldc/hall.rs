// Hall sensor decoding and commutation step counting
//
// Three 120°-spaced hall sensors yield six valid rotor sector codes. The
// two remaining input combinations (all sensors inactive / all active) are
// physically impossible and both map to the indeterminate code 6, which is
// also one of the valid sectors - a sustained 6 is therefore ambiguous and
// must not be assumed to identify a rotor position. No error is raised for
// them; an unreal code simply fails to register as a new step when it
// matches recent history.

use crate::hardware::HallLines;

/// Rotor position lookup, indexed by the 3-bit active-state key
/// `(a << 2) | (b << 1) | c`.
///
/// Indices 0 (all inactive) and 7 (all active) are the invalid combinations.
pub const HALL_TO_POS: [u8; 8] = [6, 2, 4, 3, 0, 1, 5, 6];

/// Code returned for both physically invalid hall combinations.
pub const POS_INDETERMINATE: u8 = 6;

/// Decode logical (active-level) hall states into a position code 0-6.
pub fn decode(a: bool, b: bool, c: bool) -> u8 {
    let key = ((a as usize) << 2) | ((b as usize) << 1) | (c as usize);
    HALL_TO_POS[key]
}

/// Decode raw active-low hall lines into a position code 0-6.
pub fn decode_lines(lines: HallLines) -> u8 {
    let (a, b, c) = lines.active();
    decode(a, b, c)
}

/// Per-motor position history and debounced commutation step counter.
///
/// The history pair (current, previous) only advances when the decoded code
/// changes, so `prev` always holds the value `pos` had before its last
/// update, not every raw sample. The step counter increments only when a
/// new code differs from both history entries, which filters the bounce
/// between two adjacent sectors.
#[derive(Debug, Clone, Copy)]
pub struct PositionTracker {
    pos: u8,
    prev: u8,
    steps: u16,
}

impl Default for PositionTracker {
    fn default() -> Self {
        PositionTracker::new(POS_INDETERMINATE)
    }
}

impl PositionTracker {
    pub fn new(code: u8) -> Self {
        Self {
            pos: code,
            prev: code,
            steps: 0,
        }
    }

    /// Re-seed both history entries with the current code.
    ///
    /// Used when (re)starting calibration; the step counter is deliberately
    /// left running, it counts physical motion for the whole session.
    pub fn rebase(&mut self, code: u8) {
        self.pos = code;
        self.prev = code;
    }

    /// Feed one decoded sample. Counts a step iff the code is new against
    /// both history entries.
    pub fn update(&mut self, code: u8) {
        if code != self.pos {
            if code != self.prev {
                self.steps = self.steps.wrapping_add(1);
            }
            self.prev = self.pos;
            self.pos = code;
        }
    }

    /// Most recent stored position code.
    pub fn pos(&self) -> u8 {
        self.pos
    }

    /// Debounced commutation step count (wraps at u16::MAX).
    pub fn steps(&self) -> u16 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_all_combinations_in_range() {
        for key in 0..8u8 {
            let a = key & 0b100 != 0;
            let b = key & 0b010 != 0;
            let c = key & 0b001 != 0;
            assert!(decode(a, b, c) <= 6);
        }
    }

    #[test]
    fn test_decode_invalid_combinations_are_indeterminate() {
        // all inactive and all active are physically impossible
        assert_eq!(decode(false, false, false), POS_INDETERMINATE);
        assert_eq!(decode(true, true, true), POS_INDETERMINATE);
    }

    #[test]
    fn test_decode_valid_codes_unique() {
        // the six valid combinations each map to a distinct code
        let mut seen = [false; 7];
        for key in 1..7usize {
            let code = HALL_TO_POS[key] as usize;
            assert!(!seen[code]);
            seen[code] = true;
        }
    }

    #[test]
    fn test_decode_lines_inverts_active_low() {
        // raw all-high = all sensors inactive
        let lines = HallLines {
            a: true,
            b: true,
            c: true,
        };
        assert_eq!(decode_lines(lines), POS_INDETERMINATE);
        // only sensor A active: raw a low, b/c high
        let lines = HallLines {
            a: false,
            b: true,
            c: true,
        };
        assert_eq!(decode_lines(lines), decode(true, false, false));
    }

    #[test]
    fn test_step_counts_new_code_once() {
        let mut t = PositionTracker::new(0);
        t.update(1);
        assert_eq!(t.steps(), 1);
        // repeating the same new code must not count again
        t.update(1);
        assert_eq!(t.steps(), 1);
        assert_eq!(t.pos(), 1);
    }

    #[test]
    fn test_step_ignores_bounce_between_adjacent_codes() {
        let mut t = PositionTracker::new(0);
        t.update(1); // history (1, 0) -> step
        t.update(0); // matches prev, no step
        t.update(1); // matches prev, no step
        assert_eq!(t.steps(), 1);
        t.update(2); // new against both -> step
        assert_eq!(t.steps(), 2);
    }

    #[test]
    fn test_step_counts_full_rotation() {
        let mut t = PositionTracker::new(0);
        for code in [1, 2, 3, 4, 5, 0] {
            t.update(code);
        }
        assert_eq!(t.steps(), 6);
    }

    #[test]
    fn test_rebase_keeps_step_counter() {
        let mut t = PositionTracker::new(0);
        t.update(1);
        t.update(2);
        assert_eq!(t.steps(), 2);
        t.rebase(5);
        assert_eq!(t.steps(), 2);
        assert_eq!(t.pos(), 5);
        // after rebase, the same code registers as no change
        t.update(5);
        assert_eq!(t.steps(), 2);
    }
}
