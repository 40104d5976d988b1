// Duty-cycle stage
//
// The control law emits signed phase duties centered at zero. Hardware
// compare registers want unsigned values in [0, period], so each output is
// re-centered by half the period and then hard-saturated into
// [margin, period - margin]. Values outside the window are truncated to
// the boundary, never rejected or scaled.
//
// In field-oriented mode the margin reserves a window inside every PWM
// cycle for mid-cycle phase current sampling; all other modes run with a
// zero margin.

use crate::control_law::ControlType;

/// Margin for the selected commutation method.
pub fn margin_for(ctrl_type: ControlType, foc_margin: u16) -> u16 {
    match ctrl_type {
        ControlType::FieldOriented => foc_margin,
        ControlType::Commutation | ControlType::Sinusoidal => 0,
    }
}

/// Re-center one raw duty output and clamp it into the valid window.
pub fn apply(raw: i16, period: u16, margin: u16) -> u16 {
    let centered = raw as i32 + period as i32 / 2;
    centered.clamp(margin as i32, period as i32 - margin as i32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: u16 = 2000;
    const MARGIN: u16 = 110;

    #[test]
    fn test_zero_maps_to_center() {
        assert_eq!(apply(0, PERIOD, MARGIN), 1000);
        assert_eq!(apply(0, PERIOD, 0), 1000);
    }

    #[test]
    fn test_in_range_values_shift_linearly() {
        assert_eq!(apply(500, PERIOD, MARGIN), 1500);
        assert_eq!(apply(-500, PERIOD, MARGIN), 500);
    }

    #[test]
    fn test_saturates_at_foc_margin() {
        assert_eq!(apply(i16::MAX, PERIOD, MARGIN), PERIOD - MARGIN);
        assert_eq!(apply(i16::MIN, PERIOD, MARGIN), MARGIN);
        // exactly on the boundary passes through
        assert_eq!(apply(890, PERIOD, MARGIN), 1890);
        assert_eq!(apply(891, PERIOD, MARGIN), 1890);
        assert_eq!(apply(-890, PERIOD, MARGIN), 110);
        assert_eq!(apply(-891, PERIOD, MARGIN), 110);
    }

    #[test]
    fn test_zero_margin_uses_full_window() {
        assert_eq!(apply(i16::MAX, PERIOD, 0), PERIOD);
        assert_eq!(apply(i16::MIN, PERIOD, 0), 0);
    }

    #[test]
    fn test_margin_only_in_foc_mode() {
        assert_eq!(margin_for(ControlType::FieldOriented, MARGIN), MARGIN);
        assert_eq!(margin_for(ControlType::Commutation, MARGIN), 0);
        assert_eq!(margin_for(ControlType::Sinusoidal, MARGIN), 0);
    }
}
