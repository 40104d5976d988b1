// Current acquisition and hard overcurrent cutoff
//
// Signed currents are derived as (calibration offset - raw sample); the
// sign convention is fixed by the shunt wiring and never reinterpreted.
// The phase shunts are split across the sides (left measures A/B, right
// B/C), the DC link is measured on both.
//
// The cutoff implemented here is the Level 2 protection: a purely
// combinational decision per motor per tick with no hysteresis and no
// latch. The lower Level 1 threshold lives inside the control law, which
// only receives the raw current values from here.

use crate::bldc::calibration::AdcOffsets;
use crate::hardware::AdcBuffer;

/// Measured currents for one motor [ADC counts].
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorCurrents {
    /// Phase current between phases A and B
    pub pha_ab: i16,
    /// Phase current between phases B and C
    pub pha_bc: i16,
    /// DC link current
    pub dc_link: i16,
}

/// Left motor currents from the frozen offsets and this tick's samples.
pub fn left_currents(offsets: &AdcOffsets, adc: &AdcBuffer) -> MotorCurrents {
    MotorCurrents {
        pha_ab: (offsets.left_pha_a as i32 - adc.left_pha_a as i32) as i16,
        pha_bc: (offsets.left_pha_b as i32 - adc.left_pha_b as i32) as i16,
        dc_link: (offsets.left_dc as i32 - adc.left_dc as i32) as i16,
    }
}

/// Right motor currents from the frozen offsets and this tick's samples.
pub fn right_currents(offsets: &AdcOffsets, adc: &AdcBuffer) -> MotorCurrents {
    MotorCurrents {
        pha_ab: (offsets.right_pha_b as i32 - adc.right_pha_b as i32) as i16,
        pha_bc: (offsets.right_pha_c as i32 - adc.right_pha_c as i32) as i16,
        dc_link: (offsets.right_dc as i32 - adc.right_dc as i32) as i16,
    }
}

/// Level 2 cutoff decision for one motor's bridge.
///
/// The bridge output stays enabled only while the DC link current magnitude
/// is at or below the hard limit AND enable is requested. Strictly above
/// the limit (or with no enable request) the bridge is forced off for this
/// tick; the decision is re-evaluated every tick on present-tick data.
pub fn bridge_enabled(dc_link: i16, dc_limit: i16, enable_req: bool) -> bool {
    enable_req && (dc_link as i32).abs() <= dc_limit as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_sign_convention() {
        let offsets = AdcOffsets {
            left_pha_a: 2000,
            left_pha_b: 2000,
            right_pha_b: 2000,
            right_pha_c: 2000,
            left_dc: 2000,
            right_dc: 2000,
        };
        let adc = AdcBuffer {
            left_pha_a: 1900, // below offset -> positive current
            left_pha_b: 2100, // above offset -> negative current
            right_pha_b: 2000,
            right_pha_c: 1500,
            left_dc: 1995,
            right_dc: 2005,
            batt: 0,
            temp: 0,
        };
        let left = left_currents(&offsets, &adc);
        assert_eq!(left.pha_ab, 100);
        assert_eq!(left.pha_bc, -100);
        assert_eq!(left.dc_link, 5);
        let right = right_currents(&offsets, &adc);
        assert_eq!(right.pha_ab, 0);
        assert_eq!(right.pha_bc, 500);
        assert_eq!(right.dc_link, -5);
    }

    #[test]
    fn test_cutoff_threshold_boundary() {
        let limit = 850;
        // just below, at, just above - both polarities
        assert!(bridge_enabled(849, limit, true));
        assert!(bridge_enabled(850, limit, true));
        assert!(!bridge_enabled(851, limit, true));
        assert!(bridge_enabled(-849, limit, true));
        assert!(bridge_enabled(-850, limit, true));
        assert!(!bridge_enabled(-851, limit, true));
    }

    #[test]
    fn test_cutoff_requires_enable_request() {
        assert!(!bridge_enabled(0, 850, false));
        assert!(!bridge_enabled(10_000, 850, false));
    }

    #[test]
    fn test_cutoff_handles_extreme_current() {
        // i16::MIN magnitude must not overflow the comparison
        assert!(!bridge_enabled(i16::MIN, 850, true));
        assert!(!bridge_enabled(i16::MAX, 850, true));
    }
}
