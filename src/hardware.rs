// Hardware boundary
//
// The core never touches peripherals directly. The board layer owns the
// ADC/DMA, GPIO and timers, and hands the core one sample record per
// conversion-complete event plus the raw hall line levels; duty and
// output-enable commands flow back through the `MotorBridge` trait.

/// One full set of raw ADC samples, captured by the acquisition hardware
/// once per trigger event.
///
/// Phase shunts are split 2/2 across the sides: the left bridge measures
/// phases A and B, the right bridge phases B and C. Both sides have a DC
/// link shunt. `batt` is the supply voltage divider, `temp` the auxiliary
/// board-temperature channel (sampled but not consumed by the core).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcBuffer {
    pub left_pha_a: u16,
    pub left_pha_b: u16,
    pub right_pha_b: u16,
    pub right_pha_c: u16,
    pub left_dc: u16,
    pub right_dc: u16,
    pub batt: u16,
    pub temp: u16,
}

/// Raw hall line levels for one motor, as read from the GPIO inputs.
///
/// The sensors are wired active-low; `active()` yields the logical states
/// the decoder and the control law expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HallLines {
    pub a: bool,
    pub b: bool,
    pub c: bool,
}

impl HallLines {
    /// Invert the raw active-low levels into logical hall states.
    pub fn active(self) -> (bool, bool, bool) {
        (!self.a, !self.b, !self.c)
    }
}

/// One motor's PWM bridge as seen by the core.
///
/// Both methods are called every control tick from the interrupt context
/// and must be non-blocking register writes.
pub trait MotorBridge {
    /// Master output enable of the bridge. Forced off for hard overcurrent
    /// cutoff or when enable is not requested; forced on otherwise.
    fn set_output_enable(&mut self, on: bool);

    /// Three phase compare values in timer units, already clamped into the
    /// valid window by the duty stage.
    fn set_duty(&mut self, pha_a: u16, pha_b: u16, pha_c: u16);
}
