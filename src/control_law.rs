// Control law boundary
//
// The commutation/torque control law itself is a pre-built model supplied
// by the application (one instance per motor). This module only defines the
// records exchanged with it once per tick and the trait it is invoked
// through; the law's internal mathematics are out of scope here.

/// Commutation method selected for one motor.
///
/// Configured externally and never mutated by the core. Field-oriented
/// control is the only variant that needs a reserved sampling margin in the
/// PWM window (see `bldc::duty`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlType {
    /// Trapezoidal six-step commutation
    Commutation,
    /// Sinusoidal commutation
    Sinusoidal,
    /// Field oriented control
    FieldOriented,
}

/// Inputs handed to the control law, one record per motor per tick.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LawInput {
    /// Final enable (request AND no fault on either motor)
    pub enable: bool,
    /// Selected commutation method
    pub ctrl_type: ControlType,
    /// Signed target duty from the input-decoding collaborator, ~[-1000, 1000]
    pub target: i16,
    /// Hall sensor states (active level, already inverted from the raw lines)
    pub hall_a: bool,
    pub hall_b: bool,
    pub hall_c: bool,
    /// Measured phase current between phases A and B [ADC counts]
    pub cur_pha_ab: i16,
    /// Measured phase current between phases B and C [ADC counts]
    pub cur_pha_bc: i16,
    /// Measured DC link current [ADC counts]
    pub cur_dc_link: i16,
    /// Optional mechanical angle in degrees, fixdt(1,16,4). Unused by default;
    /// an integer angle `a` converts as `(a << 4) as i16`.
    pub mech_angle: Option<i16>,
}

impl Default for LawInput {
    fn default() -> Self {
        Self {
            enable: false,
            ctrl_type: ControlType::FieldOriented,
            target: 0,
            hall_a: false,
            hall_b: false,
            hall_c: false,
            cur_pha_ab: 0,
            cur_pha_bc: 0,
            cur_dc_link: 0,
            mech_angle: None,
        }
    }
}

/// Outputs read back from the control law after each step.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LawOutput {
    /// Raw phase duty commands, signed and centered at zero
    pub duty_a: i16,
    pub duty_b: i16,
    pub duty_c: i16,
    /// Fault code; the core only interprets zero/non-zero
    pub err_code: u8,
    /// Speed telemetry, not consumed by the core
    pub speed: i16,
    /// Electrical angle telemetry, not consumed by the core
    pub elec_angle: i16,
}

/// The per-motor control law model.
///
/// Stepped exactly once per motor per tick from the interrupt context; an
/// implementation must not block.
pub trait ControlLaw {
    fn step(&mut self, input: &LawInput) -> LawOutput;
}
