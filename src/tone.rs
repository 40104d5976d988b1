// Tone generator boundary
//
// The audible-alert generator shares the drive's tick source but has no
// coupling to motor safety, so it is only an interface here. An
// implementation reads its three externally configured values (frequency
// divisor, repeat pattern, burst count) plus the tick counter it is handed,
// and drives a single binary output line.

/// Collaborator ticked once per processed scheduler invocation.
///
/// Not called on ticks dropped by the overrun guard.
pub trait ToneGenerator {
    fn tick(&mut self, tick: u64);
}

/// Silent placeholder for boards without a buzzer.
impl ToneGenerator for () {
    fn tick(&mut self, _tick: u64) {}
}
