// Copyright 2026 Cornell University
// released under MIT License

use crate::registry::Ports;

/// A design under test. The harness owns the ports; the DUT reads its
/// inputs from them and writes its outputs back during `invoke`.
pub trait Dut {
    /// Advances the design by exactly one step
    fn invoke(&mut self, ports: &mut Ports);

    /// Opaque code of the design's current control state, for designs that
    /// expose one
    fn debug_state(&self) -> Option<u64> {
        None
    }
}
