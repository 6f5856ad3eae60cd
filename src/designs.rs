// Copyright 2026 Cornell University
// released under MIT License

//! Built-in designs: DUT models together with the interface registry a
//! testbench generator would emit for them.

use clap::ValueEnum;
use log::info;

use crate::dut::Dut;
use crate::registry::{BindingId, Ports, Registry, RegistryError};
use crate::report::StateNames;
use crate::word::{AxisCodec, ScalarCodec};

/// Stream kind of the example designs' AXI4-Stream ports
pub const AXIS_KIND: &str = "uaxis_l";

/// Everything the harness needs to know about a design
pub struct Design {
    /// Name used in the run banners
    pub name: String,
    pub registry: Registry,
    pub dut: Box<dyn Dut>,
    /// Names of the codes returned by `Dut::debug_state`
    pub state_names: StateNames,
}

/// The designs that can be selected from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DesignKind {
    /// Adds one to the data of every word it forwards
    Increment,
    /// Five-state header/payload FSM with handshake signals
    Sample,
}

impl DesignKind {
    pub fn build(self) -> Result<Design, RegistryError> {
        let design = match self {
            DesignKind::Increment => increment()?,
            DesignKind::Sample => sample()?,
        };
        info!(
            "Built design `{}` with {} interfaces",
            design.name,
            design.registry.len()
        );
        Ok(design)
    }
}

/// Forwards one word from `axis_input` to `axis_output` per invocation,
/// incrementing `data` and copying `last`
pub struct IncrementDut {
    input: BindingId,
    output: BindingId,
    codec: AxisCodec,
}

impl Dut for IncrementDut {
    fn invoke(&mut self, ports: &mut Ports) {
        if let Some(word) = ports.pop(self.input) {
            let data = word.value(0).wrapping_add(1);
            let last = word.value(1) == 1;
            ports.push(self.output, self.codec.word(data, last));
        }
    }
}

pub fn increment() -> Result<Design, RegistryError> {
    let codec = AxisCodec::new(AXIS_KIND, 64);
    let registry = Registry::builder()
        .stream_in("axis_input", codec.clone())
        .stream_out("axis_output", codec.clone())
        .build()?;
    let dut = IncrementDut {
        input: registry["axis_input"].id(),
        output: registry["axis_output"].id(),
        codec,
    };
    Ok(Design {
        name: "increment".to_string(),
        registry,
        dut: Box::new(dut),
        state_names: StateNames::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleState {
    Header = 0,
    Payload = 1,
    Output = 2,
    Ack1 = 3,
    Ack2 = 4,
}

/// Reads a header word (only while `enable` is high) and a payload word,
/// raising `ack` for one step after each, then emits `payload + 1`
pub struct SampleDut {
    input: BindingId,
    output: BindingId,
    enable: BindingId,
    ack: BindingId,
    state_out: BindingId,
    axis: AxisCodec,
    ack_codec: ScalarCodec,
    state_codec: ScalarCodec,
    state: SampleState,
    payload: u64,
}

impl Dut for SampleDut {
    fn invoke(&mut self, ports: &mut Ports) {
        let enabled = ports.signal(self.enable).value(0) == 1;
        let ack = match self.state {
            SampleState::Header => {
                if !ports.is_empty(self.input) && enabled {
                    ports.pop(self.input);
                    self.state = SampleState::Ack1;
                }
                0
            }
            SampleState::Ack1 => {
                self.state = SampleState::Payload;
                1
            }
            SampleState::Payload => {
                if let Some(word) = ports.pop(self.input) {
                    self.payload = word.value(0);
                    self.state = SampleState::Ack2;
                }
                0
            }
            SampleState::Ack2 => {
                self.state = SampleState::Output;
                1
            }
            SampleState::Output => {
                let word = self.axis.word(self.payload.wrapping_add(1), false);
                ports.push(self.output, word);
                self.state = SampleState::Header;
                0
            }
        };
        ports.set_signal(self.ack, self.ack_codec.word(ack));
        ports.set_signal(self.state_out, self.state_codec.word(self.state as u64));
    }

    fn debug_state(&self) -> Option<u64> {
        Some(self.state as u64)
    }
}

pub fn sample() -> Result<Design, RegistryError> {
    let axis = AxisCodec::new(AXIS_KIND, 64);
    let ack_codec = ScalarCodec::new(1);
    let state_codec = ScalarCodec::new(3);
    let registry = Registry::builder()
        .stream_in("axis_input", axis.clone())
        .stream_out("axis_output", axis.clone())
        .signal_in("enable", ScalarCodec::new(1))
        .signal_out("ack", ack_codec.clone())
        .signal_out("state_out", state_codec.clone())
        .build()?;
    let dut = SampleDut {
        input: registry["axis_input"].id(),
        output: registry["axis_output"].id(),
        enable: registry["enable"].id(),
        ack: registry["ack"].id(),
        state_out: registry["state_out"].id(),
        axis,
        ack_codec,
        state_codec,
        state: SampleState::Header,
        payload: 3,
    };
    let state_names = StateNames::new()
        .with(SampleState::Header as u64, "st_header")
        .with(SampleState::Payload as u64, "st_payload")
        .with(SampleState::Output as u64, "st_output")
        .with(SampleState::Ack1 as u64, "ack1")
        .with(SampleState::Ack2 as u64, "ack2");
    Ok(Design {
        name: "sample".to_string(),
        registry,
        dut: Box::new(dut),
        state_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_forwards_one_word_per_invocation() {
        let mut design = increment().unwrap();
        let mut ports = Ports::new(&design.registry);
        let input = &design.registry["axis_input"];
        let output = design.registry["axis_output"].id();
        input.write(&mut ports, input.codec().encode(&[5, 0]).unwrap());
        input.write(&mut ports, input.codec().encode(&[u64::MAX, 1]).unwrap());

        design.dut.invoke(&mut ports);
        assert_eq!(ports.occupancy(output), 1);
        design.dut.invoke(&mut ports);
        design.dut.invoke(&mut ports);
        let words: Vec<Vec<u64>> = ports.drain(output).iter().map(|w| w.values()).collect();
        assert_eq!(words, vec![vec![6, 0], vec![0, 1]]);
        assert_eq!(design.dut.debug_state(), None);
    }

    #[test]
    fn sample_walks_through_its_states() {
        let mut design = sample().unwrap();
        let registry = &design.registry;
        let mut ports = Ports::new(registry);
        let input = &registry["axis_input"];
        let enable = &registry["enable"];
        let ack = registry["ack"].id();
        let output = registry["axis_output"].id();
        input.write(&mut ports, input.codec().encode(&[0xAA, 0]).unwrap());
        input.write(&mut ports, input.codec().encode(&[41, 1]).unwrap());

        // the header is not consumed while `enable` is low
        design.dut.invoke(&mut ports);
        assert_eq!(design.dut.debug_state(), Some(SampleState::Header as u64));
        assert_eq!(ports.occupancy(input.id()), 2);

        enable.write(&mut ports, enable.codec().encode(&[1]).unwrap());
        let mut trace = vec![];
        for _ in 0..5 {
            design.dut.invoke(&mut ports);
            trace.push((
                design.state_names.describe(design.dut.debug_state().unwrap()),
                ports.signal(ack).value(0),
            ));
        }
        let expected = [
            ("ack1", 0),
            ("st_payload", 1),
            ("ack2", 0),
            ("st_output", 1),
            ("st_header", 0),
        ];
        let trace: Vec<(&str, u64)> = trace.iter().map(|(s, a)| (s.as_str(), *a)).collect();
        assert_eq!(trace, expected);
        assert_eq!(ports.pop(output).unwrap().values(), vec![42, 0]);
        let state_out = registry["state_out"].id();
        assert_eq!(ports.signal(state_out).value(0), 0);
    }

    #[test]
    fn design_kinds_build_their_registries() {
        let design = DesignKind::Sample.build().unwrap();
        assert_eq!(design.name, "sample");
        assert_eq!(design.registry.len(), 5);
        assert_eq!(design.registry["axis_output"].codec().kind(), AXIS_KIND);
        assert_eq!(design.registry["state_out"].codec().kind(), "uint_3");
        let increment = DesignKind::Increment.build().unwrap();
        assert_eq!(increment.registry.streams().count(), 2);
    }
}
