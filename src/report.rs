// Copyright 2026 Cornell University
// released under MIT License

//! # Reporting
//! Formats everything the harness prints besides fatal diagnostics:
//! verification results, test-case verdicts and the optional introspection
//! dumps (stream occupancy, DUT state, leftover stream contents).
//! None of this output influences whether a test case passes.

use std::io::{self, Write};

use itertools::Itertools;
use log::warn;
use rustc_hash::FxHashMap;

use crate::ledger::CaseResult;
use crate::registry::{Ports, Registry};

/// Run-time switches that control the optional output of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Print successful comparisons as well as mismatches
    pub print_matches: bool,
    /// Dump the occupancy of every stream after each directive
    pub print_interfaces: bool,
    /// Drain and print every stream still holding words at the end of the run
    pub read_interfaces: bool,
    /// Print the DUT's control state after each invocation
    pub print_states: bool,
    /// Print values in hexadecimal instead of decimal
    pub display_hex: bool,
}

/// Serializes a value. If `display_hex = true`, the value is printed
/// in hexadecimal, otherwise it is displayed in decimal.
pub fn serialize_value(value: u64, display_hex: bool) -> String {
    if display_hex {
        format!("0x{value:x}")
    } else {
        value.to_string()
    }
}

/// Space-separated list of values
pub fn serialize_values(values: &[u64], display_hex: bool) -> String {
    values
        .iter()
        .map(|value| serialize_value(*value, display_hex))
        .join(" ")
}

/// Maps the opaque state codes returned by a DUT's debug accessor to names
#[derive(Debug, Clone, Default)]
pub struct StateNames {
    names: FxHashMap<u64, String>,
}

impl StateNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: u64, name: &str) -> Self {
        self.names.insert(code, name.to_string());
        self
    }

    pub fn get(&self, code: u64) -> Option<&str> {
        self.names.get(&code).map(String::as_str)
    }

    /// Name of `code`, or an error string for codes the table does not know
    pub fn describe(&self, code: u64) -> String {
        match self.get(code) {
            Some(name) => name.to_string(),
            None => format!("Error: Unknown state code {code}"),
        }
    }
}

pub struct Reporter {
    options: RunOptions,
    state_names: StateNames,
    /// Set once we have warned that the DUT exposes no debug state
    warned_stateless: bool,
}

impl Reporter {
    pub fn new(options: RunOptions, state_names: StateNames) -> Self {
        Self {
            options,
            state_names,
            warned_stateless: false,
        }
    }

    pub fn banner_start(&self, out: &mut dyn Write, design: &str) -> io::Result<()> {
        write!(out, "\n*** Starting {}_TB ***\n\n", design.to_uppercase())
    }

    pub fn banner_finish(&self, out: &mut dyn Write, design: &str) -> io::Result<()> {
        writeln!(out, "\n*** Finishing {}_TB ***", design.to_uppercase())
    }

    pub fn mismatch(
        &self,
        out: &mut dyn Write,
        id: &str,
        expected: &[u64],
        observed: &[u64],
    ) -> io::Result<()> {
        let hex = self.options.display_hex;
        writeln!(out, "Mismatch at id: {id}")?;
        writeln!(out, "   Expected: {}", serialize_values(expected, hex))?;
        writeln!(out, "   Received: {}", serialize_values(observed, hex))
    }

    /// Only prints when `print_matches` is set
    pub fn matched(&self, out: &mut dyn Write, id: &str, observed: &[u64]) -> io::Result<()> {
        if !self.options.print_matches {
            return Ok(());
        }
        writeln!(out, "Match at id: {id}")?;
        writeln!(
            out,
            "   Received: {}",
            serialize_values(observed, self.options.display_hex)
        )
    }

    pub fn case(&self, out: &mut dyn Write, result: &CaseResult) -> io::Result<()> {
        let verdict = if result.valid { "successful" } else { "failed" };
        writeln!(out, "Test {} {}", result.label, verdict)
    }

    /// Text of a `timestamp` / `display` directive
    pub fn display(&self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        writeln!(out, "{text}")
    }

    /// Only prints when `print_interfaces` is set
    pub fn stream_statuses(
        &self,
        out: &mut dyn Write,
        registry: &Registry,
        ports: &Ports,
    ) -> io::Result<()> {
        if !self.options.print_interfaces {
            return Ok(());
        }
        writeln!(out, "Stream statuses:")?;
        for binding in registry.streams() {
            let occupancy = ports.occupancy(binding.id());
            writeln!(out, "  {}: {occupancy}", binding.name())?;
        }
        Ok(())
    }

    /// Only prints when `print_states` is set. `state` is the DUT's debug
    /// state, if it has one.
    pub fn state(&mut self, out: &mut dyn Write, state: Option<u64>) -> io::Result<()> {
        if !self.options.print_states {
            return Ok(());
        }
        match state {
            Some(code) => writeln!(out, "Current State is {}", self.state_names.describe(code)),
            None => {
                if !self.warned_stateless {
                    warn!("state printing requested but the DUT has no debug state");
                    self.warned_stateless = true;
                }
                Ok(())
            }
        }
    }

    /// Only prints when `read_interfaces` is set. Empties every stream that
    /// still holds words, printing one line per word.
    pub fn leftovers(
        &self,
        out: &mut dyn Write,
        registry: &Registry,
        ports: &mut Ports,
    ) -> io::Result<()> {
        if !self.options.read_interfaces {
            return Ok(());
        }
        for binding in registry.streams() {
            for word in ports.drain(binding.id()) {
                writeln!(
                    out,
                    "{}: {}",
                    binding.name(),
                    serialize_values(&word.values(), self.options.display_hex)
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::word::AxisCodec;
    use insta::assert_snapshot;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = vec![];
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn values_in_decimal_or_hex() {
        assert_eq!(serialize_values(&[6, 0], false), "6 0");
        assert_eq!(serialize_values(&[255, 1], true), "0xff 0x1");
        assert_eq!(serialize_values(&[], false), "");
    }

    #[test]
    fn mismatch_lines() {
        let reporter = Reporter::new(RunOptions::default(), StateNames::new());
        let text = render(|out| reporter.mismatch(out, "a2", &[7, 0], &[6, 0]));
        assert_snapshot!(text.trim_end(), @r"
        Mismatch at id: a2
           Expected: 7 0
           Received: 6 0
        ");
    }

    #[test]
    fn matches_are_only_printed_on_request() {
        let quiet = Reporter::new(RunOptions::default(), StateNames::new());
        assert_eq!(render(|out| quiet.matched(out, "a2", &[6, 0])), "");

        let options = RunOptions {
            print_matches: true,
            display_hex: true,
            ..RunOptions::default()
        };
        let verbose = Reporter::new(options, StateNames::new());
        assert_eq!(
            render(|out| verbose.matched(out, "a2", &[10, 1])),
            "Match at id: a2\n   Received: 0xa 0x1\n"
        );
    }

    #[test]
    fn case_verdicts() {
        let reporter = Reporter::new(RunOptions::default(), StateNames::new());
        let mut ledger = Ledger::new();
        let passed = ledger.close_case("a2");
        ledger.record_mismatch("x", &[1], &[2]);
        let failed = ledger.close_case("b7");
        let passed = render(|out| reporter.case(out, &passed));
        let failed = render(|out| reporter.case(out, &failed));
        assert_eq!(passed, "Test a2 successful\n");
        assert_eq!(failed, "Test b7 failed\n");
    }

    #[test]
    fn banners_use_the_upper_case_design_name() {
        let reporter = Reporter::new(RunOptions::default(), StateNames::new());
        assert_eq!(
            render(|out| reporter.banner_start(out, "sample")),
            "\n*** Starting SAMPLE_TB ***\n\n"
        );
        assert_eq!(
            render(|out| reporter.banner_finish(out, "sample")),
            "\n*** Finishing SAMPLE_TB ***\n"
        );
    }

    #[test]
    fn state_codes_are_decoded() {
        let names = StateNames::new().with(0, "st_header").with(3, "ack1");
        assert_eq!(names.describe(3), "ack1");
        assert_eq!(names.describe(9), "Error: Unknown state code 9");

        let options = RunOptions {
            print_states: true,
            ..RunOptions::default()
        };
        let mut reporter = Reporter::new(options, names);
        assert_eq!(
            render(|out| reporter.state(out, Some(0))),
            "Current State is st_header\n"
        );
        assert_eq!(
            render(|out| reporter.state(out, Some(7))),
            "Current State is Error: Unknown state code 7\n"
        );
        assert_eq!(render(|out| reporter.state(out, None)), "");
        assert_eq!(render(|out| reporter.state(out, None)), "");
    }

    #[test]
    fn stream_dumps() {
        let registry = Registry::builder()
            .stream_in("axis_input", AxisCodec::new("uaxis_l", 64))
            .stream_out("axis_output", AxisCodec::new("uaxis_l", 64))
            .build()
            .unwrap();
        let mut ports = Ports::new(&registry);
        let input = &registry["axis_input"];
        input.write(&mut ports, input.codec().encode(&[5, 0]).unwrap());
        input.write(&mut ports, input.codec().encode(&[9, 1]).unwrap());

        let options = RunOptions {
            print_interfaces: true,
            read_interfaces: true,
            ..RunOptions::default()
        };
        let reporter = Reporter::new(options, StateNames::new());
        let statuses = render(|out| reporter.stream_statuses(out, &registry, &ports));
        assert_snapshot!(statuses.trim_end(), @r"
        Stream statuses:
          axis_input: 2
          axis_output: 0
        ");

        let leftovers = render(|out| reporter.leftovers(out, &registry, &mut ports));
        assert_eq!(leftovers, "axis_input: 5 0\naxis_input: 9 1\n");
        assert_eq!(ports.occupancy(input.id()), 0);
    }
}
