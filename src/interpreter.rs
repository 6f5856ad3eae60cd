// Copyright 2026 Cornell University
// released under MIT License

//! # Directive interpreter
//! Executes a script one directive at a time against a design: stimulus is
//! pushed into the design's input ports, outputs are popped and compared
//! with the expectations written in the script, and the DUT is invoked
//! only when the script asks for it.

use std::io::Write;

use log::{info, warn};

use crate::designs::Design;
use crate::diagnostic::DiagnosticHandler;
use crate::dut::Dut;
use crate::errors::{DiagnosticEmitter, HarnessError, HarnessResult};
use crate::ledger::{CaseResult, Ledger};
use crate::registry::{Binding, Direction, PortKind, Ports, Registry};
use crate::report::{Reporter, RunOptions};
use crate::script::{Directive, DirectiveKind, ScriptReader};
use crate::word::CodecError;

/// `timestamp` / `display` ids that are never printed
const SILENT_ID: &str = "INIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Reached `finish`; nothing else is read
    Finished,
}

/// Outcome of a run that did not hit a fatal error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Verdicts of every test case closed by an `end` directive
    pub cases: Vec<CaseResult>,
    /// Total number of DUT invocations
    pub invocations: u64,
    /// Whether the script ended with `finish` (rather than running out of records)
    pub finished: bool,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(|case| case.valid)
    }
}

pub struct Interpreter<'a> {
    design_name: &'a str,
    registry: &'a Registry,
    dut: &'a mut dyn Dut,
    ports: Ports,
    ledger: Ledger,
    reporter: Reporter,
    state: RunState,
    cases: Vec<CaseResult>,
    invocations: u64,
    out: &'a mut dyn Write,
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter for `design` that writes its report to `out`
    pub fn new(design: &'a mut Design, options: RunOptions, out: &'a mut dyn Write) -> Self {
        let Design {
            name,
            registry,
            dut,
            state_names,
        } = design;
        let registry: &'a Registry = registry;
        Self {
            design_name: name.as_str(),
            registry,
            dut: dut.as_mut(),
            ports: Ports::new(registry),
            ledger: Ledger::new(),
            reporter: Reporter::new(options, state_names.clone()),
            state: RunState::Running,
            cases: vec![],
            invocations: 0,
            out,
        }
    }

    /// The registry of the design being run. Scripts for this interpreter
    /// must be read against it.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Runs the whole script. A fatal error is reported through `handler`
    /// and returned; no directive after the offending one is processed.
    pub fn run(
        &mut self,
        reader: &mut ScriptReader,
        handler: &mut DiagnosticHandler,
    ) -> HarnessResult<RunSummary> {
        self.execute(reader).inspect_err(|error| {
            DiagnosticEmitter::emit_harness_error(handler, error);
        })
    }

    fn execute(&mut self, reader: &mut ScriptReader) -> HarnessResult<RunSummary> {
        self.reporter.banner_start(self.out, self.design_name)?;
        while self.state == RunState::Running {
            match reader.next_directive()? {
                Some(directive) => self.step(&directive)?,
                None => {
                    warn!("Script ended without a `finish` directive");
                    break;
                }
            }
        }
        self.reporter
            .leftovers(self.out, self.registry, &mut self.ports)?;
        self.reporter.banner_finish(self.out, self.design_name)?;
        Ok(RunSummary {
            cases: std::mem::take(&mut self.cases),
            invocations: self.invocations,
            finished: self.state == RunState::Finished,
        })
    }

    /// Fully processes one directive, including any invocations it requests
    pub fn step(&mut self, directive: &Directive) -> HarnessResult<()> {
        info!(
            "Line {}: `{}` (id: {}, args: {:?})",
            directive.line, directive.tag, directive.id, directive.args
        );
        match directive.kind {
            DirectiveKind::InterfaceIn => {
                let binding = self.binding(directive, Direction::Input)?;
                self.write(binding, directive)?;
            }
            DirectiveKind::InterfaceOut => {
                let binding = self.binding(directive, Direction::Output)?;
                self.check(binding, directive)?;
            }
            DirectiveKind::Signal => {
                let binding = self.signal(directive)?;
                match binding.direction() {
                    Direction::Input => self.write(binding, directive)?,
                    Direction::Output => self.check(binding, directive)?,
                }
            }
            DirectiveKind::TimestampOrDisplay => {
                if directive.id != SILENT_ID {
                    self.reporter.display(self.out, &directive.id)?;
                }
            }
            DirectiveKind::InvokeDut => {
                self.invoke(directive.invoke_count.unwrap_or_default())?;
            }
            DirectiveKind::EndTest => {
                let result = self.ledger.close_case(&directive.id);
                self.reporter.case(self.out, &result)?;
                self.cases.push(result);
            }
            DirectiveKind::Finish => {
                info!("Reached `finish` on line {}", directive.line);
                self.state = RunState::Finished;
                return Ok(());
            }
            DirectiveKind::Unknown => {
                return Err(HarnessError::UnknownDirective {
                    tag: directive.tag.clone(),
                    loc: directive.tag_loc,
                });
            }
        }

        // any record may ask for invocations once it has been processed
        if directive.kind != DirectiveKind::InvokeDut {
            if let Some(count) = directive.invoke_count.filter(|count| *count > 0) {
                self.invoke(count)?;
            }
        }

        self.reporter
            .stream_statuses(self.out, self.registry, &self.ports)?;
        Ok(())
    }

    /// Resolves the stream a directive refers to and checks its stream kind
    fn binding(&self, directive: &Directive, direction: Direction) -> HarnessResult<&'a Binding> {
        let binding = self
            .registry
            .resolve(directive.port(), direction)
            .map_err(|not_found| HarnessError::Unresolved {
                not_found,
                loc: directive.tag_loc,
            })?;
        self.check_stream_kind(binding, directive)?;
        Ok(binding)
    }

    /// Resolves the scalar port of a `signal` directive
    fn signal(&self, directive: &Directive) -> HarnessResult<&'a Binding> {
        let binding = self
            .registry
            .lookup(directive.port())
            .filter(|binding| binding.kind() == PortKind::Signal)
            .ok_or_else(|| HarnessError::NotASignal {
                port: directive.port().to_string(),
                loc: directive.loc,
            })?;
        self.check_stream_kind(binding, directive)?;
        Ok(binding)
    }

    fn check_stream_kind(&self, binding: &Binding, directive: &Directive) -> HarnessResult<()> {
        match &directive.stream_kind {
            Some(kind) if kind != binding.codec().kind() => Err(HarnessError::StreamKindMismatch {
                interface: binding.name().to_string(),
                declared: binding.codec().kind().to_string(),
                found: kind.clone(),
                loc: directive.loc,
            }),
            _ => Ok(()),
        }
    }

    fn codec_error(
        binding: &Binding,
        directive: &Directive,
    ) -> impl FnOnce(CodecError) -> HarnessError {
        let interface = binding.name().to_string();
        let loc = directive.loc;
        move |error| HarnessError::Codec {
            interface,
            error,
            loc,
        }
    }

    fn write(&mut self, binding: &Binding, directive: &Directive) -> HarnessResult<()> {
        let word = binding
            .codec()
            .encode(&directive.args)
            .map_err(Self::codec_error(binding, directive))?;
        binding.write(&mut self.ports, word);
        Ok(())
    }

    /// Reads one word from `binding` and compares it with the directive's arguments.
    /// Expectations that do not fit the interface are fatal.
    fn check(&mut self, binding: &Binding, directive: &Directive) -> HarnessResult<()> {
        let codec = binding.codec();
        codec
            .check_arity(directive.args.len())
            .and_then(|()| codec.check_fits(&directive.args))
            .map_err(Self::codec_error(binding, directive))?;
        let word = binding
            .read(&mut self.ports)
            .ok_or_else(|| HarnessError::EmptyInterface {
                interface: binding.name().to_string(),
                id: directive.id.clone(),
                loc: directive.loc,
            })?;
        let observed = codec
            .decode(&word)
            .map_err(Self::codec_error(binding, directive))?;
        if codec.equal(&directive.args, &observed) {
            self.ledger.record_match(&directive.id);
            self.reporter.matched(self.out, &directive.id, &observed)?;
        } else {
            info!(
                "Mismatch on `{}` at id {}: expected {:?}, observed {:?}",
                binding.name(),
                directive.id,
                directive.args,
                observed
            );
            self.ledger
                .record_mismatch(&directive.id, &directive.args, &observed);
            self.reporter
                .mismatch(self.out, &directive.id, &directive.args, &observed)?;
        }
        Ok(())
    }

    fn invoke(&mut self, count: u64) -> HarnessResult<()> {
        for _ in 0..count {
            self.dut.invoke(&mut self.ports);
            self.invocations += 1;
            self.reporter.state(self.out, self.dut.debug_state())?;
        }
        Ok(())
    }
}
