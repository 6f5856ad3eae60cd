// Copyright 2026 Cornell University
// released under MIT License

use crate::diagnostic::{DiagnosticHandler, Level, Loc};
use crate::registry::{NotFound, RegistryError};
use crate::word::CodecError;
use thiserror::Error;

/// Fatal harness errors. Any of these aborts the run; verification
/// mismatches are not errors and are recorded by the `Ledger` instead.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The script file could not be opened or read
    #[error("Unable to open test data file `{path}`: {reason}")]
    ScriptUnreadable { path: String, reason: String },
    /// The configured base directory does not exist
    #[error("Base directory `{0}` does not exist")]
    MissingBaseDir(String),
    #[error("The maximum argument width must be between 1 and 64 bits, got {0}")]
    InvalidArgWidth(u32),
    /// A record that does not follow the script layout
    #[error("{message}")]
    Parse {
        message: String,
        label: String,
        loc: Loc,
    },
    #[error("Unknown interfaceType: {tag}")]
    UnknownDirective { tag: String, loc: Loc },
    /// The script names an interface the registry does not declare
    #[error("Unresolved interface: {not_found}")]
    Unresolved { not_found: NotFound, loc: Loc },
    /// A `signal` directive naming a stream or an undeclared port
    #[error("`{port}` is not a signal port")]
    NotASignal { port: String, loc: Loc },
    #[error("Interface `{interface}` uses stream kind `{declared}` but the script says `{found}`")]
    StreamKindMismatch {
        interface: String,
        declared: String,
        found: String,
        loc: Loc,
    },
    #[error("Interface `{interface}`: {error}")]
    Codec {
        interface: String,
        error: CodecError,
        loc: Loc,
    },
    /// An interface-out directive found nothing to read
    #[error("Read from empty interface `{interface}` at id: {id}")]
    EmptyInterface {
        interface: String,
        id: String,
        loc: Loc,
    },
    #[error("Invalid interface registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn parse(message: impl ToString, label: impl ToString, loc: Loc) -> Self {
        HarnessError::Parse {
            message: message.to_string(),
            label: label.to_string(),
            loc,
        }
    }

    /// Location of the offending script record, if there is one
    pub fn loc(&self) -> Option<Loc> {
        match self {
            HarnessError::Parse { loc, .. }
            | HarnessError::UnknownDirective { loc, .. }
            | HarnessError::Unresolved { loc, .. }
            | HarnessError::NotASignal { loc, .. }
            | HarnessError::StreamKindMismatch { loc, .. }
            | HarnessError::Codec { loc, .. }
            | HarnessError::EmptyInterface { loc, .. } => Some(*loc),
            HarnessError::ScriptUnreadable { .. }
            | HarnessError::MissingBaseDir(_)
            | HarnessError::InvalidArgWidth(_)
            | HarnessError::Registry(_)
            | HarnessError::Io(_) => None,
        }
    }

    /// Text of the label attached to the offending record
    fn label(&self) -> String {
        match self {
            HarnessError::Parse { label, .. } => label.clone(),
            HarnessError::UnknownDirective { .. } => "unknown directive".to_string(),
            HarnessError::Unresolved { not_found, .. } => {
                format!(
                    "`{}` is not declared as an {}",
                    not_found.name, not_found.direction
                )
            }
            HarnessError::NotASignal { .. } => "expected the name of a signal port".to_string(),
            HarnessError::StreamKindMismatch { declared, .. } => {
                format!("expected `{declared}`")
            }
            HarnessError::Codec { error, .. } => match error {
                CodecError::ArityMismatch { .. } => {
                    "argument count does not match the interface".to_string()
                }
                CodecError::ValueTooWide { .. } => "value does not fit the field".to_string(),
            },
            HarnessError::EmptyInterface { .. } => {
                "nothing to read (missing `call_dut`?)".to_string()
            }
            _ => String::new(),
        }
    }
}

/// Type alias for Results
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Renders `HarnessError`s through a `DiagnosticHandler`
pub struct DiagnosticEmitter;

impl DiagnosticEmitter {
    pub fn emit_harness_error(handler: &mut DiagnosticHandler, error: &HarnessError) {
        match error.loc() {
            Some(loc) => {
                handler.emit_diagnostic_span(&error.to_string(), &error.label(), loc, Level::Error)
            }
            None => handler.emit_general_message(&error.to_string(), Level::Error),
        }
    }
}
