// Copyright 2026 Cornell University
// released under MIT License

use clap::ColorChoice;
use codespan_reporting::diagnostic::{
    Diagnostic as CodespanDiagnostic, Label as CodespanLabel, LabelStyle, Severity,
};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::Buffer;

/// Severity of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl Level {
    fn severity(self) -> Severity {
        match self {
            Level::Error => Severity::Error,
            Level::Warning => Severity::Warning,
        }
    }
}

/// A byte range inside one of the files known to a `DiagnosticHandler`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub fileid: usize,
    pub start: usize,
    pub end: usize,
}

impl Loc {
    pub fn new(fileid: usize, start: usize, end: usize) -> Self {
        Self { fileid, start, end }
    }
}

/// A label representing a part of the source code
#[derive(Debug, Clone, PartialEq, Eq)]
struct Label {
    message: Option<String>,
    range: (usize, usize),
}

impl Label {
    fn to_codespan_label(&self, fileid: usize) -> CodespanLabel<usize> {
        CodespanLabel::new(LabelStyle::Primary, fileid, self.range.0..self.range.1)
            .with_message(self.message.clone().unwrap_or_default())
    }
}

/// Diagnostic of a particular part of source code
struct Diagnostic {
    message: String,
    level: Level,
    location: Option<(usize, Label)>,
}

impl Diagnostic {
    fn emit(&self, buffer: &mut Buffer, files: &SimpleFiles<String, String>) {
        let mut diagnostic =
            CodespanDiagnostic::new(self.level.severity()).with_message(&self.message);
        if let Some((fileid, label)) = &self.location {
            diagnostic = diagnostic.with_labels(vec![label.to_codespan_label(*fileid)]);
        }
        let config = term::Config::default();
        term::emit(buffer, &config, files, &diagnostic).expect("Failed to write diagnostic");
    }
}

pub struct DiagnosticHandler {
    files: SimpleFiles<String, String>,
    error_string: String,
    /// `color_choice` indicates whether to emit error messages w/ ANSI colors
    color_choice: ColorChoice,
    /// Whether to drop the source snippet (file name and label) from messages
    no_error_locations: bool,
}

impl Default for DiagnosticHandler {
    /// Default `DiagnosticHandler` does not emit colored error messages
    fn default() -> Self {
        Self::new(ColorChoice::Never, false)
    }
}

impl DiagnosticHandler {
    pub fn new(color_choice: ColorChoice, no_error_locations: bool) -> Self {
        Self {
            files: SimpleFiles::new(),
            error_string: String::new(),
            color_choice,
            no_error_locations,
        }
    }

    /// Creates a buffer for error diagnostics
    /// (different buffers are created based on whether we want colors or not)
    fn create_buffer(&self) -> Buffer {
        if self.color_choice == ColorChoice::Never {
            Buffer::no_color()
        } else {
            Buffer::ansi()
        }
    }

    pub fn add_file(&mut self, name: String, content: String) -> usize {
        self.files.add(name, content)
    }

    /// Everything emitted so far (with ANSI codes if colors are enabled)
    pub fn error_string(&self) -> &str {
        &self.error_string
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        let mut buffer = self.create_buffer();
        diagnostic.emit(&mut buffer, &self.files);
        let error_msg = String::from_utf8_lossy(buffer.as_slice()).to_string();
        self.error_string.push_str(&error_msg);
        print!("{}", error_msg);
    }

    /// Emits `message` with a label pointing at `loc`
    pub fn emit_diagnostic_span(&mut self, message: &str, label: &str, loc: Loc, level: Level) {
        let location = if self.no_error_locations {
            None
        } else {
            Some((
                loc.fileid,
                Label {
                    message: Some(label.to_string()),
                    range: (loc.start, loc.end),
                },
            ))
        };
        self.emit(Diagnostic {
            message: message.to_string(),
            level,
            location,
        });
    }

    /// Emits a message that is not tied to any source location
    pub fn emit_general_message(&mut self, message: &str, level: Level) {
        self.emit(Diagnostic {
            message: message.to_string(),
            level,
            location: None,
        });
    }
}
