// Copyright 2026 Cornell University
// released under MIT License

//! # Script reader
//! A test script has one directive per line:
//! ```text
//! <interfaceType> <id> [<streamKind>] <argCount> [<invokeCount>] <arg>*
//! ```
//! Which of the optional fields are present is fixed per harness build and
//! described by a `ScriptLayout`. Blank lines and `#` comments are skipped.

use std::path::Path;

use clap::ValueEnum;
use pest::error::InputLocation;
use pest::Parser;
use pest_derive::Parser;

use crate::diagnostic::{DiagnosticHandler, Loc};
use crate::errors::{HarnessError, HarnessResult};
use crate::registry::{Direction, PortKind, Registry};

#[derive(Parser)]
#[grammar = "script.pest"]
struct ScriptParser;

/// Stream-kind placeholder written by generators for directives without one
const NULL_FIELD: &str = "NULL";

/// Field layout of a script record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScriptLayout {
    /// `<tag> <id> <argCount> <arg>*`
    #[default]
    Plain,
    /// `<tag> <id> <streamKind> <argCount> <arg>*`
    StreamKind,
    /// `<tag> <id> <argCount> <invokeCount> <arg>*`
    InvokeCount,
    /// `<tag> <id> <streamKind> <argCount> <invokeCount> <arg>*`
    Full,
}

impl ScriptLayout {
    pub fn has_stream_kind(self) -> bool {
        matches!(self, ScriptLayout::StreamKind | ScriptLayout::Full)
    }

    pub fn has_invoke_count(self) -> bool {
        matches!(self, ScriptLayout::InvokeCount | ScriptLayout::Full)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Write or check a scalar signal port
    Signal,
    /// Push a word into a stream the DUT consumes
    InterfaceIn,
    /// Pop a word from a stream the DUT produces and check it
    InterfaceOut,
    /// `timestamp` or `display`: print the id
    TimestampOrDisplay,
    /// `call_dut`
    InvokeDut,
    /// `end`: close the current test case
    EndTest,
    /// `finish`: stop reading the script
    Finish,
    Unknown,
}

/// One parsed record of the script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// The `interfaceType` field as written
    pub tag: String,
    pub id: String,
    pub stream_kind: Option<String>,
    pub args: Vec<u64>,
    pub invoke_count: Option<u64>,
    /// 1-based line number
    pub line: usize,
    /// Span of the whole record
    pub loc: Loc,
    /// Span of the `interfaceType` field
    pub tag_loc: Loc,
}

impl Directive {
    /// Name of the port this directive refers to: the id for `signal <port> ...`
    /// records, the tag itself otherwise
    pub fn port(&self) -> &str {
        if self.tag == "signal" {
            &self.id
        } else {
            &self.tag
        }
    }
}

/// A field of a record, with quotes removed and its span inside the line
#[derive(Debug, Clone, Copy)]
struct Field<'t> {
    text: &'t str,
    quoted: bool,
    start: usize,
    end: usize,
}

/// Datatype that defines the format of integer literals accepted in
/// scripts (either decimal, binary or hex)
#[derive(Debug, Clone, Copy)]
enum IntFormat {
    Decimal,
    Binary,
    Hex,
}

impl IntFormat {
    fn radix(self) -> u32 {
        match self {
            IntFormat::Decimal => 10,
            IntFormat::Binary => 2,
            IntFormat::Hex => 16,
        }
    }

    fn name(self) -> &'static str {
        match self {
            IntFormat::Decimal => "decimal",
            IntFormat::Binary => "binary",
            IntFormat::Hex => "hexadecimal",
        }
    }
}

/// Parses an unsigned integer literal (`42`, `0x2a`, `0b101010`, `1_000`)
fn parse_integer(text: &str) -> Result<u64, String> {
    let (format, digits) = if let Some(stripped) =
        text.strip_prefix("0b").or_else(|| text.strip_prefix("0B"))
    {
        (IntFormat::Binary, stripped)
    } else if let Some(stripped) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (IntFormat::Hex, stripped)
    } else {
        (IntFormat::Decimal, text)
    };
    let digits = digits.replace('_', "");
    if digits.is_empty() {
        return Err(format!("Empty {} integer: '{}'", format.name(), text));
    }
    if !digits.chars().all(|c| c.is_digit(format.radix())) {
        return Err(format!(
            "Invalid {} integer '{}': contains non-{} digits",
            format.name(),
            text,
            format.name()
        ));
    }
    let name = format.name();
    u64::from_str_radix(&digits, format.radix())
        .map_err(|e| format!("Invalid {name} integer '{text}': {e}"))
}

/// Reads directives out of a script, one record per call to `next_directive`
pub struct ScriptReader<'a> {
    registry: &'a Registry,
    layout: ScriptLayout,
    max_arg_width: u32,
    fileid: usize,
    source: String,
    /// Byte offset of the next unread line
    pos: usize,
    /// Number of lines consumed so far
    line: usize,
}

impl<'a> ScriptReader<'a> {
    /// Loads the script at `path` and registers it with `handler`
    pub fn open(
        path: impl AsRef<Path>,
        layout: ScriptLayout,
        max_arg_width: u32,
        registry: &'a Registry,
        handler: &mut DiagnosticHandler,
    ) -> HarnessResult<Self> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|e| HarnessError::ScriptUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_source(
            path.display(),
            source,
            layout,
            max_arg_width,
            registry,
            handler,
        ))
    }

    /// Reads a script held in memory. `name` is only used in diagnostics.
    pub fn from_source(
        name: impl ToString,
        source: String,
        layout: ScriptLayout,
        max_arg_width: u32,
        registry: &'a Registry,
        handler: &mut DiagnosticHandler,
    ) -> Self {
        let fileid = handler.add_file(name.to_string(), source.clone());
        Self {
            registry,
            layout,
            max_arg_width,
            fileid,
            source,
            pos: 0,
            line: 0,
        }
    }

    /// Returns the next directive, or `None` once the script is exhausted
    pub fn next_directive(&mut self) -> HarnessResult<Option<Directive>> {
        while self.pos < self.source.len() {
            let start = self.pos;
            let end = self.source[start..]
                .find('\n')
                .map_or(self.source.len(), |idx| start + idx);
            self.pos = end + 1;
            self.line += 1;
            let text = self.source[start..end].trim_end_matches('\r');
            if let Some(directive) = self.parse_record(text, start)? {
                return Ok(Some(directive));
            }
        }
        Ok(None)
    }

    fn loc(&self, offset: usize, start: usize, end: usize) -> Loc {
        Loc::new(self.fileid, offset + start, offset + end)
    }

    fn classify(&self, tag: &str) -> DirectiveKind {
        match tag {
            "signal" => DirectiveKind::Signal,
            "timestamp" | "display" => DirectiveKind::TimestampOrDisplay,
            "call_dut" => DirectiveKind::InvokeDut,
            "end" => DirectiveKind::EndTest,
            "finish" => DirectiveKind::Finish,
            name => match self.registry.lookup(name) {
                Some(binding) if binding.kind() == PortKind::Signal => DirectiveKind::Signal,
                Some(binding) if binding.direction() == Direction::Input => {
                    DirectiveKind::InterfaceIn
                }
                Some(_) => DirectiveKind::InterfaceOut,
                None => DirectiveKind::Unknown,
            },
        }
    }

    /// Splits one line into fields. `offset` is the byte offset of the line.
    fn split_fields<'t>(&self, text: &'t str, offset: usize) -> HarnessResult<Vec<Field<'t>>> {
        let record = match ScriptParser::parse(Rule::record, text) {
            Ok(mut pairs) => pairs.next(),
            Err(err) => {
                let (start, end) = match err.location {
                    InputLocation::Pos(start) => (start, start),
                    InputLocation::Span(span) => span,
                };
                return Err(HarnessError::parse(
                    format!("Lexing failed: {}", err.variant.message()),
                    "malformed field",
                    self.loc(offset, start, end),
                ));
            }
        };
        let Some(record) = record else {
            return Ok(vec![]);
        };
        let fields = record
            .into_inner()
            .filter_map(|pair| {
                let span = pair.as_span();
                match pair.as_rule() {
                    Rule::bare => Some(Field {
                        text: span.as_str(),
                        quoted: false,
                        start: span.start(),
                        end: span.end(),
                    }),
                    Rule::quoted => Some(Field {
                        text: &span.as_str()[1..span.as_str().len() - 1],
                        quoted: true,
                        start: span.start(),
                        end: span.end(),
                    }),
                    _ => None,
                }
            })
            .collect();
        Ok(fields)
    }

    fn parse_record(&self, text: &str, offset: usize) -> HarnessResult<Option<Directive>> {
        let fields = self.split_fields(text, offset)?;
        let Some(tag) = fields.first().copied() else {
            return Ok(None);
        };
        let record_loc = self.loc(offset, 0, text.len());
        let tag_loc = self.loc(offset, tag.start, tag.end);
        if tag.quoted {
            return Err(HarnessError::parse(
                "The interfaceType of a record cannot be quoted",
                "expected a bare word",
                tag_loc,
            ));
        }

        let kind = self.classify(tag.text);
        let mut directive = Directive {
            kind,
            tag: tag.text.to_string(),
            id: fields.get(1).map(|f| f.text.to_string()).unwrap_or_default(),
            stream_kind: None,
            args: vec![],
            invoke_count: None,
            line: self.line,
            loc: record_loc,
            tag_loc,
        };
        // unknown tags are reported by the interpreter, and everything
        // after `finish` (including its own trailing fields) is ignored
        if matches!(kind, DirectiveKind::Unknown | DirectiveKind::Finish) {
            return Ok(Some(directive));
        }

        let mut rest = fields[1..].iter().copied();
        let missing = |what: &str| {
            HarnessError::parse(
                format!("Record `{}` is missing its {}", tag.text, what),
                format!("expected {what} after this"),
                self.loc(offset, tag.start, text.len()),
            )
        };
        let number = |field: Field, what: &str| {
            parse_integer(field.text).map_err(|msg| {
                HarnessError::parse(
                    msg,
                    format!("expected {what}"),
                    self.loc(offset, field.start, field.end),
                )
            })
        };

        rest.next().ok_or_else(|| missing("id"))?;
        if self.layout.has_stream_kind() {
            let field = rest.next().ok_or_else(|| missing("stream kind"))?;
            if field.text != NULL_FIELD {
                directive.stream_kind = Some(field.text.to_string());
            }
        }
        let count_field = rest.next().ok_or_else(|| missing("argument count"))?;
        let arg_count = number(count_field, "the argument count")? as usize;
        if self.layout.has_invoke_count() {
            let field = rest.next().ok_or_else(|| missing("invocation count"))?;
            directive.invoke_count = Some(number(field, "the invocation count")?);
        }

        let arg_fields: Vec<Field> = rest.collect();
        if arg_fields.len() != arg_count {
            let label_loc = match arg_fields.get(arg_count) {
                Some(extra) => self.loc(offset, extra.start, text.len()),
                None => self.loc(offset, count_field.start, count_field.end),
            };
            return Err(HarnessError::parse(
                format!(
                    "Expected {} arguments but found {}",
                    arg_count,
                    arg_fields.len()
                ),
                "argument count declared here",
                label_loc,
            ));
        }
        for field in arg_fields {
            let value = number(field, "an integer argument")?;
            if self.max_arg_width < 64 && value >> self.max_arg_width != 0 {
                return Err(HarnessError::parse(
                    format!(
                        "Argument '{}' does not fit in {} bits",
                        field.text, self.max_arg_width
                    ),
                    "argument too wide",
                    self.loc(offset, field.start, field.end),
                ));
            }
            directive.args.push(value);
        }

        // without a dedicated field, `call_dut` passes its count as the only argument
        if kind == DirectiveKind::InvokeDut && !self.layout.has_invoke_count() {
            match directive.args.as_slice() {
                [count] => directive.invoke_count = Some(*count),
                _ => {
                    return Err(HarnessError::parse(
                        "`call_dut` takes exactly one argument (the number of invocations)",
                        "argument count declared here",
                        self.loc(offset, count_field.start, count_field.end),
                    ))
                }
            }
        }
        Ok(Some(directive))
    }
}
