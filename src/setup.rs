// Copyright 2026 Cornell University
// released under MIT License

use std::io::Write;
use std::path::PathBuf;

use log::info;

use crate::designs::Design;
use crate::diagnostic::DiagnosticHandler;
use crate::errors::{DiagnosticEmitter, HarnessError, HarnessResult};
use crate::interpreter::{Interpreter, RunSummary};
use crate::registry::Registry;
use crate::report::RunOptions;
use crate::script::{ScriptLayout, ScriptReader};
use crate::word::MAX_FIELD_WIDTH;

/// Everything a run needs besides the design itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Path to the test script
    pub script: PathBuf,
    /// Directory that a relative `script` path is resolved against
    pub base_dir: Option<PathBuf>,
    pub layout: ScriptLayout,
    /// Widest integer argument a script may contain, in bits
    pub max_arg_width: u32,
    pub options: RunOptions,
}

impl HarnessConfig {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            base_dir: None,
            layout: ScriptLayout::default(),
            max_arg_width: MAX_FIELD_WIDTH,
            options: RunOptions::default(),
        }
    }

    /// Location of the script. Relative paths are joined to `base_dir`,
    /// which must exist if it is given.
    pub fn script_path(&self) -> HarnessResult<PathBuf> {
        match &self.base_dir {
            Some(base_dir) => {
                if !base_dir.is_dir() {
                    return Err(HarnessError::MissingBaseDir(base_dir.display().to_string()));
                }
                Ok(base_dir.join(&self.script))
            }
            None => Ok(self.script.clone()),
        }
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if !(1..=MAX_FIELD_WIDTH).contains(&self.max_arg_width) {
            return Err(HarnessError::InvalidArgWidth(self.max_arg_width));
        }
        Ok(())
    }

    /// Validates the configuration and opens the script against `registry`
    pub fn open_script<'r>(
        &self,
        registry: &'r Registry,
        handler: &mut DiagnosticHandler,
    ) -> HarnessResult<ScriptReader<'r>> {
        self.validate()?;
        let path = self.script_path()?;
        info!("Reading test script {}", path.display());
        ScriptReader::open(&path, self.layout, self.max_arg_width, registry, handler)
    }
}

/// Runs the script described by `config` against `design`, writing the
/// report to `out`. Fatal errors (including configuration errors) are
/// emitted through `handler` before being returned.
pub fn run_harness(
    config: &HarnessConfig,
    design: &mut Design,
    out: &mut dyn Write,
    handler: &mut DiagnosticHandler,
) -> HarnessResult<RunSummary> {
    let mut interpreter = Interpreter::new(design, config.options, out);
    let mut reader = match config.open_script(interpreter.registry(), handler) {
        Ok(reader) => reader,
        Err(error) => {
            DiagnosticEmitter::emit_harness_error(handler, &error);
            return Err(error);
        }
    };
    interpreter.run(&mut reader, handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designs::DesignKind;
    use std::fs;
    use std::path::Path;
    use strip_ansi_escapes::strip_str;
    use tempfile::TempDir;

    /// Resolves `path` against the crate root
    fn crate_path(path: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(path)
    }

    #[test]
    fn relative_scripts_are_joined_to_the_base_dir() {
        let dir = TempDir::new().unwrap();
        let mut config = HarnessConfig::new("tests/sample_c.dat");
        assert_eq!(
            config.script_path().unwrap(),
            PathBuf::from("tests/sample_c.dat")
        );

        config.base_dir = Some(dir.path().to_path_buf());
        assert_eq!(
            config.script_path().unwrap(),
            dir.path().join("tests/sample_c.dat")
        );
    }

    #[test]
    fn missing_base_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = HarnessConfig::new("a.dat");
        config.base_dir = Some(dir.path().join("does_not_exist"));
        assert!(matches!(
            config.script_path(),
            Err(HarnessError::MissingBaseDir(_))
        ));
    }

    #[test]
    fn argument_width_is_bounded() {
        let mut config = HarnessConfig::new("a.dat");
        config.validate().unwrap();
        config.max_arg_width = 0;
        assert!(matches!(
            config.validate(),
            Err(HarnessError::InvalidArgWidth(0))
        ));
        config.max_arg_width = 65;
        assert!(matches!(
            config.validate(),
            Err(HarnessError::InvalidArgWidth(65))
        ));
        config.max_arg_width = 1;
        config.validate().unwrap();
    }

    #[test]
    fn unreadable_script_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut config = HarnessConfig::new("missing.dat");
        config.base_dir = Some(dir.path().to_path_buf());
        let mut design = DesignKind::Increment.build().unwrap();
        let mut handler = DiagnosticHandler::default();
        let mut out: Vec<u8> = vec![];
        let result = run_harness(&config, &mut design, &mut out, &mut handler);
        assert!(matches!(
            result,
            Err(HarnessError::ScriptUnreadable { .. })
        ));
        let diagnostics = strip_str(handler.error_string());
        assert!(diagnostics.contains("Unable to open test data file"));
        assert!(out.is_empty());
    }

    #[test]
    fn runs_a_script_from_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("increment.dat"),
            "axis_input a1 2 5 0\ncall_dut c1 1 1\naxis_output a2 2 6 0\nend a2 0\nfinish f1 0\n",
        )
        .unwrap();
        let mut config = HarnessConfig::new("increment.dat");
        config.base_dir = Some(dir.path().to_path_buf());
        let mut design = DesignKind::Increment.build().unwrap();
        let mut handler = DiagnosticHandler::default();
        let mut out: Vec<u8> = vec![];
        let summary = run_harness(&config, &mut design, &mut out, &mut handler).unwrap();
        assert!(summary.all_passed());
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Test a2 successful"));
    }

    #[test]
    fn runs_the_checked_in_sample_script() {
        let mut config = HarnessConfig::new(crate_path("tests/scripts/sample_c.dat"));
        config.layout = ScriptLayout::StreamKind;
        let mut design = DesignKind::Sample.build().unwrap();
        let mut handler = DiagnosticHandler::default();
        let mut out: Vec<u8> = vec![];
        let summary = run_harness(&config, &mut design, &mut out, &mut handler).unwrap();
        assert!(summary.finished);
        assert_eq!(summary.cases.len(), 2);
        assert!(summary.all_passed(), "{}", String::from_utf8_lossy(&out));
    }
}
