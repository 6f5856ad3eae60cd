// Copyright 2026 Cornell University
// released under MIT License

use std::path::PathBuf;

use clap::{ColorChoice, Parser};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::info;
use streambench::designs::DesignKind;
use streambench::diagnostic::DiagnosticHandler;
use streambench::report::RunOptions;
use streambench::script::ScriptLayout;
use streambench::setup::{run_harness, HarnessConfig};

/// Args for the harness CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Design under test
    #[arg(short, long, value_enum)]
    design: DesignKind,

    /// Path to the test script (.dat)
    #[arg(short, long, value_name = "SCRIPT_FILE")]
    script: PathBuf,

    /// Directory that a relative script path is resolved against
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Field layout of the script records
    #[arg(long, value_enum, default_value_t = ScriptLayout::Plain)]
    layout: ScriptLayout,

    /// Widest integer argument accepted in the script, in bits
    #[arg(
        long,
        value_name = "BITS",
        default_value_t = 64,
        value_parser = clap::value_parser!(u32).range(1..=64)
    )]
    max_arg_width: u32,

    /// Print successful comparisons as well as mismatches
    #[arg(long)]
    print_matches: bool,

    /// Print the number of words buffered in every stream after each directive
    #[arg(long)]
    print_interfaces: bool,

    /// Print whatever is left in the streams once the script is done
    #[arg(long)]
    read_interfaces: bool,

    /// Print the DUT's control state after every invocation
    #[arg(long)]
    print_states: bool,

    /// Print values in hexadecimal
    #[arg(long)]
    display_hex: bool,

    /// Users can specify `-v` or `--verbose` to toggle logging
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// Pass in `--color never` to suppress colored error messages.
    /// (By default, error messages are displayed w/ ANSI colors.)
    #[arg(long, value_name = "COLOR_CHOICE", default_value = "auto")]
    color: ColorChoice,

    /// Whether to suppress location info (source file and label) in error messages
    #[arg(short, long)]
    no_error_locations: bool,
}

/// Example (enables all tracing logs):
/// `cargo run -- --design increment --script tests/scripts/increment_pass.dat -v`
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // For concision, we disable timestamps in the log
    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(cli.verbosity.log_level_filter())
        .init();

    let handler = &mut DiagnosticHandler::new(cli.color, cli.no_error_locations);

    let config = HarnessConfig {
        script: cli.script,
        base_dir: cli.base_dir,
        layout: cli.layout,
        max_arg_width: cli.max_arg_width,
        options: RunOptions {
            print_matches: cli.print_matches,
            print_interfaces: cli.print_interfaces,
            read_interfaces: cli.read_interfaces,
            print_states: cli.print_states,
            display_hex: cli.display_hex,
        },
    };
    let mut design = cli.design.build()?;
    let mut stdout = std::io::stdout();

    // verification failures are reported in the output and do not change
    // the exit status; only fatal errors make it out of here
    let summary = run_harness(&config, &mut design, &mut stdout, handler)?;
    info!(
        "{} test case(s), {} failed, {} matching comparison(s), {} invocation(s)",
        summary.cases.len(),
        summary.cases.iter().filter(|case| !case.valid).count(),
        summary.cases.iter().map(|case| case.matched.len()).sum::<usize>(),
        summary.invocations
    );
    Ok(())
}
