// Copyright 2026 Cornell University
// released under MIT License

pub mod designs;
pub mod diagnostic;
pub mod dut;
pub mod errors;
pub mod interpreter;
pub mod ledger;
pub mod registry;
pub mod report;
pub mod script;
pub mod setup;
pub mod word;
