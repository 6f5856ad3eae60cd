// Copyright 2026 Cornell University
// released under MIT License

/// An expected/observed disagreement recorded against the open test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub id: String,
    pub expected: Vec<u64>,
    pub observed: Vec<u64>,
}

/// Verdict of a test case closed by an `end` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    pub label: String,
    pub valid: bool,
    pub mismatches: Vec<Mismatch>,
    /// Ids of the comparisons that matched
    pub matched: Vec<String>,
}

/// Tracks the validity of the test case currently being executed.
/// Nothing survives `close_case`: every case starts out valid.
#[derive(Debug)]
pub struct Ledger {
    valid: bool,
    mismatches: Vec<Mismatch>,
    /// Ids of the successful comparisons in the open case
    matched: Vec<String>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            valid: true,
            mismatches: vec![],
            matched: vec![],
        }
    }

    /// Invalidates the open case
    pub fn record_mismatch(&mut self, id: &str, expected: &[u64], observed: &[u64]) {
        self.valid = false;
        self.mismatches.push(Mismatch {
            id: id.to_string(),
            expected: expected.to_vec(),
            observed: observed.to_vec(),
        });
    }

    pub fn record_match(&mut self, id: &str) {
        self.matched.push(id.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Closes the open case under `label` and starts a new, valid one
    pub fn close_case(&mut self, label: &str) -> CaseResult {
        let result = CaseResult {
            label: label.to_string(),
            valid: self.valid,
            mismatches: std::mem::take(&mut self.mismatches),
            matched: std::mem::take(&mut self.matched),
        };
        self.valid = true;
        result
    }
}
