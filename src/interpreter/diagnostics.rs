// File: src/interpreter/diagnostics.rs
//
// The diagnostic stream runtime errors are reported to.
//
// Reporting never interrupts evaluation: the caller substitutes a default
// value and carries on. Reports are kept in order so hosts and tests can
// inspect them after a run.

use super::value::Value;
use crate::errors::{DmoError, ErrorKind};
use tracing::warn;

#[derive(Debug, Default)]
pub struct Diagnostics {
    reports: Vec<DmoError>,
    echo: bool,
}

impl Diagnostics {
    /// `echo` prints each report to stderr as it arrives
    pub fn new(echo: bool) -> Self {
        Diagnostics { reports: Vec::new(), echo }
    }

    pub fn report(&mut self, error: DmoError) {
        warn!(
            kind = %error.kind,
            location = %error.location,
            "{}",
            error.message
        );
        if self.echo {
            eprint!("{}", error);
        }
        self.reports.push(error);
    }

    pub fn reports(&self) -> &[DmoError] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Kinds of every report, in order
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.reports.iter().map(|error| error.kind).collect()
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.reports.iter().filter(|error| error.kind == kind).count()
    }

    /// Removes and returns everything reported so far
    pub fn take(&mut self) -> Vec<DmoError> {
        std::mem::take(&mut self.reports)
    }
}

/// A failed operation and the value evaluation continues with.
///
/// Operators and native functions return these instead of reporting
/// directly; the interpreter attaches the source location and reports them.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub kind: ErrorKind,
    pub message: String,
    pub fallback: Value,
}

impl Fault {
    pub fn new(kind: ErrorKind, message: impl Into<String>, fallback: Value) -> Self {
        Fault { kind, message: message.into(), fallback }
    }

    pub fn arity(name: &str, expected: &str, received: usize, fallback: Value) -> Self {
        Fault::new(
            ErrorKind::ArityError,
            format!("{} expects {} argument(s) but received {}", name, expected, received),
            fallback,
        )
    }

    pub fn type_error(message: impl Into<String>, fallback: Value) -> Self {
        Fault::new(ErrorKind::TypeError, message, fallback)
    }
}
