//! Diagnostic rendering for IR-construction errors

use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use super::IrError;

/// Diagnostic reporter for pretty error output.
///
/// Nothing at this layer carries a source location, so diagnostics are built
/// from the error's headline and notes rather than labeled spans.
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn report_error(&self, error: &IrError) {
        let diagnostic = Self::diagnostic(error);
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }

    fn diagnostic(error: &IrError) -> Diagnostic<usize> {
        match error {
            IrError::Construction { message } => Diagnostic::error()
                .with_message("Malformed descriptor")
                .with_notes(vec![message.clone()]),

            IrError::TypeMismatch { message } => Diagnostic::error()
                .with_message("Type mismatch")
                .with_notes(vec![message.clone()]),

            IrError::Arity { .. } => Diagnostic::error()
                .with_message("Arity mismatch")
                .with_notes(vec![error.to_string()]),

            IrError::State { message } => Diagnostic::error()
                .with_message("Invalid state transition")
                .with_notes(vec![message.clone()]),

            IrError::Cardinality { .. } => Diagnostic::error()
                .with_message("Phi cardinality")
                .with_notes(vec![error.to_string()]),

            IrError::Constraint { message } => Diagnostic::error()
                .with_message("Constraint violation")
                .with_notes(vec![message.clone()]),
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
