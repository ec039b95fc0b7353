//! miette rendering of Formulary errors.
//!
//! A failed compile or evaluation carries one diagnostic per problem, e.g.
//! one per failed check. Each of them becomes its own [`Report`] drawn
//! against the expression text. Errors without diagnostics (I/O and
//! configuration) become a single report with no snippet.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use formulary::FormularyError;
use formulary_parser::{Diagnostic, error::Role};

/// One renderable error.
#[derive(Debug)]
pub enum Report<'a> {
    /// A diagnostic together with the expression it points into.
    Diagnostic {
        diagnostic: &'a Diagnostic,
        expression: &'a str,
    },
    /// An error that has no position in an expression.
    Plain(&'a FormularyError),
}

/// Split `err` into reports, one per diagnostic.
pub fn reports(err: &FormularyError) -> Vec<Report<'_>> {
    let Some((parse_error, expression)) = err.diagnostics() else {
        return vec![Report::Plain(err)];
    };
    parse_error
        .diagnostics()
        .iter()
        .map(|diagnostic| Report::Diagnostic {
            diagnostic,
            expression,
        })
        .collect()
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Diagnostic { diagnostic, .. } => f.write_str(diagnostic.message()),
            Report::Plain(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Report<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Report::Diagnostic { .. } => None,
            Report::Plain(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for Report<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code: Box<dyn fmt::Display> = match self {
            Report::Diagnostic { diagnostic, .. } => Box::new(diagnostic.code()?),
            Report::Plain(FormularyError::Io(_)) => Box::new("formulary::io"),
            Report::Plain(FormularyError::Config(_)) => Box::new("formulary::config"),
            Report::Plain(_) => return None,
        };
        Some(code)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Report::Diagnostic { diagnostic, .. } => {
                let help = diagnostic.help()?;
                Some(Box::new(help))
            }
            Report::Plain(_) => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Report::Diagnostic { expression, .. } => {
                Some(expression as &dyn miette::SourceCode)
            }
            Report::Plain(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Report::Diagnostic {
            diagnostic,
            expression,
        } = self
        else {
            return None;
        };

        // Labels that do not fit the expression would break the snippet
        let mut labels = diagnostic
            .labels()
            .iter()
            .filter(move |label| label.covered(expression).is_some())
            .peekable();
        labels.peek()?;

        Some(Box::new(labels.map(|label| {
            let span = SourceSpan::new(label.span().start().into(), label.span().len());
            let message = Some(label.message().to_string());
            match label.role() {
                Role::Primary => LabeledSpan::new_primary_with_span(message, span),
                Role::Secondary => LabeledSpan::new_with_span(message, span),
            }
        })))
    }
}
