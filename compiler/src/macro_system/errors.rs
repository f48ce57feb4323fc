use super::position::Position;
use super::registry::Arity;
use diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticSeverity};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroSeverity {
    Error,
    Warning,
    Info,
}

/// A non-fatal message a macro body reported through its context
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDiagnostic {
    pub severity: MacroSeverity,
    pub message: String,
    pub location: Position,
}

/// Errors raised while registering or evaluating macros.
///
/// None of these are recovered from: they end the current compilation
/// attempt and are reported at [`MacroError::location`].
#[derive(Debug, Clone, PartialEq)]
pub enum MacroError {
    /// A macro with this name is already registered
    DuplicateMacro {
        name: String,
        location: Option<Position>,
        previous: Option<Position>,
    },

    /// No macro registered under this name
    UnknownMacro { name: String, location: Position },

    /// Argument count does not satisfy the declared arity
    ArityMismatch {
        macro_name: String,
        expected: Arity,
        found: usize,
        location: Position,
    },

    /// A position query happened outside any macro invocation
    NoActiveCompilation { query: &'static str },

    /// A literal builder rejected its input text
    MalformedLiteral {
        literal: String,
        kind: &'static str,
        reason: String,
        location: Position,
    },

    /// Nested invocation went past the configured depth
    RecursionLimitExceeded {
        macro_name: String,
        depth: usize,
        max_depth: usize,
        chain: Vec<String>,
        location: Position,
    },

    /// A macro received an argument of the wrong shape
    InvalidArgument {
        macro_name: String,
        message: String,
        location: Position,
    },

    /// Raised by a macro body through `MacroCall::error`
    Custom { message: String, location: Position },
}

impl MacroError {
    pub fn location(&self) -> Option<Position> {
        match self {
            MacroError::DuplicateMacro { location, .. } => *location,
            MacroError::NoActiveCompilation { .. } => None,
            MacroError::UnknownMacro { location, .. }
            | MacroError::ArityMismatch { location, .. }
            | MacroError::MalformedLiteral { location, .. }
            | MacroError::RecursionLimitExceeded { location, .. }
            | MacroError::InvalidArgument { location, .. }
            | MacroError::Custom { location, .. } => Some(*location),
        }
    }

    /// Error codes E0701-E0708 are reserved for macro evaluation:
    /// - E0701: Duplicate macro registration
    /// - E0702: Unknown macro
    /// - E0703: Argument count mismatch
    /// - E0704: Position query outside a macro invocation
    /// - E0705: Malformed literal
    /// - E0706: Recursion limit exceeded
    /// - E0707: Error reported by a macro body
    /// - E0708: Invalid macro argument
    pub fn error_code(&self) -> &'static str {
        match self {
            MacroError::DuplicateMacro { .. } => "E0701",
            MacroError::UnknownMacro { .. } => "E0702",
            MacroError::ArityMismatch { .. } => "E0703",
            MacroError::NoActiveCompilation { .. } => "E0704",
            MacroError::MalformedLiteral { .. } => "E0705",
            MacroError::RecursionLimitExceeded { .. } => "E0706",
            MacroError::Custom { .. } => "E0707",
            MacroError::InvalidArgument { .. } => "E0708",
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            MacroError::DuplicateMacro { name, .. } => Some(format!(
                "rename one of the macros or unregister '{}' first",
                name
            )),
            MacroError::UnknownMacro { name, .. } => Some(format!(
                "check that macro '{}' is registered before compilation starts",
                name
            )),
            MacroError::ArityMismatch {
                macro_name,
                expected,
                ..
            } => Some(format!(
                "macro '{}' takes {} argument(s)",
                macro_name, expected
            )),
            MacroError::NoActiveCompilation { .. } => {
                Some("call this from inside a macro body".to_string())
            }
            MacroError::RecursionLimitExceeded { macro_name, .. } => Some(format!(
                "check for unbounded recursion in macro '{}', or raise max-depth",
                macro_name
            )),
            _ => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut builder = DiagnosticBuilder::error(self.to_string()).code(self.error_code());
        if let Some(pos) = self.location() {
            builder = builder.label(pos.span(), self.label());
        }
        if let MacroError::DuplicateMacro {
            previous: Some(prev),
            ..
        } = self
        {
            builder = builder.secondary_label(prev.span(), "first registered here");
        }
        if let MacroError::RecursionLimitExceeded { chain, .. } = self {
            if !chain.is_empty() {
                builder = builder.note(format!("expansion chain: {}", chain.join(" -> ")));
            }
        }
        if let Some(help) = self.suggestion() {
            builder = builder.help(help);
        }
        builder.build()
    }

    fn label(&self) -> &'static str {
        match self {
            MacroError::DuplicateMacro { .. } => "registered again here",
            MacroError::UnknownMacro { .. } => "not a registered macro",
            MacroError::ArityMismatch { .. } => "called here",
            MacroError::NoActiveCompilation { .. } => "queried here",
            MacroError::MalformedLiteral { .. } => "invalid literal",
            MacroError::RecursionLimitExceeded { .. } => "limit reached here",
            MacroError::InvalidArgument { .. } => "unexpected argument",
            MacroError::Custom { .. } => "reported here",
        }
    }
}

impl fmt::Display for MacroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroError::DuplicateMacro { name, .. } => {
                write!(f, "macro '{}' is already registered", name)
            }
            MacroError::UnknownMacro { name, .. } => write!(f, "unknown macro: '{}'", name),
            MacroError::ArityMismatch {
                macro_name,
                expected,
                found,
                ..
            } => write!(
                f,
                "macro '{}' expects {} argument(s), found {}",
                macro_name, expected, found
            ),
            MacroError::NoActiveCompilation { query } => write!(
                f,
                "{}() called with no active macro invocation",
                query
            ),
            MacroError::MalformedLiteral {
                literal,
                kind,
                reason,
                ..
            } => write!(f, "malformed {} literal '{}': {}", kind, literal, reason),
            MacroError::RecursionLimitExceeded {
                macro_name,
                depth,
                max_depth,
                ..
            } => write!(
                f,
                "macro '{}' exceeded recursion limit: depth {} > max {}",
                macro_name, depth, max_depth
            ),
            MacroError::InvalidArgument {
                macro_name,
                message,
                ..
            } => write!(f, "invalid argument to macro '{}': {}", macro_name, message),
            MacroError::Custom { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for MacroError {}

impl From<&MacroError> for Diagnostic {
    fn from(err: &MacroError) -> Self {
        err.to_diagnostic()
    }
}

impl MacroDiagnostic {
    pub fn error(message: impl Into<String>, location: Position) -> Self {
        Self::with_severity(MacroSeverity::Error, message, location)
    }

    pub fn warning(message: impl Into<String>, location: Position) -> Self {
        Self::with_severity(MacroSeverity::Warning, message, location)
    }

    pub fn info(message: impl Into<String>, location: Position) -> Self {
        Self::with_severity(MacroSeverity::Info, message, location)
    }

    fn with_severity(severity: MacroSeverity, message: impl Into<String>, location: Position) -> Self {
        Self {
            severity,
            message: message.into(),
            location,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let severity = match self.severity {
            MacroSeverity::Error => DiagnosticSeverity::Error,
            MacroSeverity::Warning => DiagnosticSeverity::Warning,
            MacroSeverity::Info => DiagnosticSeverity::Info,
        };
        DiagnosticBuilder::new(severity, self.message.clone())
            .span(self.location.span())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_map::{FileId, SourceMap};

    fn pos() -> Position {
        Position::synthetic(FileId::new(0), 3, 7)
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = vec![
            MacroError::DuplicateMacro {
                name: "a".into(),
                location: None,
                previous: None,
            },
            MacroError::UnknownMacro {
                name: "a".into(),
                location: pos(),
            },
            MacroError::ArityMismatch {
                macro_name: "a".into(),
                expected: Arity::Exact(1),
                found: 2,
                location: pos(),
            },
            MacroError::NoActiveCompilation { query: "currentPos" },
            MacroError::MalformedLiteral {
                literal: "1x".into(),
                kind: "integer",
                reason: "unexpected character 'x'".into(),
                location: pos(),
            },
            MacroError::RecursionLimitExceeded {
                macro_name: "a".into(),
                depth: 3,
                max_depth: 2,
                chain: vec![],
                location: pos(),
            },
            MacroError::Custom {
                message: "m".into(),
                location: pos(),
            },
            MacroError::InvalidArgument {
                macro_name: "a".into(),
                message: "m".into(),
                location: pos(),
            },
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.error_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_messages() {
        let err = MacroError::ArityMismatch {
            macro_name: "makeArray".into(),
            expected: Arity::Exact(1),
            found: 0,
            location: pos(),
        };
        assert_eq!(err.to_string(), "macro 'makeArray' expects 1 argument(s), found 0");

        let err = MacroError::ArityMismatch {
            macro_name: "sum".into(),
            expected: Arity::AtLeast(2),
            found: 1,
            location: pos(),
        };
        assert_eq!(err.to_string(), "macro 'sum' expects at least 2 argument(s), found 1");

        let err = MacroError::NoActiveCompilation { query: "currentPos" };
        assert_eq!(err.to_string(), "currentPos() called with no active macro invocation");
        assert_eq!(err.location(), None);
    }

    #[test]
    fn test_to_diagnostic_carries_code_span_and_chain() {
        let mut map = SourceMap::new();
        let file = map.add_file("Main.hx", "loop();");
        let at = Position::from_offsets(&map, file, 0, 6).unwrap();

        let err = MacroError::RecursionLimitExceeded {
            macro_name: "loop".into(),
            depth: 3,
            max_depth: 2,
            chain: vec!["loop".into(), "loop".into()],
            location: at,
        };
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.code.as_deref(), Some("E0706"));
        assert_eq!(diagnostic.span, Some(at.span()));
        assert_eq!(diagnostic.notes, vec!["expansion chain: loop -> loop".to_string()]);
        assert_eq!(diagnostic.help.len(), 1);
    }

    #[test]
    fn test_macro_diagnostic_severity_maps() {
        let d = MacroDiagnostic::warning("careful", pos()).to_diagnostic();
        assert_eq!(d.severity, DiagnosticSeverity::Warning);
        assert_eq!(d.span, Some(pos().span()));
    }
}
