//! Diagnostics for macro evaluation
//!
//! Rust-style error reports: a severity, an optional error code, a primary
//! span, secondary labels, help and notes (macro errors list their expansion
//! chain as notes).
//! [`ErrorFormatter`] renders them against a [`SourceMap`] with a source snippet
//! and an underline, optionally with ANSI colors.

use std::fmt;

pub use source_map::{FileId, SourceFile, SourceMap, SourcePosition, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
    Hint,
}

impl DiagnosticSeverity {
    fn ansi_color(self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "\x1b[31m",
            DiagnosticSeverity::Warning => "\x1b[33m",
            DiagnosticSeverity::Info => "\x1b[36m",
            DiagnosticSeverity::Hint => "\x1b[32m",
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Info => write!(f, "info"),
            DiagnosticSeverity::Hint => write!(f, "hint"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

/// A message attached to a span
#[derive(Debug, Clone)]
pub struct Label {
    pub span: SourceSpan,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

/// A single report.
///
/// `span` is `None` for failures that have no source location, such as a
/// position query made outside any macro invocation.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: Option<String>,
    pub message: String,
    pub span: Option<SourceSpan>,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            diagnostics: iter.into_iter().collect(),
        }
    }
}

/// Fluent constructor for [`Diagnostic`]
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    pub fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic {
                severity,
                code: None,
                message: message.into(),
                span: None,
                labels: Vec::new(),
                notes: Vec::new(),
                help: Vec::new(),
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Info, message)
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.diagnostic.code = Some(code.into());
        self
    }

    pub fn span(mut self, span: SourceSpan) -> Self {
        self.diagnostic.span = Some(span);
        self
    }

    /// Primary label; also sets the diagnostic span if none was given
    pub fn label(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        if self.diagnostic.span.is_none() {
            self.diagnostic.span = Some(span);
        }
        self.diagnostic.labels.push(Label::primary(span, message));
        self
    }

    pub fn secondary_label(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        self.diagnostic.labels.push(Label::secondary(span, message));
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    pub fn help(mut self, help_msg: impl Into<String>) -> Self {
        self.diagnostic.help.push(help_msg.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }
}

/// Renders diagnostics as text
pub struct ErrorFormatter {
    use_colors: bool,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self { use_colors: false }
    }

    pub fn with_colors() -> Self {
        Self { use_colors: true }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_diagnostics(&self, diagnostics: &Diagnostics, source_map: &SourceMap) -> String {
        diagnostics
            .diagnostics
            .iter()
            .map(|d| self.format_diagnostic(d, source_map))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic, source_map: &SourceMap) -> String {
        let mut output = String::new();

        let mut header = diagnostic.severity.to_string();
        if let Some(code) = &diagnostic.code {
            header.push_str(&format!("[{}]", code));
        }
        output.push_str(&self.paint(diagnostic.severity.ansi_color(), &header));
        output.push_str(": ");
        output.push_str(&self.paint("\x1b[1;97m", &diagnostic.message));
        output.push('\n');

        if let Some(span) = &diagnostic.span {
            output.push_str(&format!(
                "  {} {}\n",
                self.paint("\x1b[96m", "-->"),
                source_map.describe(span)
            ));
            let primary = diagnostic
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
                .map(|l| l.message.as_str());
            self.push_snippet(&mut output, span, primary, diagnostic.severity, source_map);
        }

        for label in diagnostic
            .labels
            .iter()
            .filter(|l| l.style == LabelStyle::Secondary)
        {
            output.push_str(&format!(
                "  {} {}: {}\n",
                self.paint("\x1b[96m", "-->"),
                source_map.describe(&label.span),
                label.message
            ));
        }

        for help_msg in &diagnostic.help {
            output.push_str(&format!("     {}: {}\n", self.paint("\x1b[32m", "help"), help_msg));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("{}: {}\n", self.paint("\x1b[34m", "note"), note));
        }

        output
    }

    /// Source line plus caret underline; skipped when the file is not in the map
    fn push_snippet(
        &self,
        output: &mut String,
        span: &SourceSpan,
        label: Option<&str>,
        severity: DiagnosticSeverity,
        source_map: &SourceMap,
    ) {
        let Some(line) = source_map.get_line(span.file_id, span.start.line) else {
            return;
        };

        let gutter = " ".repeat(span.start.line.to_string().len());
        let bar = self.paint("\x1b[96m", "|");
        output.push_str(&format!("{} {}\n", gutter, bar));
        output.push_str(&format!(
            "{} {} {}\n",
            self.paint("\x1b[96m", &span.start.line.to_string()),
            bar,
            line
        ));

        let start_col = span.start.column.max(1);
        let available = line.len().saturating_sub(start_col - 1).max(1);
        let width = if span.start.line == span.end.line {
            span.end.column.saturating_sub(start_col)
        } else {
            available
        };
        let carets = "^".repeat(width.clamp(1, available));

        output.push_str(&format!(
            "{} {} {}{}",
            gutter,
            bar,
            " ".repeat(start_col - 1),
            self.paint(severity.ansi_color(), &carets)
        ));
        if let Some(message) = label {
            output.push(' ');
            output.push_str(message);
        }
        output.push('\n');
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
