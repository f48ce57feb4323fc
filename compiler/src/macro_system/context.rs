//! Per-pass compilation context
//!
//! The state a macro can query while it runs: where it was called from
//! (`Context.currentPos()`), which conditional-compilation flags are set
//! (`Context.defined`), and a sink for warnings and infos. The host owns one
//! context per compilation pass and passes it explicitly into every
//! invocation, so independent passes never share state.
//!
//! # Position stack
//!
//! Each invocation pushes an [`ExpansionFrame`] before its body runs and pops
//! it afterwards, whether the body succeeded or not. A macro that calls another
//! macro therefore sees its own call site again once the inner call returns.
//!
//! When a body fails, the frames active where that error was raised are kept
//! together with the error, so [`CompilationContext::error_diagnostic`] can
//! list the expansion chain after the stack itself has unwound. A body that
//! recovers from a nested failure discards the kept frames.

use super::errors::{MacroDiagnostic, MacroError};
use super::position::Position;
use diagnostics::{Diagnostic, Diagnostics};
use smallvec::SmallVec;
use source_map::{FileId, SourceMap};
use std::collections::BTreeMap;

/// Default maximum nesting of macro invocations
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// One active macro invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionFrame {
    pub macro_name: String,
    pub call_site: Position,
}

#[derive(Debug)]
pub struct CompilationContext {
    source_map: SourceMap,
    frames: SmallVec<[ExpansionFrame; 8]>,
    max_depth: usize,
    defines: BTreeMap<String, String>,
    diagnostics: Vec<MacroDiagnostic>,
    failure_trace: Option<(MacroError, Vec<ExpansionFrame>)>,
    pass: u32,
    invocations: usize,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::with_source_map(SourceMap::new())
    }

    pub fn with_source_map(source_map: SourceMap) -> Self {
        Self {
            source_map,
            frames: SmallVec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            defines: BTreeMap::new(),
            diagnostics: Vec::new(),
            failure_trace: None,
            pass: 0,
            invocations: 0,
        }
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> FileId {
        self.source_map.add_file(name, content)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Values below 1 are raised to 1
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
    }

    /// Start a new compilation pass.
    ///
    /// Clears the position stack, collected diagnostics and invocation count.
    /// Defines and registered files belong to the compilation, not the pass,
    /// and are kept.
    pub fn begin_pass(&mut self) -> u32 {
        if !self.frames.is_empty() {
            log::warn!(
                "starting pass {} with {} unfinished macro frame(s)",
                self.pass + 1,
                self.frames.len()
            );
        }
        self.frames.clear();
        self.diagnostics.clear();
        self.failure_trace = None;
        self.invocations = 0;
        self.pass += 1;
        log::debug!("begin compilation pass {}", self.pass);
        self.pass
    }

    pub fn pass(&self) -> u32 {
        self.pass
    }

    /// `Context.currentPos()`: call site of the innermost active invocation
    pub fn current_position(&self) -> Result<Position, MacroError> {
        self.frames
            .last()
            .map(|frame| frame.call_site)
            .ok_or(MacroError::NoActiveCompilation {
                query: "currentPos",
            })
    }

    /// Name of the innermost active macro
    pub fn current_macro(&self) -> Option<&str> {
        self.frames.last().map(|frame| frame.macro_name.as_str())
    }

    pub fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Active invocations, outermost first
    pub fn expansion_stack(&self) -> &[ExpansionFrame] {
        &self.frames
    }

    /// Number of invocations started in this pass
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    pub(crate) fn enter(&mut self, macro_name: &str, call_site: Position) -> Result<(), MacroError> {
        if self.frames.len() >= self.max_depth {
            let mut chain: Vec<String> = self.frames.iter().map(|f| f.macro_name.clone()).collect();
            chain.push(macro_name.to_string());
            return Err(MacroError::RecursionLimitExceeded {
                macro_name: macro_name.to_string(),
                depth: self.frames.len() + 1,
                max_depth: self.max_depth,
                chain,
                location: call_site,
            });
        }

        self.frames.push(ExpansionFrame {
            macro_name: macro_name.to_string(),
            call_site,
        });
        self.invocations += 1;
        log::trace!(
            "push '{}' at {} (depth {})",
            macro_name,
            call_site,
            self.frames.len()
        );
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        if let Some(frame) = self.frames.pop() {
            log::trace!("pop '{}' (depth {})", frame.macro_name, self.frames.len());
        }
    }

    /// Remember the active frames of a body failing with `err`. Outer frames
    /// propagating the same error keep the deeper trace.
    pub(crate) fn record_failure(&mut self, err: &MacroError) {
        let current = self.frames.as_slice();
        let keep = matches!(
            &self.failure_trace,
            Some((traced, trace))
                if traced == err && trace.len() > current.len() && trace.starts_with(current)
        );
        if !keep {
            self.failure_trace = Some((err.clone(), current.to_vec()));
        }
    }

    /// Drop a trace left by a failure below the current frame that the
    /// running body recovered from
    pub(crate) fn clear_recovered_failure(&mut self) {
        let current = self.frames.as_slice();
        if matches!(&self.failure_trace, Some((_, trace)) if trace.starts_with(current)) {
            self.failure_trace = None;
        }
    }

    /// Frames that were active when the last failure was raised, outermost first
    pub fn take_failure_trace(&mut self) -> Vec<ExpansionFrame> {
        self.failure_trace
            .take()
            .map(|(_, frames)| frames)
            .unwrap_or_default()
    }

    /// Render `err` with one "in expansion of macro" note per frame that was
    /// active when it was raised, innermost first. Errors raised outside any
    /// macro body get no notes.
    pub fn error_diagnostic(&mut self, err: &MacroError) -> Diagnostic {
        let mut diagnostic = err.to_diagnostic();
        let frames = match self.failure_trace.take() {
            Some((traced, frames)) if traced == *err => frames,
            _ => Vec::new(),
        };
        for frame in frames.iter().rev() {
            diagnostic.notes.push(format!(
                "in expansion of macro '{}' at {}",
                frame.macro_name,
                self.source_map.describe(&frame.call_site.span())
            ));
        }
        diagnostic
    }

    // --- Conditional compilation ---

    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.defines.insert(name.into(), value.into());
    }

    pub fn undefine(&mut self, name: &str) -> Option<String> {
        self.defines.remove(name)
    }

    /// `Context.defined(name)`
    pub fn defined(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    /// `Context.definedValue(name)`
    pub fn defined_value(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    pub fn defines(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defines.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // --- Diagnostics ---

    /// `Context.warning(msg, pos)`
    pub fn warning(&mut self, message: impl Into<String>, pos: Position) {
        self.diagnostics.push(MacroDiagnostic::warning(message, pos));
    }

    /// `Context.info(msg, pos)`
    pub fn info(&mut self, message: impl Into<String>, pos: Position) {
        self.diagnostics.push(MacroDiagnostic::info(message, pos));
    }

    pub fn diagnostics(&self) -> &[MacroDiagnostic] {
        &self.diagnostics
    }

    /// Drain collected warnings and infos, converted for rendering
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
            .iter()
            .map(MacroDiagnostic::to_diagnostic)
            .collect()
    }
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new()
    }
}
