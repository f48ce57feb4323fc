use super::context::CompilationContext;
use super::errors::MacroError;
use super::expr::Expr;
use super::position::Position;
use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use source_map::SourceMap;
use std::fmt;

/// Number of arguments a macro accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Trailing rest argument (`...args`)
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Signature of a macro body
pub type MacroFn = dyn Fn(&mut MacroCall<'_>, &[Expr]) -> Result<Expr, MacroError>;

/// A registered macro.
///
/// Bodies are plain closures or functions. They hold no per-call state; every
/// invocation gets its arguments and a fresh [`MacroCall`] view of the context.
pub struct MacroDefinition {
    name: String,
    arity: Arity,
    location: Option<Position>,
    doc: Option<String>,
    body: Box<MacroFn>,
}

impl MacroDefinition {
    pub fn new<F>(name: impl Into<String>, arity: Arity, body: F) -> Self
    where
        F: Fn(&mut MacroCall<'_>, &[Expr]) -> Result<Expr, MacroError> + 'static,
    {
        Self {
            name: name.into(),
            arity,
            location: None,
            doc: None,
            body: Box::new(body),
        }
    }

    /// Where the macro is defined, for duplicate-registration reports
    pub fn defined_at(mut self, location: Position) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn location(&self) -> Option<Position> {
        self.location
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

impl fmt::Debug for MacroDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroDefinition")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Name → macro table.
///
/// Iteration follows registration order.
#[derive(Debug, Default)]
pub struct MacroRegistry {
    macros: IndexMap<String, MacroDefinition, FxBuildHasher>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a macro. An existing macro with the same name stays registered and
    /// the new one is rejected.
    pub fn register(&mut self, definition: MacroDefinition) -> Result<(), MacroError> {
        if let Some(existing) = self.macros.get(&definition.name) {
            log::warn!("rejecting duplicate registration of macro '{}'", definition.name);
            return Err(MacroError::DuplicateMacro {
                name: definition.name,
                location: definition.location,
                previous: existing.location,
            });
        }

        log::debug!(
            "registered macro '{}' (arity {})",
            definition.name,
            definition.arity
        );
        self.macros.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn register_fn<F>(&mut self, name: &str, arity: Arity, body: F) -> Result<(), MacroError>
    where
        F: Fn(&mut MacroCall<'_>, &[Expr]) -> Result<Expr, MacroError> + 'static,
    {
        self.register(MacroDefinition::new(name, arity, body))
    }

    pub fn unregister(&mut self, name: &str) -> Option<MacroDefinition> {
        self.macros.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.macros.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &MacroDefinition> {
        self.macros.values()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Run macro `name` for the call site at `call_site`.
    ///
    /// Lookup and the arity check happen before anything is pushed or run.
    /// The returned expression is meant to replace the call site as is.
    pub fn invoke(
        &self,
        ctx: &mut CompilationContext,
        name: &str,
        args: &[Expr],
        call_site: Position,
    ) -> Result<Expr, MacroError> {
        if !ctx.is_active() {
            ctx.take_failure_trace();
        }

        let definition = self.macros.get(name).ok_or_else(|| MacroError::UnknownMacro {
            name: name.to_string(),
            location: call_site,
        })?;

        if !definition.arity.accepts(args.len()) {
            return Err(MacroError::ArityMismatch {
                macro_name: name.to_string(),
                expected: definition.arity,
                found: args.len(),
                location: call_site,
            });
        }

        ctx.enter(name, call_site)?;
        log::debug!("invoking macro '{}' at {}", name, call_site);

        let result = {
            let mut call = MacroCall {
                registry: self,
                ctx: &mut *ctx,
                name,
            };
            (definition.body)(&mut call, args)
        };

        match &result {
            Ok(_) => ctx.clear_recovered_failure(),
            Err(err) => ctx.record_failure(err),
        }
        ctx.exit();

        if let Err(err) = &result {
            log::debug!("macro '{}' failed: {}", name, err);
        }
        result
    }
}

/// What a macro body can see and do while it runs
pub struct MacroCall<'a> {
    registry: &'a MacroRegistry,
    ctx: &'a mut CompilationContext,
    name: &'a str,
}

impl<'a> MacroCall<'a> {
    /// Name of the running macro
    pub fn macro_name(&self) -> &str {
        self.name
    }

    /// `Context.currentPos()`
    pub fn current_position(&self) -> Result<Position, MacroError> {
        self.ctx.current_position()
    }

    /// Invoke another macro from inside this one
    pub fn invoke(&mut self, name: &str, args: &[Expr], call_site: Position) -> Result<Expr, MacroError> {
        self.registry.invoke(self.ctx, name, args, call_site)
    }

    pub fn context(&self) -> &CompilationContext {
        &*self.ctx
    }

    pub fn source_map(&self) -> &SourceMap {
        self.ctx.source_map()
    }

    pub fn defined(&self, flag: &str) -> bool {
        self.ctx.defined(flag)
    }

    pub fn defined_value(&self, flag: &str) -> Option<&str> {
        self.ctx.defined_value(flag)
    }

    pub fn warning(&mut self, message: impl Into<String>, pos: Position) {
        self.ctx.warning(message, pos);
    }

    pub fn info(&mut self, message: impl Into<String>, pos: Position) {
        self.ctx.info(message, pos);
    }

    /// `Context.error(msg, pos)`: build the error that aborts this macro
    pub fn error(&self, message: impl Into<String>, pos: Position) -> MacroError {
        MacroError::Custom {
            message: message.into(),
            location: pos,
        }
    }

    /// Error for an argument this macro cannot handle
    pub fn invalid_argument(&self, message: impl Into<String>, pos: Position) -> MacroError {
        MacroError::InvalidArgument {
            macro_name: self.name.to_string(),
            message: message.into(),
            location: pos,
        }
    }
}
