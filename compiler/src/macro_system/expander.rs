//! Macro expansion over whole expression trees
//!
//! The expander walks an expression top-down. A call `name(args)` whose callee
//! is a registered macro name is replaced by the macro's output, and that
//! output is walked again so macros may produce further macro calls. Arguments
//! are handed to the macro unexpanded, as Haxe passes argument ASTs; whatever
//! the macro puts in its output is expanded afterwards.
//!
//! Re-expansion nesting counts against the context's `max_depth`, the same
//! limit that bounds nested invocation inside macro bodies.

use super::context::CompilationContext;
use super::errors::MacroError;
use super::expr::Expr;
use super::position::Position;
use super::registry::MacroRegistry;

/// One substitution performed by the expander
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionOrigin {
    pub macro_name: String,
    pub call_site: Position,
    /// 1 for a call written in the input, 2 for a call produced by that
    /// macro's output, and so on
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionResult {
    pub expr: Expr,
    /// Number of macro calls substituted
    pub expansions: usize,
    /// Substitutions in the order they happened
    pub origins: Vec<ExpansionOrigin>,
}

pub struct MacroExpander<'r> {
    registry: &'r MacroRegistry,
    chain: Vec<String>,
    origins: Vec<ExpansionOrigin>,
}

impl<'r> MacroExpander<'r> {
    pub fn new(registry: &'r MacroRegistry) -> Self {
        Self {
            registry,
            chain: Vec::new(),
            origins: Vec::new(),
        }
    }

    /// Expand every macro call in `expr`.
    ///
    /// The first failing invocation aborts the walk and its error is returned.
    pub fn expand(&mut self, ctx: &mut CompilationContext, expr: Expr) -> Result<ExpansionResult, MacroError> {
        self.chain.clear();
        self.origins.clear();

        let expr = self.expand_expr(ctx, expr)?;
        let origins = std::mem::take(&mut self.origins);
        log::debug!("expansion finished: {} macro call(s) substituted", origins.len());

        Ok(ExpansionResult {
            expr,
            expansions: origins.len(),
            origins,
        })
    }

    fn expand_expr(&mut self, ctx: &mut CompilationContext, expr: Expr) -> Result<Expr, MacroError> {
        if let Some((name, args)) = expr.as_ident_call() {
            if self.registry.contains(name) {
                let call_site = expr.pos();
                let name = name.to_string();

                if self.chain.len() >= ctx.max_depth() {
                    let mut chain = self.chain.clone();
                    chain.push(name.clone());
                    return Err(MacroError::RecursionLimitExceeded {
                        macro_name: name,
                        depth: self.chain.len() + 1,
                        max_depth: ctx.max_depth(),
                        chain,
                        location: call_site,
                    });
                }

                log::trace!("expanding '{}' at {} (depth {})", name, call_site, self.chain.len() + 1);
                let output = self.registry.invoke(ctx, &name, args, call_site)?;
                self.origins.push(ExpansionOrigin {
                    macro_name: name.clone(),
                    call_site,
                    depth: self.chain.len() + 1,
                });

                self.chain.push(name);
                let expanded = self.expand_expr(ctx, output);
                self.chain.pop();
                return expanded;
            }
        }

        expr.map_children(|child| self.expand_expr(ctx, child))
    }
}

/// Expand `expr` with a fresh expander over `registry`
pub fn expand_macros(
    registry: &MacroRegistry,
    ctx: &mut CompilationContext,
    expr: Expr,
) -> Result<ExpansionResult, MacroError> {
    MacroExpander::new(registry).expand(ctx, expr)
}
