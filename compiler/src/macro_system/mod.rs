//! Haxe-style expression macros
//!
//! A macro is a named function, registered ahead of compilation, that takes
//! argument expressions and returns one expression to put in place of its call
//! site. This module covers:
//!
//! - **Expression model** ([`expr`]): `Expr`/`ExprDef`/`Constant`, each node
//!   carrying a [`Position`]
//! - **Registry** ([`registry`]): name to macro table, arity checking and
//!   invocation with call-site tracking
//! - **Compilation context** ([`context`]): position stack, defines and
//!   diagnostics for one compilation pass
//! - **Builders** ([`builders`]): validated literal constructors and `make_expr`
//! - **Expander** ([`expander`]): substitution of every macro call in a tree
//! - **Printer** ([`printer`]): Haxe syntax for expressions
//! - **Builtins** ([`builtins`]): `makeConst`, `makeArray` and friends
//!
//! ```rust,ignore
//! use compiler::macro_system::*;
//!
//! let mut registry = MacroRegistry::new();
//! registry.register_fn("makeConst", Arity::Exact(0), |call, _args| {
//!     builders::int_const("1", call.current_position()?)
//! })?;
//!
//! let mut ctx = CompilationContext::new();
//! let one = registry.invoke(&mut ctx, "makeConst", &[], call_site)?;
//! ```

pub mod builders;
pub mod builtins;
pub mod context;
pub mod errors;
pub mod expander;
pub mod expr;
pub mod position;
pub mod printer;
pub mod registry;

pub use builders::{make_expr, Literal};
pub use builtins::register_builtins;
pub use context::{CompilationContext, ExpansionFrame, DEFAULT_MAX_DEPTH};
pub use errors::{MacroDiagnostic, MacroError, MacroSeverity};
pub use expander::{expand_macros, ExpansionOrigin, ExpansionResult, MacroExpander};
pub use expr::{Binop, Constant, Expr, ExprDef, ObjectField, Unop};
pub use position::{position_of, Position};
pub use registry::{Arity, MacroCall, MacroDefinition, MacroFn, MacroRegistry};
