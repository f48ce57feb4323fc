//! Stock macros
//!
//! | macro | arity | result |
//! |-------|-------|--------|
//! | `makeConst()` | 0 | integer `1` |
//! | `makeArray(n)` | 1 | `[0, 1, ..., n-1]` |
//! | `sum(...)` | any | sum of integer constant arguments |
//! | `stringify(e)` | 1 | `e` printed as a string constant |
//! | `here()` | 0 | `"file:line:column"` of the call site |
//! | `ifDefined(flag, a, b)` | 3 | `a` if `flag` is defined, else `b` |
//!
//! Every expression they build is positioned at the macro's call site, except
//! `ifDefined`, which returns one of its arguments untouched.

use super::builders::{self, Literal};
use super::errors::MacroError;
use super::expr::{Constant, Expr, ExprDef};
use super::registry::{Arity, MacroCall, MacroDefinition, MacroRegistry};

/// Largest array `makeArray` will build
pub const MAX_ARRAY_LEN: i64 = 1 << 16;

pub fn register_builtins(registry: &mut MacroRegistry) -> Result<(), MacroError> {
    registry.register(
        MacroDefinition::new("makeConst", Arity::Exact(0), make_const)
            .with_doc("The integer constant 1, positioned at the call site"),
    )?;
    registry.register(
        MacroDefinition::new("makeArray", Arity::Exact(1), make_array)
            .with_doc("Array declaration [0, ..., n-1] for an integer literal n"),
    )?;
    registry.register(
        MacroDefinition::new("sum", Arity::AtLeast(0), sum)
            .with_doc("Sum of integer constant arguments, folded at compile time"),
    )?;
    registry.register(
        MacroDefinition::new("stringify", Arity::Exact(1), stringify)
            .with_doc("The argument expression printed as a string constant"),
    )?;
    registry.register(
        MacroDefinition::new("here", Arity::Exact(0), here)
            .with_doc("String \"file:line:column\" of the call site"),
    )?;
    registry.register(
        MacroDefinition::new("ifDefined", Arity::Exact(3), if_defined)
            .with_doc("Second argument if the flag is defined, third otherwise"),
    )?;
    log::debug!("registered {} builtin macros", registry.len());
    Ok(())
}

fn make_const(call: &mut MacroCall<'_>, _args: &[Expr]) -> Result<Expr, MacroError> {
    builders::int_const("1", call.current_position()?)
}

fn make_array(call: &mut MacroCall<'_>, args: &[Expr]) -> Result<Expr, MacroError> {
    let here = call.current_position()?;
    let n = args[0]
        .as_int()
        .ok_or_else(|| call.invalid_argument("expected an integer literal", args[0].pos()))?;
    if !(0..=MAX_ARRAY_LEN).contains(&n) {
        return Err(call.invalid_argument(
            format!("length {} is outside 0..={}", n, MAX_ARRAY_LEN),
            args[0].pos(),
        ));
    }

    let items = (0..n).map(|i| Expr::constant(Constant::Int(i), here)).collect();
    Ok(builders::array_decl(items, here))
}

fn sum(call: &mut MacroCall<'_>, args: &[Expr]) -> Result<Expr, MacroError> {
    let here = call.current_position()?;
    let mut total: i64 = 0;
    for arg in args {
        let value = arg
            .as_int()
            .ok_or_else(|| call.invalid_argument("expected an integer constant", arg.pos()))?;
        total = total
            .checked_add(value)
            .ok_or_else(|| call.invalid_argument("sum overflows a 64-bit integer", arg.pos()))?;
    }
    Ok(builders::make_expr(&Literal::Int(total), here))
}

fn stringify(call: &mut MacroCall<'_>, args: &[Expr]) -> Result<Expr, MacroError> {
    let here = call.current_position()?;
    Ok(builders::string_const(args[0].to_string(), here))
}

fn here(call: &mut MacroCall<'_>, _args: &[Expr]) -> Result<Expr, MacroError> {
    let here = call.current_position()?;
    let text = call.source_map().describe(&here.span());
    Ok(builders::string_const(text, here))
}

fn if_defined(call: &mut MacroCall<'_>, args: &[Expr]) -> Result<Expr, MacroError> {
    let flag = match args[0].def() {
        ExprDef::Const(Constant::Ident(name)) | ExprDef::Const(Constant::String(name)) => name.as_str(),
        _ => {
            return Err(call.invalid_argument(
                "flag must be an identifier or a string",
                args[0].pos(),
            ))
        }
    };
    let chosen = if call.defined(flag) { &args[1] } else { &args[2] };
    log::trace!("ifDefined({}) -> {}", flag, chosen);
    Ok(chosen.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macro_system::context::CompilationContext;
    use crate::macro_system::position::Position;
    use source_map::FileId;

    fn pos(line: usize) -> Position {
        Position::synthetic(FileId::new(0), line, 1)
    }

    fn int(v: i64) -> Expr {
        Expr::constant(Constant::Int(v), pos(9))
    }

    fn setup() -> (MacroRegistry, CompilationContext) {
        let mut registry = MacroRegistry::new();
        register_builtins(&mut registry).unwrap();
        (registry, CompilationContext::new())
    }

    #[test]
    fn test_registration_order_and_duplicates() {
        let (mut registry, _) = setup();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["makeConst", "makeArray", "sum", "stringify", "here", "ifDefined"]
        );
        assert!(matches!(
            register_builtins(&mut registry),
            Err(MacroError::DuplicateMacro { .. })
        ));
    }

    #[test]
    fn test_make_const() {
        let (registry, mut ctx) = setup();
        let out = registry.invoke(&mut ctx, "makeConst", &[], pos(3)).unwrap();
        assert_eq!(out, Expr::constant(Constant::Int(1), pos(3)));
    }

    #[test]
    fn test_make_array() {
        let (registry, mut ctx) = setup();
        let out = registry.invoke(&mut ctx, "makeArray", &[int(3)], pos(2)).unwrap();
        assert_eq!(out.to_string(), "[0, 1, 2]");
        assert!(out.children().iter().all(|c| c.pos() == pos(2)));

        let empty = registry.invoke(&mut ctx, "makeArray", &[int(0)], pos(2)).unwrap();
        assert_eq!(empty.to_string(), "[]");

        let err = registry.invoke(&mut ctx, "makeArray", &[int(-1)], pos(2)).unwrap_err();
        assert!(matches!(err, MacroError::InvalidArgument { .. }));
        assert_eq!(err.location(), Some(pos(9)));

        let not_int = builders::string_const("3", pos(4));
        assert!(registry.invoke(&mut ctx, "makeArray", &[not_int], pos(2)).is_err());
    }

    #[test]
    fn test_sum() {
        let (registry, mut ctx) = setup();
        let out = registry
            .invoke(&mut ctx, "sum", &[int(1), int(2), int(-10)], pos(1))
            .unwrap();
        assert_eq!(out.as_int(), Some(-7));
        assert_eq!(out.to_string(), "-7");

        let zero = registry.invoke(&mut ctx, "sum", &[], pos(1)).unwrap();
        assert_eq!(zero.as_int(), Some(0));

        let err = registry
            .invoke(&mut ctx, "sum", &[int(i64::MAX), int(1)], pos(1))
            .unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_stringify_and_here() {
        let (registry, mut ctx) = setup();
        let file = ctx.add_file("Main.hx", "class Main {\n  var x = here();\n}");
        let at = Position::from_offsets(ctx.source_map(), file, 23, 29).unwrap();

        let out = registry.invoke(&mut ctx, "here", &[], at).unwrap();
        assert_eq!(out.as_string(), Some("Main.hx:2:11"));
        assert_eq!(out.pos(), at);

        let arr = builders::int_array(&["1", "2"], pos(1)).unwrap();
        let out = registry.invoke(&mut ctx, "stringify", &[arr], pos(1)).unwrap();
        assert_eq!(out.as_string(), Some("[1, 2]"));
    }

    #[test]
    fn test_if_defined() {
        let (registry, mut ctx) = setup();
        let flag = builders::ident("debug", pos(1)).unwrap();
        let args = [flag, int(1), int(2)];

        let out = registry.invoke(&mut ctx, "ifDefined", &args, pos(1)).unwrap();
        assert_eq!(out.as_int(), Some(2));

        ctx.define("debug", "1");
        let out = registry.invoke(&mut ctx, "ifDefined", &args, pos(1)).unwrap();
        assert_eq!(out.as_int(), Some(1));

        let bad = [int(0), int(1), int(2)];
        assert!(registry.invoke(&mut ctx, "ifDefined", &bad, pos(1)).is_err());
    }
}
