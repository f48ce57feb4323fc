//! End-to-end tests for macro registration, invocation and expansion

use compiler::config::parse_config;
use compiler::macro_system::{
    builders, expand_macros, register_builtins, Arity, CompilationContext, Constant, Expr, ExprDef,
    MacroError, MacroRegistry, Position,
};
use source_map::{FileId, SourceMap};
use std::cell::RefCell;
use std::rc::Rc;

fn pos(line: usize, column: usize) -> Position {
    Position::synthetic(FileId::new(0), line, column)
}

fn call(name: &str, args: Vec<Expr>, at: Position) -> Expr {
    Expr::call(Expr::constant(Constant::Ident(name.into()), at), args, at)
}

#[test]
fn test_make_const_tutorial_example() {
    compiler::logging::init_test();

    let mut map = SourceMap::new();
    let src = "class Main {\n  static function main() {\n    trace(makeConst());\n  }\n}\n";
    let file = map.add_file("Main.hx", src);
    let start = src.find("makeConst").unwrap();
    let call_site = Position::from_offsets(&map, file, start, start + "makeConst()".len()).unwrap();

    let mut registry = MacroRegistry::new();
    register_builtins(&mut registry).unwrap();
    let mut ctx = CompilationContext::with_source_map(map);
    ctx.begin_pass();

    let out = registry.invoke(&mut ctx, "makeConst", &[], call_site).unwrap();
    assert_eq!(out.def(), &ExprDef::Const(Constant::Int(1)));
    assert_eq!(out.pos(), call_site);
    assert_eq!(ctx.source_map().snippet(&out.pos().span()), Some("makeConst()"));
    assert_eq!(call_site.line(), 3);
}

#[test]
fn test_unknown_macro_executes_nothing() {
    let mut registry = MacroRegistry::new();
    register_builtins(&mut registry).unwrap();
    let mut ctx = CompilationContext::new();

    let err = registry.invoke(&mut ctx, "makeConstant", &[], pos(1, 1)).unwrap_err();
    assert_eq!(
        err,
        MacroError::UnknownMacro {
            name: "makeConstant".into(),
            location: pos(1, 1),
        }
    );
    assert_eq!(ctx.invocations(), 0);
    assert_eq!(err.error_code(), "E0702");
}

#[test]
fn test_nested_invocation_positions() {
    let seen: Rc<RefCell<Vec<(String, Position)>>> = Rc::new(RefCell::new(Vec::new()));

    let mut registry = MacroRegistry::new();
    let log_b = seen.clone();
    registry
        .register_fn("b", Arity::Exact(0), move |call, _args| {
            let here = call.current_position()?;
            log_b.borrow_mut().push(("b".into(), here));
            builders::int_const("2", here)
        })
        .unwrap();
    let log_a = seen.clone();
    registry
        .register_fn("a", Arity::Exact(0), move |call, _args| {
            let before = call.current_position()?;
            let inner = call.invoke("b", &[], pos(20, 4))?;
            let after = call.current_position()?;
            log_a.borrow_mut().push(("a-before".into(), before));
            log_a.borrow_mut().push(("a-after".into(), after));
            Ok(builders::array_decl(vec![inner], after))
        })
        .unwrap();

    let mut ctx = CompilationContext::new();
    let out = registry.invoke(&mut ctx, "a", &[], pos(10, 2)).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            ("b".to_string(), pos(20, 4)),
            ("a-before".to_string(), pos(10, 2)),
            ("a-after".to_string(), pos(10, 2)),
        ]
    );
    assert_eq!(out.pos(), pos(10, 2));
    assert_eq!(out.children()[0].pos(), pos(20, 4));
    assert!(ctx.current_position().is_err());
    assert_eq!(ctx.invocations(), 2);
}

#[test]
fn test_mutual_recursion_hits_limit_and_unwinds() {
    let mut registry = MacroRegistry::new();
    registry
        .register_fn("ping", Arity::Exact(0), |call, _args| {
            let here = call.current_position()?;
            call.invoke("pong", &[], here)
        })
        .unwrap();
    registry
        .register_fn("pong", Arity::Exact(0), |call, _args| {
            let here = call.current_position()?;
            call.invoke("ping", &[], here)
        })
        .unwrap();

    let mut ctx = CompilationContext::new();
    ctx.set_max_depth(6);
    let err = registry.invoke(&mut ctx, "ping", &[], pos(1, 1)).unwrap_err();

    match &err {
        MacroError::RecursionLimitExceeded {
            depth,
            max_depth,
            chain,
            ..
        } => {
            assert_eq!(*depth, 7);
            assert_eq!(*max_depth, 6);
            assert_eq!(chain.first().map(String::as_str), Some("ping"));
            assert_eq!(chain.last().map(String::as_str), Some("ping"));
        }
        other => panic!("expected RecursionLimitExceeded, got {:?}", other),
    }
    assert_eq!(ctx.depth(), 0);

    let diagnostic = ctx.error_diagnostic(&err);
    let frames = diagnostic
        .notes
        .iter()
        .filter(|n| n.starts_with("in expansion of macro"))
        .count();
    assert_eq!(frames, 6);
}

#[test]
fn test_expander_with_builtins() {
    let mut registry = MacroRegistry::new();
    register_builtins(&mut registry).unwrap();
    let mut ctx = CompilationContext::new();
    ctx.define("debug", "1");

    // [makeArray(2), ifDefined(debug, sum(1, 2), 0), stringify(makeConst())]
    let input = Expr::array_decl(
        vec![
            call("makeArray", vec![builders::int_const("2", pos(1, 2)).unwrap()], pos(1, 2)),
            call(
                "ifDefined",
                vec![
                    builders::ident("debug", pos(1, 20)).unwrap(),
                    call(
                        "sum",
                        vec![
                            builders::int_const("1", pos(1, 30)).unwrap(),
                            builders::int_const("2", pos(1, 33)).unwrap(),
                        ],
                        pos(1, 26),
                    ),
                    builders::int_const("0", pos(1, 37)).unwrap(),
                ],
                pos(1, 10),
            ),
            call("stringify", vec![call("makeConst", vec![], pos(1, 50))], pos(1, 40)),
            call("trace", vec![], pos(1, 60)),
        ],
        pos(1, 1),
    );

    let result = expand_macros(&registry, &mut ctx, input).unwrap();
    assert_eq!(
        result.expr.to_string(),
        r#"[[0, 1], 3, "makeConst()", trace()]"#
    );
    let names: Vec<_> = result.origins.iter().map(|o| o.macro_name.as_str()).collect();
    assert_eq!(names, vec!["makeArray", "ifDefined", "sum", "stringify"]);
    assert_eq!(result.expansions, 4);
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let mut registry = MacroRegistry::new();
    register_builtins(&mut registry).unwrap();
    let err = registry
        .register_fn("makeConst", Arity::Exact(0), |call, _args| {
            builders::int_const("2", call.current_position()?)
        })
        .unwrap_err();
    assert!(matches!(err, MacroError::DuplicateMacro { ref name, .. } if name == "makeConst"));

    let mut ctx = CompilationContext::new();
    let out = registry.invoke(&mut ctx, "makeConst", &[], pos(1, 1)).unwrap();
    assert_eq!(out.as_int(), Some(1));
}

#[test]
fn test_config_drives_context() {
    let config = parse_config(
        r#"
[macro]
max-depth = 2

[defines]
debug = true
"#,
    )
    .unwrap();

    let mut registry = MacroRegistry::new();
    register_builtins(&mut registry).unwrap();
    registry
        .register_fn("deep", Arity::Exact(0), |call, _args| {
            let here = call.current_position()?;
            let inner = call.invoke("deeper", &[], here)?;
            Ok(inner)
        })
        .unwrap();
    registry
        .register_fn("deeper", Arity::Exact(0), |call, _args| {
            let here = call.current_position()?;
            call.invoke("makeConst", &[], here)
        })
        .unwrap();

    let mut ctx = CompilationContext::new();
    config.apply(&mut ctx);
    assert!(ctx.defined("debug"));

    let err = registry.invoke(&mut ctx, "deep", &[], pos(1, 1)).unwrap_err();
    assert!(matches!(err, MacroError::RecursionLimitExceeded { depth: 3, .. }));
    assert!(registry.invoke(&mut ctx, "deeper", &[], pos(1, 1)).is_ok());
}

#[test]
fn test_begin_pass_isolates_passes() {
    let mut registry = MacroRegistry::new();
    registry
        .register_fn("warn", Arity::Exact(0), |call, _args| {
            let here = call.current_position()?;
            call.warning("deprecated", here);
            Ok(builders::null_const(here))
        })
        .unwrap();

    let mut ctx = CompilationContext::new();
    assert_eq!(ctx.begin_pass(), 1);
    registry.invoke(&mut ctx, "warn", &[], pos(2, 1)).unwrap();
    assert_eq!(ctx.diagnostics().len(), 1);
    assert_eq!(ctx.invocations(), 1);

    assert_eq!(ctx.begin_pass(), 2);
    assert!(ctx.diagnostics().is_empty());
    assert_eq!(ctx.invocations(), 0);
}

#[test]
fn test_malformed_literal_inside_macro_body() {
    let mut registry = MacroRegistry::new();
    registry
        .register_fn("broken", Arity::Exact(0), |call, _args| {
            builders::int_const("0xZZ", call.current_position()?)
        })
        .unwrap();

    let mut ctx = CompilationContext::new();
    let err = registry.invoke(&mut ctx, "broken", &[], pos(4, 8)).unwrap_err();
    assert_eq!(err.location(), Some(pos(4, 8)));
    assert_eq!(err.to_diagnostic().code.as_deref(), Some("E0705"));
    assert!(!ctx.is_active());
}
