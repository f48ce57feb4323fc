//! Haxe surface syntax for expressions
//!
//! Output is single-line. Operators are printed as written in the tree; no
//! parentheses are added beyond `Parenthesis` nodes.

use super::expr::{Constant, Expr, ExprDef};
use std::fmt::{self, Write};

/// Quote and escape a string the way a Haxe double-quoted literal needs it
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        "Math.NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "Math.POSITIVE_INFINITY".to_string()
        } else {
            "Math.NEGATIVE_INFINITY".to_string()
        }
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Float(v) => f.write_str(&format_float(*v)),
            Constant::String(s) => f.write_str(&escape_string(s)),
            Constant::Ident(name) => f.write_str(name),
            Constant::Regexp { pattern, flags } => write!(f, "~/{}/{}", pattern, flags),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.def() {
            ExprDef::Const(c) => write!(f, "{}", c),
            ExprDef::Array(target, index) => write!(f, "{}[{}]", target, index),
            ExprDef::Binop(op, left, right) => write!(f, "{} {} {}", left, op.symbol(), right),
            ExprDef::Field(target, name) => write!(f, "{}.{}", target, name),
            ExprDef::Parenthesis(inner) => write!(f, "({})", inner),
            ExprDef::ObjectDecl(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.field, field.expr)?;
                }
                f.write_str("}")
            }
            ExprDef::ArrayDecl(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            ExprDef::Call(callee, args) => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            ExprDef::Unop(op, true, operand) => write!(f, "{}{}", operand, op.symbol()),
            ExprDef::Unop(op, false, operand) => write!(f, "{}{}", op.symbol(), operand),
            ExprDef::Block(exprs) => {
                f.write_str("{")?;
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{};", e)?;
                }
                f.write_str("}")
            }
            ExprDef::If(cond, then, otherwise) => {
                write!(f, "if ({}) {}", cond, then)?;
                if let Some(e) = otherwise {
                    write!(f, " else {}", e)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macro_system::builders::{self, Literal};
    use crate::macro_system::expr::{Binop, ObjectField, Unop};
    use crate::macro_system::position::Position;
    use source_map::FileId;

    fn pos() -> Position {
        Position::synthetic(FileId::new(0), 1, 1)
    }

    fn id(name: &str) -> Expr {
        Expr::constant(Constant::Ident(name.into()), pos())
    }

    fn int(v: i64) -> Expr {
        Expr::constant(Constant::Int(v), pos())
    }

    #[test]
    fn test_constants() {
        assert_eq!(int(42).to_string(), "42");
        assert_eq!(Expr::constant(Constant::Float(2.0), pos()).to_string(), "2.0");
        assert_eq!(Expr::constant(Constant::Float(0.25), pos()).to_string(), "0.25");
        assert_eq!(
            builders::string_const("a\"b\\c\n\u{1}", pos()).to_string(),
            r#""a\"b\\c\n\x01""#
        );
        assert_eq!(builders::regexp("[0-9]+", "g", pos()).unwrap().to_string(), "~/[0-9]+/g");
        assert_eq!(builders::null_const(pos()).to_string(), "null");
    }

    #[test]
    fn test_compound_expressions() {
        let sum = Expr::paren(Expr::binop(Binop::Add, id("a"), id("b"), pos()), pos());
        assert_eq!(sum.to_string(), "(a + b)");

        let call = Expr::call(id("foo"), vec![id("a"), int(1)], pos());
        assert_eq!(call.to_string(), "foo(a, 1)");

        let arr = builders::int_array(&["1", "2"], pos()).unwrap();
        assert_eq!(arr.to_string(), "[1, 2]");
        assert_eq!(Expr::array_access(id("xs"), int(0), pos()).to_string(), "xs[0]");

        let block = Expr::block(vec![id("a"), id("b")], pos());
        assert_eq!(block.to_string(), "{a; b;}");
        assert_eq!(Expr::block(vec![], pos()).to_string(), "{}");

        let object = Expr::object(
            vec![ObjectField {
                field: "x".into(),
                expr: int(1),
            }],
            pos(),
        );
        assert_eq!(object.to_string(), "{x: 1}");

        let cond = Expr::if_else(id("c"), int(1), Some(int(2)), pos());
        assert_eq!(cond.to_string(), "if (c) 1 else 2");
    }

    #[test]
    fn test_unops_and_make_expr_output() {
        assert_eq!(Expr::unop(Unop::Increment, true, id("i"), pos()).to_string(), "i++");
        assert_eq!(Expr::unop(Unop::Not, false, id("ok"), pos()).to_string(), "!ok");
        assert_eq!(builders::make_expr(&Literal::Int(-3), pos()).to_string(), "-3");
        assert_eq!(
            builders::make_expr(&Literal::Float(f64::NEG_INFINITY), pos()).to_string(),
            "Math.NEGATIVE_INFINITY"
        );
    }
}
