//! Convenience constructors for literal and container expressions
//!
//! Builders that take literal text validate it before anything is built, and
//! report [`MacroError::MalformedLiteral`] at the position they were given.
//! [`make_expr`] is the equivalent of `Context.makeExpr`: it turns a plain
//! compile-time value into the expression that would produce it.

use super::errors::MacroError;
use super::expr::{Constant, Expr, ObjectField, Unop};
use super::position::Position;

const REGEXP_FLAGS: &str = "gimsu";

fn malformed(literal: &str, kind: &'static str, reason: impl Into<String>, pos: Position) -> MacroError {
    MacroError::MalformedLiteral {
        literal: literal.to_string(),
        kind,
        reason: reason.into(),
        location: pos,
    }
}

/// Digits with single `_` separators between them
fn strip_separators(digits: &str, radix: u32) -> Result<String, String> {
    if digits.is_empty() {
        return Err("no digits".to_string());
    }
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err("misplaced digit separator".to_string());
    }
    let mut clean = String::with_capacity(digits.len());
    for ch in digits.chars() {
        match ch {
            '_' => {}
            c if c.is_digit(radix) => clean.push(c),
            c => return Err(format!("unexpected character '{}'", c)),
        }
    }
    Ok(clean)
}

/// Parse Haxe integer literal text: decimal or `0x` hexadecimal
pub fn parse_int_literal(literal: &str) -> Result<i64, String> {
    let (digits, radix) = match literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (literal, 10),
    };
    let clean = strip_separators(digits, radix)?;
    if radix == 16 {
        // hex literals denote a bit pattern, so 0xFFFFFFFFFFFFFFFF is -1
        u64::from_str_radix(&clean, 16)
            .map(|v| v as i64)
            .map_err(|_| "value does not fit in 64 bits".to_string())
    } else {
        clean
            .parse::<i64>()
            .map_err(|_| "value does not fit in 64 bits".to_string())
    }
}

/// Parse Haxe float literal text (`1.5`, `.5`, `1.`, `1e10`, `2.5E-3`)
pub fn parse_float_literal(literal: &str) -> Result<f64, String> {
    let (mantissa, exponent) = match literal.find(['e', 'E']) {
        Some(i) => (&literal[..i], Some(&literal[i + 1..])),
        None => (literal, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err("no digits".to_string());
    }
    let mut clean = String::with_capacity(literal.len());
    if !int_part.is_empty() {
        clean.push_str(&strip_separators(int_part, 10)?);
    }
    clean.push('.');
    if !frac_part.is_empty() {
        clean.push_str(&strip_separators(frac_part, 10)?);
    }
    if let Some(exp) = exponent {
        let (sign, digits) = match exp.strip_prefix(['+', '-']) {
            Some(rest) => (&exp[..1], rest),
            None => ("", exp),
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err("malformed exponent".to_string());
        }
        clean.push('e');
        clean.push_str(sign);
        clean.push_str(digits);
    }
    if clean == "." {
        return Err("no digits".to_string());
    }

    let value: f64 = format!("0{}", clean)
        .parse()
        .map_err(|_| "not a number".to_string())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("value out of range".to_string())
    }
}

/// `EConst(CInt(literal))`
pub fn int_const(literal: &str, pos: Position) -> Result<Expr, MacroError> {
    let value = parse_int_literal(literal).map_err(|reason| malformed(literal, "integer", reason, pos))?;
    Ok(Expr::constant(Constant::Int(value), pos))
}

/// `EConst(CFloat(literal))`
pub fn float_const(literal: &str, pos: Position) -> Result<Expr, MacroError> {
    let value = parse_float_literal(literal).map_err(|reason| malformed(literal, "float", reason, pos))?;
    Ok(Expr::constant(Constant::Float(value), pos))
}

pub fn string_const(value: impl Into<String>, pos: Position) -> Expr {
    Expr::constant(Constant::String(value.into()), pos)
}

pub fn is_valid_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `EConst(CIdent(name))`
pub fn ident(name: &str, pos: Position) -> Result<Expr, MacroError> {
    if !is_valid_ident(name) {
        return Err(malformed(
            name,
            "identifier",
            "identifiers start with a letter or '_' and contain only letters, digits and '_'",
            pos,
        ));
    }
    Ok(Expr::constant(Constant::Ident(name.to_string()), pos))
}

pub fn bool_const(value: bool, pos: Position) -> Expr {
    Expr::constant(Constant::Ident(value.to_string()), pos)
}

pub fn null_const(pos: Position) -> Expr {
    Expr::constant(Constant::Ident("null".to_string()), pos)
}

/// `~/pattern/flags`
pub fn regexp(pattern: &str, flags: &str, pos: Position) -> Result<Expr, MacroError> {
    if let Some(bad) = flags.chars().find(|c| !REGEXP_FLAGS.contains(*c)) {
        return Err(malformed(
            flags,
            "regexp flag",
            format!("unknown flag '{}', expected one of '{}'", bad, REGEXP_FLAGS),
            pos,
        ));
    }
    Ok(Expr::constant(
        Constant::Regexp {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
        },
        pos,
    ))
}

/// `EArrayDecl(items)`
pub fn array_decl(items: Vec<Expr>, pos: Position) -> Expr {
    Expr::array_decl(items, pos)
}

/// Array declaration of integer literals; every literal is checked before the
/// array is built
pub fn int_array<S: AsRef<str>>(literals: &[S], pos: Position) -> Result<Expr, MacroError> {
    let items = literals
        .iter()
        .map(|lit| int_const(lit.as_ref(), pos))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::array_decl(items, pos))
}

/// A plain compile-time value, as accepted by [`make_expr`]
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Literal>),
    Object(Vec<(String, Literal)>),
}

impl From<serde_json::Value> for Literal {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Literal::Null,
            Value::Bool(b) => Literal::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Literal::Int(i),
                None => Literal::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Literal::String(s),
            Value::Array(items) => Literal::Array(items.into_iter().map(Literal::from).collect()),
            Value::Object(fields) => Literal::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Literal::from(v)))
                    .collect(),
            ),
        }
    }
}

/// `Context.makeExpr(value, pos)`.
///
/// Every node of the result carries `pos`. Negative numbers become a negation
/// of a positive constant, and non-finite floats become reads of the matching
/// `Math` constant.
pub fn make_expr(value: &Literal, pos: Position) -> Expr {
    match value {
        Literal::Null => null_const(pos),
        Literal::Bool(b) => bool_const(*b, pos),
        Literal::Int(i) if *i < 0 => match i.checked_neg() {
            Some(abs) => negate(Expr::constant(Constant::Int(abs), pos), pos),
            // i64::MIN has no positive counterpart
            None => Expr::constant(Constant::Int(*i), pos),
        },
        Literal::Int(i) => Expr::constant(Constant::Int(*i), pos),
        Literal::Float(f) if f.is_nan() => math_field("NaN", pos),
        Literal::Float(f) if f.is_infinite() => {
            math_field(if *f > 0.0 { "POSITIVE_INFINITY" } else { "NEGATIVE_INFINITY" }, pos)
        }
        Literal::Float(f) if f.is_sign_negative() && *f != 0.0 => {
            negate(Expr::constant(Constant::Float(-f), pos), pos)
        }
        Literal::Float(f) => Expr::constant(Constant::Float(*f), pos),
        Literal::String(s) => string_const(s.clone(), pos),
        Literal::Array(items) => Expr::array_decl(items.iter().map(|v| make_expr(v, pos)).collect(), pos),
        Literal::Object(fields) => Expr::object(
            fields
                .iter()
                .map(|(name, v)| ObjectField {
                    field: name.clone(),
                    expr: make_expr(v, pos),
                })
                .collect(),
            pos,
        ),
    }
}

fn negate(expr: Expr, pos: Position) -> Expr {
    Expr::unop(Unop::Neg, false, expr, pos)
}

fn math_field(name: &str, pos: Position) -> Expr {
    Expr::field(Expr::constant(Constant::Ident("Math".to_string()), pos), name, pos)
}
