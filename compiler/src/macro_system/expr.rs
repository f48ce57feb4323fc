//! Compile-time expression tree
//!
//! Mirrors the shape of `haxe.macro.Expr`: an [`Expr`] pairs an [`ExprDef`]
//! (what kind of expression) with a [`Position`] (where it came from). Children
//! are owned, so a constructed tree is always complete. Fields are private and
//! there are no mutating methods; rewriting a tree means building a new one.

use super::position::Position;
use serde::Serialize;

/// Literal constants (`haxe.macro.Constant`).
///
/// `true`, `false` and `null` are identifiers, as in Haxe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    Int(i64),
    Float(f64),
    String(String),
    Ident(String),
    Regexp { pattern: String, flags: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Binop {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    BoolAnd,
    BoolOr,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
    Assign,
}

impl Binop {
    pub fn symbol(self) -> &'static str {
        match self {
            Binop::Add => "+",
            Binop::Sub => "-",
            Binop::Mult => "*",
            Binop::Div => "/",
            Binop::Mod => "%",
            Binop::Eq => "==",
            Binop::NotEq => "!=",
            Binop::Gt => ">",
            Binop::Gte => ">=",
            Binop::Lt => "<",
            Binop::Lte => "<=",
            Binop::BoolAnd => "&&",
            Binop::BoolOr => "||",
            Binop::And => "&",
            Binop::Or => "|",
            Binop::Xor => "^",
            Binop::Shl => "<<",
            Binop::Shr => ">>",
            Binop::UShr => ">>>",
            Binop::Assign => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Unop {
    Increment,
    Decrement,
    Not,
    Neg,
    NegBits,
}

impl Unop {
    pub fn symbol(self) -> &'static str {
        match self {
            Unop::Increment => "++",
            Unop::Decrement => "--",
            Unop::Not => "!",
            Unop::Neg => "-",
            Unop::NegBits => "~",
        }
    }
}

/// One `name: value` entry of an object declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectField {
    pub field: String,
    pub expr: Expr,
}

/// Expression kinds (`haxe.macro.ExprDef` subset)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprDef {
    /// `1`, `"s"`, `foo`
    Const(Constant),
    /// `e[index]`
    Array(Box<Expr>, Box<Expr>),
    Binop(Binop, Box<Expr>, Box<Expr>),
    /// `e.field`
    Field(Box<Expr>, String),
    Parenthesis(Box<Expr>),
    ObjectDecl(Vec<ObjectField>),
    /// `[a, b, c]`
    ArrayDecl(Vec<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    /// Unary operator; the flag is `true` for postfix (`i++`)
    Unop(Unop, bool, Box<Expr>),
    Block(Vec<Expr>),
    If(Box<Expr>, Box<Expr>, Option<Box<Expr>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    expr: ExprDef,
    pos: Position,
}

impl Expr {
    pub fn new(expr: ExprDef, pos: Position) -> Self {
        Self { expr, pos }
    }

    pub fn constant(constant: Constant, pos: Position) -> Self {
        Self::new(ExprDef::Const(constant), pos)
    }

    pub fn array_decl(items: Vec<Expr>, pos: Position) -> Self {
        Self::new(ExprDef::ArrayDecl(items), pos)
    }

    pub fn array_access(target: Expr, index: Expr, pos: Position) -> Self {
        Self::new(ExprDef::Array(Box::new(target), Box::new(index)), pos)
    }

    pub fn binop(op: Binop, left: Expr, right: Expr, pos: Position) -> Self {
        Self::new(ExprDef::Binop(op, Box::new(left), Box::new(right)), pos)
    }

    pub fn unop(op: Unop, postfix: bool, operand: Expr, pos: Position) -> Self {
        Self::new(ExprDef::Unop(op, postfix, Box::new(operand)), pos)
    }

    pub fn field(target: Expr, name: impl Into<String>, pos: Position) -> Self {
        Self::new(ExprDef::Field(Box::new(target), name.into()), pos)
    }

    pub fn paren(inner: Expr, pos: Position) -> Self {
        Self::new(ExprDef::Parenthesis(Box::new(inner)), pos)
    }

    pub fn object(fields: Vec<ObjectField>, pos: Position) -> Self {
        Self::new(ExprDef::ObjectDecl(fields), pos)
    }

    pub fn call(callee: Expr, args: Vec<Expr>, pos: Position) -> Self {
        Self::new(ExprDef::Call(Box::new(callee), args), pos)
    }

    pub fn block(exprs: Vec<Expr>, pos: Position) -> Self {
        Self::new(ExprDef::Block(exprs), pos)
    }

    pub fn if_else(cond: Expr, then: Expr, otherwise: Option<Expr>, pos: Position) -> Self {
        Self::new(
            ExprDef::If(Box::new(cond), Box::new(then), otherwise.map(Box::new)),
            pos,
        )
    }

    pub fn def(&self) -> &ExprDef {
        &self.expr
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn into_parts(self) -> (ExprDef, Position) {
        (self.expr, self.pos)
    }

    /// Same expression, attributed to another position
    pub fn with_pos(self, pos: Position) -> Self {
        Self { pos, ..self }
    }

    /// Name and arguments if this is a call to a plain identifier (`name(args)`)
    pub fn as_ident_call(&self) -> Option<(&str, &[Expr])> {
        match &self.expr {
            ExprDef::Call(callee, args) => match &callee.expr {
                ExprDef::Const(Constant::Ident(name)) => Some((name.as_str(), args.as_slice())),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.expr {
            ExprDef::Const(Constant::Ident(name)) => Some(name),
            _ => None,
        }
    }

    /// Integer value of `1`, `-1` or `(1)`
    pub fn as_int(&self) -> Option<i64> {
        match &self.expr {
            ExprDef::Const(Constant::Int(value)) => Some(*value),
            ExprDef::Unop(Unop::Neg, false, inner) => inner.as_int().and_then(i64::checked_neg),
            ExprDef::Parenthesis(inner) => inner.as_int(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match &self.expr {
            ExprDef::Const(Constant::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Direct sub-expressions, in source order
    pub fn children(&self) -> Vec<&Expr> {
        match &self.expr {
            ExprDef::Const(_) => Vec::new(),
            ExprDef::Array(target, index) => vec![&**target, &**index],
            ExprDef::Binop(_, left, right) => vec![&**left, &**right],
            ExprDef::Field(target, _) => vec![&**target],
            ExprDef::Parenthesis(inner) => vec![&**inner],
            ExprDef::ObjectDecl(fields) => fields.iter().map(|f| &f.expr).collect(),
            ExprDef::ArrayDecl(items) | ExprDef::Block(items) => items.iter().collect(),
            ExprDef::Call(callee, args) => std::iter::once(callee.as_ref()).chain(args).collect(),
            ExprDef::Unop(_, _, operand) => vec![&**operand],
            ExprDef::If(cond, then, otherwise) => {
                let mut out = vec![&**cond, &**then];
                out.extend(otherwise.as_deref());
                out
            }
        }
    }

    /// Rebuild this node with every direct child passed through `f`.
    ///
    /// Stops at the first error. The node's own position is kept.
    pub fn map_children<E, F>(self, mut f: F) -> Result<Expr, E>
    where
        F: FnMut(Expr) -> Result<Expr, E>,
    {
        let mut boxed = |e: Box<Expr>| f(*e).map(Box::new);
        let expr = match self.expr {
            ExprDef::Const(c) => ExprDef::Const(c),
            ExprDef::Array(target, index) => ExprDef::Array(boxed(target)?, boxed(index)?),
            ExprDef::Binop(op, left, right) => ExprDef::Binop(op, boxed(left)?, boxed(right)?),
            ExprDef::Field(target, name) => ExprDef::Field(boxed(target)?, name),
            ExprDef::Parenthesis(inner) => ExprDef::Parenthesis(boxed(inner)?),
            ExprDef::Unop(op, postfix, operand) => ExprDef::Unop(op, postfix, boxed(operand)?),
            ExprDef::If(cond, then, otherwise) => {
                let cond = boxed(cond)?;
                let then = boxed(then)?;
                let otherwise = match otherwise {
                    Some(e) => Some(boxed(e)?),
                    None => None,
                };
                ExprDef::If(cond, then, otherwise)
            }
            ExprDef::Call(callee, args) => {
                let callee = boxed(callee)?;
                drop(boxed);
                ExprDef::Call(callee, args.into_iter().map(&mut f).collect::<Result<_, _>>()?)
            }
            ExprDef::ObjectDecl(fields) => {
                drop(boxed);
                let mut mapped = Vec::with_capacity(fields.len());
                for of in fields {
                    mapped.push(ObjectField {
                        field: of.field,
                        expr: f(of.expr)?,
                    });
                }
                ExprDef::ObjectDecl(mapped)
            }
            ExprDef::ArrayDecl(items) => {
                drop(boxed);
                ExprDef::ArrayDecl(items.into_iter().map(&mut f).collect::<Result<_, _>>()?)
            }
            ExprDef::Block(items) => {
                drop(boxed);
                ExprDef::Block(items.into_iter().map(&mut f).collect::<Result<_, _>>()?)
            }
        };
        Ok(Expr {
            expr,
            pos: self.pos,
        })
    }

    /// Number of nodes in the tree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }
}
