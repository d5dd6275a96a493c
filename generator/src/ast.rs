// ast.rs — Shader AST nodes and GLSL rendering
//
// Data-only expression and statement nodes for the generated shader body.
// Every expression node carries its result type so rewrite passes never
// have to re-infer types. Rendering performs no validation; semantic
// validity is the generator's responsibility.

use std::fmt;
use std::fmt::Write as _;

use crate::types::{BasicType, ScalarKind, TypeDescriptor};

// ── Operators ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnOp {
    pub fn is_prefix(self) -> bool {
        !matches!(self, UnOp::PostInc | UnOp::PostDec)
    }

    pub fn is_inc_dec(self) -> bool {
        matches!(
            self,
            UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec
        )
    }

    pub fn glsl(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::BitNot => "~",
            UnOp::PreInc | UnOp::PostInc => "++",
            UnOp::PreDec | UnOp::PostDec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    LogAnd,
    LogOr,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
}

impl BinOp {
    pub fn glsl(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::LogAnd => "&&",
            BinOp::LogOr => "||",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::EqEq => "==",
            BinOp::Ne => "!=",
        }
    }
}

// ── Expressions ──────────────────────────────────────────────────────────

/// An expression node. Constructor calls and builtin calls share the
/// `Call` node; the name decides which is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i32),
    UintLit(u32),
    FloatLit(f32),
    BoolLit(bool),
    Ident {
        name: String,
        ty: BasicType,
    },
    Unary {
        op: UnOp,
        ty: BasicType,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        ty: BasicType,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        ty: BasicType,
        args: Vec<Expr>,
    },
    Index {
        ty: BasicType,
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// Component access / swizzle (`v.x`, `v.xyz`).
    Field {
        ty: BasicType,
        base: Box<Expr>,
        member: &'static str,
    },
}

impl Expr {
    /// Result type of this expression.
    pub fn ty(&self) -> BasicType {
        match self {
            Expr::IntLit(_) => BasicType::scalar(ScalarKind::Int),
            Expr::UintLit(_) => BasicType::scalar(ScalarKind::Uint),
            Expr::FloatLit(_) => BasicType::scalar(ScalarKind::Float),
            Expr::BoolLit(_) => BasicType::scalar(ScalarKind::Bool),
            Expr::Ident { ty, .. }
            | Expr::Unary { ty, .. }
            | Expr::Binary { ty, .. }
            | Expr::Call { ty, .. }
            | Expr::Index { ty, .. }
            | Expr::Field { ty, .. } => *ty,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLit(v) => write!(f, "{}", v),
            Expr::UintLit(v) => write!(f, "{}u", v),
            // {:?} keeps a decimal point or exponent, which GLSL needs.
            Expr::FloatLit(v) => write!(f, "{:?}", v),
            Expr::BoolLit(v) => write!(f, "{}", v),
            Expr::Ident { name, .. } => write!(f, "{}", name),
            Expr::Unary { op, operand, .. } => {
                if op.is_prefix() {
                    write!(f, "({}{})", op.glsl(), operand)
                } else {
                    write!(f, "({}{})", operand, op.glsl())
                }
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                write!(f, "({} {} {})", lhs, op.glsl(), rhs)
            }
            Expr::Call { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Index { base, index, .. } => write!(f, "{}[{}]", base, index),
            Expr::Field { base, member, .. } => write!(f, "{}.{}", base, member),
        }
    }
}

// ── Statements ───────────────────────────────────────────────────────────

/// A variable declaration, local or top-level.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeDescriptor,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Decl(VarDecl),
    Assign { target: Expr, value: Expr },
    Expr(Expr),
    Block(Vec<Stmt>),
}

/// Render one statement at the given indentation into `out`.
pub fn write_stmt(out: &mut String, stmt: &Stmt, indent: usize) {
    let pad = " ".repeat(indent);
    match stmt {
        Stmt::Decl(decl) => match &decl.init {
            Some(init) => {
                let _ = writeln!(out, "{}{} = {};", pad, decl.ty.glsl_decl(&decl.name), init);
            }
            None => {
                let _ = writeln!(out, "{}{};", pad, decl.ty.glsl_decl(&decl.name));
            }
        },
        Stmt::Assign { target, value } => {
            let _ = writeln!(out, "{}{} = {};", pad, target, value);
        }
        Stmt::Expr(expr) => {
            let _ = writeln!(out, "{}{};", pad, expr);
        }
        Stmt::Block(body) => {
            let _ = writeln!(out, "{}{{", pad);
            for inner in body {
                write_stmt(out, inner, indent + 4);
            }
            let _ = writeln!(out, "{}}}", pad);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_ty() -> BasicType {
        BasicType::scalar(ScalarKind::Int)
    }

    #[test]
    fn expressions_render_fully_parenthesized() {
        let e = Expr::Binary {
            op: BinOp::Add,
            ty: int_ty(),
            lhs: Box::new(Expr::IntLit(1)),
            rhs: Box::new(Expr::Binary {
                op: BinOp::Mul,
                ty: int_ty(),
                lhs: Box::new(Expr::Ident {
                    name: "v0".into(),
                    ty: int_ty(),
                }),
                rhs: Box::new(Expr::IntLit(-3)),
            }),
        };
        assert_eq!(format!("{}", e), "(1 + (v0 * -3))");
    }

    #[test]
    fn float_literals_keep_a_decimal_point() {
        assert_eq!(format!("{}", Expr::FloatLit(2.0)), "2.0");
        assert_eq!(format!("{}", Expr::FloatLit(-0.25)), "-0.25");
    }

    #[test]
    fn uint_literals_carry_suffix() {
        assert_eq!(format!("{}", Expr::UintLit(7)), "7u");
    }

    #[test]
    fn postfix_and_prefix_unaries() {
        let v = Expr::Ident {
            name: "v1".into(),
            ty: int_ty(),
        };
        let post = Expr::Unary {
            op: UnOp::PostInc,
            ty: int_ty(),
            operand: Box::new(v.clone()),
        };
        let pre = Expr::Unary {
            op: UnOp::PreDec,
            ty: int_ty(),
            operand: Box::new(v),
        };
        assert_eq!(format!("{}", post), "(v1++)");
        assert_eq!(format!("{}", pre), "(--v1)");
    }

    #[test]
    fn statements_render_with_indent() {
        let mut out = String::new();
        let stmt = Stmt::Assign {
            target: Expr::Ident {
                name: "m0".into(),
                ty: int_ty(),
            },
            value: Expr::IntLit(5),
        };
        write_stmt(&mut out, &stmt, 4);
        assert_eq!(out, "    m0 = 5;\n");
    }

    #[test]
    fn blocks_nest() {
        let mut out = String::new();
        let stmt = Stmt::Block(vec![Stmt::Expr(Expr::Ident {
            name: "v0".into(),
            ty: int_ty(),
        })]);
        write_stmt(&mut out, &stmt, 4);
        assert_eq!(out, "    {\n        v0;\n    }\n");
    }
}
