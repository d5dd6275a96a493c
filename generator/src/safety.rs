// safety.rs — Safety rewrite passes
//
// Structural rewrites over the assembled shader that replace operations
// with undefined or implementation-defined results by calls to injected
// wrapper functions. Each wrapper is pure and total: it returns the same
// result as the raw operation wherever that result was already
// well-defined, and a deterministic clamped result otherwise.
//
// Passes apply inside-out within one pass (children are rewritten before
// their parent, so an outer wrapper's argument is already wrapped), their
// match sets are disjoint across passes, and every pass is idempotent:
// re-running it on an already-rewritten program changes nothing, and an
// empty program is a fixed point.

use std::collections::BTreeMap;

use crate::assemble::{ComputeShader, WrapperFn};
use crate::ast::{BinOp, Expr, Stmt, UnOp};
use crate::types::{BasicType, ScalarKind};

const COMPONENTS: [&str; 4] = ["x", "y", "z", "w"];

/// Shift amounts outside [0, 31] are clamped to this constant.
const SHIFT_CLAMP: u32 = 16;
/// Float results at or above this magnitude (or NaN) become the sentinel.
/// Below 2^24 every value converts exactly into int32 and uint32 range,
/// which keeps the conversion rewrites total as well.
const FLOAT_LIMIT: &str = "16777216.0";
const FLOAT_SENTINEL: &str = "10.0";

// ── Pass identifiers ─────────────────────────────────────────────────────

/// Identifies each safety rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyPassId {
    IntegerOps,
    BitfieldRange,
    FloatClamp,
    UnsignedConversion,
}

/// All passes in application order. The order is a convention, not a
/// requirement: the passes' match sets are disjoint.
pub const ALL_PASSES: [SafetyPassId; 4] = [
    SafetyPassId::IntegerOps,
    SafetyPassId::BitfieldRange,
    SafetyPassId::FloatClamp,
    SafetyPassId::UnsignedConversion,
];

/// Wrapper function families. A concrete wrapper is a family
/// monomorphized at a basic type; vector forms delegate componentwise to
/// the scalar form of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    Lshift,
    Rshift,
    Div,
    Mod,
    Abs,
    Negate,
    BitfieldExtract,
    Clamp,
}

/// Static metadata about a safety pass.
pub struct PassDescriptor {
    pub name: &'static str,
    /// Wrapper families this pass may inject.
    pub wrappers: &'static [WrapperKind],
    /// What the pass matches, for diagnostics/verbose output.
    pub matches: &'static str,
}

pub fn descriptor(id: SafetyPassId) -> PassDescriptor {
    match id {
        SafetyPassId::IntegerOps => PassDescriptor {
            name: "integer_ops",
            wrappers: &[
                WrapperKind::Lshift,
                WrapperKind::Rshift,
                WrapperKind::Div,
                WrapperKind::Mod,
                WrapperKind::Abs,
                WrapperKind::Negate,
            ],
            matches: "integer shifts, division, modulo, abs, unary minus",
        },
        SafetyPassId::BitfieldRange => PassDescriptor {
            name: "bitfield_range",
            wrappers: &[WrapperKind::BitfieldExtract],
            matches: "bitfieldExtract calls",
        },
        SafetyPassId::FloatClamp => PassDescriptor {
            name: "float_clamp",
            wrappers: &[WrapperKind::Clamp],
            matches: "float arithmetic results and embedded increment/decrement",
        },
        SafetyPassId::UnsignedConversion => PassDescriptor {
            name: "unsigned_conversion",
            wrappers: &[],
            matches: "unsigned-from-float constructor calls",
        },
    }
}

/// Scalar-level wrapper dependencies: injecting a family may require
/// another family's scalar form in its body.
fn scalar_deps(kind: WrapperKind, ty: BasicType) -> &'static [(WrapperKind, ScalarKind)] {
    match (kind, ty.kind) {
        (WrapperKind::Mod, ScalarKind::Int) => &[(WrapperKind::Abs, ScalarKind::Int)],
        (WrapperKind::BitfieldExtract, _) => &[(WrapperKind::Abs, ScalarKind::Int)],
        _ => &[],
    }
}

fn family_name(kind: WrapperKind) -> &'static str {
    match kind {
        WrapperKind::Lshift => "lshift",
        WrapperKind::Rshift => "rshift",
        WrapperKind::Div => "div",
        WrapperKind::Mod => "mod",
        WrapperKind::Abs => "abs",
        WrapperKind::Negate => "negate",
        WrapperKind::BitfieldExtract => "bitfield_extract",
        WrapperKind::Clamp => "clamp",
    }
}

/// Name of the monomorphized wrapper for a family at a basic type.
pub fn wrapper_name(kind: WrapperKind, ty: BasicType) -> String {
    format!("safe_{}_{}", family_name(kind), ty.glsl_name())
}

// ── Wrapper registry ─────────────────────────────────────────────────────

/// Injected wrapper definitions, keyed and emitted by name so each
/// distinct wrapper appears at most once per program.
struct WrapperSet {
    defs: BTreeMap<String, String>,
}

impl WrapperSet {
    fn from_defs(defs: &[WrapperFn]) -> Self {
        WrapperSet {
            defs: defs
                .iter()
                .map(|w| (w.name.clone(), w.source.clone()))
                .collect(),
        }
    }

    fn into_defs(self) -> Vec<WrapperFn> {
        self.defs
            .into_iter()
            .map(|(name, source)| WrapperFn { name, source })
            .collect()
    }

    /// Ensure the wrapper (and everything its body calls) is defined,
    /// returning its name.
    fn require(&mut self, kind: WrapperKind, ty: BasicType) -> String {
        let name = wrapper_name(kind, ty);
        if self.defs.contains_key(&name) {
            return name;
        }
        if ty.arity > 1 {
            self.require(kind, ty.component());
        } else {
            for &(dep, dep_kind) in scalar_deps(kind, ty) {
                self.require(dep, BasicType::scalar(dep_kind));
            }
        }
        self.defs.insert(name.clone(), wrapper_source(kind, ty));
        name
    }
}

// ── Wrapper sources ──────────────────────────────────────────────────────

/// GLSL source of the monomorphized wrapper.
pub fn wrapper_source(kind: WrapperKind, ty: BasicType) -> String {
    if ty.arity > 1 {
        return componentwise_source(kind, ty);
    }
    let name = wrapper_name(kind, ty);
    match (kind, ty.kind) {
        (WrapperKind::Lshift, ScalarKind::Int) => format!(
            "int {}(int a, int b) {{\n    if (b < 0 || b > 31) {{\n        b = {};\n    }}\n    return a << b;\n}}\n",
            name, SHIFT_CLAMP
        ),
        (WrapperKind::Lshift, ScalarKind::Uint) => format!(
            "uint {}(uint a, uint b) {{\n    if (b > 31u) {{\n        b = {}u;\n    }}\n    return a << b;\n}}\n",
            name, SHIFT_CLAMP
        ),
        (WrapperKind::Rshift, ScalarKind::Int) => format!(
            "int {}(int a, int b) {{\n    if (b < 0 || b > 31) {{\n        b = {};\n    }}\n    return a >> b;\n}}\n",
            name, SHIFT_CLAMP
        ),
        (WrapperKind::Rshift, ScalarKind::Uint) => format!(
            "uint {}(uint a, uint b) {{\n    if (b > 31u) {{\n        b = {}u;\n    }}\n    return a >> b;\n}}\n",
            name, SHIFT_CLAMP
        ),
        (WrapperKind::Div, ScalarKind::Int) => format!(
            "int {}(int a, int b) {{\n    if (b == 0) {{\n        return a;\n    }}\n    if (a == (-2147483647 - 1) && b == -1) {{\n        return a;\n    }}\n    return a / b;\n}}\n",
            name
        ),
        (WrapperKind::Div, ScalarKind::Uint) => format!(
            "uint {}(uint a, uint b) {{\n    if (b == 0u) {{\n        return a;\n    }}\n    return a / b;\n}}\n",
            name
        ),
        (WrapperKind::Mod, ScalarKind::Int) => format!(
            "int {}(int a, int b) {{\n    int sa = safe_abs_int(a);\n    int sb = safe_abs_int(b);\n    if (sb == 0) {{\n        return sa;\n    }}\n    return sa % sb;\n}}\n",
            name
        ),
        (WrapperKind::Mod, ScalarKind::Uint) => format!(
            "uint {}(uint a, uint b) {{\n    if (b == 0u) {{\n        return a;\n    }}\n    return a % b;\n}}\n",
            name
        ),
        (WrapperKind::Abs, ScalarKind::Int) => format!(
            "int {}(int a) {{\n    if (a == (-2147483647 - 1)) {{\n        return 2147483647;\n    }}\n    return abs(a);\n}}\n",
            name
        ),
        (WrapperKind::Negate, ScalarKind::Int) => format!(
            "int {}(int a) {{\n    if (a == (-2147483647 - 1)) {{\n        return 2147483647;\n    }}\n    return -a;\n}}\n",
            name
        ),
        (WrapperKind::Clamp, ScalarKind::Float) => format!(
            "float {}(float x) {{\n    if (isnan(x) || abs(x) >= {}) {{\n        return {};\n    }}\n    return x;\n}}\n",
            name, FLOAT_LIMIT, FLOAT_SENTINEL
        ),
        (WrapperKind::BitfieldExtract, ScalarKind::Int) => format!(
            "int {}(int v, int offset, int bits) {{\n    int safe_offset = safe_abs_int(offset) % 32;\n    int safe_bits = safe_abs_int(bits) % (32 - safe_offset);\n    return bitfieldExtract(v, safe_offset, safe_bits);\n}}\n",
            name
        ),
        (WrapperKind::BitfieldExtract, ScalarKind::Uint) => format!(
            "uint {}(uint v, int offset, int bits) {{\n    int safe_offset = safe_abs_int(offset) % 32;\n    int safe_bits = safe_abs_int(bits) % (32 - safe_offset);\n    return bitfieldExtract(v, safe_offset, safe_bits);\n}}\n",
            name
        ),
        _ => unreachable!("internal: no wrapper for {:?} at {:?}", kind, ty),
    }
}

fn componentwise_source(kind: WrapperKind, ty: BasicType) -> String {
    let name = wrapper_name(kind, ty);
    let scalar = wrapper_name(kind, ty.component());
    let ty_name = ty.glsl_name();
    let comps = &COMPONENTS[..ty.arity as usize];
    match kind {
        WrapperKind::Abs | WrapperKind::Negate | WrapperKind::Clamp => {
            let calls: Vec<String> = comps.iter().map(|c| format!("{}(x.{})", scalar, c)).collect();
            format!(
                "{} {}({} x) {{\n    return {}({});\n}}\n",
                ty_name,
                name,
                ty_name,
                ty_name,
                calls.join(", ")
            )
        }
        WrapperKind::Lshift | WrapperKind::Rshift | WrapperKind::Div | WrapperKind::Mod => {
            let calls: Vec<String> = comps
                .iter()
                .map(|c| format!("{}(a.{}, b.{})", scalar, c, c))
                .collect();
            format!(
                "{} {}({} a, {} b) {{\n    return {}({});\n}}\n",
                ty_name,
                name,
                ty_name,
                ty_name,
                ty_name,
                calls.join(", ")
            )
        }
        WrapperKind::BitfieldExtract => {
            let calls: Vec<String> = comps
                .iter()
                .map(|c| format!("{}(v.{}, offset, bits)", scalar, c))
                .collect();
            format!(
                "{} {}({} v, int offset, int bits) {{\n    return {}({});\n}}\n",
                ty_name,
                name,
                ty_name,
                ty_name,
                calls.join(", ")
            )
        }
    }
}

// ── Pass application ─────────────────────────────────────────────────────

/// Apply every safety pass. Returns the total number of rewritten sites.
pub fn apply_all(shader: &mut ComputeShader) -> u32 {
    ALL_PASSES.iter().map(|&id| apply(id, shader)).sum()
}

/// Apply one pass across the shader. Returns the number of rewritten
/// sites; zero means the shader was already a fixed point of this pass.
pub fn apply(id: SafetyPassId, shader: &mut ComputeShader) -> u32 {
    let mut wrappers = WrapperSet::from_defs(&shader.wrappers);
    let mut count = 0u32;
    for decl in &mut shader.globals {
        if let Some(init) = &mut decl.init {
            rewrite_expr(id, init, &mut wrappers, &mut count, false);
        }
    }
    for stmt in &mut shader.main_body {
        rewrite_stmt(id, stmt, &mut wrappers, &mut count);
    }
    shader.wrappers = wrappers.into_defs();
    count
}

fn rewrite_stmt(id: SafetyPassId, stmt: &mut Stmt, wrappers: &mut WrapperSet, count: &mut u32) {
    match stmt {
        Stmt::Decl(decl) => {
            if let Some(init) = &mut decl.init {
                rewrite_expr(id, init, wrappers, count, false);
            }
        }
        // The stored target is an lvalue, not a computed value; only the
        // right-hand side is rewritten.
        Stmt::Assign { value, .. } => rewrite_expr(id, value, wrappers, count, false),
        // An expression statement discards its value, so an embedded
        // increment/decrement needs no value wrapping; the stored
        // mutation itself is unaffected by wrapping anyway.
        Stmt::Expr(expr) => rewrite_expr(id, expr, wrappers, count, true),
        Stmt::Block(body) => {
            for inner in body {
                rewrite_stmt(id, inner, wrappers, count);
            }
        }
    }
}

fn is_clamp_wrapper(name: &str) -> bool {
    name.starts_with("safe_clamp_")
}

fn take(expr: &mut Expr) -> Expr {
    std::mem::replace(expr, Expr::BoolLit(false))
}

/// Rewrite one expression, children first. `value_protected` marks nodes
/// whose value is already guarded (the direct argument of a clamp
/// wrapper) or discarded (an expression statement); the float pass must
/// not wrap those again.
fn rewrite_expr(
    id: SafetyPassId,
    expr: &mut Expr,
    wrappers: &mut WrapperSet,
    count: &mut u32,
    value_protected: bool,
) {
    match expr {
        Expr::Unary { operand, .. } => rewrite_expr(id, operand, wrappers, count, false),
        Expr::Binary { lhs, rhs, .. } => {
            rewrite_expr(id, lhs, wrappers, count, false);
            rewrite_expr(id, rhs, wrappers, count, false);
        }
        Expr::Call { name, args, .. } => {
            let shield = is_clamp_wrapper(name);
            for arg in args.iter_mut() {
                rewrite_expr(id, arg, wrappers, count, shield);
            }
        }
        Expr::Index { base, index, .. } => {
            rewrite_expr(id, base, wrappers, count, false);
            rewrite_expr(id, index, wrappers, count, false);
        }
        Expr::Field { base, .. } => rewrite_expr(id, base, wrappers, count, false),
        _ => {}
    }

    match id {
        SafetyPassId::IntegerOps => rewrite_integer_ops(expr, wrappers, count),
        SafetyPassId::BitfieldRange => rewrite_bitfield(expr, wrappers, count),
        SafetyPassId::FloatClamp => rewrite_float(expr, wrappers, count, value_protected),
        SafetyPassId::UnsignedConversion => rewrite_unsigned_conversion(expr, count),
    }
}

fn is_int_kind(ty: BasicType) -> bool {
    matches!(ty.kind, ScalarKind::Int | ScalarKind::Uint)
}

fn rewrite_integer_ops(expr: &mut Expr, wrappers: &mut WrapperSet, count: &mut u32) {
    let shift_div_mod = matches!(
        expr,
        Expr::Binary { op, ty, .. }
            if is_int_kind(*ty)
                && matches!(op, BinOp::Shl | BinOp::Shr | BinOp::Div | BinOp::Mod)
    );
    if shift_div_mod {
        if let Expr::Binary { op, ty, lhs, rhs } = take(expr) {
            let family = match op {
                BinOp::Shl => WrapperKind::Lshift,
                BinOp::Shr => WrapperKind::Rshift,
                BinOp::Div => WrapperKind::Div,
                _ => WrapperKind::Mod,
            };
            let name = wrappers.require(family, ty);
            *expr = Expr::Call {
                name,
                ty,
                args: vec![*lhs, *rhs],
            };
            *count += 1;
        }
        return;
    }

    let signed_negate = matches!(
        expr,
        Expr::Unary { op: UnOp::Neg, ty, .. } if ty.kind == ScalarKind::Int
    );
    if signed_negate {
        if let Expr::Unary { ty, operand, .. } = take(expr) {
            let name = wrappers.require(WrapperKind::Negate, ty);
            *expr = Expr::Call {
                name,
                ty,
                args: vec![*operand],
            };
            *count += 1;
        }
        return;
    }

    if let Expr::Call { name, ty, .. } = expr {
        if name.as_str() == "abs" && ty.kind == ScalarKind::Int {
            *name = wrappers.require(WrapperKind::Abs, *ty);
            *count += 1;
        }
    }
}

fn rewrite_bitfield(expr: &mut Expr, wrappers: &mut WrapperSet, count: &mut u32) {
    if let Expr::Call { name, ty, .. } = expr {
        if name.as_str() == "bitfieldExtract" {
            *name = wrappers.require(WrapperKind::BitfieldExtract, *ty);
            *count += 1;
        }
    }
}

fn rewrite_float(
    expr: &mut Expr,
    wrappers: &mut WrapperSet,
    count: &mut u32,
    value_protected: bool,
) {
    if value_protected {
        return;
    }
    let float_arith = matches!(
        expr,
        Expr::Binary { op, ty, .. }
            if ty.kind == ScalarKind::Float
                && matches!(op, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    );
    let float_inc_dec = matches!(
        expr,
        Expr::Unary { op, ty, .. } if ty.kind == ScalarKind::Float && op.is_inc_dec()
    );
    if float_arith || float_inc_dec {
        let ty = expr.ty();
        let name = wrappers.require(WrapperKind::Clamp, ty);
        let old = take(expr);
        *expr = Expr::Call {
            name,
            ty,
            args: vec![old],
        };
        *count += 1;
    }
}

fn rewrite_unsigned_conversion(expr: &mut Expr, count: &mut u32) {
    if let Expr::Call { name, args, .. } = expr {
        let unsigned_ctor = matches!(name.as_str(), "uint" | "uvec2" | "uvec3" | "uvec4");
        if unsigned_ctor && args.len() == 1 && args[0].ty().kind == ScalarKind::Float {
            let already_abs = matches!(&args[0], Expr::Call { name, .. } if name == "abs");
            if !already_abs {
                let arg_ty = args[0].ty();
                let old = take(&mut args[0]);
                args[0] = Expr::Call {
                    name: "abs".to_string(),
                    ty: arg_ty,
                    args: vec![old],
                };
                *count += 1;
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
