// exprs.rs — Scope-constrained statement and expression generation
//
// Fills the shader body with declarations, assignments and expression
// statements. Every variable access goes through the scope stack's
// availability queries; every multi-argument construct (constructor,
// builtin call, the two operands of a binary operator) runs the
// initializer-frame protocol so no two sibling sub-expressions touch a
// variable in a way whose evaluation order the language leaves open.
//
// Write targets are locals, globals and output-buffer members only, and
// increment/decrement lvalues are never buffer members: all invocations
// of a dispatch then compute identical values, so racing writes store the
// same bytes and reads never observe a torn intermediate state.

use rand::Rng;

use crate::ast::{BinOp, Expr, Stmt, UnOp, VarDecl};
use crate::config::GenConfig;
use crate::scope::EntryView;
use crate::state::ProgramState;
use crate::types::{BasicType, ScalarKind, TypeDescriptor};

const COMPONENTS: [&str; 4] = ["x", "y", "z", "w"];
const NARROW: [&str; 5] = ["", "x", "xy", "xyz", "xyzw"];

// ── Top-level drivers ────────────────────────────────────────────────────

/// Generate top-level global declarations. Globals initialize with
/// constant expressions only, so initializers are literal-built.
pub fn generate_globals(state: &mut ProgramState, config: &GenConfig, rng: &mut impl Rng) {
    let count = rng.gen_range(0..=config.max_globals);
    for _ in 0..count {
        let kind = ScalarKind::ALL[rng.gen_range(0..ScalarKind::ALL.len())];
        let arity = rng.gen_range(1..=4u32) as u8;
        let target = BasicType::new(kind, arity);
        let init = const_literal(config, rng, target);
        let name = state.names.global();
        let ty = TypeDescriptor::from_basic(target);
        state.scopes.declare(name.clone(), ty.clone(), true);
        state.globals.push(VarDecl {
            name,
            ty,
            init: Some(init),
        });
    }
}

/// Generate the `main` body: a bounded statement sequence followed by one
/// guaranteed store into a member of every output buffer.
pub fn generate_main_body(state: &mut ProgramState, config: &GenConfig, rng: &mut impl Rng) {
    state.scopes.enter_scope();

    let count = rng.gen_range(0..=config.max_statements);
    for _ in 0..count {
        let stmt = gen_stmt(state, config, rng, true);
        state.main_body.push(stmt);
    }

    let picks: Vec<(String, TypeDescriptor)> = state
        .buffers
        .iter()
        .filter(|b| !b.is_input)
        .map(|b| {
            let i = rng.gen_range(0..b.member_names.len());
            (b.member_names[i].clone(), b.member_types[i].clone())
        })
        .collect();
    for (name, ty) in picks {
        state.scopes.reset_statement_flags();
        let stmt = store_stmt(state, config, rng, &name, &ty);
        state.main_body.push(stmt);
    }

    state.scopes.exit_scope();
}

// ── Statements ───────────────────────────────────────────────────────────

fn gen_stmt(state: &mut ProgramState, config: &GenConfig, rng: &mut impl Rng, allow_block: bool) -> Stmt {
    state.scopes.reset_statement_flags();
    match rng.gen_range(0..6) {
        0 | 1 => local_decl_stmt(state, config, rng),
        2 | 3 => assign_stmt(state, config, rng),
        4 => incdec_stmt(state, config, rng),
        _ if allow_block => block_stmt(state, config, rng),
        _ => assign_stmt(state, config, rng),
    }
}

fn local_decl_stmt(state: &mut ProgramState, config: &GenConfig, rng: &mut impl Rng) -> Stmt {
    let kind = ScalarKind::ALL[rng.gen_range(0..ScalarKind::ALL.len())];
    let arity = rng.gen_range(1..=4u32) as u8;
    let target = BasicType::new(kind, arity);
    let init = gen_expr(state, config, rng, target, config.max_expr_depth);
    let name = state.names.local();
    let ty = TypeDescriptor::from_basic(target);
    state.scopes.declare(name.clone(), ty.clone(), true);
    Stmt::Decl(VarDecl {
        name,
        ty,
        init: Some(init),
    })
}

fn assign_stmt(state: &mut ProgramState, config: &GenConfig, rng: &mut impl Rng) -> Stmt {
    let candidates: Vec<EntryView> = state
        .scopes
        .writable()
        .into_iter()
        .filter(is_store_target)
        .collect();
    if candidates.is_empty() {
        return local_decl_stmt(state, config, rng);
    }
    let pick = candidates[rng.gen_range(0..candidates.len())].clone();
    store_stmt(state, config, rng, &pick.name, &pick.ty)
}

/// Build `target = value;`. The store and the value expression are the
/// two "siblings" of the statement: the target is folded into a frame
/// before the value is generated, so the value can neither read nor write
/// the stored variable and the store order cannot matter.
fn store_stmt(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    name: &str,
    ty: &TypeDescriptor,
) -> Stmt {
    let base = ty.base();
    let target = if ty.is_array() {
        let len = ty.array_len().max(1);
        Expr::Index {
            ty: base,
            base: Box::new(Expr::Ident {
                name: name.to_string(),
                ty: base,
            }),
            index: Box::new(Expr::IntLit(rng.gen_range(0..len) as i32)),
        }
    } else {
        Expr::Ident {
            name: name.to_string(),
            ty: base,
        }
    };

    state.scopes.enter_initializer();
    state.scopes.mark_written(name);
    state.scopes.finish_init_param();
    let value = gen_expr(state, config, rng, base, config.max_expr_depth);
    state.scopes.finish_init_param();
    state.scopes.exit_initializer();

    Stmt::Assign { target, value }
}

fn incdec_stmt(state: &mut ProgramState, config: &GenConfig, rng: &mut impl Rng) -> Stmt {
    let candidates: Vec<EntryView> = state
        .scopes
        .writable()
        .into_iter()
        .filter(|e| is_incdec_target(e))
        .collect();
    if candidates.is_empty() {
        return assign_stmt(state, config, rng);
    }
    let pick = candidates[rng.gen_range(0..candidates.len())].clone();
    let base = pick.ty.base();
    state.scopes.mark_read(&pick.name);
    state.scopes.mark_written(&pick.name);
    let op = [UnOp::PreInc, UnOp::PreDec, UnOp::PostInc, UnOp::PostDec][rng.gen_range(0..4)];
    Stmt::Expr(Expr::Unary {
        op,
        ty: base,
        operand: Box::new(Expr::Ident {
            name: pick.name,
            ty: base,
        }),
    })
}

fn block_stmt(state: &mut ProgramState, config: &GenConfig, rng: &mut impl Rng) -> Stmt {
    state.scopes.enter_scope();
    let count = rng.gen_range(1..=2);
    let mut body = Vec::new();
    for _ in 0..count {
        body.push(gen_stmt(state, config, rng, false));
    }
    state.scopes.exit_scope();
    Stmt::Block(body)
}

/// Locals, globals and output-buffer members may be stored to; read-only
/// entries and input members may not.
fn is_store_target(entry: &EntryView) -> bool {
    let flags = entry.ty.flags();
    !flags.read_only && (entry.hideable || flags.write_only)
}

/// Increment/decrement mutates in place, so it is confined to private
/// per-invocation storage: non-array, non-bool locals and globals.
fn is_incdec_target(entry: &EntryView) -> bool {
    let flags = entry.ty.flags();
    entry.hideable
        && !entry.ty.is_array()
        && !flags.read_only
        && !flags.write_only
        && entry.ty.base().kind != ScalarKind::Bool
}

// ── Expressions ──────────────────────────────────────────────────────────

/// Generate an expression of exactly `target` type, with at most `depth`
/// levels of nested operations.
pub fn gen_expr(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    target: BasicType,
    depth: u32,
) -> Expr {
    if depth == 0 {
        return leaf_expr(state, config, rng, target);
    }
    match rng.gen_range(0..8) {
        0 | 1 => leaf_expr(state, config, rng, target),
        2 | 3 => binary_expr(state, config, rng, target, depth),
        4 => constructor_or_conversion(state, config, rng, target, depth),
        5 => builtin_expr(state, config, rng, target, depth),
        6 => unary_expr(state, config, rng, target, depth),
        _ => leaf_expr(state, config, rng, target),
    }
}

fn leaf_expr(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    target: BasicType,
) -> Expr {
    if rng.gen_bool(0.5) {
        if let Some(expr) = variable_expr(state, config, rng, target) {
            return expr;
        }
    }
    const_literal(config, rng, target)
}

fn scalar_literal(config: &GenConfig, rng: &mut impl Rng, kind: ScalarKind) -> Expr {
    match kind {
        ScalarKind::Int => Expr::IntLit(rng.gen_range(-config.int_bound..=config.int_bound)),
        ScalarKind::Uint => Expr::UintLit(rng.gen_range(0..=config.uint_bound)),
        ScalarKind::Float => {
            Expr::FloatLit(rng.gen_range(-config.float_bound..=config.float_bound))
        }
        ScalarKind::Bool => Expr::BoolLit(rng.gen_bool(0.5)),
    }
}

/// A literal of `target` type: a scalar literal, or a constructor call
/// over scalar literals for vectors. Constant-foldable, so also valid as
/// a global initializer.
fn const_literal(config: &GenConfig, rng: &mut impl Rng, target: BasicType) -> Expr {
    if target.arity == 1 {
        return scalar_literal(config, rng, target.kind);
    }
    let args = (0..target.arity)
        .map(|_| scalar_literal(config, rng, target.kind))
        .collect();
    Expr::Call {
        name: target.glsl_name().to_string(),
        ty: target,
        args,
    }
}

fn variable_expr(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    target: BasicType,
) -> Option<Expr> {
    let candidates: Vec<EntryView> = state
        .scopes
        .readable(target)
        .into_iter()
        .filter(|e| !e.ty.flags().write_only)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let pick = candidates[rng.gen_range(0..candidates.len())].clone();
    state.scopes.mark_read(&pick.name);
    Some(adapt_access(config, rng, &pick, target))
}

/// Build an access expression of exactly `target` type from a compatible
/// entry: index into arrays, extract a component for scalar targets,
/// swizzle-narrow or literal-pad for vector targets.
fn adapt_access(
    config: &GenConfig,
    rng: &mut impl Rng,
    entry: &EntryView,
    target: BasicType,
) -> Expr {
    let base = entry.ty.base();
    let core = if entry.ty.is_array() {
        let len = entry.ty.array_len().max(1);
        Expr::Index {
            ty: base,
            base: Box::new(Expr::Ident {
                name: entry.name.clone(),
                ty: base,
            }),
            index: Box::new(Expr::IntLit(rng.gen_range(0..len) as i32)),
        }
    } else {
        Expr::Ident {
            name: entry.name.clone(),
            ty: base,
        }
    };

    if base.arity == target.arity {
        core
    } else if target.arity == 1 {
        let member = COMPONENTS[rng.gen_range(0..base.arity as usize)];
        Expr::Field {
            ty: target,
            base: Box::new(core),
            member,
        }
    } else if base.arity > target.arity {
        Expr::Field {
            ty: target,
            base: Box::new(core),
            member: NARROW[target.arity as usize],
        }
    } else {
        let mut args = vec![core];
        for _ in 0..(target.arity - base.arity) {
            args.push(scalar_literal(config, rng, target.kind));
        }
        Expr::Call {
            name: target.glsl_name().to_string(),
            ty: target,
            args,
        }
    }
}

fn binary_expr(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    target: BasicType,
    depth: u32,
) -> Expr {
    if target.kind == ScalarKind::Bool {
        if target.arity > 1 {
            return constructor_expr(state, config, rng, target, depth);
        }
        return if rng.gen_bool(0.5) {
            let op = [
                BinOp::Lt,
                BinOp::Le,
                BinOp::Gt,
                BinOp::Ge,
                BinOp::EqEq,
                BinOp::Ne,
            ][rng.gen_range(0..6)];
            framed_binary(state, config, rng, op, target, BasicType::scalar(ScalarKind::Int), depth)
        } else {
            let op = if rng.gen_bool(0.5) { BinOp::LogAnd } else { BinOp::LogOr };
            framed_binary(state, config, rng, op, target, target, depth)
        };
    }

    let op = match target.kind {
        ScalarKind::Float => {
            [BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div][rng.gen_range(0..4)]
        }
        _ => {
            let mut ops = vec![
                BinOp::Add,
                BinOp::Sub,
                BinOp::Mul,
                BinOp::Div,
                BinOp::Mod,
                BinOp::BitAnd,
                BinOp::BitOr,
                BinOp::BitXor,
            ];
            if target.arity == 1 {
                ops.push(BinOp::Shl);
                ops.push(BinOp::Shr);
            }
            ops[rng.gen_range(0..ops.len())]
        }
    };
    framed_binary(state, config, rng, op, target, target, depth)
}

/// The two operands of a binary operator are sibling sub-expressions of
/// one construct; run them through the frame protocol.
fn framed_binary(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    op: BinOp,
    result: BasicType,
    operand: BasicType,
    depth: u32,
) -> Expr {
    state.scopes.enter_initializer();
    let lhs = gen_expr(state, config, rng, operand, depth - 1);
    state.scopes.finish_init_param();
    let rhs = gen_expr(state, config, rng, operand, depth - 1);
    state.scopes.finish_init_param();
    state.scopes.exit_initializer();
    Expr::Binary {
        op,
        ty: result,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn constructor_or_conversion(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    target: BasicType,
    depth: u32,
) -> Expr {
    if target.arity >= 2 {
        return constructor_expr(state, config, rng, target, depth);
    }
    let src = match target.kind {
        ScalarKind::Int => [ScalarKind::Uint, ScalarKind::Float][rng.gen_range(0..2)],
        ScalarKind::Uint => [ScalarKind::Int, ScalarKind::Float][rng.gen_range(0..2)],
        ScalarKind::Float => [ScalarKind::Int, ScalarKind::Uint][rng.gen_range(0..2)],
        ScalarKind::Bool => return leaf_expr(state, config, rng, target),
    };
    let arg = gen_expr(state, config, rng, BasicType::scalar(src), depth - 1);
    Expr::Call {
        name: target.glsl_name().to_string(),
        ty: target,
        args: vec![arg],
    }
}

fn constructor_expr(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    target: BasicType,
    depth: u32,
) -> Expr {
    state.scopes.enter_initializer();
    let mut args = Vec::with_capacity(target.arity as usize);
    for _ in 0..target.arity {
        let arg = gen_expr(state, config, rng, target.component(), depth - 1);
        state.scopes.finish_init_param();
        args.push(arg);
    }
    state.scopes.exit_initializer();
    Expr::Call {
        name: target.glsl_name().to_string(),
        ty: target,
        args,
    }
}

fn builtin_expr(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    target: BasicType,
    depth: u32,
) -> Expr {
    match target.kind {
        ScalarKind::Bool => leaf_expr(state, config, rng, target),
        ScalarKind::Uint => {
            if target.arity == 1 && rng.gen_bool(0.2) {
                return bitfield_extract_expr(state, config, rng, target, depth);
            }
            let name = if rng.gen_bool(0.5) { "min" } else { "max" };
            framed_call(state, config, rng, name, target, 2, depth)
        }
        ScalarKind::Int => {
            if target.arity == 1 && rng.gen_bool(0.2) {
                return bitfield_extract_expr(state, config, rng, target, depth);
            }
            match rng.gen_range(0..3) {
                0 => {
                    let arg = gen_expr(state, config, rng, target, depth - 1);
                    Expr::Call {
                        name: "abs".to_string(),
                        ty: target,
                        args: vec![arg],
                    }
                }
                1 => framed_call(state, config, rng, "min", target, 2, depth),
                _ => framed_call(state, config, rng, "max", target, 2, depth),
            }
        }
        ScalarKind::Float => match rng.gen_range(0..3) {
            0 => {
                let arg = gen_expr(state, config, rng, target, depth - 1);
                Expr::Call {
                    name: "abs".to_string(),
                    ty: target,
                    args: vec![arg],
                }
            }
            1 => framed_call(state, config, rng, "min", target, 2, depth),
            _ => framed_call(state, config, rng, "max", target, 2, depth),
        },
    }
}

fn framed_call(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    name: &str,
    target: BasicType,
    argc: usize,
    depth: u32,
) -> Expr {
    state.scopes.enter_initializer();
    let mut args = Vec::with_capacity(argc);
    for _ in 0..argc {
        let arg = gen_expr(state, config, rng, target, depth - 1);
        state.scopes.finish_init_param();
        args.push(arg);
    }
    state.scopes.exit_initializer();
    Expr::Call {
        name: name.to_string(),
        ty: target,
        args,
    }
}

fn bitfield_extract_expr(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    target: BasicType,
    depth: u32,
) -> Expr {
    let int_scalar = BasicType::scalar(ScalarKind::Int);
    state.scopes.enter_initializer();
    let value = gen_expr(state, config, rng, target, depth - 1);
    state.scopes.finish_init_param();
    let offset = gen_expr(state, config, rng, int_scalar, depth - 1);
    state.scopes.finish_init_param();
    let bits = gen_expr(state, config, rng, int_scalar, depth - 1);
    state.scopes.finish_init_param();
    state.scopes.exit_initializer();
    Expr::Call {
        name: "bitfieldExtract".to_string(),
        ty: target,
        args: vec![value, offset, bits],
    }
}

fn unary_expr(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    target: BasicType,
    depth: u32,
) -> Expr {
    if target.kind != ScalarKind::Bool && rng.gen_bool(0.3) {
        let candidates: Vec<EntryView> = state
            .scopes
            .writable()
            .into_iter()
            .filter(|e| is_incdec_target(e) && e.ty.base() == target)
            .collect();
        if !candidates.is_empty() {
            let pick = candidates[rng.gen_range(0..candidates.len())].clone();
            state.scopes.mark_read(&pick.name);
            state.scopes.mark_written(&pick.name);
            let op =
                [UnOp::PreInc, UnOp::PreDec, UnOp::PostInc, UnOp::PostDec][rng.gen_range(0..4)];
            return Expr::Unary {
                op,
                ty: target,
                operand: Box::new(Expr::Ident {
                    name: pick.name,
                    ty: target,
                }),
            };
        }
    }
    let op = match target.kind {
        ScalarKind::Bool => UnOp::Not,
        ScalarKind::Float => UnOp::Neg,
        ScalarKind::Uint => UnOp::BitNot,
        ScalarKind::Int => {
            if rng.gen_bool(0.5) {
                UnOp::Neg
            } else {
                UnOp::BitNot
            }
        }
    };
    let operand = gen_expr(state, config, rng, target, depth - 1);
    Expr::Unary {
        op,
        ty: target,
        operand: Box::new(operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::synthesize_buffers;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generate(seed: u64) -> ProgramState {
        let config = GenConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = ProgramState::new();
        synthesize_buffers(&mut state, &config, &mut rng).unwrap();
        generate_globals(&mut state, &config, &mut rng);
        generate_main_body(&mut state, &config, &mut rng);
        state
    }

    fn check_expr_types(expr: &Expr) {
        match expr {
            Expr::Binary { op, ty, lhs, rhs, .. } => {
                let relational = matches!(
                    op,
                    BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::EqEq | BinOp::Ne
                );
                if !relational {
                    assert_eq!(lhs.ty(), *ty);
                    assert_eq!(rhs.ty(), *ty);
                }
                check_expr_types(lhs);
                check_expr_types(rhs);
            }
            Expr::Unary { operand, ty, .. } => {
                assert_eq!(operand.ty(), *ty);
                check_expr_types(operand);
            }
            Expr::Call { args, .. } => args.iter().for_each(check_expr_types),
            Expr::Index { base, index, .. } => {
                check_expr_types(base);
                check_expr_types(index);
            }
            Expr::Field { base, .. } => check_expr_types(base),
            _ => {}
        }
    }

    fn visit_stmts(stmts: &[Stmt], f: &mut impl FnMut(&Stmt)) {
        for stmt in stmts {
            f(stmt);
            if let Stmt::Block(body) = stmt {
                visit_stmts(body, f);
            }
        }
    }

    #[test]
    fn generated_expressions_are_internally_typed() {
        for seed in 0..24 {
            let state = generate(seed);
            visit_stmts(&state.main_body, &mut |stmt| match stmt {
                Stmt::Decl(decl) => {
                    if let Some(init) = &decl.init {
                        assert_eq!(init.ty(), decl.ty.base());
                        check_expr_types(init);
                    }
                }
                Stmt::Assign { target, value } => {
                    assert_eq!(target.ty(), value.ty());
                    check_expr_types(value);
                }
                Stmt::Expr(expr) => check_expr_types(expr),
                Stmt::Block(_) => {}
            });
        }
    }

    #[test]
    fn every_output_buffer_receives_a_store() {
        for seed in 0..24 {
            let state = generate(seed);
            for buffer in state.output_buffers() {
                let stored = state.main_body.iter().any(|stmt| match stmt {
                    Stmt::Assign { target, .. } => {
                        let name = match target {
                            Expr::Ident { name, .. } => Some(name),
                            Expr::Index { base, .. } => match base.as_ref() {
                                Expr::Ident { name, .. } => Some(name),
                                _ => None,
                            },
                            _ => None,
                        };
                        name.map(|n| buffer.member_names.contains(n)).unwrap_or(false)
                    }
                    _ => false,
                });
                assert!(stored, "output buffer {} never stored to", buffer.name);
            }
        }
    }

    #[test]
    fn input_members_are_never_assigned() {
        for seed in 0..24 {
            let state = generate(seed);
            let input_members: Vec<&String> = state
                .input_buffers()
                .flat_map(|b| b.member_names.iter())
                .collect();
            visit_stmts(&state.main_body, &mut |stmt| {
                if let Stmt::Assign { target, .. } = stmt {
                    let name = match target {
                        Expr::Ident { name, .. } => Some(name),
                        Expr::Index { base, .. } => match base.as_ref() {
                            Expr::Ident { name, .. } => Some(name),
                            _ => None,
                        },
                        _ => None,
                    };
                    if let Some(name) = name {
                        assert!(
                            !input_members.contains(&name),
                            "input member {} was assigned",
                            name
                        );
                    }
                }
            });
        }
    }

    #[test]
    fn output_members_are_never_read() {
        for seed in 0..24 {
            let state = generate(seed);
            let output_members: Vec<&String> = state
                .output_buffers()
                .flat_map(|b| b.member_names.iter())
                .collect();

            fn check_reads(expr: &Expr, outputs: &[&String]) {
                match expr {
                    Expr::Ident { name, .. } => {
                        assert!(!outputs.contains(&name), "output member {} was read", name);
                    }
                    Expr::Unary { operand, .. } => check_reads(operand, outputs),
                    Expr::Binary { lhs, rhs, .. } => {
                        check_reads(lhs, outputs);
                        check_reads(rhs, outputs);
                    }
                    Expr::Call { args, .. } => args.iter().for_each(|a| check_reads(a, outputs)),
                    Expr::Index { base, index, .. } => {
                        check_reads(base, outputs);
                        check_reads(index, outputs);
                    }
                    Expr::Field { base, .. } => check_reads(base, outputs),
                    _ => {}
                }
            }

            visit_stmts(&state.main_body, &mut |stmt| match stmt {
                Stmt::Decl(decl) => {
                    if let Some(init) = &decl.init {
                        check_reads(init, &output_members);
                    }
                }
                Stmt::Assign { value, .. } => check_reads(value, &output_members),
                Stmt::Expr(expr) => {
                    // Statement-level inc/dec of a local is allowed; its
                    // operand is not a buffer member by construction.
                    if let Expr::Unary { operand, .. } = expr {
                        if let Expr::Ident { name, .. } = operand.as_ref() {
                            assert!(!output_members.contains(&name));
                        }
                    }
                }
                Stmt::Block(_) => {}
            });
        }
    }
}
