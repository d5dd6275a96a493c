// buffers.rs — Storage-buffer synthesis
//
// Builds the storage-buffer declarations of a program: member shapes,
// randomized initial values, qualifiers and binding layout, and registers
// every member as a global scope entry. Buffers are recorded in
// declaration order, which is also binding-index order and the order the
// wire format re-emits them in.
//
// Qualifier policy: an input buffer may be read-only; an output buffer is
// write-only, never read-only. Either may be coherent when the
// configuration permits storage qualifiers. Layout is always std430 so
// the wire reader's size computation is unambiguous.

use rand::Rng;

use crate::config::GenConfig;
use crate::diag::{codes, Fault};
use crate::state::{Buffer, ProgramState};
use crate::types::{ScalarKind, ScalarValue, StorageFlags, TypeDescriptor};

/// Synthesize all input and output buffers for one program.
pub fn synthesize_buffers(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
) -> Result<(), Fault> {
    if config.max_input_buffers == 0 {
        return Err(
            Fault::configuration("max_input_buffers", "no input buffers permitted")
                .with_code(codes::CFG_NO_INPUT_BUFFERS),
        );
    }
    if config.max_output_buffers == 0 {
        return Err(
            Fault::configuration("max_output_buffers", "no output buffers permitted")
                .with_code(codes::CFG_NO_OUTPUT_BUFFERS),
        );
    }

    let input_count = rng.gen_range(1..=config.max_input_buffers);
    let output_count = rng.gen_range(1..=config.max_output_buffers);
    for _ in 0..input_count {
        synthesize_buffer(state, config, rng, true)?;
    }
    for _ in 0..output_count {
        synthesize_buffer(state, config, rng, false)?;
    }
    Ok(())
}

fn synthesize_buffer(
    state: &mut ProgramState,
    config: &GenConfig,
    rng: &mut impl Rng,
    is_input: bool,
) -> Result<(), Fault> {
    // The random tag keeps sequential generations from one generator
    // instance disjoint by name; the prefix is how the wire reader
    // recovers the buffer's direction.
    let tag: u32 = rng.gen();
    let name = if is_input {
        format!("in_{:08x}", tag)
    } else {
        format!("out_{:08x}", tag)
    };

    let mut flags = StorageFlags::default();
    if !is_input {
        flags.write_only = true;
    } else if config.allow_storage_qualifiers && rng.gen_bool(0.5) {
        flags.read_only = true;
    }
    if config.allow_storage_qualifiers && rng.gen_bool(0.25) {
        flags.coherent = true;
    }

    let member_count = rng.gen_range(1..=config.max_members_per_buffer);
    let buffer_kind = pick_carrier(rng);

    let mut values = Vec::new();
    let mut member_names = Vec::new();
    let mut member_types = Vec::new();

    for _ in 0..member_count {
        let kind = if config.allow_mixed_members {
            pick_carrier(rng)
        } else {
            buffer_kind
        };
        let mut ty = member_type(config, rng, kind);
        ty.merge_flags(flags);

        for _ in 0..ty.element_count() {
            values.push(random_scalar(config, rng, kind));
        }

        let member_name = state.names.member();
        // Members must remain visible; they are the comparison surface of
        // the harness, so they may never be shadowed.
        state.scopes.declare(member_name.clone(), ty.clone(), false);
        member_names.push(member_name);
        member_types.push(ty);
    }

    let binding = state.next_binding();
    state.buffers.push(Buffer {
        name,
        layout: "std430",
        values,
        flags,
        member_names,
        member_types,
        binding,
        is_input,
    });
    Ok(())
}

fn pick_carrier(rng: &mut impl Rng) -> ScalarKind {
    ScalarKind::BUFFER_CARRIERS[rng.gen_range(0..ScalarKind::BUFFER_CARRIERS.len())]
}

/// A member is a scalar of the carrier kind, or a fixed-size array of
/// such scalars. Vector and aggregate members are out: std430 padding
/// would make the flat value list ambiguous.
fn member_type(config: &GenConfig, rng: &mut impl Rng, kind: ScalarKind) -> TypeDescriptor {
    if config.max_array_elements >= 2 && rng.gen_bool(0.3) {
        let len = rng.gen_range(2..=config.max_array_elements);
        TypeDescriptor::array(TypeDescriptor::basic(kind, 1), len)
    } else {
        TypeDescriptor::basic(kind, 1)
    }
}

fn random_scalar(config: &GenConfig, rng: &mut impl Rng, kind: ScalarKind) -> ScalarValue {
    match kind {
        ScalarKind::Int => ScalarValue::Int(rng.gen_range(-config.int_bound..=config.int_bound)),
        ScalarKind::Uint => ScalarValue::Uint(rng.gen_range(0..=config.uint_bound)),
        ScalarKind::Float => {
            ScalarValue::Float(rng.gen_range(-config.float_bound..=config.float_bound))
        }
        ScalarKind::Bool => unreachable!("internal: bool is not a buffer carrier kind"),
    }
}
