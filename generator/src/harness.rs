// harness.rs — Harness wire-format writer and reader
//
// Serializes a generated program as an AmberScript-style test block and
// reads such text back. No parsing library: the format is a fixed
// positional line grammar that maps to simple string operations.
//
// The `# DATA_SIZE` comment inside each buffer's DATA block is
// load-bearing: it is the only per-member size information available on
// deserialization. Reconstruction recovers buffer names, binding indices
// and member shapes; member names are regenerated and scalar values are
// replaced by a placeholder.

use std::fmt::Write;

use crate::diag::{codes, Fault};
use crate::state::{Buffer, ProgramState};
use crate::types::{ScalarKind, ScalarValue, TypeDescriptor};

/// Pipeline name used in every emitted harness.
pub const PIPELINE_NAME: &str = "pipeline";

// ── Writer ───────────────────────────────────────────────────────────────

/// Serialize a shader plus its buffers as harness text.
pub fn write_harness(
    shader_name: &str,
    glsl: &str,
    buffers: &[Buffer],
) -> Result<String, Fault> {
    let mut out = String::with_capacity(glsl.len() + 1024);
    writeln!(out, "SHADER compute {} GLSL", shader_name).unwrap();
    out.push_str(glsl);
    if !glsl.ends_with('\n') {
        out.push('\n');
    }
    writeln!(out, "END").unwrap();

    for buffer in buffers {
        let carrier = buffer_carrier(buffer)?;
        writeln!(
            out,
            "BUFFER {} DATA_TYPE {} DATA",
            buffer.name,
            data_type_name(carrier)
        )
        .unwrap();
        let sizes: Vec<String> = buffer.member_sizes().iter().map(u32::to_string).collect();
        writeln!(out, " # DATA_SIZE {}", sizes.join(" ")).unwrap();
        let values: Vec<String> = buffer.values.iter().map(ScalarValue::to_string).collect();
        writeln!(out, "  {}", values.join(" ")).unwrap();
        writeln!(out, "END").unwrap();
    }

    writeln!(out, "PIPELINE compute {}", PIPELINE_NAME).unwrap();
    writeln!(out, "  ATTACH {}", shader_name).unwrap();
    for buffer in buffers {
        writeln!(
            out,
            "  BIND BUFFER {} AS storage DESCRIPTOR_SET 0 BINDING {}",
            buffer.name, buffer.binding
        )
        .unwrap();
    }
    writeln!(out, "END").unwrap();
    writeln!(out, "RUN {} 1 1 1", PIPELINE_NAME).unwrap();
    Ok(out)
}

/// The single scalar kind a buffer carries on the wire. Mixed-kind
/// buffers have no encoding: DATA_TYPE is per buffer.
fn buffer_carrier(buffer: &Buffer) -> Result<ScalarKind, Fault> {
    let kind = buffer.member_types[0].base().kind;
    if buffer.member_types.iter().any(|t| t.base().kind != kind) {
        return Err(Fault::unsupported(format!(
            "buffer '{}' mixes member kinds; the wire format carries one DATA_TYPE per buffer",
            buffer.name
        ))
        .with_code(codes::UNSUPPORTED_MIXED_BUFFER));
    }
    Ok(kind)
}

fn data_type_name(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Int => "int32",
        ScalarKind::Uint => "uint32",
        ScalarKind::Float => "float",
        ScalarKind::Bool => unreachable!("internal: bool is not a buffer carrier kind"),
    }
}

// ── Reader ───────────────────────────────────────────────────────────────

/// A buffer reconstructed from harness text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBuffer {
    pub name: String,
    pub carrier: ScalarKind,
    pub member_sizes: Vec<u32>,
    pub binding: u32,
    pub is_input: bool,
}

/// The parsed harness: shader name, GLSL source, and buffers in binding
/// order.
#[derive(Debug, Clone)]
pub struct HarnessModule {
    pub shader_name: String,
    pub glsl: String,
    pub buffers: Vec<ParsedBuffer>,
}

/// Parse harness text. Faults name the expected fragment that was not
/// found.
pub fn parse_harness(text: &str) -> Result<HarnessModule, Fault> {
    let lines: Vec<&str> = text.lines().collect();

    let shader_idx = lines
        .iter()
        .position(|l| l.trim_start().starts_with("SHADER "))
        .ok_or_else(|| {
            Fault::malformed("expected SHADER block was not found").with_code(codes::WIRE_NO_SHADER)
        })?;
    let header: Vec<&str> = lines[shader_idx].split_whitespace().collect();
    if header.len() != 4 || header[3] != "GLSL" {
        return Err(
            Fault::malformed("expected 'SHADER compute <name> GLSL' header line")
                .with_code(codes::WIRE_NO_SHADER),
        );
    }
    if header[1] != "compute" {
        return Err(Fault::unsupported(format!(
            "shader kind '{}' is not generated; only compute is",
            header[1]
        ))
        .with_code(codes::UNSUPPORTED_SHADER_KIND));
    }
    let shader_name = header[2].to_string();

    let body_len = lines[shader_idx + 1..]
        .iter()
        .position(|l| l.trim() == "END")
        .ok_or_else(|| {
            Fault::malformed("expected END of SHADER block was not found")
                .with_code(codes::WIRE_NO_SHADER_END)
        })?;
    let mut glsl = lines[shader_idx + 1..shader_idx + 1 + body_len].join("\n");
    glsl.push('\n');

    let mut buffers: Vec<ParsedBuffer> = Vec::new();
    let mut bound: Vec<String> = Vec::new();
    let mut saw_run = false;
    let mut i = shader_idx + body_len + 2;
    while i < lines.len() {
        let line = lines[i].trim();
        if line.starts_with("BUFFER ") {
            let (buffer, consumed) = parse_buffer_block(&lines, i)?;
            buffers.push(buffer);
            i += consumed;
            continue;
        }
        if let Some(rest) = line.strip_prefix("BIND BUFFER ") {
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            // <name> AS storage DESCRIPTOR_SET 0 BINDING <idx>
            if tokens.len() != 7 || tokens[5] != "BINDING" {
                return Err(Fault::malformed("expected BIND BUFFER line with BINDING index")
                    .with_code(codes::WIRE_NO_BINDING));
            }
            let binding: u32 = tokens[6].parse().map_err(|_| {
                Fault::malformed("expected numeric BINDING index")
                    .with_code(codes::WIRE_NO_BINDING)
            })?;
            let name = tokens[0];
            let buffer = buffers.iter_mut().find(|b| b.name == name).ok_or_else(|| {
                Fault::malformed(format!(
                    "expected BUFFER block for bound buffer '{}' was not found",
                    name
                ))
                .with_code(codes::WIRE_NO_BINDING)
            })?;
            buffer.binding = binding;
            bound.push(buffer.name.clone());
        } else if line.starts_with("RUN ") {
            saw_run = true;
        }
        i += 1;
    }

    for buffer in &buffers {
        if !bound.contains(&buffer.name) {
            return Err(Fault::malformed(format!(
                "expected BIND for buffer '{}' was not found",
                buffer.name
            ))
            .with_code(codes::WIRE_NO_BINDING));
        }
    }
    if !saw_run {
        return Err(
            Fault::malformed("expected RUN dispatch was not found").with_code(codes::WIRE_NO_RUN)
        );
    }

    buffers.sort_by_key(|b| b.binding);
    Ok(HarnessModule {
        shader_name,
        glsl,
        buffers,
    })
}

/// Parse one BUFFER block starting at `start`. Returns the buffer and
/// the number of lines consumed.
fn parse_buffer_block(lines: &[&str], start: usize) -> Result<(ParsedBuffer, usize), Fault> {
    let tokens: Vec<&str> = lines[start].split_whitespace().collect();
    // BUFFER <name> DATA_TYPE <type> DATA
    if tokens.len() != 5 || tokens[2] != "DATA_TYPE" || tokens[4] != "DATA" {
        return Err(
            Fault::malformed("expected 'BUFFER <name> DATA_TYPE <type> DATA' line")
                .with_code(codes::WIRE_BAD_BUFFER),
        );
    }
    let name = tokens[1].to_string();
    let carrier = match tokens[3] {
        "int32" => ScalarKind::Int,
        "uint32" => ScalarKind::Uint,
        "float" => ScalarKind::Float,
        other => {
            return Err(
                Fault::malformed(format!("expected known DATA_TYPE, found '{}'", other))
                    .with_code(codes::WIRE_BAD_BUFFER),
            )
        }
    };

    let size_line = lines.get(start + 1).map(|l| l.trim()).unwrap_or("");
    let sizes_text = size_line.strip_prefix("# DATA_SIZE").ok_or_else(|| {
        Fault::malformed(format!(
            "expected DATA_SIZE comment in buffer '{}' was not found",
            name
        ))
        .with_code(codes::WIRE_NO_DATA_SIZE)
    })?;
    let mut member_sizes = Vec::new();
    for token in sizes_text.split_whitespace() {
        let size: u32 = token.parse().map_err(|_| {
            Fault::malformed(format!(
                "expected numeric member size in buffer '{}', found '{}'",
                name, token
            ))
            .with_code(codes::WIRE_NO_DATA_SIZE)
        })?;
        member_sizes.push(size);
    }

    let end = lines[start..]
        .iter()
        .position(|l| l.trim() == "END")
        .ok_or_else(|| {
            Fault::malformed(format!("expected END of buffer '{}' was not found", name))
                .with_code(codes::WIRE_NO_BUFFER_END)
        })?;

    let is_input = name.starts_with("in_");
    Ok((
        ParsedBuffer {
            name,
            carrier,
            member_sizes,
            binding: 0,
            is_input,
        },
        end + 1,
    ))
}

// ── Reconstruction ───────────────────────────────────────────────────────

/// Rebuild a Program State from parsed harness text. Buffer names and
/// binding indices are preserved; member names come from a fresh
/// allocator and every scalar value is the placeholder (value
/// round-tripping is a deliberate non-goal).
pub fn reconstruct_state(module: &HarnessModule) -> ProgramState {
    let mut state = ProgramState::new();
    for parsed in &module.buffers {
        let mut member_names = Vec::new();
        let mut member_types = Vec::new();
        let mut values = Vec::new();
        for &size in &parsed.member_sizes {
            let ty = if size <= 1 {
                TypeDescriptor::basic(parsed.carrier, 1)
            } else {
                TypeDescriptor::array(TypeDescriptor::basic(parsed.carrier, 1), size)
            };
            let member_name = state.names.member();
            state.scopes.declare(member_name.clone(), ty.clone(), false);
            for _ in 0..ty.element_count() {
                values.push(ScalarValue::placeholder(parsed.carrier));
            }
            member_names.push(member_name);
            member_types.push(ty);
        }
        state.next_binding();
        state.buffers.push(Buffer {
            name: parsed.name.clone(),
            layout: "std430",
            values,
            flags: Default::default(),
            member_names,
            member_types,
            binding: parsed.binding,
            is_input: parsed.is_input,
        });
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StorageFlags;

    fn sample_buffer(name: &str, binding: u32, is_input: bool) -> Buffer {
        Buffer {
            name: name.to_string(),
            layout: "std430",
            values: vec![
                ScalarValue::Int(3),
                ScalarValue::Int(-7),
                ScalarValue::Int(12),
            ],
            flags: StorageFlags::default(),
            member_names: vec!["m0".into(), "m1".into()],
            member_types: vec![
                TypeDescriptor::basic(ScalarKind::Int, 1),
                TypeDescriptor::array(TypeDescriptor::basic(ScalarKind::Int, 1), 2),
            ],
            binding,
            is_input,
        }
    }

    #[test]
    fn writer_emits_the_block_sequence() {
        let glsl = "#version 450\n\nvoid main()\n{\n}\n";
        let buffers = vec![sample_buffer("in_0000abcd", 0, true)];
        let text = write_harness("compute_shader", glsl, &buffers).unwrap();
        assert!(text.starts_with("SHADER compute compute_shader GLSL\n#version 450\n"));
        assert!(text.contains("\nEND\nBUFFER in_0000abcd DATA_TYPE int32 DATA\n"));
        assert!(text.contains(" # DATA_SIZE 1 2\n"));
        assert!(text.contains("  3 -7 12\n"));
        assert!(text.contains("BIND BUFFER in_0000abcd AS storage DESCRIPTOR_SET 0 BINDING 0\n"));
        assert!(text.ends_with("RUN pipeline 1 1 1\n"));
    }

    #[test]
    fn mixed_kind_buffers_cannot_be_encoded() {
        let mut buffer = sample_buffer("in_0000abcd", 0, true);
        buffer.member_types[1] = TypeDescriptor::basic(ScalarKind::Float, 1);
        let fault = write_harness("s", "void main() {}\n", &[buffer]).unwrap_err();
        assert_eq!(fault.code, Some(codes::UNSUPPORTED_MIXED_BUFFER));
    }

    #[test]
    fn round_trip_preserves_names_bindings_and_shapes() {
        let glsl = "#version 450\n\nvoid main()\n{\n}\n";
        let buffers = vec![
            sample_buffer("in_00000001", 0, true),
            Buffer {
                values: vec![ScalarValue::Uint(0), ScalarValue::Uint(0)],
                member_names: vec!["m2".into()],
                member_types: vec![TypeDescriptor::array(
                    TypeDescriptor::basic(ScalarKind::Uint, 1),
                    2,
                )],
                ..sample_buffer("out_00000002", 1, false)
            },
        ];
        let text = write_harness("compute_shader", glsl, &buffers).unwrap();
        let module = parse_harness(&text).unwrap();

        assert_eq!(module.shader_name, "compute_shader");
        assert_eq!(module.glsl, glsl);
        assert_eq!(module.buffers.len(), 2);
        assert_eq!(module.buffers[0].name, "in_00000001");
        assert_eq!(module.buffers[0].binding, 0);
        assert_eq!(module.buffers[0].member_sizes, vec![1, 2]);
        assert!(module.buffers[0].is_input);
        assert_eq!(module.buffers[1].name, "out_00000002");
        assert_eq!(module.buffers[1].binding, 1);
        assert_eq!(module.buffers[1].member_sizes, vec![2]);
        assert!(!module.buffers[1].is_input);
    }

    #[test]
    fn missing_data_size_names_the_fragment() {
        let text = "SHADER compute s GLSL\nvoid main() {}\nEND\nBUFFER in_1 DATA_TYPE int32 DATA\n  1 2 3\nEND\nRUN pipeline 1 1 1\n";
        let fault = parse_harness(text).unwrap_err();
        assert_eq!(fault.code, Some(codes::WIRE_NO_DATA_SIZE));
        assert!(fault.message.contains("DATA_SIZE"));
    }

    #[test]
    fn missing_binding_is_reported() {
        let text = "SHADER compute s GLSL\nvoid main() {}\nEND\nBIND BUFFER ghost AS storage DESCRIPTOR_SET 0 BINDING 0\nRUN pipeline 1 1 1\n";
        let fault = parse_harness(text).unwrap_err();
        assert_eq!(fault.code, Some(codes::WIRE_NO_BINDING));
    }

    #[test]
    fn missing_run_is_reported() {
        let text = "SHADER compute s GLSL\nvoid main() {}\nEND\n";
        let fault = parse_harness(text).unwrap_err();
        assert_eq!(fault.code, Some(codes::WIRE_NO_RUN));
    }

    #[test]
    fn non_compute_shader_kind_is_unsupported_not_malformed() {
        let text = "SHADER vertex s GLSL\nvoid main() {}\nEND\nRUN pipeline 1 1 1\n";
        let fault = parse_harness(text).unwrap_err();
        assert_eq!(fault.code, Some(codes::UNSUPPORTED_SHADER_KIND));
        assert_eq!(fault.kind, crate::diag::FaultKind::Unsupported);
    }

    #[test]
    fn reconstruction_regenerates_member_names_and_placeholder_values() {
        let glsl = "#version 450\n\nvoid main()\n{\n}\n";
        let buffers = vec![sample_buffer("in_00000001", 0, true)];
        let text = write_harness("compute_shader", glsl, &buffers).unwrap();
        let module = parse_harness(&text).unwrap();
        let state = reconstruct_state(&module);

        assert_eq!(state.buffers.len(), 1);
        let rebuilt = &state.buffers[0];
        assert_eq!(rebuilt.name, "in_00000001");
        assert_eq!(rebuilt.member_sizes(), vec![1, 2]);
        assert_eq!(rebuilt.values, vec![ScalarValue::Int(0); 3]);
        assert!(state.scopes.lookup(&rebuilt.member_names[0]).is_some());
    }
}
