// assemble.rs — Compute-shader assembly and GLSL emission
//
// Consumes a Program State and produces the complete shader: fixed
// workgroup-size declaration, one interface block per buffer in binding
// order, injected safety-wrapper functions, top-level globals, and the
// `main` entry point with the generated statement sequence. The emission
// order is part of the output contract.
//
// Preconditions: buffers, globals and the main body are fully generated.
// Postconditions: `emit_glsl` returns a self-contained GLSL 450 source.
// Failure modes: none (pure data movement and string formatting).
// Side effects: none.

use std::fmt::Write;

use crate::ast::{write_stmt, Stmt, VarDecl};
use crate::config::GenConfig;
use crate::state::{Buffer, ProgramState};

// ── Assembled shader ─────────────────────────────────────────────────────

/// An injected safety-wrapper function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperFn {
    pub name: String,
    pub source: String,
}

/// The assembled compute shader, ready for rewrite passes and emission.
#[derive(Debug, Clone)]
pub struct ComputeShader {
    pub workgroup_size: [u32; 3],
    pub buffers: Vec<Buffer>,
    /// Wrapper definitions, kept sorted by name. Each distinct wrapper is
    /// injected at most once per program.
    pub wrappers: Vec<WrapperFn>,
    pub globals: Vec<VarDecl>,
    pub main_body: Vec<Stmt>,
    pub emit_qualifiers: bool,
}

/// Build the shader skeleton from a completed Program State.
pub fn assemble(state: &ProgramState, config: &GenConfig) -> ComputeShader {
    ComputeShader {
        workgroup_size: state.workgroup_size,
        buffers: state.buffers.clone(),
        wrappers: Vec::new(),
        globals: state.globals.clone(),
        main_body: state.main_body.clone(),
        emit_qualifiers: config.allow_storage_qualifiers,
    }
}

// ── Emission ─────────────────────────────────────────────────────────────

/// Render the shader as GLSL text. Ends with a newline.
pub fn emit_glsl(shader: &ComputeShader) -> String {
    let mut out = String::with_capacity(4096);
    writeln!(out, "#version 450").unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "layout(local_size_x = {}, local_size_y = {}, local_size_z = {}) in;",
        shader.workgroup_size[0], shader.workgroup_size[1], shader.workgroup_size[2]
    )
    .unwrap();

    for buffer in &shader.buffers {
        writeln!(out).unwrap();
        emit_block(&mut out, buffer, shader.emit_qualifiers);
    }

    for wrapper in &shader.wrappers {
        writeln!(out).unwrap();
        out.push_str(&wrapper.source);
    }

    if !shader.globals.is_empty() {
        writeln!(out).unwrap();
        for decl in &shader.globals {
            match &decl.init {
                Some(init) => {
                    writeln!(out, "{} = {};", decl.ty.glsl_decl(&decl.name), init).unwrap()
                }
                None => writeln!(out, "{};", decl.ty.glsl_decl(&decl.name)).unwrap(),
            }
        }
    }

    writeln!(out).unwrap();
    writeln!(out, "void main()").unwrap();
    writeln!(out, "{{").unwrap();
    for stmt in &shader.main_body {
        write_stmt(&mut out, stmt, 4);
    }
    writeln!(out, "}}").unwrap();
    out
}

fn emit_block(out: &mut String, buffer: &Buffer, emit_qualifiers: bool) {
    let mut qualifiers = String::new();
    if emit_qualifiers {
        if buffer.flags.coherent {
            qualifiers.push_str("coherent ");
        }
        if buffer.flags.read_only {
            qualifiers.push_str("readonly ");
        } else if buffer.flags.write_only {
            qualifiers.push_str("writeonly ");
        }
    }
    writeln!(
        out,
        "layout({}, binding = {}) {}buffer {} {{",
        buffer.layout, buffer.binding, qualifiers, buffer.name
    )
    .unwrap();
    for (name, ty) in buffer.member_names.iter().zip(&buffer.member_types) {
        writeln!(out, "    {};", ty.glsl_decl(name)).unwrap();
    }
    writeln!(out, "}};").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScalarKind, StorageFlags, TypeDescriptor};

    fn shader_with_buffer(flags: StorageFlags, emit_qualifiers: bool) -> ComputeShader {
        ComputeShader {
            workgroup_size: [2, 1, 1],
            buffers: vec![Buffer {
                name: "in_00000001".into(),
                layout: "std430",
                values: Vec::new(),
                flags,
                member_names: vec!["m0".into(), "m1".into()],
                member_types: vec![
                    TypeDescriptor::basic(ScalarKind::Int, 1),
                    TypeDescriptor::array(TypeDescriptor::basic(ScalarKind::Int, 1), 3),
                ],
                binding: 0,
                is_input: true,
            }],
            wrappers: Vec::new(),
            globals: Vec::new(),
            main_body: Vec::new(),
            emit_qualifiers,
        }
    }

    #[test]
    fn emission_order_is_version_workgroup_blocks_main() {
        let shader = shader_with_buffer(StorageFlags::default(), true);
        let glsl = emit_glsl(&shader);
        let version = glsl.find("#version 450").unwrap();
        let workgroup = glsl.find("layout(local_size_x = 2").unwrap();
        let block = glsl.find("buffer in_00000001").unwrap();
        let main = glsl.find("void main()").unwrap();
        assert!(version < workgroup && workgroup < block && block < main);
        assert!(glsl.ends_with("}\n"));
    }

    #[test]
    fn empty_main_emits_empty_braces() {
        let shader = shader_with_buffer(StorageFlags::default(), true);
        let glsl = emit_glsl(&shader);
        assert!(glsl.contains("void main()\n{\n}\n"));
    }

    #[test]
    fn qualifiers_render_in_fixed_order() {
        let flags = StorageFlags {
            read_only: true,
            write_only: false,
            coherent: true,
        };
        let glsl = emit_glsl(&shader_with_buffer(flags, true));
        assert!(glsl.contains("layout(std430, binding = 0) coherent readonly buffer in_00000001 {"));
    }

    #[test]
    fn qualifier_emission_can_be_disabled() {
        let flags = StorageFlags {
            read_only: true,
            write_only: false,
            coherent: true,
        };
        let glsl = emit_glsl(&shader_with_buffer(flags, false));
        assert!(glsl.contains("layout(std430, binding = 0) buffer in_00000001 {"));
        assert!(!glsl.contains("readonly"));
    }

    #[test]
    fn members_render_with_array_suffixes() {
        let glsl = emit_glsl(&shader_with_buffer(StorageFlags::default(), true));
        assert!(glsl.contains("    int m0;\n"));
        assert!(glsl.contains("    int m1[3];\n"));
    }
}
