// generate.rs — Top-level program synthesis driver
//
// Owns the single sequential random stream and runs the synthesis
// pipeline for one program at a time: fresh Program State, buffer
// synthesis, globals, statement generation, assembly, safety rewrites,
// emission, harness serialization, provenance. Generation is
// single-threaded, synchronous and bounded by the configuration limits,
// so it always terminates.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use crate::assemble::{assemble, emit_glsl, ComputeShader};
use crate::buffers::synthesize_buffers;
use crate::config::GenConfig;
use crate::diag::{codes, Fault};
use crate::exprs::{generate_globals, generate_main_body};
use crate::harness::write_harness;
use crate::safety::apply_all;
use crate::state::ProgramState;

/// Shader name used in every emitted harness.
pub const SHADER_NAME: &str = "compute_shader";

// ── Shader kinds ─────────────────────────────────────────────────────────

/// The closed set of shader kinds. Only `Compute` is generated; the
/// others are explicit unsupported-construct faults so that adding them
/// later is additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Compute,
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub fn name(self) -> &'static str {
        match self {
            ShaderKind::Compute => "compute",
            ShaderKind::Vertex => "vertex",
            ShaderKind::Fragment => "fragment",
        }
    }
}

// ── Provenance ───────────────────────────────────────────────────────────

/// Provenance metadata for a generated program.
///
/// `shader_hash`: SHA-256 of the emitted GLSL text.
/// `config_fingerprint`: SHA-256 of the configuration's canonical compact
/// JSON, stable independent of display formatting.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub shader_hash: [u8; 32],
    pub config_fingerprint: [u8; 32],
    pub generator_version: &'static str,
}

impl Provenance {
    /// Hex string of the shader hash (64 characters).
    pub fn shader_hash_hex(&self) -> String {
        bytes_to_hex(&self.shader_hash)
    }

    /// Hex string of the configuration fingerprint (64 characters).
    pub fn config_fingerprint_hex(&self) -> String {
        bytes_to_hex(&self.config_fingerprint)
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self) -> String {
        format!(
            "{{\n  \"shader_hash\": \"{}\",\n  \"config_fingerprint\": \"{}\",\n  \"generator_version\": \"{}\"\n}}\n",
            self.shader_hash_hex(),
            self.config_fingerprint_hex(),
            self.generator_version,
        )
    }
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut out = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", b);
    }
    out
}

fn sha256(text: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

fn compute_provenance(glsl: &str, config: &GenConfig) -> Provenance {
    Provenance {
        shader_hash: sha256(glsl),
        config_fingerprint: sha256(&config.canonical_json()),
        generator_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Generated program ────────────────────────────────────────────────────

/// One complete generated program and its serializations.
#[derive(Debug)]
pub struct GeneratedProgram {
    pub shader: ComputeShader,
    pub state: ProgramState,
    pub glsl: String,
    pub harness: String,
    pub provenance: Provenance,
}

// ── Generator ────────────────────────────────────────────────────────────

/// Program generator. One instance owns one seeded random stream,
/// consumed in generation order: fixed seed + fixed configuration
/// reproduces programs byte-for-byte, and sequential generations draw
/// disjoint buffer name tags from the advancing stream.
pub struct Generator {
    rng: ChaCha8Rng,
    config: GenConfig,
}

impl Generator {
    pub fn new(seed: u64, config: GenConfig) -> Self {
        Generator {
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// Generate one program of the requested shader kind.
    pub fn generate(&mut self, kind: ShaderKind) -> Result<GeneratedProgram, Fault> {
        match kind {
            ShaderKind::Compute => self.generate_compute(),
            other => Err(Fault::unsupported(format!(
                "shader kind '{}' is not generated; only compute is",
                other.name()
            ))
            .with_code(codes::UNSUPPORTED_SHADER_KIND)),
        }
    }

    /// Each run starts from a fresh Program State; nothing from a prior
    /// run is observable except the advanced random stream.
    fn generate_compute(&mut self) -> Result<GeneratedProgram, Fault> {
        self.config.validate()?;
        let mut state = ProgramState::new();
        state.workgroup_size = [
            self.rng.gen_range(1..=self.config.max_workgroup_dim[0]),
            self.rng.gen_range(1..=self.config.max_workgroup_dim[1]),
            self.rng.gen_range(1..=self.config.max_workgroup_dim[2]),
        ];

        synthesize_buffers(&mut state, &self.config, &mut self.rng)?;
        generate_globals(&mut state, &self.config, &mut self.rng);
        generate_main_body(&mut state, &self.config, &mut self.rng);

        let mut shader = assemble(&state, &self.config);
        apply_all(&mut shader);

        let glsl = emit_glsl(&shader);
        let harness = write_harness(SHADER_NAME, &glsl, &state.buffers)?;
        let provenance = compute_provenance(&glsl, &self.config);

        Ok(GeneratedProgram {
            shader,
            state,
            glsl,
            harness,
            provenance,
        })
    }
}
