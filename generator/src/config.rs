// config.rs — Generation limits and literal bounds
//
// All knobs the synthesis engine consults. Loaded from a JSON file with
// field-wise defaults, so partial configurations are valid. The canonical
// compact-JSON form feeds the provenance fingerprint.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diag::{codes, Fault};

// ── Defaults ─────────────────────────────────────────────────────────────

const DEFAULT_MAX_INPUT_BUFFERS: u32 = 2;
const DEFAULT_MAX_OUTPUT_BUFFERS: u32 = 2;
const DEFAULT_MAX_MEMBERS_PER_BUFFER: u32 = 3;
const DEFAULT_MAX_GLOBALS: u32 = 3;
const DEFAULT_MAX_ARRAY_ELEMENTS: u32 = 4;
const DEFAULT_MAX_STATEMENTS: u32 = 10;
const DEFAULT_MAX_EXPR_DEPTH: u32 = 3;
const DEFAULT_MAX_WORKGROUP_DIM: [u32; 3] = [4, 2, 2];

/// Integer literals are drawn from [-INT_BOUND, INT_BOUND].
const DEFAULT_INT_BOUND: i32 = 2_000_000_000;
/// Unsigned literals are drawn from [0, UINT_BOUND].
const DEFAULT_UINT_BOUND: u32 = 4_000_000_000;
/// Float literals are drawn from the symmetric range [-FLOAT_BOUND,
/// FLOAT_BOUND], deliberately far below float range to bound
/// magnitude-related divergence between drivers.
const DEFAULT_FLOAT_BOUND: f32 = 1024.0;

// ── Configuration ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    pub max_input_buffers: u32,
    pub max_output_buffers: u32,
    pub max_members_per_buffer: u32,
    pub max_globals: u32,
    pub max_array_elements: u32,
    pub max_statements: u32,
    pub max_expr_depth: u32,
    /// Upper bound per workgroup dimension; each dimension is drawn
    /// independently from 1..=bound.
    pub max_workgroup_dim: [u32; 3],
    pub allow_storage_qualifiers: bool,
    /// Permit members of one buffer to carry distinct scalar kinds.
    /// Such buffers cannot be encoded in the wire format.
    pub allow_mixed_members: bool,
    pub int_bound: i32,
    pub uint_bound: u32,
    pub float_bound: f32,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            max_input_buffers: DEFAULT_MAX_INPUT_BUFFERS,
            max_output_buffers: DEFAULT_MAX_OUTPUT_BUFFERS,
            max_members_per_buffer: DEFAULT_MAX_MEMBERS_PER_BUFFER,
            max_globals: DEFAULT_MAX_GLOBALS,
            max_array_elements: DEFAULT_MAX_ARRAY_ELEMENTS,
            max_statements: DEFAULT_MAX_STATEMENTS,
            max_expr_depth: DEFAULT_MAX_EXPR_DEPTH,
            max_workgroup_dim: DEFAULT_MAX_WORKGROUP_DIM,
            allow_storage_qualifiers: true,
            allow_mixed_members: false,
            int_bound: DEFAULT_INT_BOUND,
            uint_bound: DEFAULT_UINT_BOUND,
            float_bound: DEFAULT_FLOAT_BOUND,
        }
    }
}

impl GenConfig {
    /// Load a configuration from a JSON file. Missing fields default.
    pub fn load(path: &Path) -> Result<GenConfig, Fault> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Fault::configuration("config", format!("{}: {}", path.display(), e))
                .with_code(codes::CFG_UNREADABLE)
        })?;
        let config: GenConfig = serde_json::from_str(&text).map_err(|e| {
            Fault::configuration("config", format!("{}: {}", path.display(), e))
                .with_code(codes::CFG_UNREADABLE)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations under which generation has no valid
    /// realization. Reported with the offending setting, never retried.
    pub fn validate(&self) -> Result<(), Fault> {
        if self.max_input_buffers == 0 {
            return Err(
                Fault::configuration("max_input_buffers", "no input buffers permitted")
                    .with_code(codes::CFG_NO_INPUT_BUFFERS),
            );
        }
        if self.max_output_buffers == 0 {
            return Err(
                Fault::configuration("max_output_buffers", "no output buffers permitted")
                    .with_code(codes::CFG_NO_OUTPUT_BUFFERS),
            );
        }
        if self.max_members_per_buffer == 0 {
            return Err(
                Fault::configuration("max_members_per_buffer", "buffers need at least one member")
                    .with_code(codes::CFG_NO_MEMBERS),
            );
        }
        if self.max_workgroup_dim.iter().any(|&d| d == 0) {
            return Err(Fault::configuration(
                "max_workgroup_dim",
                "workgroup dimensions must be at least 1",
            )
            .with_code(codes::CFG_BAD_WORKGROUP));
        }
        if self.max_array_elements == 0 {
            return Err(Fault::configuration(
                "max_array_elements",
                "array declarations need at least one element",
            )
            .with_code(codes::CFG_BAD_ARRAY_BOUND));
        }
        if self.int_bound <= 0 {
            return Err(
                Fault::configuration("int_bound", "signed literal bound must be positive")
                    .with_code(codes::CFG_BAD_LITERAL_BOUND),
            );
        }
        if self.uint_bound == 0 {
            return Err(
                Fault::configuration("uint_bound", "unsigned literal bound must be positive")
                    .with_code(codes::CFG_BAD_LITERAL_BOUND),
            );
        }
        if !self.float_bound.is_finite() || self.float_bound <= 0.0 {
            return Err(
                Fault::configuration("float_bound", "float literal bound must be positive")
                    .with_code(codes::CFG_BAD_LITERAL_BOUND),
            );
        }
        Ok(())
    }

    /// Canonical compact JSON, stable across runs, for fingerprinting.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).expect("internal: config serialization cannot fail")
    }
}
