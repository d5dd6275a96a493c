// diag.rs — Unified fault model
//
// Provides the shared fault type used across all generator phases.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── Fault code ───────────────────────────────────────────────────────────

/// A stable fault code (e.g., `C0001`, `M0002`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different semantic
/// meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaultCode(pub &'static str);

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable fault codes. `C` codes are configuration faults, `M` codes are
/// malformed harness input, `U` codes are unsupported constructs.
pub mod codes {
    use super::FaultCode;

    pub const CFG_NO_INPUT_BUFFERS: FaultCode = FaultCode("C0001");
    pub const CFG_NO_OUTPUT_BUFFERS: FaultCode = FaultCode("C0002");
    pub const CFG_NO_MEMBERS: FaultCode = FaultCode("C0003");
    pub const CFG_BAD_WORKGROUP: FaultCode = FaultCode("C0004");
    pub const CFG_BAD_LITERAL_BOUND: FaultCode = FaultCode("C0005");
    pub const CFG_BAD_ARRAY_BOUND: FaultCode = FaultCode("C0006");
    pub const CFG_UNREADABLE: FaultCode = FaultCode("C0100");

    pub const WIRE_NO_SHADER: FaultCode = FaultCode("M0001");
    pub const WIRE_NO_SHADER_END: FaultCode = FaultCode("M0002");
    pub const WIRE_BAD_BUFFER: FaultCode = FaultCode("M0003");
    pub const WIRE_NO_DATA_SIZE: FaultCode = FaultCode("M0004");
    pub const WIRE_NO_BUFFER_END: FaultCode = FaultCode("M0005");
    pub const WIRE_NO_BINDING: FaultCode = FaultCode("M0006");
    pub const WIRE_NO_RUN: FaultCode = FaultCode("M0007");

    pub const UNSUPPORTED_SHADER_KIND: FaultCode = FaultCode("U0001");
    pub const UNSUPPORTED_MIXED_BUFFER: FaultCode = FaultCode("U0002");
    pub const UNSUPPORTED_MEMBER_SHAPE: FaultCode = FaultCode("U0003");
}

// ── Fault kind ───────────────────────────────────────────────────────────

/// The three failure categories of the generator.
///
/// Configuration faults mean the current limits admit no valid realization
/// of a requested operation. Malformed-input faults mean harness text does
/// not match the wire grammar. Unsupported faults mean the request targets
/// a shape the generator does not implement, so callers can distinguish
/// "not yet supported" from "actually invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Configuration,
    MalformedInput,
    Unsupported,
}

// ── Fault ────────────────────────────────────────────────────────────────

/// A fault raised by any generator phase. Never retried automatically;
/// retry-with-different-random-choices is a caller-level policy.
#[derive(Debug, Clone)]
pub struct Fault {
    pub kind: FaultKind,
    pub code: Option<FaultCode>,
    pub message: String,
    /// The offending configuration setting, for configuration faults.
    pub setting: Option<&'static str>,
    pub hint: Option<String>,
}

impl Fault {
    /// A configuration fault naming the offending setting.
    pub fn configuration(setting: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Configuration,
            code: None,
            message: message.into(),
            setting: Some(setting),
            hint: None,
        }
    }

    /// A malformed-input fault. The message must name the expected
    /// fragment that was not found.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::MalformedInput,
            code: None,
            message: message.into(),
            setting: None,
            hint: None,
        }
    }

    /// An unsupported-construct fault.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Unsupported,
            code: None,
            message: message.into(),
            setting: None,
            hint: None,
        }
    }

    /// Attach a stable fault code.
    pub fn with_code(mut self, code: FaultCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FaultKind::Configuration => "configuration fault",
            FaultKind::MalformedInput => "malformed input",
            FaultKind::Unsupported => "unsupported",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: {}", kind, code, self.message)?;
        } else {
            write!(f, "{}: {}", kind, self.message)?;
        }
        if let Some(setting) = &self.setting {
            write!(f, " (setting: {})", setting)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for Fault {}
