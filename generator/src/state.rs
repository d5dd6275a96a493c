// state.rs — Mutable synthesis context for one generated program
//
// Owns the scope arena, the declared buffers (declaration order = binding
// order), per-category name counters and the shader body being built.
// Created fresh for every program and discarded after serialization; no
// state persists across programs.

use crate::ast::{Stmt, VarDecl};
use crate::scope::ScopeStack;
use crate::types::{ScalarValue, StorageFlags, TypeDescriptor};

// ── Name allocation ──────────────────────────────────────────────────────

/// Per-category name counters. Produces monotonically increasing names in
/// allocation order, ensuring deterministic assignment. Restarts with the
/// Program State, so member and local names repeat across programs; only
/// buffer names (random-tagged) must stay distinct between runs.
#[derive(Debug, Default)]
pub struct NameAllocator {
    next_member: u32,
    next_local: u32,
    next_global: u32,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member(&mut self) -> String {
        let name = format!("m{}", self.next_member);
        self.next_member += 1;
        name
    }

    pub fn local(&mut self) -> String {
        let name = format!("v{}", self.next_local);
        self.next_local += 1;
        name
    }

    pub fn global(&mut self) -> String {
        let name = format!("g{}", self.next_global);
        self.next_global += 1;
        name
    }
}

// ── Buffers ──────────────────────────────────────────────────────────────

/// A declared storage buffer. `values` is the flattened, in-declaration-
/// order concatenation of every member's scalar elements; the wire-format
/// writer and reader agree on this flattening byte-for-byte.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub name: String,
    pub layout: &'static str,
    pub values: Vec<ScalarValue>,
    pub flags: StorageFlags,
    pub member_names: Vec<String>,
    pub member_types: Vec<TypeDescriptor>,
    pub binding: u32,
    pub is_input: bool,
}

impl Buffer {
    /// Flattened element count per member, the unit the wire format's
    /// DATA_SIZE comment carries.
    pub fn member_sizes(&self) -> Vec<u32> {
        self.member_types.iter().map(|t| t.element_count()).collect()
    }
}

// ── Program state ────────────────────────────────────────────────────────

/// The synthesis context for one program.
#[derive(Debug)]
pub struct ProgramState {
    pub scopes: ScopeStack,
    pub buffers: Vec<Buffer>,
    pub names: NameAllocator,
    pub workgroup_size: [u32; 3],
    pub globals: Vec<VarDecl>,
    pub main_body: Vec<Stmt>,
}

impl Default for ProgramState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramState {
    pub fn new() -> Self {
        ProgramState {
            scopes: ScopeStack::new(),
            buffers: Vec::new(),
            names: NameAllocator::new(),
            workgroup_size: [1, 1, 1],
            globals: Vec::new(),
            main_body: Vec::new(),
        }
    }

    /// Claim the next sequential binding index.
    pub fn next_binding(&mut self) -> u32 {
        self.scopes.advance_binding()
    }

    pub fn input_buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.iter().filter(|b| b.is_input)
    }

    pub fn output_buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.iter().filter(|b| !b.is_input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    #[test]
    fn name_allocation_is_sequential_per_category() {
        let mut names = NameAllocator::new();
        assert_eq!(names.member(), "m0");
        assert_eq!(names.member(), "m1");
        assert_eq!(names.local(), "v0");
        assert_eq!(names.global(), "g0");
        assert_eq!(names.member(), "m2");
    }

    #[test]
    fn bindings_are_sequential() {
        let mut state = ProgramState::new();
        assert_eq!(state.next_binding(), 0);
        assert_eq!(state.next_binding(), 1);
        assert_eq!(state.next_binding(), 2);
    }

    #[test]
    fn member_sizes_flatten_arrays() {
        let buffer = Buffer {
            name: "in_0".into(),
            layout: "std430",
            values: Vec::new(),
            flags: Default::default(),
            member_names: vec!["m0".into(), "m1".into()],
            member_types: vec![
                TypeDescriptor::basic(ScalarKind::Int, 1),
                TypeDescriptor::array(TypeDescriptor::basic(ScalarKind::Int, 1), 3),
            ],
            binding: 0,
            is_input: true,
        };
        assert_eq!(buffer.member_sizes(), vec![1, 3]);
    }

    #[test]
    fn fresh_states_share_nothing() {
        let mut first = ProgramState::new();
        first.next_binding();
        first.names.member();
        let mut second = ProgramState::new();
        assert_eq!(second.next_binding(), 0);
        assert_eq!(second.names.member(), "m0");
    }
}
