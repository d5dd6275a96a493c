// scope.rs — Scoped variable availability tracking
//
// Answers, at any point during generation, "which declared variables may
// be read (for a target type) or written right now without introducing
// order-dependent semantics?"
//
// Scopes are nodes in an index arena: each node stores a parent index and
// its entries in declaration order, and lookups walk the index chain.
// Entries are never removed once declared; a child scope only adds.
//
// The initializer-frame protocol guards multi-argument constructs. The
// source language does not fix the evaluation order of sibling arguments,
// so a variable written by one completed sibling must be neither read nor
// written by a later sibling, and a variable read by one sibling must not
// be written by a later one (read/read pairs commute). Frames stack, so
// nested constructs compose: an inner construct's exclusions die with its
// frame, and its activity reaches the enclosing frame only through the
// ordinary read/written flags re-marked on exit.

use std::collections::HashSet;

use crate::types::{BasicType, TypeDescriptor};

// ── Entries ──────────────────────────────────────────────────────────────

/// A declared variable. `hideable = false` entries must stay visible to
/// the syntactic-hiding policy (they may not be shadowed); they are still
/// subject to initializer-frame exclusion like any other entry.
#[derive(Debug, Clone)]
pub struct ScopeEntry {
    pub name: String,
    pub ty: TypeDescriptor,
    pub hideable: bool,
    read: bool,
    written: bool,
}

/// Owned snapshot of an entry, handed to generation call sites.
#[derive(Debug, Clone)]
pub struct EntryView {
    pub name: String,
    pub ty: TypeDescriptor,
    pub hideable: bool,
}

impl EntryView {
    fn of(entry: &ScopeEntry) -> Self {
        EntryView {
            name: entry.name.clone(),
            ty: entry.ty.clone(),
            hideable: entry.hideable,
        }
    }
}

// ── Arena nodes ──────────────────────────────────────────────────────────

#[derive(Debug)]
struct ScopeNode {
    parent: Option<usize>,
    entries: Vec<ScopeEntry>,
    /// Storage bindings consumed so far, copied by value at creation so
    /// nested scopes see a consistent counter.
    binding_offset: u32,
}

/// Accumulated activity of completed sibling arguments of one
/// multi-argument construct.
#[derive(Debug, Default)]
struct InitFrame {
    reads: HashSet<String>,
    writes: HashSet<String>,
}

// ── Scope stack ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ScopeStack {
    nodes: Vec<ScopeNode>,
    current: usize,
    frames: Vec<InitFrame>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// A stack holding only the global scope.
    pub fn new() -> Self {
        ScopeStack {
            nodes: vec![ScopeNode {
                parent: None,
                entries: Vec::new(),
                binding_offset: 0,
            }],
            current: 0,
            frames: Vec::new(),
        }
    }

    /// Open a nested scope and make it current.
    pub fn enter_scope(&mut self) {
        let offset = self.nodes[self.current].binding_offset;
        self.nodes.push(ScopeNode {
            parent: Some(self.current),
            entries: Vec::new(),
            binding_offset: offset,
        });
        self.current = self.nodes.len() - 1;
    }

    /// Return to the parent scope. The node stays in the arena; its
    /// entries simply fall out of the visible chain.
    pub fn exit_scope(&mut self) {
        self.current = self.nodes[self.current]
            .parent
            .expect("internal: exit_scope called on the global scope");
    }

    /// Visible chain indices, global scope first.
    fn chain(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        let mut cursor = Some(self.current);
        while let Some(idx) = cursor {
            indices.push(idx);
            cursor = self.nodes[idx].parent;
        }
        indices.reverse();
        indices
    }

    /// Declare a name in the current (innermost) scope. Duplicates in the
    /// visible chain are a logic fault in the caller, not a runtime
    /// condition to recover from.
    pub fn declare(&mut self, name: impl Into<String>, ty: TypeDescriptor, hideable: bool) {
        let name = name.into();
        assert!(
            self.lookup(&name).is_none(),
            "internal: duplicate declaration of '{}'",
            name
        );
        self.nodes[self.current].entries.push(ScopeEntry {
            name,
            ty,
            hideable,
            read: false,
            written: false,
        });
    }

    /// Find a visible entry by name, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&ScopeEntry> {
        let mut cursor = Some(self.current);
        while let Some(idx) = cursor {
            if let Some(entry) = self.nodes[idx].entries.iter().find(|e| e.name == name) {
                return Some(entry);
            }
            cursor = self.nodes[idx].parent;
        }
        None
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut ScopeEntry> {
        let mut cursor = Some(self.current);
        while let Some(idx) = cursor {
            if self.nodes[idx].entries.iter().any(|e| e.name == name) {
                return self.nodes[idx].entries.iter_mut().find(|e| e.name == name);
            }
            cursor = self.nodes[idx].parent;
        }
        None
    }

    fn excluded_from_read(&self, name: &str) -> bool {
        self.frames.iter().any(|f| f.writes.contains(name))
    }

    fn excluded_from_write(&self, name: &str) -> bool {
        self.frames
            .iter()
            .any(|f| f.reads.contains(name) || f.writes.contains(name))
    }

    /// Entries readable for `target`: read/write-compatible by type, and
    /// not written by a completed sibling of any open construct. An empty
    /// chain yields an empty result, never an error.
    pub fn readable(&self, target: BasicType) -> Vec<EntryView> {
        let mut out = Vec::new();
        for idx in self.chain() {
            for entry in &self.nodes[idx].entries {
                if entry.ty.compatible_with(target) && !self.excluded_from_read(&entry.name) {
                    out.push(EntryView::of(entry));
                }
            }
        }
        out
    }

    /// Every declared entry not touched by a completed sibling of any
    /// open construct. Type filtering happens at the call site.
    pub fn writable(&self) -> Vec<EntryView> {
        let mut out = Vec::new();
        for idx in self.chain() {
            for entry in &self.nodes[idx].entries {
                if !self.excluded_from_write(&entry.name) {
                    out.push(EntryView::of(entry));
                }
            }
        }
        out
    }

    /// Record a read of a visible entry for the current statement.
    pub fn mark_read(&mut self, name: &str) {
        self.lookup_mut(name)
            .unwrap_or_else(|| panic!("internal: mark_read of undeclared '{}'", name))
            .read = true;
    }

    /// Record a write of a visible entry for the current statement.
    pub fn mark_written(&mut self, name: &str) {
        self.lookup_mut(name)
            .unwrap_or_else(|| panic!("internal: mark_written of undeclared '{}'", name))
            .written = true;
    }

    /// Clear all transient read/written flags. Called when a new statement
    /// begins.
    pub fn reset_statement_flags(&mut self) {
        for node in &mut self.nodes {
            for entry in &mut node.entries {
                entry.read = false;
                entry.written = false;
            }
        }
    }

    /// Begin a multi-argument construct: push a fresh, empty frame.
    pub fn enter_initializer(&mut self) {
        self.frames.push(InitFrame::default());
    }

    /// One sibling argument is complete: fold the entries touched since
    /// the last frame boundary into the top frame, then clear the flags so
    /// the next sibling starts clean. Availability shrinks monotonically
    /// as more siblings are generated.
    pub fn finish_init_param(&mut self) {
        let frame = self
            .frames
            .last_mut()
            .expect("internal: finish_init_param outside an initializer");
        for node in &mut self.nodes {
            for entry in &mut node.entries {
                if entry.read {
                    frame.reads.insert(entry.name.clone());
                }
                if entry.written {
                    frame.writes.insert(entry.name.clone());
                }
                entry.read = false;
                entry.written = false;
            }
        }
    }

    /// Close the construct: pop the frame and discard its exclusion set.
    /// The popped activity is re-marked on the entry flags so that an
    /// enclosing construct's own fold sees it.
    pub fn exit_initializer(&mut self) {
        let frame = self
            .frames
            .pop()
            .expect("internal: exit_initializer outside an initializer");
        for name in &frame.reads {
            if let Some(entry) = self.lookup_mut(name) {
                entry.read = true;
            }
        }
        for name in &frame.writes {
            if let Some(entry) = self.lookup_mut(name) {
                entry.written = true;
            }
        }
    }

    /// Number of storage bindings consumed, as seen by the current scope.
    pub fn binding_offset(&self) -> u32 {
        self.nodes[self.current].binding_offset
    }

    /// Claim the next binding index.
    pub fn advance_binding(&mut self) -> u32 {
        let binding = self.nodes[self.current].binding_offset;
        self.nodes[self.current].binding_offset += 1;
        binding
    }

    /// Whether `name` may be shadowed by a declaration in a nested scope.
    pub fn shadowable(&self, name: &str) -> bool {
        self.lookup(name).map(|e| e.hideable).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    fn basic(kind: ScalarKind, arity: u8) -> TypeDescriptor {
        TypeDescriptor::basic(kind, arity)
    }

    fn names(entries: &[EntryView]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn empty_chain_yields_empty_results() {
        let scopes = ScopeStack::new();
        assert!(scopes.readable(BasicType::scalar(ScalarKind::Int)).is_empty());
        assert!(scopes.writable().is_empty());
    }

    #[test]
    #[should_panic(expected = "duplicate declaration")]
    fn duplicate_declaration_panics() {
        let mut scopes = ScopeStack::new();
        scopes.declare("v0", basic(ScalarKind::Int, 1), true);
        scopes.enter_scope();
        scopes.declare("v0", basic(ScalarKind::Int, 1), true);
    }

    #[test]
    fn readable_walks_global_to_innermost() {
        let mut scopes = ScopeStack::new();
        scopes.declare("g0", basic(ScalarKind::Float, 1), true);
        scopes.enter_scope();
        scopes.declare("v0", basic(ScalarKind::Float, 2), true);
        let readable = scopes.readable(BasicType::scalar(ScalarKind::Float));
        assert_eq!(names(&readable), vec!["g0", "v0"]);
    }

    #[test]
    fn exit_scope_drops_inner_entries_from_view() {
        let mut scopes = ScopeStack::new();
        scopes.declare("g0", basic(ScalarKind::Int, 1), true);
        scopes.enter_scope();
        scopes.declare("v0", basic(ScalarKind::Int, 1), true);
        assert_eq!(scopes.writable().len(), 2);
        scopes.exit_scope();
        assert_eq!(names(&scopes.writable()), vec!["g0"]);
    }

    #[test]
    fn reads_exclude_from_writable_but_not_readable() {
        let mut scopes = ScopeStack::new();
        scopes.declare("v0", basic(ScalarKind::Int, 1), true);
        scopes.enter_initializer();
        scopes.mark_read("v0");
        scopes.finish_init_param();

        // A read by an earlier sibling commutes with later reads, so v0
        // stays readable; a later write would not commute.
        assert_eq!(names(&scopes.readable(BasicType::scalar(ScalarKind::Int))), vec!["v0"]);
        assert!(scopes.writable().is_empty());

        scopes.exit_initializer();
        assert_eq!(scopes.writable().len(), 1);
    }

    #[test]
    fn writes_exclude_from_both() {
        let mut scopes = ScopeStack::new();
        scopes.declare("v0", basic(ScalarKind::Uint, 1), true);
        scopes.enter_initializer();
        scopes.mark_written("v0");
        scopes.finish_init_param();

        assert!(scopes.readable(BasicType::scalar(ScalarKind::Uint)).is_empty());
        assert!(scopes.writable().is_empty());

        scopes.exit_initializer();
        assert_eq!(scopes.readable(BasicType::scalar(ScalarKind::Uint)).len(), 1);
    }

    #[test]
    fn nested_frames_leak_only_through_flags() {
        let mut scopes = ScopeStack::new();
        scopes.declare("v0", basic(ScalarKind::Int, 1), true);
        scopes.declare("v1", basic(ScalarKind::Int, 1), true);

        scopes.enter_initializer(); // outer construct
        scopes.enter_initializer(); // inner construct, first outer sibling
        scopes.mark_written("v0");
        scopes.finish_init_param();
        // Inside the inner construct, v0 is excluded.
        assert!(!names(&scopes.writable()).contains(&"v0"));
        scopes.exit_initializer();

        // Inner frame is gone, but v0's flag was re-marked; the outer
        // fold picks it up for the outer construct's later siblings.
        scopes.finish_init_param();
        assert!(!names(&scopes.writable()).contains(&"v0"));
        assert!(names(&scopes.writable()).contains(&"v1"));

        scopes.exit_initializer();
        assert_eq!(scopes.writable().len(), 2);
    }

    #[test]
    fn non_hideable_entries_still_subject_to_frames() {
        let mut scopes = ScopeStack::new();
        scopes.declare("m0", basic(ScalarKind::Int, 1), false);
        scopes.enter_initializer();
        scopes.mark_written("m0");
        scopes.finish_init_param();
        assert!(scopes.readable(BasicType::scalar(ScalarKind::Int)).is_empty());
        scopes.exit_initializer();
        assert!(!scopes.shadowable("m0"));
    }

    #[test]
    fn binding_offset_is_inherited_by_value() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.advance_binding(), 0);
        assert_eq!(scopes.advance_binding(), 1);
        scopes.enter_scope();
        assert_eq!(scopes.binding_offset(), 2);
        assert_eq!(scopes.advance_binding(), 2);
        scopes.exit_scope();
        // The parent kept its own counter.
        assert_eq!(scopes.binding_offset(), 2);
    }

    #[test]
    fn statement_reset_clears_flags() {
        let mut scopes = ScopeStack::new();
        scopes.declare("v0", basic(ScalarKind::Float, 1), true);
        scopes.mark_read("v0");
        scopes.mark_written("v0");
        scopes.reset_statement_flags();
        scopes.enter_initializer();
        scopes.finish_init_param();
        // Nothing was folded: the flags were already clear.
        assert_eq!(scopes.writable().len(), 1);
        scopes.exit_initializer();
    }
}
