// types.rs — Uniform type descriptors for generated shader values
//
// Treats scalars, vectors and fixed-size arrays uniformly for generation:
// every descriptor answers the same questions (base scalar kind, total
// element count, storage qualification) regardless of shape. Structural
// fields never change after construction; only the three storage flags are
// mutable, and only monotonically to `true`.

use std::fmt;

// ── Scalar kinds ─────────────────────────────────────────────────────────

/// The closed set of base element kinds a generated value can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Uint,
    Float,
    Bool,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 4] = [
        ScalarKind::Int,
        ScalarKind::Uint,
        ScalarKind::Float,
        ScalarKind::Bool,
    ];

    /// Kinds a storage buffer can carry on the wire (no bool data type).
    pub const BUFFER_CARRIERS: [ScalarKind; 3] =
        [ScalarKind::Int, ScalarKind::Uint, ScalarKind::Float];
}

// ── Basic type: kind × arity ─────────────────────────────────────────────

/// A scalar or vector type: scalar kind plus arity 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicType {
    pub kind: ScalarKind,
    pub arity: u8,
}

impl BasicType {
    pub fn new(kind: ScalarKind, arity: u8) -> Self {
        assert!((1..=4).contains(&arity), "internal: arity out of range");
        BasicType { kind, arity }
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        BasicType { kind, arity: 1 }
    }

    /// The scalar type with this type's kind.
    pub fn component(self) -> Self {
        BasicType {
            kind: self.kind,
            arity: 1,
        }
    }

    /// GLSL name of this type (`int`, `ivec3`, `uint`, `vec2`, `bvec4`, ...).
    pub fn glsl_name(self) -> &'static str {
        match (self.kind, self.arity) {
            (ScalarKind::Int, 1) => "int",
            (ScalarKind::Int, 2) => "ivec2",
            (ScalarKind::Int, 3) => "ivec3",
            (ScalarKind::Int, 4) => "ivec4",
            (ScalarKind::Uint, 1) => "uint",
            (ScalarKind::Uint, 2) => "uvec2",
            (ScalarKind::Uint, 3) => "uvec3",
            (ScalarKind::Uint, 4) => "uvec4",
            (ScalarKind::Float, 1) => "float",
            (ScalarKind::Float, 2) => "vec2",
            (ScalarKind::Float, 3) => "vec3",
            (ScalarKind::Float, 4) => "vec4",
            (ScalarKind::Bool, 1) => "bool",
            (ScalarKind::Bool, 2) => "bvec2",
            (ScalarKind::Bool, 3) => "bvec3",
            (ScalarKind::Bool, 4) => "bvec4",
            _ => unreachable!("internal: arity out of range"),
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glsl_name())
    }
}

// ── Storage flags ────────────────────────────────────────────────────────

/// Storage-buffer qualification. Set after construction by the component
/// that decides buffer qualifiers; flags only ever move `false` → `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageFlags {
    pub read_only: bool,
    pub write_only: bool,
    pub coherent: bool,
}

// ── Type errors ──────────────────────────────────────────────────────────

/// Errors from shape-dependent descriptor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeError {
    /// `child()` was queried on a non-array descriptor.
    NotAnArray,
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::NotAnArray => write!(f, "child type queried on a non-array descriptor"),
        }
    }
}

impl std::error::Error for TypeError {}

// ── Type descriptor ──────────────────────────────────────────────────────

/// The shape of a descriptor: a basic (scalar/vector) type, or an array of
/// a child descriptor. `len == 0` means runtime-sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Basic(BasicType),
    Array { elem: Box<TypeDescriptor>, len: u32 },
}

/// Uniform view over a scalar, vector or fixed-size array type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    shape: TypeShape,
    flags: StorageFlags,
}

impl TypeDescriptor {
    pub fn basic(kind: ScalarKind, arity: u8) -> Self {
        TypeDescriptor {
            shape: TypeShape::Basic(BasicType::new(kind, arity)),
            flags: StorageFlags::default(),
        }
    }

    pub fn from_basic(basic: BasicType) -> Self {
        TypeDescriptor {
            shape: TypeShape::Basic(basic),
            flags: StorageFlags::default(),
        }
    }

    pub fn array(elem: TypeDescriptor, len: u32) -> Self {
        TypeDescriptor {
            shape: TypeShape::Array {
                elem: Box::new(elem),
                len,
            },
            flags: StorageFlags::default(),
        }
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// The innermost basic type of this descriptor's shape chain.
    pub fn base(&self) -> BasicType {
        match &self.shape {
            TypeShape::Basic(basic) => *basic,
            TypeShape::Array { elem, .. } => elem.base(),
        }
    }

    /// Total scalar element count: arity × every array length along the
    /// chain. Always >= 1; runtime-sized lengths count as 1.
    pub fn element_count(&self) -> u32 {
        match &self.shape {
            TypeShape::Basic(basic) => u32::from(basic.arity),
            TypeShape::Array { elem, len } => elem.element_count() * (*len).max(1),
        }
    }

    /// Array length, or 0 for non-arrays and runtime-sized arrays.
    pub fn array_len(&self) -> u32 {
        match &self.shape {
            TypeShape::Basic(_) => 0,
            TypeShape::Array { len, .. } => *len,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.shape, TypeShape::Array { .. })
    }

    /// The element descriptor of an array. Erroring on non-arrays keeps
    /// array-only operations exhaustively checked at the call site.
    pub fn child(&self) -> Result<&TypeDescriptor, TypeError> {
        match &self.shape {
            TypeShape::Basic(_) => Err(TypeError::NotAnArray),
            TypeShape::Array { elem, .. } => Ok(elem),
        }
    }

    pub fn flags(&self) -> StorageFlags {
        self.flags
    }

    pub fn mark_read_only(&mut self) {
        self.flags.read_only = true;
    }

    pub fn mark_write_only(&mut self) {
        self.flags.write_only = true;
    }

    pub fn mark_coherent(&mut self) {
        self.flags.coherent = true;
    }

    /// Merge qualifier flags in. Monotonic: set bits are never cleared.
    pub fn merge_flags(&mut self, flags: StorageFlags) {
        self.flags.read_only |= flags.read_only;
        self.flags.write_only |= flags.write_only;
        self.flags.coherent |= flags.coherent;
    }

    /// Read/write compatibility with a target basic type.
    ///
    /// A scalar target accepts any candidate of the same scalar kind
    /// (a component is extracted at the access layer). A vector target
    /// needs a candidate with arity >= 2 of the same kind; the access
    /// layer narrows or pads to the exact arity.
    pub fn compatible_with(&self, target: BasicType) -> bool {
        let base = self.base();
        if base.kind != target.kind {
            return false;
        }
        if target.arity == 1 {
            true
        } else {
            base.arity >= 2
        }
    }

    /// GLSL declaration text for a named value of this type, with array
    /// suffixes after the name (`uint m1[3]`).
    pub fn glsl_decl(&self, name: &str) -> String {
        let mut suffix = String::new();
        let mut shape = &self.shape;
        loop {
            match shape {
                TypeShape::Basic(basic) => {
                    return format!("{} {}{}", basic.glsl_name(), name, suffix);
                }
                TypeShape::Array { elem, len } => {
                    if *len == 0 {
                        suffix.push_str("[]");
                    } else {
                        suffix.push_str(&format!("[{}]", len));
                    }
                    shape = &elem.shape;
                }
            }
        }
    }
}

// ── Scalar values ────────────────────────────────────────────────────────

/// A concrete scalar element of a buffer's flattened value list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    Int(i32),
    Uint(u32),
    Float(f32),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Int(_) => ScalarKind::Int,
            ScalarValue::Uint(_) => ScalarKind::Uint,
            ScalarValue::Float(_) => ScalarKind::Float,
        }
    }

    /// The placeholder value substituted on deserialization.
    pub fn placeholder(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Int => ScalarValue::Int(0),
            ScalarKind::Uint => ScalarValue::Uint(0),
            ScalarKind::Float | ScalarKind::Bool => ScalarValue::Float(0.0),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(v) => write!(f, "{}", v),
            ScalarValue::Uint(v) => write!(f, "{}", v),
            ScalarValue::Float(v) => write!(f, "{:?}", v),
        }
    }
}
