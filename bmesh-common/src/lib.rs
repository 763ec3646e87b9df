//! Shared binary primitives and wire types for EXT_bmesh_encoding
//!
//! This crate holds everything about the component buffers that does not
//! depend on mesh topology:
//! - `bmesh-codec` (topology encode/decode)
//! - `bmesh-export` (GLB container tooling)
//!
//! # Modules
//!
//! - [`packing`] - Little-endian packing of u8/u32/f32 scalars and tuples
//! - [`formats`] - Attribute buffers, the component set and CSR tables

pub mod formats;
pub mod packing;

// Re-export commonly used packing items
pub use packing::{
    BufferTarget, ComponentType, Element, ElementShape, PackingError, Scalar, byte_length, pack,
    unpack,
};

// Re-export commonly used format items
pub use formats::{
    Attribute, AttributeRef, BufferViewIndex, ComponentRecord, ComponentSet, Csr, CsrError,
    EDGES, EdgeSection, FACES, FaceSection, LOOP_TOPOLOGY_STRIDE, LOOPS, LoopSection, VERTICES,
    VertexSection,
};
