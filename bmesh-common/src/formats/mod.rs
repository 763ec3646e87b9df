//! EXT_bmesh_encoding component buffer formats
//!
//! The component set is the encoder's output and the decoder's input: four
//! sections (vertices, edges, loops, faces), each with an element count and
//! named attribute buffers. Before it is embedded in a container, every
//! [`Attribute`] is stored in a buffer and replaced by an [`AttributeRef`]
//! (a buffer view handle plus layout), producing a [`ComponentRecord`].
//!
//! Variable-length per-element lists (face corners, adjacency) use the CSR
//! layout described in [`csr`].

mod attribute;
mod component_set;
pub mod csr;

#[cfg(test)]
mod tests;

pub use attribute::{Attribute, AttributeRef, BufferViewIndex};
pub use component_set::{
    ComponentRecord, ComponentSet, EDGES, EdgeSection, FACES, FaceSection, LOOP_TOPOLOGY_STRIDE,
    LOOPS, LoopSection, VERTICES, VertexSection,
};
pub use csr::{Csr, CsrError};
