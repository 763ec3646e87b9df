//! EXT_bmesh_encoding topology codec
//!
//! Serializes a polygon mesh's half-edge topology (vertices, edges, directed
//! loops, faces) into the component buffers defined in `bmesh-common`, and
//! reconstructs it again.
//!
//! # Pipeline
//!
//! ```text
//! MeshSource ─encode─▶ ComponentSet ─store_components─▶ ComponentRecord
//! ComponentRecord ─resolve_components─▶ ComponentSet
//! ComponentSet ─decode─▶ TopologySnapshot ─apply─▶ MeshSink
//! ```
//!
//! # Modules
//!
//! - [`topology`] - Arena topology model and its builder
//! - [`encoder`] - Mesh source to component set
//! - [`decoder`] - Component set to topology snapshot, and `apply`
//! - [`fan`] - Triangle-fan fallback for generic triangle readers
//! - [`mesh`] - Mesh source / sink interfaces and the owned `PolygonMesh`
//! - [`store`] - Buffer store / resolver interfaces and the append-only arena

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fan;
pub mod geometry;
pub mod mesh;
pub mod store;
pub mod topology;

#[cfg(test)]
pub(crate) mod test_meshes;

pub use decoder::{DecodeOutput, apply, decode, decode_record};
pub use encoder::{EncodeOptions, encode, encode_snapshot, snapshot_from_source};
pub use error::{ApplyError, CodecError, DecodeWarning};
pub use fan::{AnchorStrategy, FanOptions, FanTriangle, encode_fan};
pub use mesh::{CornerUvLayer, MeshSink, MeshSource, PolygonMesh};
pub use store::{
    BufferArena, BufferResolver, BufferSlices, BufferStore, BufferView, resolve_components,
    store_components,
};
pub use topology::{
    Edge, EdgeId, Face, FaceId, Loop, LoopId, ManifoldStats, ManifoldStatus, TopologyBuilder,
    TopologyError, TopologySnapshot, UvLayer, Vertex, VertexId,
};

// Wire types live in bmesh-common; re-export so downstream crates need one import
pub use bmesh_common::{Attribute, AttributeRef, BufferViewIndex, ComponentRecord, ComponentSet};
