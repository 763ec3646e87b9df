//! Codec error and warning types

use crate::topology::TopologyError;
use bmesh_common::{BufferViewIndex, CsrError, Element, PackingError, byte_length};
use std::fmt;
use thiserror::Error;

/// Fatal encode/decode failure
///
/// Section-level problems abort the whole operation. Problems with a single
/// edge or face are reported as [`DecodeWarning`] instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A required top-level section is absent
    #[error("missing required section '{0}'")]
    MissingSection(&'static str),

    /// Byte length disagrees with the declared element count (the
    /// attribute's own count or its section's)
    #[error("malformed buffer {section}.{attribute}: expected {expected} bytes, found {actual}")]
    MalformedBuffer {
        section: &'static str,
        attribute: String,
        expected: usize,
        actual: usize,
    },

    /// Attribute stored with a component type or shape the codec cannot read
    #[error("{section}.{attribute} has unexpected layout: {detail}")]
    TypeMismatch {
        section: &'static str,
        attribute: String,
        detail: String,
    },

    /// Offsets array is not a valid CSR table for its values
    #[error("{section}.{attribute}: {source}")]
    MalformedOffsets {
        section: &'static str,
        attribute: String,
        #[source]
        source: CsrError,
    },

    /// Buffer resolver has no bytes for a referenced view
    #[error("buffer view {0} could not be resolved")]
    UnresolvedBufferView(BufferViewIndex),

    /// Buffer store refused an allocation
    #[error("buffer store: {0}")]
    BufferStore(String),
}

impl CodecError {
    /// Attach section/attribute context to a packing failure
    pub fn packing(section: &'static str, attribute: &str, err: PackingError) -> Self {
        match err {
            PackingError::LengthMismatch { expected, actual } => CodecError::MalformedBuffer {
                section,
                attribute: attribute.to_string(),
                expected,
                actual,
            },
            other => CodecError::TypeMismatch {
                section,
                attribute: attribute.to_string(),
                detail: other.to_string(),
            },
        }
    }

    /// Attribute holds `actual` bytes where the section count asks for
    /// `expected_elements` elements of `E`
    pub(crate) fn section_length<E: Element>(
        section: &'static str,
        attribute: &str,
        expected_elements: usize,
        actual: usize,
    ) -> Self {
        CodecError::MalformedBuffer {
            section,
            attribute: attribute.to_string(),
            expected: byte_length(E::COMPONENT, E::SHAPE, expected_elements),
            actual,
        }
    }
}

/// Failure while pushing a snapshot into a mesh sink
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Snapshot failed validation; the sink was not touched
    #[error("snapshot is not valid: {0}")]
    InvalidSnapshot(#[from] TopologyError),

    /// The sink rejected the replacement or the derived-state refresh
    #[error("mesh sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Non-fatal anomaly recovered during decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// Edge references an out-of-range vertex or connects a vertex to itself
    EdgeSkipped { edge: u32, vertices: [u32; 2] },

    /// A face corner references an out-of-range vertex; the corner was dropped
    FaceVertexUnresolved { face: u32, corner: u32, vertex: u32 },

    /// Face could not be created
    FaceSkipped { face: u32, reason: TopologyError },

    /// Stored loop topology disagrees with the rebuilt loops
    LoopTopologyMismatch { stored: u32, rebuilt: u32 },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::EdgeSkipped { edge, vertices } => write!(
                f,
                "edge {} skipped: invalid vertex pair ({}, {})",
                edge, vertices[0], vertices[1]
            ),
            DecodeWarning::FaceVertexUnresolved {
                face,
                corner,
                vertex,
            } => write!(
                f,
                "face {} corner {} references unknown vertex {}",
                face, corner, vertex
            ),
            DecodeWarning::FaceSkipped { face, reason } => {
                write!(f, "face {} skipped: {}", face, reason)
            }
            DecodeWarning::LoopTopologyMismatch { stored, rebuilt } => write!(
                f,
                "stored loop topology ({} loops) does not match rebuilt loops ({})",
                stored, rebuilt
            ),
        }
    }
}
