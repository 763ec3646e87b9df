//! Buffer store / resolver interfaces
//!
//! The encoder's attributes are handed to a [`BufferStore`], which returns a
//! buffer view index for each. On the decode side a [`BufferResolver`] maps
//! those indices back to bytes. [`BufferArena`] implements both over one
//! owned, append-only byte buffer; [`BufferSlices`] resolves views over an
//! already loaded binary chunk.

use crate::error::CodecError;
use bmesh_common::{
    Attribute, AttributeRef, BufferTarget, BufferViewIndex, ComponentRecord, ComponentSet,
};
use serde::{Deserialize, Serialize};

/// Every view starts on this byte boundary
pub const VIEW_ALIGNMENT: usize = 4;

pub trait BufferStore {
    /// Copy an attribute's bytes into the store
    fn store(&mut self, attribute: &Attribute) -> Result<BufferViewIndex, CodecError>;
}

pub trait BufferResolver {
    /// Bytes previously stored for a view, `None` if unknown
    fn resolve(&self, view: BufferViewIndex) -> Option<&[u8]>;
}

/// glTF `bufferView` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: u32,
    #[serde(default)]
    pub byte_offset: u32,
    pub byte_length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<BufferTarget>,
}

impl BufferView {
    fn range(&self) -> std::ops::Range<usize> {
        let start = self.byte_offset as usize;
        start..start + self.byte_length as usize
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Append-only byte arena (one glTF buffer)
///
/// Offsets only grow; stored bytes are never moved or overwritten.
#[derive(Debug, Clone, Default)]
pub struct BufferArena {
    buffer: u32,
    data: Vec<u8>,
    views: Vec<BufferView>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena whose views reference glTF buffer `buffer`
    pub fn for_buffer(buffer: u32) -> Self {
        Self {
            buffer,
            ..Self::default()
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn views(&self) -> &[BufferView] {
        &self.views
    }

    pub fn into_parts(self) -> (Vec<u8>, Vec<BufferView>) {
        (self.data, self.views)
    }

    /// Append raw bytes as a new view
    pub fn push_bytes(
        &mut self,
        bytes: &[u8],
        target: Option<BufferTarget>,
    ) -> Result<BufferViewIndex, CodecError> {
        let padding = (VIEW_ALIGNMENT - self.data.len() % VIEW_ALIGNMENT) % VIEW_ALIGNMENT;
        let offset = self.data.len() + padding;
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= u32::MAX as usize)
            .ok_or_else(|| CodecError::BufferStore("arena exceeds 4 GiB".to_string()))?;
        let index = u32::try_from(self.views.len())
            .map_err(|_| CodecError::BufferStore("too many buffer views".to_string()))?;

        self.data.resize(offset, 0);
        self.data.extend_from_slice(bytes);
        debug_assert_eq!(self.data.len(), end);

        self.views.push(BufferView {
            buffer: self.buffer,
            byte_offset: offset as u32,
            byte_length: bytes.len() as u32,
            target,
        });
        Ok(index)
    }
}

impl BufferStore for BufferArena {
    fn store(&mut self, attribute: &Attribute) -> Result<BufferViewIndex, CodecError> {
        self.push_bytes(&attribute.data, Some(attribute.target))
    }
}

impl BufferResolver for BufferArena {
    fn resolve(&self, view: BufferViewIndex) -> Option<&[u8]> {
        let view = self.views.get(view as usize)?;
        if view.buffer != self.buffer {
            return None;
        }
        self.data.get(view.range())
    }
}

// ============================================================================
// Borrowed Resolver
// ============================================================================

/// Resolver over a loaded binary chunk (glTF buffer 0) and its view table
#[derive(Debug, Clone, Copy)]
pub struct BufferSlices<'a> {
    data: &'a [u8],
    views: &'a [BufferView],
}

impl<'a> BufferSlices<'a> {
    pub fn new(data: &'a [u8], views: &'a [BufferView]) -> Self {
        Self { data, views }
    }
}

impl BufferResolver for BufferSlices<'_> {
    fn resolve(&self, view: BufferViewIndex) -> Option<&[u8]> {
        let view = self.views.get(view as usize)?;
        if view.buffer != 0 {
            return None;
        }
        self.data.get(view.range())
    }
}

// ============================================================================
// Component Set Conversion
// ============================================================================

/// Store every attribute and replace it with its buffer view reference
pub fn store_components<S>(
    set: &ComponentSet,
    store: &mut S,
) -> Result<ComponentRecord, CodecError>
where
    S: BufferStore + ?Sized,
{
    set.try_map(|section, name, attribute| {
        attribute
            .validate()
            .map_err(|err| CodecError::packing(section, name, err))?;
        let view = store.store(attribute)?;
        Ok(AttributeRef::new(view, attribute))
    })
}

/// Resolve every buffer view of a record back into attribute bytes
///
/// Byte lengths are checked against each declared layout.
pub fn resolve_components<R>(
    record: &ComponentRecord,
    resolver: &R,
) -> Result<ComponentSet, CodecError>
where
    R: BufferResolver + ?Sized,
{
    record.try_map(|section, name, reference| {
        let bytes = resolver
            .resolve(reference.buffer_view)
            .ok_or(CodecError::UnresolvedBufferView(reference.buffer_view))?;
        reference
            .to_attribute(bytes)
            .map_err(|err| CodecError::packing(section, name, err))
    })
}
