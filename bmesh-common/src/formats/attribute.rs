//! Attribute buffers and their buffer-view references

use crate::packing::{
    BufferTarget, ComponentType, Element, ElementShape, PackingError, byte_length, pack, unpack,
};
use serde::{Deserialize, Serialize};

/// Opaque handle assigned by a buffer store (glTF buffer view index)
pub type BufferViewIndex = u32;

/// Raw attribute buffer together with its element layout
///
/// Invariant (checked by [`Attribute::validate`]):
/// `data.len() == count * component_type.width() * shape.arity()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Packed little-endian element data
    pub data: Vec<u8>,
    /// Intended binding of the buffer view that will hold `data`
    pub target: BufferTarget,
    pub component_type: ComponentType,
    pub shape: ElementShape,
    /// Number of elements (not components)
    pub count: u32,
}

impl Attribute {
    /// Pack a slice of elements into a new attribute
    pub fn from_elements<E: Element>(values: &[E], target: BufferTarget) -> Self {
        Self {
            data: pack(values),
            target,
            component_type: E::COMPONENT,
            shape: E::SHAPE,
            count: values.len() as u32,
        }
    }

    /// Byte length implied by the declared layout and count
    pub fn expected_byte_length(&self) -> usize {
        byte_length(self.component_type, self.shape, self.count as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Check the byte length against the declared layout
    pub fn validate(&self) -> Result<(), PackingError> {
        let expected = self.expected_byte_length();
        if self.data.len() != expected {
            return Err(PackingError::LengthMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Unpack the elements, checking that the stored layout matches `E`
    pub fn read<E: Element>(&self) -> Result<Vec<E>, PackingError> {
        if self.component_type != E::COMPONENT || self.shape != E::SHAPE {
            return Err(PackingError::LayoutMismatch {
                expected_component: E::COMPONENT,
                expected_shape: E::SHAPE,
                actual_component: self.component_type,
                actual_shape: self.shape,
            });
        }
        unpack(&self.data, self.count as usize)
    }
}

/// Serialized form of an attribute once its bytes live in a buffer view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRef {
    pub buffer_view: BufferViewIndex,
    pub component_type: ComponentType,
    #[serde(rename = "type")]
    pub shape: ElementShape,
    pub count: u32,
}

impl AttributeRef {
    /// Describe `attribute` as stored in `buffer_view`
    pub fn new(buffer_view: BufferViewIndex, attribute: &Attribute) -> Self {
        Self {
            buffer_view,
            component_type: attribute.component_type,
            shape: attribute.shape,
            count: attribute.count,
        }
    }

    pub fn expected_byte_length(&self) -> usize {
        byte_length(self.component_type, self.shape, self.count as usize)
    }

    /// Rebuild an attribute from the bytes of its buffer view
    ///
    /// Fails with [`PackingError::LengthMismatch`] when the view holds a
    /// different number of bytes than the declared layout requires.
    pub fn to_attribute(&self, bytes: &[u8]) -> Result<Attribute, PackingError> {
        let expected = self.expected_byte_length();
        if bytes.len() != expected {
            return Err(PackingError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Attribute {
            data: bytes.to_vec(),
            target: BufferTarget::ArrayBuffer,
            component_type: self.component_type,
            shape: self.shape,
            count: self.count,
        })
    }
}
