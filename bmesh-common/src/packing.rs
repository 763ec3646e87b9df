//! Binary primitive packing
//!
//! Converts typed element slices to and from little-endian byte buffers:
//! - `u8`  → glTF `UNSIGNED_BYTE` (5121)
//! - `u32` → glTF `UNSIGNED_INT` (5125)
//! - `f32` → glTF `FLOAT` (5126)
//!
//! Elements are scalars or fixed-size tuples (`[T; 2]`, `[T; 3]`). Buffers are
//! tightly packed: no padding between elements.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Failure while packing or unpacking a buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackingError {
    /// Byte length does not match `count * arity * width`
    #[error("buffer length mismatch: expected {expected} bytes, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Buffer layout differs from the layout the reader asked for
    #[error(
        "layout mismatch: expected {expected_component} {expected_shape}, \
         found {actual_component} {actual_shape}"
    )]
    LayoutMismatch {
        expected_component: ComponentType,
        expected_shape: ElementShape,
        actual_component: ComponentType,
        actual_shape: ElementShape,
    },

    /// glTF component type code not supported by the codec
    #[error("unsupported component type code {0}")]
    UnknownComponentType(u32),

    /// glTF buffer view target code not supported by the codec
    #[error("unsupported buffer target code {0}")]
    UnknownTarget(u32),
}

// ============================================================================
// Component Types
// ============================================================================

/// Fixed-width component type of an attribute buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ComponentType {
    U8,
    U32,
    F32,
}

impl ComponentType {
    /// glTF / OpenGL enum value
    pub const fn gl_code(self) -> u32 {
        match self {
            ComponentType::U8 => 5121,
            ComponentType::U32 => 5125,
            ComponentType::F32 => 5126,
        }
    }

    pub const fn from_gl_code(code: u32) -> Option<Self> {
        match code {
            5121 => Some(ComponentType::U8),
            5125 => Some(ComponentType::U32),
            5126 => Some(ComponentType::F32),
            _ => None,
        }
    }

    /// Width of one component in bytes
    pub const fn width(self) -> usize {
        match self {
            ComponentType::U8 => 1,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = PackingError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_gl_code(code).ok_or(PackingError::UnknownComponentType(code))
    }
}

impl From<ComponentType> for u32 {
    fn from(value: ComponentType) -> Self {
        value.gl_code()
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentType::U8 => "u8",
            ComponentType::U32 => "u32",
            ComponentType::F32 => "f32",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Element Shapes
// ============================================================================

/// Number of components per element (glTF accessor `type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementShape {
    #[serde(rename = "SCALAR")]
    Scalar,
    #[serde(rename = "VEC2")]
    Vec2,
    #[serde(rename = "VEC3")]
    Vec3,
}

impl ElementShape {
    pub const fn arity(self) -> usize {
        match self {
            ElementShape::Scalar => 1,
            ElementShape::Vec2 => 2,
            ElementShape::Vec3 => 3,
        }
    }
}

impl fmt::Display for ElementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementShape::Scalar => "SCALAR",
            ElementShape::Vec2 => "VEC2",
            ElementShape::Vec3 => "VEC3",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Buffer Targets
// ============================================================================

/// Intended GPU binding of a buffer view (glTF `bufferView.target`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BufferTarget {
    /// `ARRAY_BUFFER` (34962)
    #[default]
    ArrayBuffer,
    /// `ELEMENT_ARRAY_BUFFER` (34963)
    ElementArrayBuffer,
}

impl BufferTarget {
    pub const fn gl_code(self) -> u32 {
        match self {
            BufferTarget::ArrayBuffer => 34962,
            BufferTarget::ElementArrayBuffer => 34963,
        }
    }
}

impl TryFrom<u32> for BufferTarget {
    type Error = PackingError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            34962 => Ok(BufferTarget::ArrayBuffer),
            34963 => Ok(BufferTarget::ElementArrayBuffer),
            other => Err(PackingError::UnknownTarget(other)),
        }
    }
}

impl From<BufferTarget> for u32 {
    fn from(value: BufferTarget) -> Self {
        value.gl_code()
    }
}

// ============================================================================
// Elements
// ============================================================================

/// A value that can be written to / read from a component buffer
pub trait Element: Copy {
    const COMPONENT: ComponentType;
    const SHAPE: ElementShape;
    /// Encoded size in bytes
    const SIZE: usize = Self::COMPONENT.width() * Self::SHAPE.arity();

    fn write_le(&self, out: &mut Vec<u8>);

    /// Read one element from exactly `Self::SIZE` bytes
    fn read_le(bytes: &[u8]) -> Self;
}

/// Single-component element (`u8`, `u32`, `f32`)
pub trait Scalar: Element {}

macro_rules! scalar_element {
    ($ty:ty, $component:expr) => {
        impl Element for $ty {
            const COMPONENT: ComponentType = $component;
            const SHAPE: ElementShape = ElementShape::Scalar;

            #[inline]
            fn write_le(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                <$ty>::from_le_bytes(raw)
            }
        }

        impl Scalar for $ty {}
    };
}

scalar_element!(u8, ComponentType::U8);
scalar_element!(u32, ComponentType::U32);
scalar_element!(f32, ComponentType::F32);

macro_rules! tuple_element {
    ($n:literal, $shape:expr) => {
        impl<T: Scalar> Element for [T; $n] {
            const COMPONENT: ComponentType = T::COMPONENT;
            const SHAPE: ElementShape = $shape;

            #[inline]
            fn write_le(&self, out: &mut Vec<u8>) {
                for value in self {
                    value.write_le(out);
                }
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let width = T::COMPONENT.width();
                std::array::from_fn(|i| T::read_le(&bytes[i * width..(i + 1) * width]))
            }
        }
    };
}

tuple_element!(2, ElementShape::Vec2);
tuple_element!(3, ElementShape::Vec3);

// ============================================================================
// Pack / Unpack
// ============================================================================

/// Expected byte length of `count` elements of the given layout
#[inline]
pub const fn byte_length(component: ComponentType, shape: ElementShape, count: usize) -> usize {
    count
        .saturating_mul(shape.arity())
        .saturating_mul(component.width())
}

/// Pack elements into a little-endian byte buffer
pub fn pack<E: Element>(values: &[E]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * E::SIZE);
    for value in values {
        value.write_le(&mut out);
    }
    out
}

/// Unpack exactly `count` elements from a little-endian byte buffer
///
/// Fails with [`PackingError::LengthMismatch`] when the buffer holds more or
/// fewer bytes than `count` elements need.
pub fn unpack<E: Element>(bytes: &[u8], count: usize) -> Result<Vec<E>, PackingError> {
    let expected = byte_length(E::COMPONENT, E::SHAPE, count);
    if bytes.len() != expected {
        return Err(PackingError::LengthMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bytes.chunks_exact(E::SIZE).map(E::read_le).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_sizes() {
        assert_eq!(<u8 as Element>::SIZE, 1);
        assert_eq!(<u32 as Element>::SIZE, 4);
        assert_eq!(<[u32; 2] as Element>::SIZE, 8);
        assert_eq!(<[f32; 2] as Element>::SIZE, 8);
        assert_eq!(<[f32; 3] as Element>::SIZE, 12);
    }

    #[test]
    fn test_pack_is_little_endian() {
        let bytes = pack(&[0x0403_0201u32]);
        assert_eq!(bytes, vec![0x01, 0x02, 0x03, 0x04]);

        let bytes = pack(&[1.0f32]);
        assert_eq!(bytes, 1.0f32.to_le_bytes().to_vec());
    }

    #[test]
    fn test_pack_vec3_has_no_padding() {
        let bytes = pack(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[12..16], &4.0f32.to_le_bytes());
    }

    #[test]
    fn test_unpack_vec2_u32() {
        let pairs = [[0u32, 1], [1, 2], [7, 9]];
        let bytes = pack(&pairs);
        let decoded: Vec<[u32; 2]> = unpack(&bytes, 3).unwrap();
        assert_eq!(decoded, pairs);
    }

    #[test]
    fn test_unpack_rejects_short_buffer() {
        // 4 declared positions, only 3 present
        let bytes = pack(&[[0.0f32; 3]; 3]);
        let err = unpack::<[f32; 3]>(&bytes, 4).unwrap_err();
        assert_eq!(
            err,
            PackingError::LengthMismatch {
                expected: 48,
                actual: 36
            }
        );
    }

    #[test]
    fn test_unpack_rejects_trailing_bytes() {
        let mut bytes = pack(&[1u32, 2]);
        bytes.push(0);
        assert!(unpack::<u32>(&bytes, 2).is_err());
    }

    #[test]
    fn test_unpack_empty() {
        let values: Vec<u8> = unpack(&[], 0).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_component_type_codes() {
        assert_eq!(ComponentType::from_gl_code(5121), Some(ComponentType::U8));
        assert_eq!(ComponentType::from_gl_code(5125), Some(ComponentType::U32));
        assert_eq!(ComponentType::from_gl_code(5126), Some(ComponentType::F32));
        assert_eq!(ComponentType::from_gl_code(5123), None);
        assert_eq!(
            ComponentType::try_from(5120),
            Err(PackingError::UnknownComponentType(5120))
        );
    }

    #[test]
    fn test_byte_length() {
        assert_eq!(byte_length(ComponentType::F32, ElementShape::Vec3, 8), 96);
        assert_eq!(byte_length(ComponentType::U8, ElementShape::Scalar, 5), 5);
        assert_eq!(byte_length(ComponentType::U32, ElementShape::Vec2, 0), 0);
    }
}
