//! Static field-layout tables for VHD structures.
//!
//! Each on-disk structure declares one [`VhdPropertyDescriptor`] per field:
//! where the field lives, how wide it is, how it is encoded, and a getter
//! and setter pair. The table for a type is built once and cached, see
//! [`VhdEntity::descriptor`].

use std::fmt;

use crate::error::MgmtError;

/// How a field is laid out on disk. Integers are big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VhdEncoding {
    /// One byte.
    U8,
    /// Two-byte big-endian integer.
    U16,
    /// Four-byte big-endian integer.
    U32,
    /// Eight-byte big-endian integer.
    U64,
    /// Raw bytes of the declared size.
    Bytes,
}

impl VhdEncoding {
    /// The fixed width of an integer encoding.
    #[must_use]
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::U8 => Some(1),
            Self::U16 => Some(2),
            Self::U32 => Some(4),
            Self::U64 => Some(8),
            Self::Bytes => None,
        }
    }
}

/// A field value moving between a structure and its byte image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VhdValue {
    /// One byte.
    U8(u8),
    /// 16-bit integer.
    U16(u16),
    /// 32-bit integer.
    U32(u32),
    /// 64-bit integer.
    U64(u64),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl VhdValue {
    /// The encoding this value is written with.
    #[must_use]
    pub const fn encoding(&self) -> VhdEncoding {
        match self {
            Self::U8(_) => VhdEncoding::U8,
            Self::U16(_) => VhdEncoding::U16,
            Self::U32(_) => VhdEncoding::U32,
            Self::U64(_) => VhdEncoding::U64,
            Self::Bytes(_) => VhdEncoding::Bytes,
        }
    }

    fn mismatch(&self, field: &str, wanted: VhdEncoding) -> MgmtError {
        MgmtError::vhd_format(
            field,
            format!("expected {wanted:?} value, got {:?}", self.encoding()),
        )
    }

    /// Unwrap a `U8` value.
    pub fn into_u8(self, field: &str) -> Result<u8, MgmtError> {
        match self {
            Self::U8(v) => Ok(v),
            other => Err(other.mismatch(field, VhdEncoding::U8)),
        }
    }

    /// Unwrap a `U16` value.
    pub fn into_u16(self, field: &str) -> Result<u16, MgmtError> {
        match self {
            Self::U16(v) => Ok(v),
            other => Err(other.mismatch(field, VhdEncoding::U16)),
        }
    }

    /// Unwrap a `U32` value.
    pub fn into_u32(self, field: &str) -> Result<u32, MgmtError> {
        match self {
            Self::U32(v) => Ok(v),
            other => Err(other.mismatch(field, VhdEncoding::U32)),
        }
    }

    /// Unwrap a `U64` value.
    pub fn into_u64(self, field: &str) -> Result<u64, MgmtError> {
        match self {
            Self::U64(v) => Ok(v),
            other => Err(other.mismatch(field, VhdEncoding::U64)),
        }
    }

    /// Unwrap a `Bytes` value.
    pub fn into_bytes(self, field: &str) -> Result<Vec<u8>, MgmtError> {
        match self {
            Self::Bytes(v) => Ok(v),
            other => Err(other.mismatch(field, VhdEncoding::Bytes)),
        }
    }

    /// Unwrap a `Bytes` value of exactly `N` bytes.
    pub fn into_array<const N: usize>(self, field: &str) -> Result<[u8; N], MgmtError> {
        let bytes = self.into_bytes(field)?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| MgmtError::vhd_format(field, format!("expected {N} bytes, got {len}")))
    }
}

/// Where and how one field is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VhdPropertyAttribute {
    /// Field name, for diagnostics.
    pub name: &'static str,
    /// Byte offset from the start of the structure.
    pub offset: usize,
    /// Size in bytes.
    pub size: usize,
    /// On-disk encoding.
    pub encoding: VhdEncoding,
}

impl VhdPropertyAttribute {
    /// A one-byte field.
    #[must_use]
    pub const fn u8(name: &'static str, offset: usize) -> Self {
        Self::integer(name, offset, VhdEncoding::U8, 1)
    }

    /// A big-endian 16-bit field.
    #[must_use]
    pub const fn u16(name: &'static str, offset: usize) -> Self {
        Self::integer(name, offset, VhdEncoding::U16, 2)
    }

    /// A big-endian 32-bit field.
    #[must_use]
    pub const fn u32(name: &'static str, offset: usize) -> Self {
        Self::integer(name, offset, VhdEncoding::U32, 4)
    }

    /// A big-endian 64-bit field.
    #[must_use]
    pub const fn u64(name: &'static str, offset: usize) -> Self {
        Self::integer(name, offset, VhdEncoding::U64, 8)
    }

    /// A raw byte range.
    #[must_use]
    pub const fn bytes(name: &'static str, offset: usize, size: usize) -> Self {
        Self {
            name,
            offset,
            size,
            encoding: VhdEncoding::Bytes,
        }
    }

    const fn integer(name: &'static str, offset: usize, encoding: VhdEncoding, size: usize) -> Self {
        Self {
            name,
            offset,
            size,
            encoding,
        }
    }

    /// One past the last byte of the field.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Reads a field out of a structure.
pub type VhdGetter<T> = fn(&T) -> VhdValue;

/// Writes a field into a structure.
pub type VhdSetter<T> = fn(&mut T, VhdValue) -> Result<(), MgmtError>;

/// One field of `T`: its layout plus accessor pair.
pub struct VhdPropertyDescriptor<T> {
    /// Layout of the field.
    pub attribute: VhdPropertyAttribute,
    /// Reads the field.
    pub getter: VhdGetter<T>,
    /// Writes the field.
    pub setter: VhdSetter<T>,
}

impl<T> VhdPropertyDescriptor<T> {
    /// Describe a field.
    #[must_use]
    pub const fn new(
        attribute: VhdPropertyAttribute,
        getter: VhdGetter<T>,
        setter: VhdSetter<T>,
    ) -> Self {
        Self {
            attribute,
            getter,
            setter,
        }
    }
}

impl<T> Clone for VhdPropertyDescriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for VhdPropertyDescriptor<T> {}

impl<T> fmt::Debug for VhdPropertyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VhdPropertyDescriptor")
            .field("attribute", &self.attribute)
            .finish_non_exhaustive()
    }
}

/// The ordered field table for `T`.
///
/// Properties are kept sorted by offset whatever order they were declared in.
pub struct VhdEntityDescriptor<T> {
    properties: Vec<VhdPropertyDescriptor<T>>,
}

impl<T> VhdEntityDescriptor<T> {
    /// Build a table, ordering properties by offset.
    #[must_use]
    pub fn new(mut properties: Vec<VhdPropertyDescriptor<T>>) -> Self {
        properties.sort_by_key(|p| p.attribute.offset);
        Self { properties }
    }

    /// The properties, by ascending offset.
    #[must_use]
    pub fn properties(&self) -> &[VhdPropertyDescriptor<T>] {
        &self.properties
    }

    /// Find a property by field name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VhdPropertyDescriptor<T>> {
        self.properties.iter().find(|p| p.attribute.name == name)
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Check that every field fits in `size` bytes, integer fields have
    /// their natural width, and no two fields overlap.
    pub fn validate(&self, size: usize) -> Result<(), MgmtError> {
        let mut previous: Option<&VhdPropertyAttribute> = None;
        for attribute in self.properties.iter().map(|p| &p.attribute) {
            if let Some(width) = attribute.encoding.width() {
                if width != attribute.size {
                    return Err(MgmtError::vhd_format(
                        attribute.name,
                        format!(
                            "{:?} field must be {width} bytes, declared {}",
                            attribute.encoding, attribute.size
                        ),
                    ));
                }
            }
            if attribute.end() > size {
                return Err(MgmtError::vhd_format(
                    attribute.name,
                    format!("ends at byte {} past structure size {size}", attribute.end()),
                ));
            }
            if let Some(prev) = previous {
                if prev.end() > attribute.offset {
                    return Err(MgmtError::vhd_format(
                        attribute.name,
                        format!("overlaps '{}' at byte {}", prev.name, attribute.offset),
                    ));
                }
            }
            previous = Some(attribute);
        }
        Ok(())
    }
}

impl<T> fmt::Debug for VhdEntityDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.properties.iter().map(|p| p.attribute))
            .finish()
    }
}

/// A fixed-size on-disk structure described by a static field table.
///
/// Implementations cache the table in a `static` [`std::sync::OnceLock`],
/// so it is built on first use and shared afterwards:
///
/// ```rust
/// use std::sync::OnceLock;
/// use mgmtkit_core::vhd::{
///     VhdEntity, VhdEntityDescriptor, VhdPropertyAttribute, VhdPropertyDescriptor, VhdValue,
/// };
///
/// #[derive(Default)]
/// struct Header {
///     version: u32,
/// }
///
/// impl VhdEntity for Header {
///     const SIZE: usize = 4;
///
///     fn descriptor() -> &'static VhdEntityDescriptor<Self> {
///         static DESCRIPTOR: OnceLock<VhdEntityDescriptor<Header>> = OnceLock::new();
///         DESCRIPTOR.get_or_init(|| {
///             VhdEntityDescriptor::new(vec![VhdPropertyDescriptor::new(
///                 VhdPropertyAttribute::u32("version", 0),
///                 |h: &Header| VhdValue::U32(h.version),
///                 |h: &mut Header, v| {
///                     h.version = v.into_u32("version")?;
///                     Ok(())
///                 },
///             )])
///         })
///     }
/// }
///
/// assert_eq!(Header::descriptor().len(), 1);
/// ```
pub trait VhdEntity: Default + Sized + 'static {
    /// Size of the structure on disk, in bytes.
    const SIZE: usize;

    /// The cached field table.
    fn descriptor() -> &'static VhdEntityDescriptor<Self>;
}
