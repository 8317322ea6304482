//! Descriptor-driven packing of VHD structures.

use super::descriptor::{VhdEncoding, VhdEntity, VhdPropertyAttribute, VhdValue};
use crate::error::MgmtError;

/// Packs and unpacks any [`VhdEntity`] using only its field table.
#[derive(Debug, Clone, Copy, Default)]
pub struct VhdSerializer;

impl VhdSerializer {
    /// Pack `entity` into a buffer of `T::SIZE` bytes.
    ///
    /// Bytes not covered by any field are zero.
    pub fn serialize<T: VhdEntity>(entity: &T) -> Result<Vec<u8>, MgmtError> {
        let mut buffer = vec![0u8; T::SIZE];
        for property in T::descriptor().properties() {
            let value = (property.getter)(entity);
            Self::write_value(&mut buffer, &property.attribute, &value)?;
        }
        Ok(buffer)
    }

    /// Unpack a `T` from exactly `T::SIZE` bytes.
    pub fn deserialize<T: VhdEntity>(bytes: &[u8]) -> Result<T, MgmtError> {
        if bytes.len() != T::SIZE {
            return Err(MgmtError::vhd_format(
                std::any::type_name::<T>(),
                format!("expected {} bytes, got {}", T::SIZE, bytes.len()),
            ));
        }

        let mut entity = T::default();
        for property in T::descriptor().properties() {
            let value = Self::read_value(bytes, &property.attribute)?;
            (property.setter)(&mut entity, value)?;
        }
        Ok(entity)
    }

    /// Write one field into `buffer`.
    pub fn write_value(
        buffer: &mut [u8],
        attribute: &VhdPropertyAttribute,
        value: &VhdValue,
    ) -> Result<(), MgmtError> {
        let target = field_range_mut(buffer, attribute)?;
        match (attribute.encoding, value) {
            (VhdEncoding::U8, VhdValue::U8(v)) => target.copy_from_slice(&[*v]),
            (VhdEncoding::U16, VhdValue::U16(v)) => target.copy_from_slice(&v.to_be_bytes()),
            (VhdEncoding::U32, VhdValue::U32(v)) => target.copy_from_slice(&v.to_be_bytes()),
            (VhdEncoding::U64, VhdValue::U64(v)) => target.copy_from_slice(&v.to_be_bytes()),
            (VhdEncoding::Bytes, VhdValue::Bytes(v)) if v.len() == attribute.size => {
                target.copy_from_slice(v);
            }
            (VhdEncoding::Bytes, VhdValue::Bytes(v)) => {
                return Err(MgmtError::vhd_format(
                    attribute.name,
                    format!("expected {} bytes, got {}", attribute.size, v.len()),
                ));
            }
            (encoding, value) => {
                return Err(MgmtError::vhd_format(
                    attribute.name,
                    format!("cannot write {:?} value as {encoding:?}", value.encoding()),
                ));
            }
        }
        Ok(())
    }

    /// Read one field out of `bytes`.
    pub fn read_value(bytes: &[u8], attribute: &VhdPropertyAttribute) -> Result<VhdValue, MgmtError> {
        let source = field_range(bytes, attribute)?;
        let width_error =
            || MgmtError::vhd_format(attribute.name, format!("bad width {}", attribute.size));
        Ok(match attribute.encoding {
            VhdEncoding::U8 => VhdValue::U8(source[0]),
            VhdEncoding::U16 => {
                VhdValue::U16(u16::from_be_bytes(source.try_into().map_err(|_| width_error())?))
            }
            VhdEncoding::U32 => {
                VhdValue::U32(u32::from_be_bytes(source.try_into().map_err(|_| width_error())?))
            }
            VhdEncoding::U64 => {
                VhdValue::U64(u64::from_be_bytes(source.try_into().map_err(|_| width_error())?))
            }
            VhdEncoding::Bytes => VhdValue::Bytes(source.to_vec()),
        })
    }
}

fn check_range(len: usize, attribute: &VhdPropertyAttribute) -> Result<(), MgmtError> {
    if attribute.size == 0 || attribute.end() > len {
        return Err(MgmtError::vhd_format(
            attribute.name,
            format!(
                "range {}..{} outside {len}-byte buffer",
                attribute.offset,
                attribute.end()
            ),
        ));
    }
    if let Some(width) = attribute.encoding.width().filter(|w| *w != attribute.size) {
        return Err(MgmtError::vhd_format(
            attribute.name,
            format!(
                "{:?} field declared {} bytes wide, encoding needs {width}",
                attribute.encoding, attribute.size
            ),
        ));
    }
    Ok(())
}

fn field_range<'a>(bytes: &'a [u8], attribute: &VhdPropertyAttribute) -> Result<&'a [u8], MgmtError> {
    check_range(bytes.len(), attribute)?;
    Ok(&bytes[attribute.offset..attribute.end()])
}

fn field_range_mut<'a>(
    bytes: &'a mut [u8],
    attribute: &VhdPropertyAttribute,
) -> Result<&'a mut [u8], MgmtError> {
    check_range(bytes.len(), attribute)?;
    Ok(&mut bytes[attribute.offset..attribute.end()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_big_endian() {
        let mut buffer = [0u8; 8];
        let attribute = VhdPropertyAttribute::u32("features", 2);
        VhdSerializer::write_value(&mut buffer, &attribute, &VhdValue::U32(0x0102_0304)).unwrap();
        assert_eq!(buffer, [0, 0, 1, 2, 3, 4, 0, 0]);
        assert_eq!(
            VhdSerializer::read_value(&buffer, &attribute).unwrap(),
            VhdValue::U32(0x0102_0304)
        );
    }

    #[test]
    fn test_write_rejects_wrong_value_kind() {
        let mut buffer = [0u8; 8];
        let attribute = VhdPropertyAttribute::u64("size", 0);
        let err = VhdSerializer::write_value(&mut buffer, &attribute, &VhdValue::U32(1)).unwrap_err();
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn test_write_rejects_short_bytes() {
        let mut buffer = [0u8; 8];
        let attribute = VhdPropertyAttribute::bytes("cookie", 0, 8);
        let err = VhdSerializer::write_value(&mut buffer, &attribute, &VhdValue::Bytes(b"abc".to_vec()))
            .unwrap_err();
        assert!(err.to_string().contains("expected 8 bytes, got 3"));
    }

    #[test]
    fn test_mis_declared_width_is_format_error() {
        let mut buffer = [0u8; 8];
        let mut attribute = VhdPropertyAttribute::u16("version", 0);
        attribute.size = 3;

        let err = VhdSerializer::write_value(&mut buffer, &attribute, &VhdValue::U16(1)).unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::InvalidData);
        assert!(err.to_string().contains("declared 3 bytes wide, encoding needs 2"));
        assert_eq!(buffer, [0u8; 8]);

        let mut byte = VhdPropertyAttribute::u8("flag", 0);
        byte.size = 2;
        assert!(VhdSerializer::read_value(&buffer, &byte).is_err());
    }

    #[test]
    fn test_read_rejects_out_of_range() {
        let attribute = VhdPropertyAttribute::u32("checksum", 6);
        assert!(VhdSerializer::read_value(&[0u8; 8], &attribute).is_err());
    }
}
