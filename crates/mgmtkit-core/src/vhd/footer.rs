//! The 512-byte VHD footer.

use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use super::descriptor::{
    VhdEntity, VhdEntityDescriptor, VhdPropertyAttribute as Attr, VhdPropertyDescriptor, VhdValue,
};
use super::serializer::VhdSerializer;
use crate::error::MgmtError;

/// Size of the footer on disk.
pub const FOOTER_SIZE: usize = 512;

/// The footer cookie.
pub const VHD_COOKIE: [u8; 8] = *b"conectix";

/// Feature flags: the reserved bit is always set.
pub const FEATURES_RESERVED: u32 = 0x0000_0002;

/// File format version 1.0.
pub const FILE_FORMAT_VERSION: u32 = 0x0001_0000;

/// Data offset of a fixed disk, which has no dynamic header.
pub const FIXED_DATA_OFFSET: u64 = u64::MAX;

/// Creator host OS: Windows (`Wi2k`).
pub const HOST_OS_WINDOWS: u32 = 0x5769_326B;

/// Creator application tag written by this crate.
pub const CREATOR_APPLICATION: [u8; 4] = *b"mgkt";

/// Creator version written by this crate.
pub const CREATOR_VERSION: u32 = 0x0000_0004;

/// Unix time of the VHD epoch, 2000-01-01T00:00:00Z.
pub const VHD_EPOCH_UNIX: i64 = 946_684_800;

const CHECKSUM_RANGE: std::ops::Range<usize> = 64..68;
const RESERVED_SIZE: usize = 427;
const SECTOR_SIZE: u64 = 512;

/// The kind of virtual disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiskType {
    /// No disk.
    #[default]
    None,
    /// Fixed-size disk: data followed by the footer.
    Fixed,
    /// Dynamically expanding disk.
    Dynamic,
    /// Differencing disk.
    Differencing,
}

impl DiskType {
    /// The on-disk code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Fixed => 2,
            Self::Dynamic => 3,
            Self::Differencing => 4,
        }
    }
}

impl TryFrom<u32> for DiskType {
    type Error = MgmtError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            2 => Ok(Self::Fixed),
            3 => Ok(Self::Dynamic),
            4 => Ok(Self::Differencing),
            other => Err(MgmtError::vhd_format(
                "disk_type",
                format!("unknown disk type {other}"),
            )),
        }
    }
}

/// Cylinder/head/sector geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskGeometry {
    /// Cylinder count.
    pub cylinders: u16,
    /// Heads per cylinder.
    pub heads: u8,
    /// Sectors per track.
    pub sectors_per_track: u8,
}

impl DiskGeometry {
    /// Compute the geometry for a disk of `size` bytes, using the standard
    /// VHD algorithm (capped at 65535 x 16 x 255 sectors).
    #[must_use]
    pub fn for_size(size: u64) -> Self {
        let mut total_sectors = size / SECTOR_SIZE;
        total_sectors = total_sectors.min(65_535 * 16 * 255);

        let (sectors_per_track, heads, cylinder_times_heads) =
            if total_sectors >= 65_535 * 16 * 63 {
                (255, 16, total_sectors / 255)
            } else {
                let mut spt = 17;
                let mut cth = total_sectors / spt;
                let mut heads = cth.div_ceil(1024).max(4);

                if cth >= heads * 1024 || heads > 16 {
                    spt = 31;
                    heads = 16;
                    cth = total_sectors / spt;
                }
                if cth >= heads * 1024 {
                    spt = 63;
                    heads = 16;
                    cth = total_sectors / spt;
                }
                (spt, heads, cth)
            };

        Self {
            cylinders: (cylinder_times_heads / heads) as u16,
            heads: heads as u8,
            sectors_per_track: sectors_per_track as u8,
        }
    }

    /// Pack as stored: cylinders in the high 16 bits, then heads, then sectors.
    #[must_use]
    pub const fn pack(self) -> u32 {
        ((self.cylinders as u32) << 16) | ((self.heads as u32) << 8) | self.sectors_per_track as u32
    }

    /// Unpack a stored geometry.
    #[must_use]
    pub const fn unpack(value: u32) -> Self {
        Self {
            cylinders: (value >> 16) as u16,
            heads: (value >> 8) as u8,
            sectors_per_track: value as u8,
        }
    }
}

/// The VHD footer, the last 512 bytes of every VHD file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VhdFooter {
    /// Always `conectix` in a valid footer.
    pub cookie: [u8; 8],
    /// Feature flags.
    pub features: u32,
    /// File format version.
    pub file_format_version: u32,
    /// Offset of the dynamic header, or all ones for fixed disks.
    pub data_offset: u64,
    /// Seconds since 2000-01-01T00:00:00Z.
    pub time_stamp: u32,
    /// Tag of the application that created the image.
    pub creator_application: [u8; 4],
    /// Version of that application.
    pub creator_version: u32,
    /// Host OS the image was created on.
    pub creator_host_os: u32,
    /// Size at creation, in bytes.
    pub original_size: u64,
    /// Current size, in bytes.
    pub current_size: u64,
    /// CHS geometry.
    pub disk_geometry: DiskGeometry,
    /// Kind of disk.
    pub disk_type: DiskType,
    /// One's complement of the byte sum of the footer without this field.
    pub checksum: u32,
    /// Identifier of the image.
    pub unique_id: Uuid,
    /// Whether the image is in a saved state.
    pub saved_state: bool,
    /// Reserved, 427 bytes.
    pub reserved: Vec<u8>,
}

impl Default for VhdFooter {
    fn default() -> Self {
        Self {
            cookie: VHD_COOKIE,
            features: FEATURES_RESERVED,
            file_format_version: FILE_FORMAT_VERSION,
            data_offset: FIXED_DATA_OFFSET,
            time_stamp: 0,
            creator_application: CREATOR_APPLICATION,
            creator_version: CREATOR_VERSION,
            creator_host_os: HOST_OS_WINDOWS,
            original_size: 0,
            current_size: 0,
            disk_geometry: DiskGeometry::default(),
            disk_type: DiskType::None,
            checksum: 0,
            unique_id: Uuid::nil(),
            saved_state: false,
            reserved: vec![0; RESERVED_SIZE],
        }
    }
}

impl VhdFooter {
    /// Build the footer of a fixed disk holding `size` bytes of data.
    ///
    /// `size` must be a whole number of 512-byte sectors.
    pub fn fixed(size: u64, created: DateTime<Utc>, unique_id: Uuid) -> Result<Self, MgmtError> {
        if size == 0 || size % SECTOR_SIZE != 0 {
            return Err(MgmtError::vhd_format(
                "current_size",
                format!("{size} is not a positive multiple of {SECTOR_SIZE}"),
            ));
        }

        let mut footer = Self {
            time_stamp: vhd_timestamp(created)?,
            original_size: size,
            current_size: size,
            disk_geometry: DiskGeometry::for_size(size),
            disk_type: DiskType::Fixed,
            unique_id,
            ..Self::default()
        };
        footer.checksum = footer.compute_checksum()?;
        Ok(footer)
    }

    /// Creation time, decoded from the timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(VHD_EPOCH_UNIX + i64::from(self.time_stamp), 0)
            .single()
    }

    /// The checksum the current field values call for.
    pub fn compute_checksum(&self) -> Result<u32, MgmtError> {
        Ok(checksum_of(&VhdSerializer::serialize(self)?))
    }

    /// Pack into 512 bytes, with a freshly computed checksum.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MgmtError> {
        let mut bytes = VhdSerializer::serialize(self)?;
        let checksum = checksum_of(&bytes);
        bytes[CHECKSUM_RANGE].copy_from_slice(&checksum.to_be_bytes());
        Ok(bytes)
    }

    /// Unpack 512 bytes, verifying cookie and checksum.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MgmtError> {
        let footer: Self = VhdSerializer::deserialize(bytes)?;
        if footer.cookie != VHD_COOKIE {
            return Err(MgmtError::vhd_format(
                "cookie",
                format!("expected \"conectix\", got {:?}", String::from_utf8_lossy(&footer.cookie)),
            ));
        }
        let expected = checksum_of(bytes);
        if footer.checksum != expected {
            return Err(MgmtError::vhd_format(
                "checksum",
                format!("stored {:#010x}, computed {expected:#010x}", footer.checksum),
            ));
        }
        Ok(footer)
    }
}

fn vhd_timestamp(time: DateTime<Utc>) -> Result<u32, MgmtError> {
    u32::try_from(time.timestamp() - VHD_EPOCH_UNIX)
        .map_err(|_| MgmtError::vhd_format("time_stamp", format!("{time} is outside the VHD epoch")))
}

fn checksum_of(bytes: &[u8]) -> u32 {
    let sum = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| !CHECKSUM_RANGE.contains(i))
        .fold(0u32, |acc, (_, b)| acc.wrapping_add(u32::from(*b)));
    !sum
}

impl VhdEntity for VhdFooter {
    const SIZE: usize = FOOTER_SIZE;

    fn descriptor() -> &'static VhdEntityDescriptor<Self> {
        static DESCRIPTOR: OnceLock<VhdEntityDescriptor<VhdFooter>> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| VhdEntityDescriptor::new(footer_properties()))
    }
}

type Prop = VhdPropertyDescriptor<VhdFooter>;

fn footer_properties() -> Vec<Prop> {
    vec![
        Prop::new(
            Attr::bytes("cookie", 0, 8),
            |f: &VhdFooter| VhdValue::Bytes(f.cookie.to_vec()),
            |f: &mut VhdFooter, v| {
                f.cookie = v.into_array("cookie")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u32("features", 8),
            |f: &VhdFooter| VhdValue::U32(f.features),
            |f: &mut VhdFooter, v| {
                f.features = v.into_u32("features")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u32("file_format_version", 12),
            |f: &VhdFooter| VhdValue::U32(f.file_format_version),
            |f: &mut VhdFooter, v| {
                f.file_format_version = v.into_u32("file_format_version")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u64("data_offset", 16),
            |f: &VhdFooter| VhdValue::U64(f.data_offset),
            |f: &mut VhdFooter, v| {
                f.data_offset = v.into_u64("data_offset")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u32("time_stamp", 24),
            |f: &VhdFooter| VhdValue::U32(f.time_stamp),
            |f: &mut VhdFooter, v| {
                f.time_stamp = v.into_u32("time_stamp")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::bytes("creator_application", 28, 4),
            |f: &VhdFooter| VhdValue::Bytes(f.creator_application.to_vec()),
            |f: &mut VhdFooter, v| {
                f.creator_application = v.into_array("creator_application")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u32("creator_version", 32),
            |f: &VhdFooter| VhdValue::U32(f.creator_version),
            |f: &mut VhdFooter, v| {
                f.creator_version = v.into_u32("creator_version")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u32("creator_host_os", 36),
            |f: &VhdFooter| VhdValue::U32(f.creator_host_os),
            |f: &mut VhdFooter, v| {
                f.creator_host_os = v.into_u32("creator_host_os")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u64("original_size", 40),
            |f: &VhdFooter| VhdValue::U64(f.original_size),
            |f: &mut VhdFooter, v| {
                f.original_size = v.into_u64("original_size")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u64("current_size", 48),
            |f: &VhdFooter| VhdValue::U64(f.current_size),
            |f: &mut VhdFooter, v| {
                f.current_size = v.into_u64("current_size")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u32("disk_geometry", 56),
            |f: &VhdFooter| VhdValue::U32(f.disk_geometry.pack()),
            |f: &mut VhdFooter, v| {
                f.disk_geometry = DiskGeometry::unpack(v.into_u32("disk_geometry")?);
                Ok(())
            },
        ),
        Prop::new(
            Attr::u32("disk_type", 60),
            |f: &VhdFooter| VhdValue::U32(f.disk_type.code()),
            |f: &mut VhdFooter, v| {
                f.disk_type = DiskType::try_from(v.into_u32("disk_type")?)?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::u32("checksum", 64),
            |f: &VhdFooter| VhdValue::U32(f.checksum),
            |f: &mut VhdFooter, v| {
                f.checksum = v.into_u32("checksum")?;
                Ok(())
            },
        ),
        Prop::new(
            Attr::bytes("unique_id", 68, 16),
            |f: &VhdFooter| VhdValue::Bytes(f.unique_id.as_bytes().to_vec()),
            |f: &mut VhdFooter, v| {
                f.unique_id = Uuid::from_bytes(v.into_array("unique_id")?);
                Ok(())
            },
        ),
        Prop::new(
            Attr::u8("saved_state", 84),
            |f: &VhdFooter| VhdValue::U8(u8::from(f.saved_state)),
            |f: &mut VhdFooter, v| {
                f.saved_state = v.into_u8("saved_state")? != 0;
                Ok(())
            },
        ),
        Prop::new(
            Attr::bytes("reserved", 85, RESERVED_SIZE),
            |f: &VhdFooter| VhdValue::Bytes(f.reserved.clone()),
            |f: &mut VhdFooter, v| {
                f.reserved = v.into_bytes("reserved")?;
                Ok(())
            },
        ),
    ]
}
