//! VHD on-disk structures.
//!
//! Structures are described by static field tables rather than discovered at
//! runtime: each type implements [`VhdEntity`] and lists its fields as
//! [`VhdPropertyDescriptor`]s. [`VhdSerializer`] packs and unpacks any such
//! type from the table alone. [`VhdFooter`] is the one structure shipped here.

mod descriptor;
mod footer;
mod serializer;

pub use descriptor::{
    VhdEncoding, VhdEntity, VhdEntityDescriptor, VhdGetter, VhdPropertyAttribute,
    VhdPropertyDescriptor, VhdSetter, VhdValue,
};
pub use footer::{
    CREATOR_APPLICATION, CREATOR_VERSION, DiskGeometry, DiskType, FEATURES_RESERVED,
    FILE_FORMAT_VERSION, FIXED_DATA_OFFSET, FOOTER_SIZE, HOST_OS_WINDOWS, VHD_COOKIE,
    VHD_EPOCH_UNIX, VhdFooter,
};
pub use serializer::VhdSerializer;
