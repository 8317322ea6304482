//! Store add-ons.

mod client;
mod model;

pub use client::{API_VERSION_HEADER, HttpStoreClient, STORE_API_VERSION, StoreClient, StoreClientConfig};
pub use model::{AddOn, OperationType};
