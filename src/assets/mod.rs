//! Asset catalog: directory index, decoding, font resolution and bounded caches.

pub(crate) mod cache;
pub(crate) mod color;
pub(crate) mod decode;
/// Font resolution and handles.
pub mod fonts;
/// The resource cache.
pub mod store;
