//! facegif-media — Files in and out of a FaceGIF session.
//!
//! Upload intake from the local filesystem, the embedded demo target
//! catalog used as the search provider, and result export.

pub mod catalog;
pub mod export;
pub mod intake;

pub use catalog::{Catalog, CatalogError, CatalogSearch};
pub use export::{ExportError, ExportReceipt, ExportSource, Exporter};
