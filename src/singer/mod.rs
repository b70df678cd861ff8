//! Singer protocol: messages written to stdout, catalog and state documents.

pub mod catalog;
pub mod messages;
pub mod state;
pub mod writer;

pub use catalog::{Catalog, CatalogEntry};
pub use messages::Message;
pub use writer::MessageWriter;
