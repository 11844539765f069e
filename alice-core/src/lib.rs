//! # Alice Core
//!
//! The trust-boundary pieces of the canvas bridge that need neither a GPU
//! nor a wasm engine: the bounds-checked view over module memory, the handle
//! table, the wire record codec and the error taxonomy.

pub mod codec;
pub mod error;
pub mod formats;
pub mod handles;
pub mod memory;
pub mod rect;

pub use error::{BridgeError, ProtocolError};
pub use handles::{Handle, HandleTable, ResourceKind, Tagged};
pub use memory::LinearMemory;
pub use rect::Rect;
