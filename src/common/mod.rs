//! Miscellaneous common structs used throughout the library.

mod content_id;
mod id;
pub mod messages;
mod peer;
mod record;

pub use content_id::*;
pub use id::*;
pub use messages::*;
pub use peer::*;
pub use record::*;
