#![doc = include_str!("../README.md")]

// Public modules
pub mod collaborators;
mod common;
pub mod config;
mod context;
mod error;
pub mod server;
pub mod time;
pub mod validators;

pub use crate::common::{
    bytes_to_sockaddr, sockaddr_to_bytes, storage_key, Connectedness, ContentId, Id, Message,
    MessageType, PeerId, PeerInfo, Record,
};
pub use bytes::Bytes;
pub use config::Config;
pub use context::Context;
pub use server::{DefaultServer, Server, ServerBuilder};

pub use ed25519_dalek::SigningKey;

pub use error::{Error, Result};

pub mod errors {
    //! Error types returned by collaborators.
    pub use super::error::{Cancelled, StorageError, ValidationError};
}
