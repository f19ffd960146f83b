//! Tag payload protocol and shared data model for Tagkey.
//!
//! This crate defines what lives on a tag and what the rest of the
//! system passes around:
//!
//! - **Codec** ([`PayloadCodec`] trait, [`TagCodec`]): profile
//!   identifier ↔ tag payload bytes.
//! - **Types** ([`ProfileId`], [`Profile`], [`SessionRecord`]): the value
//!   types shared by the session layer and its collaborators.
//! - **Errors** ([`EncodeError`], [`DecodeError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (raw payload) → Protocol (identifier) → Session (state machine)
//! ```
//!
//! Nothing here does I/O or keeps state between calls.

mod codec;
mod error;
mod types;

pub use codec::{CodecConfig, PayloadCodec, TagCodec};
pub use error::{DecodeError, EncodeError};
pub use types::{Profile, ProfileId, SessionRecord};
