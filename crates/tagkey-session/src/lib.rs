//! Session control for Tagkey.
//!
//! This crate decides what a tag scan *means*:
//!
//! 1. **Controller**: the single-session state machine
//!    ([`SessionController`]) with its lock rule. A locked session can
//!    only be ended by scanning its own tag.
//! 2. **Actor**: a Tokio task that owns the controller, drives its
//!    elapsed-time ticker, and publishes [`SessionSnapshot`]s
//!    ([`spawn_controller`], [`ControllerHandle`]).
//! 3. **Lookup & history**: the two seams to persistence. Profiles come
//!    in through [`ProfileLookup`]; finished sessions go out through
//!    [`HistorySink`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)          ← reads a tag, decodes it, asks this crate what to do
//!     ↕
//! Session Layer (this crate)  ← start / end / lock rules, elapsed time
//!     ↕
//! Protocol + Tick (below) ← Profile, SessionRecord, ElapsedTicker
//! ```

mod actor;
mod controller;
mod error;
mod history;
mod lookup;
mod session;

pub use actor::{ControllerHandle, spawn_controller};
pub use controller::{SessionController, link_tag};
pub use error::{HistoryError, SessionError};
pub use history::{HistorySink, JsonLinesHistory, MemoryHistory};
pub use lookup::{ProfileLookup, ProfileRegistry};
pub use session::{
    ActiveSnapshot, ControllerConfig, ScanOutcome, SessionSnapshot, format_elapsed,
};
