//! Data models for the ticket API.
//!
//! This module contains the stable domain model (tickets, articles, search
//! criteria) and the wire records mirroring the generic interface JSON.
//! The [`crate::mapper`] module translates between the two.

mod ticket;
pub mod wire;

pub use ticket::*;
