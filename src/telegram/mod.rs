//! Messaging platform glue
//!
//! Payload preparation for the platform's bot API: access checks on incoming
//! messages and splitting formatted replies into sendable messages. The HTTP
//! client that delivers them lives outside this crate.

mod access;
mod reply;

pub use access::AccessList;
pub use reply::{prepare_reply, split_message, MAX_MESSAGE_LENGTH};
