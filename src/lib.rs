//! gptbot - chat relay between a messaging platform and a language model
//!
//! The core of the crate is [`markdown`], which turns the model's markdown
//! answers into plain text plus formatting entities addressed in UTF-16
//! code units. Around it sit the conversation log, prompt building, reply
//! splitting and configuration.

pub mod config;
pub mod conversation;
pub mod error;
pub mod markdown;
pub mod string_utils;
pub mod telegram;

pub use error::{Error, Result};
