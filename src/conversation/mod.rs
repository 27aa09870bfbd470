//! Conversation memory and model requests
//!
//! Messages are logged per user with their reply links; a new request is
//! answered with the context of the chain it replies to.

mod prompt;
mod storage;

pub use prompt::{
    collect_history, normalize_request, parse_completion_output, ChatMessage, CompletionRequest,
    ResponseFormat, Role, MAX_CONVERSATION_DEPTH,
};
pub use storage::{MessageChain, MessageSide, Storage, StoredMessage};
