//! Conversation log persistence
//!
//! Every message the bot sees or sends is kept in a single YAML file, keyed
//! by user id and message id. Each message remembers which message it
//! replied to, so a conversation is recovered by walking reply links back
//! from its latest message.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Which side of the conversation wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSide {
    User,
    Bot,
}

/// A message read back from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMessage {
    pub side: MessageSide,
    pub text: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// File Model
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StorageRoot {
    conversations: BTreeMap<i64, Conversation>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Conversation {
    messages: BTreeMap<i32, MessageRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reply_to: Option<i32>,
    side: MessageSide,
    text: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

/// File-backed conversation log.
///
/// All access goes through [`Storage::transaction`], which holds a lock for
/// the duration of the callback so concurrent handlers never interleave
/// their read-modify-write cycles.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Storage {
    /// Open the log at `path`, creating the file and its directory when
    /// missing. Fails if an existing file cannot be parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| Error::StorageSave {
                    path: parent.to_path_buf(),
                    source: Box::new(e),
                })?;
            }
            debug!("Creating conversation log at {}", path.display());
            fs::write(&path, "").map_err(|e| Error::StorageSave {
                path: path.clone(),
                source: Box::new(e),
            })?;
        }

        let storage = Self {
            path,
            lock: Mutex::new(()),
        };
        storage.load()?;
        Ok(storage)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the conversation of `user_id` while holding the
    /// storage lock.
    pub fn transaction<T>(
        &self,
        user_id: i64,
        f: impl FnOnce(&mut MessageChain<'_>) -> Result<T>,
    ) -> Result<T> {
        // The lock guards no data, so a poisoned lock is still usable
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut root = self.load()?;
        let mut chain = MessageChain {
            root: &mut root,
            user_id,
            path: &self.path,
        };
        f(&mut chain)
    }

    fn load(&self) -> Result<StorageRoot> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(Error::StorageLoad {
                    path: self.path.clone(),
                    source: Box::new(e),
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(StorageRoot::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| Error::StorageLoad {
            path: self.path.clone(),
            source: Box::new(e),
        })
    }
}

/// Write the whole document next to the target, then move it into place.
fn save_root(path: &Path, root: &StorageRoot) -> Result<()> {
    let yaml = serde_yaml::to_string(root).map_err(|e| Error::StorageSave {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, yaml).map_err(|e| Error::StorageSave {
        path: temp_path.clone(),
        source: Box::new(e),
    })?;
    fs::rename(&temp_path, path).map_err(|e| Error::StorageSave {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    debug!("Saved conversation log to {}", path.display());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// MessageChain
// ─────────────────────────────────────────────────────────────────────────────

/// One user's messages, valid for the duration of a transaction.
pub struct MessageChain<'a> {
    root: &'a mut StorageRoot,
    user_id: i64,
    path: &'a Path,
}

impl MessageChain<'_> {
    /// Record a message and persist the log.
    pub fn store(
        &mut self,
        message_id: i32,
        reply_to: Option<i32>,
        side: MessageSide,
        text: impl Into<String>,
    ) -> Result<()> {
        self.root
            .conversations
            .entry(self.user_id)
            .or_default()
            .messages
            .insert(
                message_id,
                MessageRecord {
                    reply_to,
                    side,
                    text: text.into(),
                },
            );
        save_root(self.path, self.root)
    }

    /// The conversation ending at `message_id`, oldest message first.
    ///
    /// Unknown ids give an empty chain. Reply links that loop back on
    /// themselves stop at the first message seen twice.
    pub fn read(&self, message_id: i32) -> Vec<StoredMessage> {
        let Some(conversation) = self.root.conversations.get(&self.user_id) else {
            return Vec::new();
        };

        let mut messages = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(message_id);

        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            let Some(record) = conversation.messages.get(&id) else {
                break;
            };
            messages.push(StoredMessage {
                side: record.side,
                text: record.text.clone(),
            });
            current = record.reply_to;
        }

        messages.reverse();
        messages
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
