//! Access control for incoming chats
//!
//! The bot only answers users listed in its access list, given either by
//! numeric user id or by username.

use std::collections::HashSet;

/// Users allowed to talk to the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessList {
    ids: HashSet<i64>,
    usernames: HashSet<String>,
}

impl AccessList {
    /// Parse a list of user ids and usernames separated by commas,
    /// semicolons or spaces. A single leading `@` on a username is optional.
    ///
    /// ```ignore
    /// let access = AccessList::parse("123456, @alice;bob");
    /// assert!(access.is_allowed(123456, "anyone"));
    /// assert!(access.is_allowed(1, "alice"));
    /// ```
    pub fn parse(list: &str) -> Self {
        let mut access = Self::default();

        for token in list
            .split(|c: char| c == ',' || c == ';' || c == ' ')
            .map(str::trim)
            .filter(|token| !token.is_empty())
        {
            match token.parse::<i64>() {
                Ok(id) => {
                    access.ids.insert(id);
                }
                Err(_) => {
                    let username = token.strip_prefix('@').unwrap_or(token);
                    // A bare "@" names nobody and must not match empty usernames
                    if !username.is_empty() {
                        access.usernames.insert(username.to_string());
                    }
                }
            }
        }

        access
    }

    /// True when either the id or the username is on the list.
    pub fn is_allowed(&self, id: i64, username: &str) -> bool {
        self.ids.contains(&id) || self.usernames.contains(username)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.usernames.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
