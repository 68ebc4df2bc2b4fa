//! Confirmation levels for statements in the dialogue history.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How committed the conversation is to a given statement.
///
/// The levels are ordered by commitment: a `Proposed` statement was
/// suggested by the agent and the user has not reacted yet; an `Accepted`
/// statement should run but has not been confirmed; a `Confirmed` statement
/// was explicitly confirmed before a sensitive action executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Proposed,
    Accepted,
    Confirmed,
}

impl Confirmation {
    /// Returns true for agent proposals the user has not reacted to.
    pub fn is_proposed(self) -> bool {
        self == Confirmation::Proposed
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confirmation::Proposed => "proposed",
            Confirmation::Accepted => "accepted",
            Confirmation::Confirmed => "confirmed",
        };
        write!(f, "{}", s)
    }
}
