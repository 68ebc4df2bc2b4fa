//! Dialogue history model.
//!
//! A `DialogueState` is the append-only record of where a conversation
//! stands: one `ExchangeItem` per statement the conversation has committed
//! to, each carrying its confirmation level and, once executed, its
//! results.
//!
//! # Invariants
//!
//! - **H1** (proposed suffix): once a `Proposed` item appears, every later
//!   item is also `Proposed`.
//! - **H2** (executed prefix): every executed item precedes every pending
//!   one.
//!
//! Both hold for every state the transition operations produce; the
//! context extractor enforces H1 fatally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::{Confirmation, POLICY_NAME};
use crate::statement::{Statement, Value};

/// One row of an execution result, keyed by output field name.
pub type ResultRecord = BTreeMap<String, Value>;

/// Number of records an execution produced.
///
/// `Symbolic` means the count is a reference the engine cannot resolve to
/// a literal number (e.g. an aggregate computed elsewhere); it is always
/// treated as large.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCount {
    Exact(u64),
    Symbolic(String),
}

/// The outcome of executing a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Returned records, in result order.
    pub records: Vec<ResultRecord>,
    /// Error descriptor, if the execution failed.
    pub error: Option<String>,
    /// Total number of matching records.
    pub count: ResultCount,
    /// True when additional unfetched records exist beyond `records`.
    pub more: bool,
}

impl ExecutionResult {
    /// A successful result over the given records, with an exact count.
    pub fn of_records(records: Vec<ResultRecord>) -> Self {
        let count = ResultCount::Exact(records.len() as u64);
        Self {
            records,
            error: None,
            count,
            more: false,
        }
    }

    /// An empty successful result.
    pub fn empty() -> Self {
        Self::of_records(Vec::new())
    }

    /// A failed execution.
    pub fn error(code: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            error: Some(code.into()),
            count: ResultCount::Exact(0),
            more: false,
        }
    }

    /// Overrides the total count.
    pub fn with_count(mut self, count: ResultCount) -> Self {
        self.count = count;
        self
    }

    /// Marks the result as truncated.
    pub fn with_more(mut self) -> Self {
        self.more = true;
        self
    }
}

/// One statement in the history, with its confirmation level and results.
///
/// `results == None` means the statement has not executed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeItem {
    pub statement: Statement,
    pub confirmation: Confirmation,
    pub results: Option<ExecutionResult>,
}

impl ExchangeItem {
    /// A pending (unexecuted) item.
    pub fn pending(statement: Statement, confirmation: Confirmation) -> Self {
        Self {
            statement,
            confirmation,
            results: None,
        }
    }

    /// An executed item.
    pub fn executed(
        statement: Statement,
        confirmation: Confirmation,
        results: ExecutionResult,
    ) -> Self {
        Self {
            statement,
            confirmation,
            results: Some(results),
        }
    }

    /// Returns true once the item has executed.
    pub fn is_executed(&self) -> bool {
        self.results.is_some()
    }
}

/// The full dialogue state: the current act plus the exchange history.
///
/// States are immutable once published; the transition operations build
/// new ones rather than mutating in place. `clone()` is a structural deep
/// copy, so holding a reference to an old state is always safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueState {
    /// Name of the policy that produced this state.
    pub policy: String,
    /// Symbolic label of the current dialogue act.
    pub dialogue_act: String,
    /// Parameter names attached to the act, if any.
    pub dialogue_act_params: Option<Vec<String>>,
    /// Ordered exchange history.
    pub history: Vec<ExchangeItem>,
}

impl DialogueState {
    /// A state with the given act and history, under this engine's policy.
    pub fn new(
        dialogue_act: impl Into<String>,
        dialogue_act_params: Option<Vec<String>>,
        history: Vec<ExchangeItem>,
    ) -> Self {
        Self {
            policy: POLICY_NAME.to_string(),
            dialogue_act: dialogue_act.into(),
            dialogue_act_params,
            history,
        }
    }

    /// The state of a conversation that has not started.
    pub fn initial() -> Self {
        Self::new(crate::foundation::acts::SYS_INIT, None, Vec::new())
    }

    /// Returns true if some history item has not executed yet.
    pub fn has_pending_item(&self) -> bool {
        self.history.iter().any(|item| !item.is_executed())
    }
}
