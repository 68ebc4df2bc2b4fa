//! Context extraction.
//!
//! A `ContextInfo` is the per-turn summary of "where the conversation
//! currently stands": the last executed item, the first pending one, the
//! classified result, and the chain-parameter pairing between them. All of
//! it is derivable from the `DialogueState`; this type exists so the
//! template layer never re-walks the history.
//!
//! A `ContextInfo` is built fresh each turn and never mutated afterwards,
//! except for the opaque `aux` payload injected by reply packaging.

use serde_json::Value as Aux;

use crate::foundation::InvariantViolation;
use crate::statement::FunctionSchema;

use super::next_info::NextStatementInfo;
use super::result_info::ResultInfo;
use super::state::{DialogueState, ExchangeItem, ResultRecord};

/// Derived summary of a dialogue state. Constructed by [`ContextInfo::extract`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextInfo {
    state: DialogueState,
    current_index: Option<usize>,
    next_index: Option<usize>,
    previous_domain_index: Option<usize>,
    is_multi_domain: bool,
    current_function: Option<FunctionSchema>,
    next_function: Option<FunctionSchema>,
    result_info: Option<ResultInfo>,
    next_info: Option<NextStatementInfo>,
    aux: Aux,
}

impl ContextInfo {
    /// The context of a conversation that has not started.
    ///
    /// Callers that may or may not have a prior context should carry an
    /// `Option<ContextInfo>` and fall back to this constructor.
    pub fn initial() -> Self {
        Self {
            state: DialogueState::initial(),
            current_index: None,
            next_index: None,
            previous_domain_index: None,
            is_multi_domain: false,
            current_function: None,
            next_function: None,
            result_info: None,
            next_info: None,
            aux: Aux::Null,
        }
    }

    /// Scans the history once, left to right, and derives the context.
    ///
    /// # Errors
    ///
    /// Fatal invariant violations: an executed item following a proposed
    /// one (H1), a pending item not adjacent to the current one, or a
    /// domain switch recorded after the current item.
    pub fn extract(state: DialogueState) -> Result<Self, InvariantViolation> {
        let mut current_index: Option<usize> = None;
        let mut next_index: Option<usize> = None;
        let mut previous_domain_index: Option<usize> = None;
        let mut current_function: Option<FunctionSchema> = None;
        let mut next_function: Option<FunctionSchema> = None;
        let mut current_result_info: Option<ResultInfo> = None;
        let mut next_info: Option<NextStatementInfo> = None;
        let mut current_device: Option<String> = None;
        let mut proposed_skip = 0usize;

        for (idx, item) in state.history.iter().enumerate() {
            let item_schema = item.statement.schema();
            let device = item_schema.device();
            if let Some(previous_device) = &current_device {
                if previous_device != device {
                    previous_domain_index = current_index;
                }
            }

            if item.confirmation.is_proposed() {
                proposed_skip += 1;
                continue;
            }

            if !item.is_executed() {
                next_index = Some(idx);
                next_function = Some(item_schema.clone());
                next_info = Some(NextStatementInfo::resolve(
                    current_index.map(|i| &state.history[i]),
                    current_result_info.as_ref(),
                    item,
                ));
                break;
            }

            // executed items must all precede the proposed suffix
            if proposed_skip != 0 {
                return Err(InvariantViolation::ProposedNotSuffix { index: idx });
            }

            current_device = Some(device.to_string());
            current_function = Some(item_schema.clone());
            current_index = Some(idx);
            current_result_info = Some(ResultInfo::classify(&state, item)?);
        }

        if let (Some(next), Some(current)) = (next_index, current_index) {
            if next != current + 1 + proposed_skip {
                return Err(InvariantViolation::NextIndexMismatch {
                    next,
                    current,
                    skipped: proposed_skip,
                });
            }
        }
        if let Some(previous) = previous_domain_index {
            match current_index {
                Some(current) if previous <= current => {}
                _ => {
                    return Err(InvariantViolation::DomainIndexOutOfOrder {
                        previous,
                        current: current_index.unwrap_or(0),
                    })
                }
            }
        }

        Ok(Self {
            state,
            current_index,
            next_index,
            previous_domain_index,
            is_multi_domain: previous_domain_index.is_some(),
            current_function,
            next_function,
            result_info: current_result_info,
            next_info,
            aux: Aux::Null,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    pub fn dialogue_act(&self) -> &str {
        &self.state.dialogue_act
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn next_index(&self) -> Option<usize> {
        self.next_index
    }

    pub fn previous_domain_index(&self) -> Option<usize> {
        self.previous_domain_index
    }

    /// True when the history spans more than one device namespace.
    pub fn is_multi_domain(&self) -> bool {
        self.is_multi_domain
    }

    /// Schema of the last executed, non-proposed statement.
    pub fn current_function(&self) -> Option<&FunctionSchema> {
        self.current_function.as_ref()
    }

    /// Schema of the first pending statement.
    pub fn next_function(&self) -> Option<&FunctionSchema> {
        self.next_function.as_ref()
    }

    pub fn result_info(&self) -> Option<&ResultInfo> {
        self.result_info.as_ref()
    }

    pub fn next_info(&self) -> Option<&NextStatementInfo> {
        self.next_info.as_ref()
    }

    /// The last executed, non-proposed history item.
    pub fn current(&self) -> Option<&ExchangeItem> {
        self.current_index.map(|i| &self.state.history[i])
    }

    /// The first pending history item.
    pub fn next(&self) -> Option<&ExchangeItem> {
        self.next_index.map(|i| &self.state.history[i])
    }

    /// The last item of the previous domain, when the history switched
    /// devices.
    pub fn previous_domain(&self) -> Option<&ExchangeItem> {
        self.previous_domain_index.map(|i| &self.state.history[i])
    }

    /// Records of the current item's execution.
    pub fn results(&self) -> Option<&[ResultRecord]> {
        self.current()
            .and_then(|item| item.results.as_ref())
            .map(|r| r.records.as_slice())
    }

    /// Error descriptor of the current item's execution.
    pub fn error(&self) -> Option<&str> {
        self.current()
            .and_then(|item| item.results.as_ref())
            .and_then(|r| r.error.as_deref())
    }

    /// Opaque payload attached by reply packaging.
    pub fn aux(&self) -> &Aux {
        &self.aux
    }

    /// Attaches the auxiliary payload. The only post-construction write.
    pub fn set_aux(&mut self, aux: Aux) {
        self.aux = aux;
    }
}
