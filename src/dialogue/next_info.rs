//! Chain-parameter resolver.
//!
//! Pairs the current query's result with the first pending item to decide
//! whether the pending action can be auto-wired to "the thing I just
//! showed you": an input parameter whose type matches the identifying
//! output type of the current table.

use crate::statement::StatementExpr;

use super::result_info::ResultInfo;
use super::state::ExchangeItem;

/// What the engine knows about the first pending statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextStatementInfo {
    /// The pending statement is a bare action (no query element).
    pub is_action: bool,
    /// Input parameter of the pending action whose type equals the current
    /// table's identifying output type.
    pub chain_parameter: Option<String>,
    /// The chain parameter is already bound to a concrete value.
    pub chain_parameter_filled: bool,
    /// The pending statement is fully executable as it stands.
    pub is_complete: bool,
    /// Required input parameters still waiting for a value, in schema
    /// order. Consumed by slot-filling templates.
    pub missing_params: Vec<String>,
}

impl NextStatementInfo {
    /// Resolves the pairing of the current item (if any) with the first
    /// pending item.
    pub fn resolve(
        current_item: Option<&ExchangeItem>,
        current_result_info: Option<&ResultInfo>,
        next_item: &ExchangeItem,
    ) -> Self {
        let next_stmt = &next_item.statement;

        let is_action = next_stmt.last_query().is_none();
        let is_complete = next_stmt.is_executable();
        let missing_params = missing_params_of(next_item);

        let mut info = Self {
            is_action,
            chain_parameter: None,
            chain_parameter_filled: false,
            is_complete,
            missing_params,
        };
        if !is_action {
            return info;
        }

        debug_assert_eq!(next_stmt.exprs().len(), 1);
        let action = match next_stmt.first() {
            StatementExpr::Action(action) => action,
            StatementExpr::Query(_) => return info,
        };

        let current_item = match (current_item, current_result_info) {
            (Some(item), Some(result_info)) if result_info.is_table => item,
            _ => return info,
        };

        let id_type = match current_item.statement.schema().id_arg_type() {
            Some(ty) => ty,
            None => return info,
        };

        info.chain_parameter = action
            .schema
            .input_args()
            .find(|arg| &arg.ty == id_type)
            .map(|arg| arg.name.clone());

        if let Some(name) = &info.chain_parameter {
            info.chain_parameter_filled = matches!(
                action.param(name),
                Some(param) if param.value.is_defined()
            );
        }

        info
    }
}

/// Required inputs of every invocation in the statement that are still
/// unbound or bound to a placeholder.
fn missing_params_of(item: &ExchangeItem) -> Vec<String> {
    let mut missing = Vec::new();
    for expr in item.statement.exprs() {
        if let StatementExpr::Action(action) = expr {
            for arg in action.schema.input_args().filter(|a| a.required) {
                let bound = matches!(
                    action.param(&arg.name),
                    Some(p) if p.value.is_defined()
                );
                if !bound {
                    missing.push(arg.name.clone());
                }
            }
        }
    }
    missing
}
