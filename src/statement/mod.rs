//! Statement Tree boundary types.
//!
//! The engine does not parse or execute statements; it only inspects them.
//! This module carries the minimal statement representation the policy
//! consumes: values with a placeholder variant, function schemas with
//! argument introspection, query-expression shapes, and chains of queries
//! and actions.

mod expression;
mod schema;
mod values;

pub use expression::{Filter, InputParam, Invocation, QueryExpression, Statement, StatementExpr};
pub use schema::{ArgDef, FunctionSchema, FunctionType};
pub use values::{SortDirection, Value, ValueType};

/// Name of the identifying output argument on query schemas.
pub const ID_ARG: &str = "id";
