//! Statement expressions - query shapes, action invocations, and chains.

use serde::{Deserialize, Serialize};

use super::schema::{FunctionSchema, FunctionType};
use super::values::{SortDirection, Value};

/// A boolean filter over query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Atom { param: String, value: Value },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Returns true if any atom in the filter references `param`.
    pub fn uses_param(&self, param: &str) -> bool {
        match self {
            Filter::Atom { param: p, .. } => p == param,
            Filter::And(clauses) | Filter::Or(clauses) => {
                clauses.iter().any(|c| c.uses_param(param))
            }
        }
    }

    /// Returns true if every atom carries a concrete value.
    pub fn is_complete(&self) -> bool {
        match self {
            Filter::Atom { value, .. } => value.is_defined(),
            Filter::And(clauses) | Filter::Or(clauses) => {
                clauses.iter().all(Filter::is_complete)
            }
        }
    }
}

/// A data-fetch expression tree.
///
/// The leaf is a call to a query function; the wrappers are the shapes the
/// result classifier cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryExpression {
    Call(FunctionSchema),
    Filter {
        inner: Box<QueryExpression>,
        filter: Filter,
    },
    Projection {
        inner: Box<QueryExpression>,
        fields: Vec<String>,
        /// Names of computed output fields; non-empty makes this a
        /// compute-projection.
        computations: Vec<String>,
    },
    Sort {
        inner: Box<QueryExpression>,
        field: String,
        direction: SortDirection,
    },
    Index {
        inner: Box<QueryExpression>,
        index: i64,
    },
    Slice {
        inner: Box<QueryExpression>,
        base: i64,
        limit: i64,
    },
    Aggregation {
        inner: Box<QueryExpression>,
        operator: String,
        field: Option<String>,
    },
}

impl QueryExpression {
    /// Returns the schema of the underlying query call.
    pub fn schema(&self) -> &FunctionSchema {
        match self {
            QueryExpression::Call(schema) => schema,
            QueryExpression::Filter { inner, .. }
            | QueryExpression::Projection { inner, .. }
            | QueryExpression::Sort { inner, .. }
            | QueryExpression::Index { inner, .. }
            | QueryExpression::Slice { inner, .. }
            | QueryExpression::Aggregation { inner, .. } => inner.schema(),
        }
    }

    pub fn is_projection(&self) -> bool {
        matches!(self, QueryExpression::Projection { .. })
    }

    /// Returns true for a projection carrying computed fields.
    pub fn is_compute_projection(&self) -> bool {
        matches!(
            self,
            QueryExpression::Projection { computations, .. } if !computations.is_empty()
        )
    }

    pub fn is_index_selection(&self) -> bool {
        matches!(
            self,
            QueryExpression::Index { .. } | QueryExpression::Slice { .. }
        )
    }

    pub fn is_aggregation(&self) -> bool {
        matches!(self, QueryExpression::Aggregation { .. })
    }

    /// Returns the explicitly projected output fields (projected fields
    /// plus computed field names), or `None` if this is not a projection.
    pub fn projection_arguments(&self) -> Option<Vec<String>> {
        match self {
            QueryExpression::Projection {
                fields,
                computations,
                ..
            } => {
                let mut args = fields.clone();
                args.extend(computations.iter().cloned());
                Some(args)
            }
            _ => None,
        }
    }

    /// Finds the first filter in the expression tree, outermost first.
    pub fn find_filter(&self) -> Option<&Filter> {
        match self {
            QueryExpression::Call(_) => None,
            QueryExpression::Filter { filter, .. } => Some(filter),
            QueryExpression::Projection { inner, .. }
            | QueryExpression::Sort { inner, .. }
            | QueryExpression::Index { inner, .. }
            | QueryExpression::Slice { inner, .. }
            | QueryExpression::Aggregation { inner, .. } => inner.find_filter(),
        }
    }

    /// Returns true if every filter in the tree is complete.
    pub fn is_complete(&self) -> bool {
        match self {
            QueryExpression::Call(_) => true,
            QueryExpression::Filter { inner, filter } => {
                filter.is_complete() && inner.is_complete()
            }
            QueryExpression::Projection { inner, .. }
            | QueryExpression::Sort { inner, .. }
            | QueryExpression::Index { inner, .. }
            | QueryExpression::Slice { inner, .. }
            | QueryExpression::Aggregation { inner, .. } => inner.is_complete(),
        }
    }
}

/// A named input parameter of an action invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputParam {
    pub name: String,
    pub value: Value,
}

impl InputParam {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A call to an action function with its input parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub schema: FunctionSchema,
    pub params: Vec<InputParam>,
}

impl Invocation {
    pub fn new(schema: FunctionSchema, params: Vec<InputParam>) -> Self {
        Self { schema, params }
    }

    /// An invocation with no parameters bound.
    pub fn bare(schema: FunctionSchema) -> Self {
        Self {
            schema,
            params: Vec::new(),
        }
    }

    /// Looks up a bound parameter by name.
    pub fn param(&self, name: &str) -> Option<&InputParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Sets an existing parameter in place, or inserts a new one keeping
    /// the parameter list name-sorted. Overwrites do not re-sort.
    pub fn set_or_add_param(&mut self, name: &str, value: Value) {
        if let Some(existing) = self.params.iter_mut().find(|p| p.name == name) {
            existing.value = value;
            return;
        }
        self.params.push(InputParam::new(name, value));
        self.params.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Merges every defined parameter of `source` into this invocation.
    ///
    /// Same-name parameters are overwritten in place; new parameters land
    /// in name-sorted position. Placeholders in `source` are skipped.
    pub fn merge_parameters(&mut self, source: &Invocation) {
        for param in &source.params {
            if !param.value.is_defined() {
                continue;
            }
            self.set_or_add_param(&param.name, param.value.clone());
        }
    }

    /// Returns true if every required input argument is bound to a
    /// concrete value.
    pub fn is_complete(&self) -> bool {
        self.schema
            .input_args()
            .filter(|a| a.required)
            .all(|a| matches!(self.param(&a.name), Some(p) if p.value.is_defined()))
    }

    /// Drops parameters bound to their schema-declared default value.
    pub fn strip_default_params(&mut self) {
        let schema = self.schema.clone();
        self.params.retain(|p| match schema.arg(&p.name) {
            Some(arg) => arg.default.as_ref() != Some(&p.value),
            None => true,
        });
    }
}

/// One element of a statement chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementExpr {
    Query(QueryExpression),
    Action(Invocation),
}

impl StatementExpr {
    /// Returns the schema of this element.
    pub fn schema(&self) -> &FunctionSchema {
        match self {
            StatementExpr::Query(query) => query.schema(),
            StatementExpr::Action(action) => &action.schema,
        }
    }
}

/// A statement: a chain of at most one query followed by zero or more
/// actions (or a bare action chain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    exprs: Vec<StatementExpr>,
}

impl Statement {
    /// Builds a statement from chain elements.
    ///
    /// # Panics
    ///
    /// Panics if `exprs` is empty; an empty chain is not a statement.
    pub fn new(exprs: Vec<StatementExpr>) -> Self {
        assert!(!exprs.is_empty(), "a statement chain cannot be empty");
        Self { exprs }
    }

    /// A single-query statement.
    pub fn query(query: QueryExpression) -> Self {
        Self::new(vec![StatementExpr::Query(query)])
    }

    /// A single-action statement.
    pub fn action(action: Invocation) -> Self {
        Self::new(vec![StatementExpr::Action(action)])
    }

    pub fn exprs(&self) -> &[StatementExpr] {
        &self.exprs
    }

    pub fn first(&self) -> &StatementExpr {
        &self.exprs[0]
    }

    pub fn last(&self) -> &StatementExpr {
        self.exprs.last().expect("statement chain is non-empty")
    }

    /// Returns the last query element of the chain, if any.
    pub fn last_query(&self) -> Option<&QueryExpression> {
        self.exprs.iter().rev().find_map(|e| match e {
            StatementExpr::Query(q) => Some(q),
            StatementExpr::Action(_) => None,
        })
    }

    /// Returns the last action element of the chain, if any.
    pub fn last_action(&self) -> Option<&Invocation> {
        self.exprs.iter().rev().find_map(|e| match e {
            StatementExpr::Action(a) => Some(a),
            StatementExpr::Query(_) => None,
        })
    }

    /// Mutable access to the last action element, for parameter edits on
    /// a statement that was cloned first.
    pub fn last_action_mut(&mut self) -> Option<&mut Invocation> {
        self.exprs.iter_mut().rev().find_map(|e| match e {
            StatementExpr::Action(a) => Some(a),
            StatementExpr::Query(_) => None,
        })
    }

    /// Returns the schema of the whole statement (its last element).
    pub fn schema(&self) -> &FunctionSchema {
        self.last().schema()
    }

    /// Returns true if the statement is query-like: it ends in a query,
    /// with no trailing action left to run.
    pub fn is_table(&self) -> bool {
        matches!(self.last(), StatementExpr::Query(_))
            && self.schema().function_type() == FunctionType::Query
    }

    /// Returns true if the statement can execute: every invocation has its
    /// required inputs bound and every filter value is concrete.
    pub fn is_executable(&self) -> bool {
        self.exprs.iter().all(|e| match e {
            StatementExpr::Query(q) => q.is_complete(),
            StatementExpr::Action(a) => a.is_complete(),
        })
    }

    /// Drops action parameters bound to their schema-declared defaults.
    pub fn strip_default_params(&mut self) {
        for expr in &mut self.exprs {
            if let StatementExpr::Action(action) = expr {
                action.strip_default_params();
            }
        }
    }
}
