//! Function schemas - argument introspection for queries and actions.

use serde::{Deserialize, Serialize};

use super::values::{Value, ValueType};
use super::ID_ARG;

/// Whether a function fetches data or performs a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionType {
    Query,
    Action,
}

/// A declared argument of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDef {
    pub name: String,
    pub ty: ValueType,
    pub is_input: bool,
    pub required: bool,
    /// Schema-declared default; parameters bound to this value are
    /// stripped before a statement enters the history.
    #[serde(default)]
    pub default: Option<Value>,
}

impl ArgDef {
    /// A required input argument.
    pub fn input(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_input: true,
            required: true,
            default: None,
        }
    }

    /// An optional input argument.
    pub fn optional_input(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_input: true,
            required: false,
            default: None,
        }
    }

    /// An output argument.
    pub fn output(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_input: false,
            required: false,
            default: None,
        }
    }

    /// Sets the declared default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Schema of a primitive function: its qualified name, type, and arguments.
///
/// The qualified name is `device.function`; the device part is the
/// primitive-function namespace used for domain-switch detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSchema {
    qualified_name: String,
    function_type: FunctionType,
    args: Vec<ArgDef>,
    is_list: bool,
    is_monitorable: bool,
    /// Names of related functions the result can pivot to.
    related: Vec<String>,
}

impl FunctionSchema {
    pub fn new(
        qualified_name: impl Into<String>,
        function_type: FunctionType,
        args: Vec<ArgDef>,
    ) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            function_type,
            args,
            is_list: false,
            is_monitorable: false,
            related: Vec::new(),
        }
    }

    /// Marks the function as returning a list of records.
    pub fn with_list(mut self) -> Self {
        self.is_list = true;
        self
    }

    /// Marks the function as monitorable.
    pub fn with_monitorable(mut self) -> Self {
        self.is_monitorable = true;
        self
    }

    /// Declares related functions.
    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related = related;
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Returns the primitive-function namespace (the part before the dot).
    pub fn device(&self) -> &str {
        match self.qualified_name.rsplit_once('.') {
            Some((device, _)) => device,
            None => &self.qualified_name,
        }
    }

    pub fn function_type(&self) -> FunctionType {
        self.function_type
    }

    pub fn is_list(&self) -> bool {
        self.is_list
    }

    pub fn is_monitorable(&self) -> bool {
        self.is_monitorable
    }

    pub fn related(&self) -> &[String] {
        &self.related
    }

    pub fn args(&self) -> &[ArgDef] {
        &self.args
    }

    /// Looks up an argument by name.
    pub fn arg(&self, name: &str) -> Option<&ArgDef> {
        self.args.iter().find(|a| a.name == name)
    }

    /// Returns the declared type of an argument, if present.
    pub fn arg_type(&self, name: &str) -> Option<&ValueType> {
        self.arg(name).map(|a| &a.ty)
    }

    /// Returns the type of the identifying output argument, if the schema
    /// has one. This is the type chain parameters are matched against.
    pub fn id_arg_type(&self) -> Option<&ValueType> {
        self.arg(ID_ARG)
            .filter(|a| !a.is_input)
            .map(|a| &a.ty)
    }

    /// Returns true if the function declares any output arguments.
    pub fn has_output_args(&self) -> bool {
        self.args.iter().any(|a| !a.is_input)
    }

    /// Iterates over input arguments.
    pub fn input_args(&self) -> impl Iterator<Item = &ArgDef> {
        self.args.iter().filter(|a| a.is_input)
    }

    /// Returns true if `other` names the same primitive function.
    pub fn is_same_function(&self, other: &FunctionSchema) -> bool {
        self.qualified_name == other.qualified_name
    }
}
