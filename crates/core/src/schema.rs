//! Operator schema model
//!
//! Only the parts of a schema the dispatch layer reads: formal parameters with
//! their type-strings and arity, and the schema's declared type parameters.
//! Schemas are authored elsewhere; `OpSchemaRegistry` just holds them for
//! lookup by (domain, op type, max version).

use crate::element_type::ElementType;
use crate::types::{canonical_domain, OpIdentifier};
use rustc_hash::FxHashMap;

/// Arity of a formal parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormalParameterOption {
    /// Exactly one argument
    Single,
    /// Zero or one argument
    Optional,
    /// Any number of arguments; only valid on the last formal parameter
    Variadic,
}

/// One formal input or output of an operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalParameter {
    /// Parameter name
    pub name: String,
    /// Type-string governing the parameter's type
    pub type_str: String,
    /// Arity
    pub option: FormalParameterOption,
}

impl FormalParameter {
    /// Formal parameter taking exactly one argument
    pub fn single(name: impl Into<String>, type_str: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_str: type_str.into(),
            option: FormalParameterOption::Single,
        }
    }

    /// Formal parameter that may be omitted
    pub fn optional(name: impl Into<String>, type_str: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_str: type_str.into(),
            option: FormalParameterOption::Optional,
        }
    }

    /// Formal parameter taking any number of arguments
    pub fn variadic(name: impl Into<String>, type_str: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_str: type_str.into(),
            option: FormalParameterOption::Variadic,
        }
    }
}

/// A declared type parameter and its allowed types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConstraintParam {
    /// Type parameter name, e.g. `T`
    pub type_param_str: String,
    /// Types the schema permits
    pub allowed_types: Vec<ElementType>,
}

/// Schema of one versioned operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpSchema {
    /// Operator type name
    pub name: String,
    /// Operator domain (canonicalized on lookup)
    pub domain: String,
    /// Opset version this signature was introduced in
    pub since_version: i32,
    /// Formal inputs, in order
    pub inputs: Vec<FormalParameter>,
    /// Formal outputs, in order
    pub outputs: Vec<FormalParameter>,
    /// Declared type parameters
    pub type_constraints: Vec<TypeConstraintParam>,
}

impl OpSchema {
    /// Schema with no parameters
    pub fn new(domain: impl Into<String>, name: impl Into<String>, since_version: i32) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            since_version,
            inputs: Vec::new(),
            outputs: Vec::new(),
            type_constraints: Vec::new(),
        }
    }

    /// Append a formal input
    pub fn input(mut self, param: FormalParameter) -> Self {
        self.inputs.push(param);
        self
    }

    /// Append a formal output
    pub fn output(mut self, param: FormalParameter) -> Self {
        self.outputs.push(param);
        self
    }

    /// Declare a type parameter
    pub fn type_constraint(
        mut self,
        type_param_str: impl Into<String>,
        allowed_types: impl IntoIterator<Item = ElementType>,
    ) -> Self {
        self.type_constraints.push(TypeConstraintParam {
            type_param_str: type_param_str.into(),
            allowed_types: allowed_types.into_iter().collect(),
        });
        self
    }

    /// Identity of this schema
    pub fn op_id(&self) -> OpIdentifier {
        OpIdentifier::new(&self.domain, self.name.as_str(), self.since_version)
    }
}

/// Read access to operator schemas
pub trait SchemaLookup {
    /// Latest schema for (domain, op type) whose since-version is at most `max_version`
    fn get_schema(&self, op_type: &str, domain: &str, max_version: i32) -> Option<&OpSchema>;
}

/// In-memory schema table keyed by (domain, op type)
#[derive(Debug, Default)]
pub struct OpSchemaRegistry {
    schemas: FxHashMap<(String, String), Vec<OpSchema>>,
}

impl OpSchemaRegistry {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema; versions are kept sorted ascending
    ///
    /// A schema with the same identity replaces the earlier one.
    pub fn register(&mut self, schema: OpSchema) {
        let key = (
            canonical_domain(&schema.domain).to_string(),
            schema.name.clone(),
        );
        let versions = self.schemas.entry(key).or_default();
        match versions.binary_search_by_key(&schema.since_version, |s| s.since_version) {
            Ok(pos) => versions[pos] = schema,
            Err(pos) => versions.insert(pos, schema),
        }
    }

    /// Number of registered schemas across all versions
    pub fn len(&self) -> usize {
        self.schemas.values().map(Vec::len).sum()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaLookup for OpSchemaRegistry {
    fn get_schema(&self, op_type: &str, domain: &str, max_version: i32) -> Option<&OpSchema> {
        let key = (canonical_domain(domain).to_string(), op_type.to_string());
        self.schemas
            .get(&key)?
            .iter()
            .rev()
            .find(|s| s.since_version <= max_version)
    }
}
