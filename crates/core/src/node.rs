//! Graph node collaborator
//!
//! The dispatch layer never owns graph nodes; it reads them through the
//! [`Node`] trait. [`GraphNode`] is a plain owned implementation used by
//! tooling and tests that have no real graph at hand.

use crate::element_type::ElementType;
use crate::types::{HashValue, OpIdentifier};

/// Read-only view of a graph node, as needed for kernel selection
pub trait Node {
    /// Node name, for diagnostics
    fn name(&self) -> &str;

    /// Operator type
    fn op_type(&self) -> &str;

    /// Operator domain, possibly empty
    fn domain(&self) -> &str;

    /// Since-version of the operator schema the node was resolved against
    fn since_version(&self) -> i32;

    /// Provider assigned by placement, if any
    fn execution_provider_type(&self) -> Option<&str>;

    /// Number of actual inputs per formal input
    ///
    /// A variadic formal input may own several consecutive actual inputs.
    fn input_arg_count(&self) -> &[usize];

    /// Element types of the actual inputs; `None` marks a missing optional
    fn input_types(&self) -> &[Option<ElementType>];

    /// Number of actual outputs per formal output
    ///
    /// Only the last formal output may be variadic and own several.
    fn output_arg_count(&self) -> &[usize];

    /// Element types of the actual outputs; `None` marks a missing optional
    fn output_types(&self) -> &[Option<ElementType>];

    /// Precomputed kernel definition hash, set by a full build
    fn kernel_def_hash(&self) -> Option<HashValue>;

    /// Identity of the operator the node invokes
    fn op_id(&self) -> OpIdentifier {
        OpIdentifier::new(self.domain(), self.op_type(), self.since_version())
    }
}

/// Owned node description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    name: String,
    op_type: String,
    domain: String,
    since_version: i32,
    execution_provider: Option<String>,
    input_arg_count: Vec<usize>,
    input_types: Vec<Option<ElementType>>,
    output_arg_count: Vec<usize>,
    output_types: Vec<Option<ElementType>>,
    kernel_def_hash: Option<HashValue>,
}

impl GraphNode {
    /// Node with no arguments in the given operator
    pub fn new(
        name: impl Into<String>,
        op_type: impl Into<String>,
        domain: impl Into<String>,
        since_version: i32,
    ) -> Self {
        Self {
            name: name.into(),
            op_type: op_type.into(),
            domain: domain.into(),
            since_version,
            execution_provider: None,
            input_arg_count: Vec::new(),
            input_types: Vec::new(),
            output_arg_count: Vec::new(),
            output_types: Vec::new(),
            kernel_def_hash: None,
        }
    }

    /// Append one formal input holding a single argument
    pub fn input(self, ty: ElementType) -> Self {
        self.variadic_input([ty])
    }

    /// Append one formal input whose optional argument is absent
    pub fn missing_input(mut self) -> Self {
        self.input_arg_count.push(1);
        self.input_types.push(None);
        self
    }

    /// Append one formal input holding every type in `types`
    pub fn variadic_input(mut self, types: impl IntoIterator<Item = ElementType>) -> Self {
        let before = self.input_types.len();
        self.input_types.extend(types.into_iter().map(Some));
        self.input_arg_count.push(self.input_types.len() - before);
        self
    }

    /// Append one formal output holding a single argument
    pub fn output(self, ty: ElementType) -> Self {
        self.variadic_output([ty])
    }

    /// Append one formal output holding every type in `types`
    pub fn variadic_output(mut self, types: impl IntoIterator<Item = ElementType>) -> Self {
        let before = self.output_types.len();
        self.output_types.extend(types.into_iter().map(Some));
        self.output_arg_count.push(self.output_types.len() - before);
        self
    }

    /// Assign a provider, as placement would
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.execution_provider = Some(provider.into());
        self
    }

    /// Attach a precomputed kernel definition hash
    pub fn with_kernel_def_hash(mut self, hash: HashValue) -> Self {
        self.kernel_def_hash = Some(hash);
        self
    }

    /// Set the provider after construction
    pub fn set_execution_provider_type(&mut self, provider: impl Into<String>) {
        self.execution_provider = Some(provider.into());
    }

    /// Bake a hash after a successful schema-aware match
    pub fn set_kernel_def_hash(&mut self, hash: HashValue) {
        self.kernel_def_hash = Some(hash);
    }
}

impl Node for GraphNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn op_type(&self) -> &str {
        &self.op_type
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    fn since_version(&self) -> i32 {
        self.since_version
    }

    fn execution_provider_type(&self) -> Option<&str> {
        self.execution_provider.as_deref()
    }

    fn input_arg_count(&self) -> &[usize] {
        &self.input_arg_count
    }

    fn input_types(&self) -> &[Option<ElementType>] {
        &self.input_types
    }

    fn output_arg_count(&self) -> &[usize] {
        &self.output_arg_count
    }

    fn output_types(&self) -> &[Option<ElementType>] {
        &self.output_types
    }

    fn kernel_def_hash(&self) -> Option<HashValue> {
        self.kernel_def_hash
    }
}
