//! Template compilation.
//!
//! Turns a [`StackDefinition`] into everything the driver sends to the
//! provider: the full remote name, the request body, the tag set, and the
//! deploy parameters.

mod artifact;
mod compiled;
mod tags;

pub use artifact::TemplateWriter;
pub use compiled::{CompiledTemplate, DEFAULT_DESCRIPTION, TEMPLATE_FORMAT_VERSION};
pub use tags::{build_tags, Tag, TagSet, STAGE_TAG};

use serde_json::{Map, Value};

use crate::definition::{DeployParameter, StackDefinition};

/// Run-wide inputs to compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    /// Active deployment stage.
    pub stage: String,
    /// Prefix for derived stack names, usually `<service>-<stage>`.
    pub prefix: String,
    /// Provider-wide default tags.
    pub default_tags: Option<Map<String, Value>>,
}

impl CompileContext {
    /// Creates a context.
    #[must_use]
    pub fn new(stage: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            prefix: prefix.into(),
            default_tags: None,
        }
    }

    /// Sets the provider-wide default tags.
    #[must_use]
    pub fn with_default_tags(mut self, tags: Map<String, Value>) -> Self {
        self.default_tags = Some(tags);
        self
    }
}

/// A stack ready to be sent to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStack {
    /// Logical name from the configuration.
    pub name: String,
    /// Full remote stack name.
    pub full_name: String,
    /// Rendered template.
    pub template: CompiledTemplate,
    /// Tags for the request.
    pub tags: TagSet,
    /// Parameters for the request.
    pub parameters: Vec<DeployParameter>,
}

/// Resolves the full remote name of a stack.
#[must_use]
pub fn full_stack_name(prefix: &str, logical_name: &str, definition: &StackDefinition) -> String {
    definition
        .stack_name
        .clone()
        .unwrap_or_else(|| format!("{prefix}-{logical_name}"))
}

/// Compiles one stack definition.
#[must_use]
pub fn compile_stack(name: &str, definition: &StackDefinition, ctx: &CompileContext) -> CompiledStack {
    CompiledStack {
        name: name.to_string(),
        full_name: full_stack_name(&ctx.prefix, name, definition),
        template: CompiledTemplate::from_definition(definition),
        tags: build_tags(&ctx.stage, definition.tags.as_ref(), ctx.default_tags.as_ref()),
        parameters: definition.deploy_parameters.clone(),
    }
}
