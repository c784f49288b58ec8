//! Capability descriptors: the metadata a server declares for each
//! resource, tool and prompt.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::schema::ParamSchema;

/// The three kinds of capability a server can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Resource,
    Tool,
    Prompt,
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CapabilityKind::Resource => "resource",
            CapabilityKind::Tool => "tool",
            CapabilityKind::Prompt => "prompt",
        };
        f.write_str(name)
    }
}

/// One exposed resource, tool or prompt.
#[derive(Debug, Clone)]
pub struct CapabilityDescriptor {
    /// Identifier, unique within its kind.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub description: Option<String>,
    pub spec: CapabilitySpec,
}

/// Kind-specific part of a descriptor.
#[derive(Debug, Clone)]
pub enum CapabilitySpec {
    Resource(ResourceSpec),
    Tool(ToolSpec),
    Prompt(PromptSpec),
}

impl CapabilityDescriptor {
    pub fn resource(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_spec(id, name, CapabilitySpec::Resource(ResourceSpec::default()))
    }

    pub fn tool(id: impl Into<String>, name: impl Into<String>, params: ParamSchema) -> Self {
        Self::with_spec(
            id,
            name,
            CapabilitySpec::Tool(ToolSpec {
                params,
                side_effects: false,
                invalidates: Vec::new(),
            }),
        )
    }

    pub fn prompt(id: impl Into<String>, name: impl Into<String>, steps: Vec<PromptStep>) -> Self {
        Self::with_spec(id, name, CapabilitySpec::Prompt(PromptSpec { steps }))
    }

    fn with_spec(id: impl Into<String>, name: impl Into<String>, spec: CapabilitySpec) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            spec,
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        match self.spec {
            CapabilitySpec::Resource(_) => CapabilityKind::Resource,
            CapabilitySpec::Tool(_) => CapabilityKind::Tool,
            CapabilitySpec::Prompt(_) => CapabilityKind::Prompt,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Default cache lifetime for a resource. No effect on other kinds.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        if let CapabilitySpec::Resource(spec) = &mut self.spec {
            spec.cache_ttl = Some(ttl);
        }
        self
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        if let CapabilitySpec::Resource(spec) = &mut self.spec {
            spec.mime_type = Some(mime.into());
        }
        self
    }

    /// Declare that a tool mutates data and drops the given cache entries on
    /// success. No effect on other kinds.
    pub fn invalidates(mut self, targets: impl IntoIterator<Item = CacheInvalidation>) -> Self {
        if let CapabilitySpec::Tool(spec) = &mut self.spec {
            spec.side_effects = true;
            spec.invalidates.extend(targets);
        }
        self
    }

    pub fn as_resource(&self) -> Option<&ResourceSpec> {
        match &self.spec {
            CapabilitySpec::Resource(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_tool(&self) -> Option<&ToolSpec> {
        match &self.spec {
            CapabilitySpec::Tool(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_prompt(&self) -> Option<&PromptSpec> {
        match &self.spec {
            CapabilitySpec::Prompt(spec) => Some(spec),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceSpec {
    pub mime_type: Option<String>,
    pub cache_ttl: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub params: ParamSchema,
    pub side_effects: bool,
    pub invalidates: Vec<CacheInvalidation>,
}

/// Cache entries a side-effecting tool drops after a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheInvalidation {
    /// Every cached read of the resource, whatever its parameters.
    Resource(String),
    /// The cached read of `resource` whose parameters are the tool arguments
    /// named in `bind`, copied under the same names.
    Scoped { resource: String, bind: Vec<String> },
    /// The whole cache.
    All,
}

impl CacheInvalidation {
    pub fn resource(id: impl Into<String>) -> Self {
        CacheInvalidation::Resource(id.into())
    }

    pub fn scoped(resource: impl Into<String>, bind: &[&str]) -> Self {
        CacheInvalidation::Scoped {
            resource: resource.into(),
            bind: bind.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub steps: Vec<PromptStep>,
}

/// One step of a guided prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<PromptField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Input,
    Display,
    Action,
}

/// A form field collected during an input step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl PromptStep {
    pub fn input(id: &str, label: &str, fields: Vec<PromptField>) -> Self {
        Self {
            id: id.to_string(),
            step_type: StepType::Input,
            label: label.to_string(),
            fields,
            computed_content: None,
        }
    }

    pub fn display(id: &str, label: &str, computed_content: &str) -> Self {
        Self {
            id: id.to_string(),
            step_type: StepType::Display,
            label: label.to_string(),
            fields: Vec::new(),
            computed_content: Some(computed_content.to_string()),
        }
    }
}

impl PromptField {
    pub fn required(id: &str, label: &str, field_type: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type: field_type.to_string(),
            required: true,
            options: Vec::new(),
            dynamic_options: None,
            placeholder: None,
        }
    }

    pub fn with_options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(label, value)| FieldOption {
                label: label.to_string(),
                value: value.to_string(),
            })
            .collect();
        self
    }

    /// Options filled from a named data source at presentation time.
    pub fn with_dynamic_options(mut self, source: &str) -> Self {
        self.dynamic_options = Some(source.to_string());
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }
}
