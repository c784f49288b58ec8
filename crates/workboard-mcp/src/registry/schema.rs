//! Declarative parameter schemas for tools and parameterized resources.
//!
//! Validation checks presence and type only, and reports every violation
//! in one pass so clients can fix a call in a single round trip.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{McpError, McpResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON type name of a value, as reported in a type mismatch.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: Option<String>,
}

/// One failed parameter check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum ParamViolation {
    Missing {
        parameter: String,
    },
    TypeMismatch {
        parameter: String,
        expected: ParamType,
        found: String,
    },
}

impl ParamViolation {
    pub fn parameter(&self) -> &str {
        match self {
            ParamViolation::Missing { parameter } => parameter,
            ParamViolation::TypeMismatch { parameter, .. } => parameter,
        }
    }
}

impl std::fmt::Display for ParamViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamViolation::Missing { parameter } => {
                write!(f, "missing required parameter '{parameter}'")
            }
            ParamViolation::TypeMismatch {
                parameter,
                expected,
                found,
            } => write!(f, "parameter '{parameter}' expected {expected}, found {found}"),
        }
    }
}

/// Ordered parameter list. Order is the order clients see in listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSchema {
    params: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.push(name, param_type, true, description)
    }

    pub fn optional(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.push(name, param_type, false, description)
    }

    fn push(
        mut self,
        name: &str,
        param_type: ParamType,
        required: bool,
        description: &str,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            param_type,
            required,
            description: (!description.is_empty()).then(|| description.to_string()),
        });
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Reject schemas that declare a parameter name twice.
    pub fn check_unique(&self) -> McpResult<()> {
        for (i, spec) in self.params.iter().enumerate() {
            if self.params[..i].iter().any(|p| p.name == spec.name) {
                return Err(McpError::InvalidDescriptor(format!(
                    "parameter '{}' declared twice",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    /// Check `args` against the schema and collect every violation, in
    /// declaration order. A `null` value counts as absent. Arguments with no
    /// matching declaration are ignored.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<(), Vec<ParamViolation>> {
        let mut violations = Vec::new();
        for spec in &self.params {
            match args.get(&spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        violations.push(ParamViolation::Missing {
                            parameter: spec.name.clone(),
                        });
                    }
                }
                Some(value) if !spec.param_type.accepts(value) => {
                    violations.push(ParamViolation::TypeMismatch {
                        parameter: spec.name.clone(),
                        expected: spec.param_type,
                        found: json_type_name(value).to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// JSON Schema object advertised as a tool's `inputSchema`.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for spec in &self.params {
            let mut prop = json!({ "type": spec.param_type.as_str() });
            if let Some(description) = &spec.description {
                prop["description"] = json!(description);
            }
            properties.insert(spec.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = json!({ "type": "object", "properties": properties });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_schema() -> ParamSchema {
        ParamSchema::new()
            .required("board_id", ParamType::Integer, "Board ID")
            .required("item_name", ParamType::String, "Item name")
            .optional("group_id", ParamType::String, "")
    }

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_arguments_pass() {
        let schema = item_schema();
        assert!(schema
            .validate(&args(json!({"board_id": 1, "item_name": "Ship it"})))
            .is_ok());
    }

    #[test]
    fn test_all_missing_parameters_reported_together() {
        let violations = item_schema().validate(&Map::new()).unwrap_err();
        let names: Vec<&str> = violations.iter().map(|v| v.parameter()).collect();
        assert_eq!(names, vec!["board_id", "item_name"]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let violations = item_schema()
            .validate(&args(json!({"board_id": null, "item_name": "x"})))
            .unwrap_err();
        assert_eq!(
            violations,
            vec![ParamViolation::Missing {
                parameter: "board_id".to_string()
            }]
        );
    }

    #[test]
    fn test_type_mismatch_names_expected_and_found() {
        let violations = item_schema()
            .validate(&args(json!({"board_id": "one", "item_name": 5, "group_id": true})))
            .unwrap_err();
        assert_eq!(violations.len(), 3);
        assert_eq!(
            violations[0],
            ParamViolation::TypeMismatch {
                parameter: "board_id".to_string(),
                expected: ParamType::Integer,
                found: "string".to_string(),
            }
        );
        assert_eq!(
            violations[1].to_string(),
            "parameter 'item_name' expected string, found integer"
        );
    }

    #[test]
    fn test_float_is_not_integer() {
        let schema = ParamSchema::new().required("n", ParamType::Integer, "");
        let violations = schema.validate(&args(json!({"n": 1.5}))).unwrap_err();
        assert!(matches!(
            &violations[0],
            ParamViolation::TypeMismatch { found, .. } if found == "number"
        ));
        let schema = ParamSchema::new().required("n", ParamType::Number, "");
        assert!(schema.validate(&args(json!({"n": 3}))).is_ok());
    }

    #[test]
    fn test_unknown_arguments_ignored() {
        let schema = item_schema();
        assert!(schema
            .validate(&args(json!({"board_id": 1, "item_name": "x", "extra": [1, 2]})))
            .is_ok());
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let schema = ParamSchema::new()
            .required("id", ParamType::String, "")
            .optional("id", ParamType::Integer, "");
        assert!(matches!(
            schema.check_unique(),
            Err(McpError::InvalidDescriptor(_))
        ));
        assert!(item_schema().check_unique().is_ok());
    }

    #[test]
    fn test_json_schema_lists_required() {
        let schema = item_schema().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["board_id"]["type"], "integer");
        assert_eq!(schema["properties"]["board_id"]["description"], "Board ID");
        assert!(schema["properties"]["group_id"].get("description").is_none());
        assert_eq!(schema["required"], json!(["board_id", "item_name"]));
    }

    #[test]
    fn test_violation_serializes_with_problem_tag() {
        let v = ParamViolation::Missing {
            parameter: "x".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"problem": "missing", "parameter": "x"})
        );
        let v = ParamViolation::TypeMismatch {
            parameter: "n".to_string(),
            expected: ParamType::Integer,
            found: "string".to_string(),
        };
        assert_eq!(serde_json::to_value(&v).unwrap()["problem"], "type_mismatch");
    }
}
