//! Terraform Schema Types
//!
//! Defines the schema types used for Terraform Plugin Protocol v6, the
//! validators and plan modifiers attached to attributes, and the codec that
//! moves values between Terraform attribute names and Kubernetes field names.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Path of an attribute inside a schema, e.g. `["metadata", "name"]`
pub type AttributePath = Vec<String>;

/// Attribute type for schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    /// Whole number, the only numeric kind Chaos Mesh fields use
    Int64,
    Bool,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// Whether a JSON value is acceptable for this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            AttributeType::String => value.is_string(),
            AttributeType::Int64 => value.as_i64().is_some(),
            AttributeType::Bool => value.is_boolean(),
            AttributeType::List(element) => value
                .as_array()
                .map(|items| items.iter().all(|item| element.accepts(item)))
                .unwrap_or(false),
            AttributeType::Map(element) => value
                .as_object()
                .map(|entries| entries.values().all(|item| element.accepts(item)))
                .unwrap_or(false),
        }
    }

    fn describe(&self) -> String {
        match self {
            AttributeType::String => "string".to_string(),
            AttributeType::Int64 => "whole number".to_string(),
            AttributeType::Bool => "bool".to_string(),
            AttributeType::List(element) => format!("list of {}", element.describe()),
            AttributeType::Map(element) => format!("map of {}", element.describe()),
        }
    }
}

static DNS_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("static regex")
});

static DNS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("static regex"));

static QUALIFIED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("static regex")
});

static LABEL_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").expect("static regex")
});

/// Attribute value validators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Validator {
    /// String must be one of the listed values
    OneOf { values: Vec<String> },
    /// Integer lower bound (inclusive)
    AtLeast { min: i64 },
    /// Integer range (inclusive)
    Between { min: i64, max: i64 },
    /// RFC 1123 subdomain, used for object names
    DnsSubdomain,
    /// RFC 1123 label, used for namespaces
    DnsLabel,
    /// Map with label keys and label values
    Labels,
    /// Map with annotation keys
    Annotations,
}

impl Validator {
    pub fn one_of(values: &[&str]) -> Self {
        Validator::OneOf {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Check a non-null value, returning a human readable reason on failure
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Validator::OneOf { values } => {
                let s = value.as_str().unwrap_or_default();
                if values.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(format!("value must be one of: {:?}, got: {:?}", values, s))
                }
            }
            Validator::AtLeast { min } => {
                let n = whole_number(value)?;
                if n >= *min {
                    Ok(())
                } else {
                    Err(format!("value must be at least {}, got: {}", min, n))
                }
            }
            Validator::Between { min, max } => {
                let n = whole_number(value)?;
                if (*min..=*max).contains(&n) {
                    Ok(())
                } else {
                    Err(format!("value must be between {} and {}, got: {}", min, max, n))
                }
            }
            Validator::DnsSubdomain => {
                let s = value.as_str().unwrap_or_default();
                if s.len() <= 253 && DNS_SUBDOMAIN.is_match(s) {
                    Ok(())
                } else {
                    Err(format!(
                        "{:?} must be a lowercase RFC 1123 subdomain of at most 253 characters",
                        s
                    ))
                }
            }
            Validator::DnsLabel => {
                let s = value.as_str().unwrap_or_default();
                if s.len() <= 63 && DNS_LABEL.is_match(s) {
                    Ok(())
                } else {
                    Err(format!(
                        "{:?} must be a lowercase RFC 1123 label of at most 63 characters",
                        s
                    ))
                }
            }
            Validator::Labels => {
                let entries = value.as_object().cloned().unwrap_or_default();
                for (key, v) in &entries {
                    check_qualified_key(key)?;
                    let v = v.as_str().unwrap_or_default();
                    if v.len() > 63 || !LABEL_VALUE.is_match(v) {
                        return Err(format!("label value {:?} of key {:?} is invalid", v, key));
                    }
                }
                Ok(())
            }
            Validator::Annotations => {
                let entries = value.as_object().cloned().unwrap_or_default();
                entries.keys().try_for_each(|key| check_qualified_key(key))
            }
        }
    }
}

fn whole_number(value: &Value) -> Result<i64, String> {
    value
        .as_i64()
        .ok_or_else(|| format!("value must be a whole number, got: {}", value))
}

/// Kubernetes qualified name: optional DNS subdomain prefix and a name part
fn check_qualified_key(key: &str) -> Result<(), String> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };
    if let Some(prefix) = prefix {
        if prefix.is_empty() || prefix.len() > 253 || !DNS_SUBDOMAIN.is_match(prefix) {
            return Err(format!("key {:?} has an invalid prefix", key));
        }
    }
    if name.is_empty() || name.len() > 63 || !QUALIFIED_NAME.is_match(name) {
        return Err(format!("key {:?} has an invalid name part", key));
    }
    Ok(())
}

/// Plan modifiers applied while planning a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    /// A change to this attribute replaces the resource
    RequiresReplace,
    /// Keep the prior value of a computed attribute instead of leaving it unknown
    UseStateForUnknown,
}

/// How nested attributes are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    Single,
    List,
}

/// Nested attribute type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedAttributes {
    pub nesting_mode: NestingMode,
    pub block: SchemaBlock,
}

/// Schema attribute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaAttribute {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub attr_type: Option<AttributeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_type: Option<NestedAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub validators: Vec<Validator>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub plan_modifiers: Vec<PlanModifier>,
    /// Field name on the Kubernetes side when it is not the camelCase form
    #[serde(skip)]
    pub json_name: Option<String>,
    /// Kept in Terraform state only, never sent to Kubernetes
    #[serde(skip)]
    pub state_only: bool,
}

impl SchemaAttribute {
    fn of_type(attr_type: Option<AttributeType>, nested_type: Option<NestedAttributes>) -> Self {
        Self {
            attr_type,
            nested_type,
            description: None,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            default: None,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
            json_name: None,
            state_only: false,
        }
    }

    pub fn string() -> Self {
        Self::of_type(Some(AttributeType::String), None)
    }

    pub fn int64() -> Self {
        Self::of_type(Some(AttributeType::Int64), None)
    }

    pub fn bool() -> Self {
        Self::of_type(Some(AttributeType::Bool), None)
    }

    pub fn list(element_type: AttributeType) -> Self {
        Self::of_type(Some(AttributeType::List(Box::new(element_type))), None)
    }

    pub fn map(element_type: AttributeType) -> Self {
        Self::of_type(Some(AttributeType::Map(Box::new(element_type))), None)
    }

    pub fn single_nested(block: SchemaBlock) -> Self {
        Self::of_type(
            None,
            Some(NestedAttributes {
                nesting_mode: NestingMode::Single,
                block,
            }),
        )
    }

    pub fn list_nested(block: SchemaBlock) -> Self {
        Self::of_type(
            None,
            Some(NestedAttributes {
                nesting_mode: NestingMode::List,
                block,
            }),
        )
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn one_of(self, values: &[&str]) -> Self {
        self.with_validator(Validator::one_of(values))
    }

    pub fn at_least(self, min: i64) -> Self {
        self.with_validator(Validator::AtLeast { min })
    }

    pub fn between(self, min: i64, max: i64) -> Self {
        self.with_validator(Validator::Between { min, max })
    }

    pub fn with_plan_modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    pub fn json_name(mut self, name: &str) -> Self {
        self.json_name = Some(name.to_string());
        self
    }

    pub fn state_only(mut self) -> Self {
        self.state_only = true;
        self
    }

    /// Kubernetes field name for an attribute declared as `tf_name`
    pub fn json_key(&self, tf_name: &str) -> String {
        self.json_name
            .clone()
            .unwrap_or_else(|| lower_camel_case(tf_name))
    }

    fn has_modifier(&self, modifier: PlanModifier) -> bool {
        self.plan_modifiers.contains(&modifier)
    }

    fn to_api_value(&self, value: &Value) -> Value {
        match &self.nested_type {
            Some(nested) => match nested.nesting_mode {
                NestingMode::Single => nested.block.to_api_object(value),
                NestingMode::List => Value::Array(
                    value
                        .as_array()
                        .map(|items| items.iter().map(|i| nested.block.to_api_object(i)).collect())
                        .unwrap_or_default(),
                ),
            },
            None => value.clone(),
        }
    }

    fn from_api_value(&self, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        match &self.nested_type {
            Some(nested) => match nested.nesting_mode {
                NestingMode::Single => nested.block.from_api_object(value),
                NestingMode::List => match value.as_array() {
                    Some(items) => Value::Array(
                        items.iter().map(|i| nested.block.from_api_object(i)).collect(),
                    ),
                    None => Value::Null,
                },
            },
            None => value.clone(),
        }
    }

    fn validate_value(&self, value: &Value, path: &mut AttributePath, diags: &mut Vec<Diagnostic>) {
        if let Some(nested) = &self.nested_type {
            match nested.nesting_mode {
                NestingMode::Single => nested.block.validate_at(value, path, diags),
                NestingMode::List => match value.as_array() {
                    Some(items) => {
                        for (index, item) in items.iter().enumerate() {
                            path.push(index.to_string());
                            nested.block.validate_at(item, path, diags);
                            path.pop();
                        }
                    }
                    None => diags.push(
                        Diagnostic::error("Incorrect attribute value type")
                            .with_detail("expected a list of objects")
                            .with_attribute(path.clone()),
                    ),
                },
            }
            return;
        }

        if let Some(attr_type) = &self.attr_type {
            if !attr_type.accepts(value) {
                diags.push(
                    Diagnostic::error("Incorrect attribute value type")
                        .with_detail(&format!("expected {}", attr_type.describe()))
                        .with_attribute(path.clone()),
                );
                return;
            }
        }

        for validator in &self.validators {
            if let Err(reason) = validator.check(value) {
                diags.push(
                    Diagnostic::error("Invalid Attribute Value")
                        .with_detail(&format!("Attribute {} {}", path.join("."), reason))
                        .with_attribute(path.clone()),
                );
            }
        }
    }
}

/// `conditional_branches` -> `conditionalBranches`
pub fn lower_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Block of attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaBlock {
    pub attributes: BTreeMap<String, SchemaAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaBlock {
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
            description: None,
        }
    }

    pub fn with_attribute(mut self, name: &str, attr: SchemaAttribute) -> Self {
        self.attributes.insert(name.to_string(), attr);
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Rename Terraform attributes to Kubernetes fields, dropping nulls
    pub fn to_api_object(&self, state: &Value) -> Value {
        let Some(obj) = state.as_object() else {
            return Value::Null;
        };
        let mut out = Map::new();
        for (name, attr) in &self.attributes {
            if attr.state_only {
                continue;
            }
            match obj.get(name) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    out.insert(attr.json_key(name), attr.to_api_value(value));
                }
            }
        }
        Value::Object(out)
    }

    /// Rename Kubernetes fields to Terraform attributes and project onto the schema
    pub fn from_api_object(&self, object: &Value) -> Value {
        let Some(obj) = object.as_object() else {
            return Value::Null;
        };
        let mut out = Map::new();
        for (name, attr) in &self.attributes {
            let value = if attr.state_only {
                Value::Null
            } else {
                obj.get(&attr.json_key(name))
                    .map(|v| attr.from_api_value(v))
                    .unwrap_or(Value::Null)
            };
            out.insert(name.clone(), value);
        }
        Value::Object(out)
    }

    /// Validate a configuration object against this block
    pub fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        self.validate_at(config, &mut Vec::new(), &mut diags);
        diags
    }

    fn validate_at(&self, value: &Value, path: &mut AttributePath, diags: &mut Vec<Diagnostic>) {
        let Some(obj) = value.as_object() else {
            diags.push(
                Diagnostic::error("Incorrect attribute value type")
                    .with_detail("expected an object")
                    .with_attribute(path.clone()),
            );
            return;
        };

        for key in obj.keys() {
            if !self.attributes.contains_key(key) {
                let mut at = path.clone();
                at.push(key.clone());
                diags.push(
                    Diagnostic::error("Unsupported argument")
                        .with_detail(&format!("An argument named {:?} is not expected here", key))
                        .with_attribute(at),
                );
            }
        }

        for (name, attr) in &self.attributes {
            path.push(name.clone());
            match obj.get(name) {
                None | Some(Value::Null) => {
                    if attr.required {
                        diags.push(
                            Diagnostic::error("Missing required argument")
                                .with_detail(&format!(
                                    "The argument {:?} is required, but no definition was found",
                                    path.join(".")
                                ))
                                .with_attribute(path.clone()),
                        );
                    }
                }
                Some(value) => {
                    if attr.computed && !attr.optional && !attr.required {
                        diags.push(
                            Diagnostic::error("Invalid configuration for read-only attribute")
                                .with_detail(&format!("{:?} is computed", path.join(".")))
                                .with_attribute(path.clone()),
                        );
                    } else {
                        attr.validate_value(value, path, diags);
                    }
                }
            }
            path.pop();
        }
    }

    /// Apply plan modifiers, returning the planned value and the paths
    /// whose change requires replacing the resource
    pub fn plan(&self, prior: &Value, proposed: &Value) -> (Value, Vec<AttributePath>) {
        let mut replace = Vec::new();
        let planned = self.plan_at(prior, proposed, &mut Vec::new(), &mut replace);
        (planned, replace)
    }

    fn plan_at(
        &self,
        prior: &Value,
        proposed: &Value,
        path: &mut AttributePath,
        replace: &mut Vec<AttributePath>,
    ) -> Value {
        let Some(proposed_obj) = proposed.as_object() else {
            return proposed.clone();
        };
        let mut planned = proposed_obj.clone();

        for (name, attr) in &self.attributes {
            let before = prior.get(name).unwrap_or(&Value::Null);
            let after = proposed_obj.get(name).unwrap_or(&Value::Null);
            path.push(name.clone());

            if attr.computed && after.is_null() && attr.has_modifier(PlanModifier::UseStateForUnknown)
            {
                planned.insert(name.clone(), before.clone());
            } else if let Some(nested) = &attr.nested_type {
                if nested.nesting_mode == NestingMode::Single && after.is_object() {
                    let value = nested.block.plan_at(before, after, path, replace);
                    planned.insert(name.clone(), value);
                }
            }

            if attr.has_modifier(PlanModifier::RequiresReplace) && !prior.is_null() && before != after
            {
                replace.push(path.clone());
            }
            path.pop();
        }

        Value::Object(planned)
    }
}

impl Default for SchemaBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Resource schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSchema {
    pub version: i64,
    pub block: SchemaBlock,
}

impl ResourceSchema {
    pub fn new(version: i64, block: SchemaBlock) -> Self {
        Self { version, block }
    }
}

/// Provider schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSchema {
    pub provider: SchemaBlock,
    pub resource_schemas: BTreeMap<String, ResourceSchema>,
    pub data_source_schemas: BTreeMap<String, ResourceSchema>,
}

impl ProviderSchema {
    pub fn new(provider: SchemaBlock) -> Self {
        Self {
            provider,
            resource_schemas: BTreeMap::new(),
            data_source_schemas: BTreeMap::new(),
        }
    }

    pub fn with_resource(mut self, name: &str, schema: ResourceSchema) -> Self {
        self.resource_schemas.insert(name.to_string(), schema);
        self
    }

    pub fn with_data_source(mut self, name: &str, schema: ResourceSchema) -> Self {
        self.data_source_schemas.insert(name.to_string(), schema);
        self
    }
}

// ============================================================================
// Terraform Plugin Protocol Messages
// ============================================================================

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: i64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcResponse {
    pub fn success(id: i64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: i64, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.to_string(),
            }),
        }
    }

    /// Successful response carrying only diagnostics
    pub fn diagnostics(id: i64, diagnostics: Vec<Diagnostic>) -> Self {
        Self::success(id, serde_json::json!({ "diagnostics": diagnostics }))
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticSeverity {
    Invalid,
    Error,
    Warning,
}

/// Diagnostic message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: &str) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.to_string(),
            detail: None,
            attribute: None,
        }
    }

    pub fn with_detail(mut self, detail: &str) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// Whether any diagnostic in the list is an error
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_block() -> SchemaBlock {
        SchemaBlock::new()
            .with_attribute("id", SchemaAttribute::string().computed().state_only())
            .with_attribute(
                "metadata",
                SchemaAttribute::single_nested(
                    SchemaBlock::new()
                        .with_attribute(
                            "name",
                            SchemaAttribute::string()
                                .required()
                                .with_validator(Validator::DnsSubdomain)
                                .with_plan_modifier(PlanModifier::RequiresReplace),
                        )
                        .with_attribute(
                            "labels",
                            SchemaAttribute::map(AttributeType::String)
                                .optional()
                                .with_validator(Validator::Labels),
                        ),
                )
                .required(),
            )
            .with_attribute(
                "aws_chaos",
                SchemaAttribute::single_nested(
                    SchemaBlock::new()
                        .with_attribute(
                            "action",
                            SchemaAttribute::string()
                                .required()
                                .one_of(&["ec2-stop", "ec2-restart", "detach-volume"]),
                        )
                        .with_attribute("volume_id", SchemaAttribute::string().optional().json_name("volumeID"))
                        .with_attribute("ec2_instance", SchemaAttribute::string().optional()),
                )
                .optional(),
            )
            .with_attribute(
                "templates",
                SchemaAttribute::list_nested(
                    SchemaBlock::new()
                        .with_attribute("template_type", SchemaAttribute::string().required())
                        .with_attribute("grace_period", SchemaAttribute::int64().optional().at_least(0)),
                )
                .optional(),
            )
    }

    #[test]
    fn test_schema_attribute_builder() {
        let attr = SchemaAttribute::string()
            .with_description("Test attribute")
            .required()
            .with_plan_modifier(PlanModifier::RequiresReplace);

        assert!(attr.required);
        assert!(!attr.optional);
        assert!(!attr.sensitive);
        assert!(attr.has_modifier(PlanModifier::RequiresReplace));
        assert_eq!(attr.description, Some("Test attribute".to_string()));
    }

    #[test]
    fn test_lower_camel_case() {
        assert_eq!(lower_camel_case("conditional_branches"), "conditionalBranches");
        assert_eq!(lower_camel_case("ec2_instance"), "ec2Instance");
        assert_eq!(lower_camel_case("entry"), "entry");
    }

    #[test]
    fn test_to_api_object_renames_and_drops_nulls() {
        let state = json!({
            "id": "bar/foo",
            "metadata": {"name": "bar", "labels": {"app.kubernetes.io/name": "x"}},
            "aws_chaos": {"action": "detach-volume", "volume_id": "vol-1", "ec2_instance": null},
            "templates": [{"template_type": "Serial", "grace_period": null}]
        });

        let api = sample_block().to_api_object(&state);

        assert_eq!(
            api,
            json!({
                "metadata": {"name": "bar", "labels": {"app.kubernetes.io/name": "x"}},
                "awsChaos": {"action": "detach-volume", "volumeID": "vol-1"},
                "templates": [{"templateType": "Serial"}]
            })
        );
    }

    #[test]
    fn test_from_api_object_projects_onto_schema() {
        let api = json!({
            "metadata": {"name": "bar", "uid": "1234", "resourceVersion": "7"},
            "awsChaos": {"action": "ec2-stop", "volumeID": "vol-1"},
            "status": {"phase": "Running"}
        });

        let state = sample_block().from_api_object(&api);

        assert_eq!(
            state,
            json!({
                "id": null,
                "metadata": {"name": "bar", "labels": null},
                "aws_chaos": {"action": "ec2-stop", "volume_id": "vol-1", "ec2_instance": null},
                "templates": null
            })
        );
    }

    #[test]
    fn test_validate_reports_paths() {
        let config = json!({
            "metadata": {"name": "Not_Valid", "labels": {"ok": "yes"}},
            "aws_chaos": {"action": "explode"},
            "templates": [{"template_type": "Serial", "grace_period": -1}, {}],
            "bogus": true
        });

        let diags = sample_block().validate(&config);
        let paths: Vec<AttributePath> = diags.iter().filter_map(|d| d.attribute.clone()).collect();

        assert!(paths.contains(&vec!["bogus".to_string()]));
        assert!(paths.contains(&vec!["metadata".to_string(), "name".to_string()]));
        assert!(paths.contains(&vec!["aws_chaos".to_string(), "action".to_string()]));
        assert!(paths.contains(&vec![
            "templates".to_string(),
            "0".to_string(),
            "grace_period".to_string()
        ]));
        assert!(paths.contains(&vec![
            "templates".to_string(),
            "1".to_string(),
            "template_type".to_string()
        ]));
        assert_eq!(diags.len(), 5);
        assert!(has_errors(&diags));
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        let config = json!({
            "id": null,
            "metadata": {"name": "workflow-1", "labels": {"team": "sre"}},
            "aws_chaos": {"action": "ec2-stop", "ec2_instance": "i-1"}
        });

        assert!(sample_block().validate(&config).is_empty());
    }

    #[test]
    fn test_validate_rejects_computed_attribute() {
        let config = json!({"id": "x", "metadata": {"name": "a"}});
        let diags = sample_block().validate(&config);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute, Some(vec!["id".to_string()]));
    }

    #[test]
    fn test_validators() {
        assert!(Validator::Between { min: 0, max: 100 }.check(&json!(50)).is_ok());
        assert!(Validator::Between { min: 0, max: 100 }.check(&json!(101)).is_err());
        assert!(Validator::AtLeast { min: 1 }.check(&json!(1.5)).is_err());
        assert!(Validator::DnsLabel.check(&json!("chaos-testing")).is_ok());
        assert!(Validator::DnsLabel.check(&json!("a.b")).is_err());
        assert!(Validator::DnsSubdomain.check(&json!("a.b")).is_ok());
        assert!(Validator::Annotations
            .check(&json!({"example.com/owner": "anything at all"}))
            .is_ok());
        assert!(Validator::Annotations.check(&json!({"/owner": "x"})).is_err());
        assert!(Validator::Labels.check(&json!({"tier": "not valid!"})).is_err());
    }

    #[test]
    fn test_int64_rejects_fractions() {
        assert!(AttributeType::Int64.accepts(&json!(3)));
        assert!(AttributeType::Int64.accepts(&json!(-1)));
        assert!(!AttributeType::Int64.accepts(&json!(1.5)));
        assert!(!AttributeType::Int64.accepts(&json!("3")));

        let config = json!({
            "metadata": {"name": "a"},
            "templates": [{"template_type": "PodChaos", "grace_period": 1.5}]
        });
        let diags = sample_block().validate(&config);

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Incorrect attribute value type");
        assert_eq!(
            diags[0].attribute,
            Some(vec![
                "templates".to_string(),
                "0".to_string(),
                "grace_period".to_string()
            ])
        );
    }

    #[test]
    fn test_plan_requires_replace_on_name_change() {
        let prior = json!({"id": "a/ns", "metadata": {"name": "a", "labels": null}});
        let proposed = json!({"id": null, "metadata": {"name": "b", "labels": null}});

        let (_, replace) = sample_block().plan(&prior, &proposed);

        assert_eq!(replace, vec![vec!["metadata".to_string(), "name".to_string()]]);
    }

    #[test]
    fn test_plan_without_prior_never_replaces() {
        let proposed = json!({"metadata": {"name": "b"}});
        let (planned, replace) = sample_block().plan(&Value::Null, &proposed);
        assert!(replace.is_empty());
        assert_eq!(planned, proposed);
    }

    #[test]
    fn test_rpc_response_error() {
        let response = RpcResponse::error(1, -32600, "Invalid request");
        assert!(response.result.is_none());
        assert_eq!(response.error.map(|e| e.code), Some(-32600));
    }
}
