//! Declarative schemas for form payloads
//!
//! A [`Schema`] is built once (usually by a `*_schema()` function next to the
//! DTO it validates) and applied to a `serde_json::Value` with [`validate`].
//! Validation is exhaustive: every violated rule is reported in the same pass,
//! each issue keyed by the path of the offending value.
//!
//! ```rust,ignore
//! let schema = Schema::object()
//!     .field("name", Schema::string().min_length(5, "Nom trop court"))
//!     .optional("cost", Schema::number().min(0.0, "Coût négatif"));
//!
//! let result = validate(&json!({ "name": "abc" }), &schema.into());
//! assert!(!result.success);
//! ```

mod rules;

pub use rules::{NumberRules, StringRules};

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::sanitize::{sanitize, SanitizeMode};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

const REQUIRED_MESSAGE: &str = "Ce champ est requis";

// ============================================================================
// Results
// ============================================================================

/// One step of the path leading to a validated value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl ValidationIssue {
    /// Dotted form of the path, e.g. `steps.0.title`
    pub fn joined_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// First segment of the path (the top-level field name)
    pub fn root(&self) -> Option<&str> {
        match self.path.first() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }
}

/// Outcome of [`validate`].
///
/// `data` holds the transformed value (sanitized strings, defaults applied,
/// unknown object keys removed) and is present only on success.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub success: bool,
    pub data: Option<Value>,
    pub errors: Vec<ValidationIssue>,
}

impl Validation {
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

/// Validate `data` against `schema`, collecting every issue
pub fn validate(data: &Value, schema: &Schema) -> Validation {
    schema.validate(data)
}

// ============================================================================
// Schema tree
// ============================================================================

#[derive(Debug, Clone)]
pub enum Schema {
    String(StringSchema),
    Number(NumberSchema),
    Boolean(BooleanSchema),
    Enum(EnumSchema),
    Array(ArraySchema),
    Object(ObjectSchema),
}

macro_rules! into_schema {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for Schema {
                fn from(node: $node) -> Self {
                    Schema::$variant(node)
                }
            }
        )*
    };
}

into_schema! {
    StringSchema => String,
    NumberSchema => Number,
    BooleanSchema => Boolean,
    EnumSchema => Enum,
    ArraySchema => Array,
    ObjectSchema => Object,
}

impl Schema {
    pub fn string() -> StringSchema {
        StringSchema::default()
    }

    pub fn number() -> NumberSchema {
        NumberSchema::default()
    }

    pub fn boolean() -> BooleanSchema {
        BooleanSchema::default()
    }

    pub fn enumeration<I, S>(variants: I) -> EnumSchema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let variants: Vec<String> = variants.into_iter().map(Into::into).collect();
        let message = format!("Valeur invalide. Attendu : {}", variants.join(" | "));
        EnumSchema { variants, message }
    }

    pub fn array(item: impl Into<Schema>) -> ArraySchema {
        ArraySchema {
            item: Box::new(item.into()),
            min_items: None,
            max_items: None,
        }
    }

    pub fn object() -> ObjectSchema {
        ObjectSchema::default()
    }

    pub fn validate(&self, data: &Value) -> Validation {
        let mut path = Vec::new();
        let mut issues = Vec::new();
        let output = self.check(data, &mut path, &mut issues);

        if issues.is_empty() {
            Validation {
                success: true,
                data: Some(output),
                errors: issues,
            }
        } else {
            Validation {
                success: false,
                data: None,
                errors: issues,
            }
        }
    }

    fn check(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        match self {
            Self::String(node) => node.check_value(value, path, issues),
            Self::Number(node) => node.check(value, path, issues),
            Self::Boolean(node) => node.check(value, path, issues),
            Self::Enum(node) => node.check(value, path, issues),
            Self::Array(node) => node.check(value, path, issues),
            Self::Object(node) => node.check(value, path, issues),
        }
    }
}

fn report(path: &[PathSegment], issues: &mut Vec<ValidationIssue>, message: impl Into<String>) {
    issues.push(ValidationIssue {
        path: path.to_vec(),
        message: message.into(),
    });
}

// ============================================================================
// Strings
// ============================================================================

#[derive(Clone)]
struct StringCheck {
    message: String,
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl fmt::Debug for StringCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringCheck")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    rules: StringRules,
    patterns: Vec<(Regex, String)>,
    checks: Vec<StringCheck>,
    sanitize: Option<SanitizeMode>,
}

impl StringSchema {
    /// Reject blank (whitespace-only) values
    pub fn non_empty(mut self, message: impl Into<String>) -> Self {
        self.rules.required = Some(message.into());
        self
    }

    pub fn min_length(mut self, min: usize, message: impl Into<String>) -> Self {
        self.rules.min_length = Some((min, message.into()));
        self
    }

    pub fn max_length(mut self, max: usize, message: impl Into<String>) -> Self {
        self.rules.max_length = Some((max, message.into()));
        self
    }

    pub fn pattern(mut self, regex: &Regex, message: impl Into<String>) -> Self {
        self.patterns.push((regex.clone(), message.into()));
        self
    }

    pub fn email(self, message: impl Into<String>) -> Self {
        self.pattern(&EMAIL, message)
    }

    /// Custom predicate; the value is rejected when `predicate` returns false
    pub fn check<F>(mut self, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.checks.push(StringCheck {
            message: message.into(),
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Sanitize the value in the validated output
    pub fn sanitize(mut self, mode: SanitizeMode) -> Self {
        self.sanitize = Some(mode);
        self
    }

    fn check_value(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        let Some(text) = value.as_str() else {
            report(path, issues, "Type invalide : texte attendu");
            return Value::Null;
        };

        for message in self.rules.violations(text) {
            report(path, issues, message);
        }
        for (regex, message) in &self.patterns {
            if !regex.is_match(text) {
                report(path, issues, message.as_str());
            }
        }
        for check in &self.checks {
            if !(check.predicate)(text) {
                report(path, issues, check.message.as_str());
            }
        }

        match self.sanitize {
            Some(mode) => Value::String(sanitize(text, mode)),
            None => Value::String(text.to_string()),
        }
    }
}

// ============================================================================
// Numbers, booleans, enumerations
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    rules: NumberRules,
}

impl NumberSchema {
    pub fn min(mut self, min: f64, message: impl Into<String>) -> Self {
        self.rules.min = Some((min, message.into()));
        self
    }

    pub fn max(mut self, max: f64, message: impl Into<String>) -> Self {
        self.rules.max = Some((max, message.into()));
        self
    }

    pub fn integer(mut self, message: impl Into<String>) -> Self {
        self.rules.integer = Some(message.into());
        self
    }

    fn check(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        let Some(number) = value.as_f64() else {
            report(path, issues, "Type invalide : nombre attendu");
            return Value::Null;
        };

        for message in self.rules.violations(number) {
            report(path, issues, message);
        }
        value.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BooleanSchema {
    must_be_true: Option<String>,
}

impl BooleanSchema {
    pub fn must_be_true(mut self, message: impl Into<String>) -> Self {
        self.must_be_true = Some(message.into());
        self
    }

    fn check(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        let Some(flag) = value.as_bool() else {
            report(path, issues, "Type invalide : booléen attendu");
            return Value::Null;
        };

        if let Some(message) = &self.must_be_true {
            if !flag {
                report(path, issues, message.as_str());
            }
        }
        Value::Bool(flag)
    }
}

#[derive(Debug, Clone)]
pub struct EnumSchema {
    variants: Vec<String>,
    message: String,
}

impl EnumSchema {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn check(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        match value.as_str() {
            Some(text) if self.variants.iter().any(|v| v == text) => value.clone(),
            _ => {
                report(path, issues, self.message.as_str());
                Value::Null
            }
        }
    }
}

// ============================================================================
// Arrays
// ============================================================================

#[derive(Debug, Clone)]
pub struct ArraySchema {
    item: Box<Schema>,
    min_items: Option<(usize, String)>,
    max_items: Option<(usize, String)>,
}

impl ArraySchema {
    pub fn min_items(mut self, min: usize, message: impl Into<String>) -> Self {
        self.min_items = Some((min, message.into()));
        self
    }

    pub fn max_items(mut self, max: usize, message: impl Into<String>) -> Self {
        self.max_items = Some((max, message.into()));
        self
    }

    fn check(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        let Some(items) = value.as_array() else {
            report(path, issues, "Type invalide : liste attendue");
            return Value::Null;
        };

        if let Some((min, message)) = &self.min_items {
            if items.len() < *min {
                report(path, issues, message.as_str());
            }
        }
        if let Some((max, message)) = &self.max_items {
            if items.len() > *max {
                report(path, issues, message.as_str());
            }
        }

        let mut output = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            path.push(PathSegment::Index(index));
            output.push(self.item.check(item, path, issues));
            path.pop();
        }
        Value::Array(output)
    }
}

// ============================================================================
// Objects
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Presence {
    Required,
    Optional,
    Default(Value),
}

#[derive(Debug, Clone)]
struct FieldDef {
    name: String,
    schema: Schema,
    presence: Presence,
}

#[derive(Clone)]
struct Refinement {
    path: Vec<PathSegment>,
    message: String,
    predicate: Arc<dyn Fn(&Map<String, Value>) -> bool + Send + Sync>,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("path", &self.path)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Object schema.
///
/// A key holding `null` counts as absent. Keys not declared as fields are
/// dropped from the validated output unless [`ObjectSchema::passthrough`] is
/// set.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<FieldDef>,
    refinements: Vec<Refinement>,
    passthrough: bool,
}

impl ObjectSchema {
    pub fn field(self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.push_field(name.into(), schema.into(), Presence::Required)
    }

    pub fn optional(self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.push_field(name.into(), schema.into(), Presence::Optional)
    }

    /// Field filled with `default` when absent
    pub fn with_default(
        self,
        name: impl Into<String>,
        schema: impl Into<Schema>,
        default: Value,
    ) -> Self {
        self.push_field(name.into(), schema.into(), Presence::Default(default))
    }

    /// Cross-field rule over the whole object.
    ///
    /// A failure is reported at `path` (dotted, relative to this object).
    pub fn refine<F>(mut self, path: &str, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> bool + Send + Sync + 'static,
    {
        let path = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| PathSegment::Key(s.to_string()))
            .collect();
        self.refinements.push(Refinement {
            path,
            message: message.into(),
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Keep undeclared keys in the validated output
    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    fn push_field(mut self, name: String, schema: Schema, presence: Presence) -> Self {
        self.fields.retain(|f| f.name != name);
        self.fields.push(FieldDef {
            name,
            schema,
            presence,
        });
        self
    }

    fn check(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        let Some(input) = value.as_object() else {
            report(path, issues, "Type invalide : objet attendu");
            return Value::Null;
        };

        let mut output = if self.passthrough {
            input.clone()
        } else {
            Map::new()
        };

        for field in &self.fields {
            path.push(PathSegment::Key(field.name.clone()));
            match input.get(&field.name).filter(|v| !v.is_null()) {
                Some(raw) => {
                    let checked = field.schema.check(raw, path, issues);
                    output.insert(field.name.clone(), checked);
                }
                None => match &field.presence {
                    Presence::Required => report(path, issues, REQUIRED_MESSAGE),
                    Presence::Optional => {
                        output.remove(&field.name);
                    }
                    Presence::Default(default) => {
                        output.insert(field.name.clone(), default.clone());
                    }
                },
            }
            path.pop();
        }

        for refinement in &self.refinements {
            if !(refinement.predicate)(input) {
                let mut at = path.clone();
                at.extend(refinement.path.iter().cloned());
                report(&at, issues, refinement.message.as_str());
            }
        }

        Value::Object(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step_schema() -> Schema {
        Schema::object()
            .field("title", Schema::string().non_empty("Titre requis"))
            .field("required", Schema::boolean())
            .into()
    }

    #[test]
    fn test_reports_every_violation_in_one_pass() {
        let schema: Schema = Schema::object()
            .field("name", Schema::string().min_length(5, "Nom trop court"))
            .field("cost", Schema::number().min(0.0, "Coût négatif"))
            .field("kind", Schema::enumeration(["loi", "decret"]))
            .field("steps", Schema::array(step_schema()).min_items(1, "Une étape"))
            .into();

        let result = schema.validate(&json!({
            "name": "abc",
            "cost": -3,
            "kind": "autre",
            "steps": []
        }));

        assert!(!result.success);
        assert!(result.data.is_none());
        let paths: Vec<String> = result.errors.iter().map(|e| e.joined_path()).collect();
        assert_eq!(paths, vec!["name", "cost", "kind", "steps"]);
    }

    #[test]
    fn test_nested_array_paths_are_joined() {
        let schema: Schema = Schema::object()
            .field("steps", Schema::array(step_schema()))
            .into();

        let result = schema.validate(&json!({
            "steps": [
                { "title": "Dépôt", "required": true },
                { "title": " ", "required": "oui" }
            ]
        }));

        let paths: Vec<String> = result.errors.iter().map(|e| e.joined_path()).collect();
        assert_eq!(paths, vec!["steps.1.title", "steps.1.required"]);
        assert_eq!(result.errors[0].root(), Some("steps"));
    }

    #[test]
    fn test_missing_optional_and_default_fields() {
        let schema: Schema = Schema::object()
            .field("name", Schema::string())
            .optional("cost", Schema::number())
            .with_default("isPublic", Schema::boolean(), json!(true))
            .into();

        let missing = schema.validate(&json!({ "cost": null }));
        assert_eq!(missing.errors.len(), 1);
        assert_eq!(missing.errors[0].message, REQUIRED_MESSAGE);

        let ok = schema.validate(&json!({ "name": "x", "extra": 1 }));
        assert!(ok.success);
        assert_eq!(ok.data, Some(json!({ "name": "x", "isPublic": true })));
    }

    #[test]
    fn test_passthrough_keeps_unknown_keys() {
        let schema: Schema = Schema::object()
            .field("name", Schema::string())
            .passthrough()
            .into();
        let result = schema.validate(&json!({ "name": "x", "id": "a1" }));
        assert_eq!(result.data, Some(json!({ "name": "x", "id": "a1" })));
    }

    #[test]
    fn test_refinement_reports_on_target_path() {
        let schema: Schema = Schema::object()
            .field("password", Schema::string())
            .field("confirmPassword", Schema::string())
            .refine("confirmPassword", "Les mots de passe ne correspondent pas", |o| {
                o.get("password") == o.get("confirmPassword")
            })
            .into();

        let result = schema.validate(&json!({ "password": "a", "confirmPassword": "b" }));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].joined_path(), "confirmPassword");
    }

    #[test]
    fn test_sanitized_output() {
        let schema: Schema = Schema::object()
            .field("name", Schema::string().sanitize(SanitizeMode::Text))
            .into();
        let result = schema.validate(&json!({ "name": "<b>Permis</b>" }));
        assert_eq!(result.data, Some(json!({ "name": "Permis" })));
    }

    #[test]
    fn test_string_patterns_and_checks() {
        let schema: Schema = Schema::string()
            .email("Format d'email invalide")
            .check("Format d'email suspect détecté", |s| !s.contains(".."))
            .into();

        assert!(schema.validate(&json!("agent@dalil.dz")).success);
        let result = schema.validate(&json!("agent..x@dalil"));
        assert_eq!(
            result.messages(),
            vec!["Format d'email invalide", "Format d'email suspect détecté"]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let schema: Schema = Schema::number().into();
        let result = schema.validate(&json!("12"));
        assert_eq!(result.messages(), vec!["Type invalide : nombre attendu"]);
    }
}
