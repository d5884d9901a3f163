//! Validation of a built schema

use super::types::{ObjectType, Schema};
use std::collections::HashSet;

/// Validator for built schemas
pub struct SchemaValidator {
    /// Validation errors collected during validation
    errors: Vec<String>,
    /// Validation warnings collected during validation
    warnings: Vec<String>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Validate a complete schema
    pub fn validate(&mut self, schema: &Schema) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        let mut type_names = HashSet::new();
        for object in schema.objects() {
            if !type_names.insert(object.name.as_str()) {
                self.errors.push(format!(
                    "Type name '{}' is produced by more than one node type",
                    object.name
                ));
            }
            self.validate_object(object, schema);
        }

        self.validate_root(schema);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_object(&mut self, object: &ObjectType, schema: &Schema) {
        if !object.complete {
            self.errors
                .push(format!("Node '{}' was never completely built", object.node_type));
        }

        if object.fields.is_empty() {
            self.errors.push(format!(
                "Node '{}' must declare at least one field",
                object.node_type
            ));
            return;
        }

        let mut seen = HashSet::new();
        for field in &object.fields {
            if field.name.is_empty() {
                self.errors
                    .push(format!("Field name cannot be empty in node '{}'", object.node_type));
                continue;
            }

            if !seen.insert(field.name.as_str()) {
                self.errors.push(format!(
                    "Field '{}' is declared more than once in node '{}'",
                    field.name, object.node_type
                ));
            }

            if !is_identifier(&field.name) {
                self.warnings.push(format!(
                    "Field name '{}' in node '{}' is not a valid identifier",
                    field.name, object.node_type
                ));
            } else if field.name.starts_with(char::is_uppercase) {
                self.warnings.push(format!(
                    "Field name '{}' in node '{}' should start with a lowercase letter",
                    field.name, object.node_type
                ));
            }

            if let Some(id) = field.output.object_id() {
                if schema.get_object(id).is_none() {
                    self.errors.push(format!(
                        "Field '{}' in node '{}' references a type outside the schema",
                        field.name, object.node_type
                    ));
                }
            }
        }
    }

    fn validate_root(&mut self, schema: &Schema) {
        let mut names = HashSet::new();
        for root in schema.root_fields() {
            if root.name.is_empty() {
                self.errors
                    .push(format!("Node '{}' has an empty name", root.node_type));
                continue;
            }

            if !names.insert(root.name.as_str()) {
                self.errors
                    .push(format!("Node name '{}' is used by more than one node", root.name));
            }

            if root.name.starts_with(char::is_uppercase) {
                self.warnings.push(format!(
                    "Node name '{}' should start with a lowercase letter",
                    root.name
                ));
            }
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Result of schema validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Validation errors that must be fixed
    pub errors: Vec<String>,
    /// Validation warnings (suggestions for improvement)
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get total number of issues (errors + warnings)
    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}
