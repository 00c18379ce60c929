//! Template storage and the rendering walk.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tenantforge_core::InfrastructureKind;

use crate::builtin;
use crate::error::{Result, TemplateError};

/// A declarative deployment template.
///
/// The spec tree is arbitrary nested JSON; `{{variable}}` placeholders are
/// recognized in string leaves only. Each template declares the variables
/// it cannot render without.
#[derive(Debug, Clone)]
pub struct DeploymentTemplate {
    /// Template name, unique per infrastructure kind.
    pub name: String,
    /// Infrastructure kind this template targets.
    pub kind: InfrastructureKind,
    /// Variables that must be present for rendering to proceed.
    pub required_variables: Vec<String>,
    /// The declarative spec tree.
    pub spec: Value,
}

/// Registry and renderer for deployment templates.
///
/// Ships with one default template per infrastructure kind; additional
/// templates can be registered at runtime without code changes.
#[derive(Debug)]
pub struct TemplateManager {
    templates: HashMap<(String, InfrastructureKind), DeploymentTemplate>,
}

impl TemplateManager {
    /// Name of the built-in templates.
    pub const DEFAULT_TEMPLATE: &'static str = "tenant-stack";

    /// Create a manager holding the two built-in templates.
    #[must_use]
    pub fn new() -> Self {
        let mut manager = Self {
            templates: HashMap::new(),
        };

        // Built-ins are well-formed by construction.
        let _ = manager.register(builtin::kubernetes_template());
        let _ = manager.register(builtin::compose_template());
        manager
    }

    /// Register a template, replacing any previous one with the same
    /// `(name, kind)` key.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::EmptyName`] if the template has no name.
    pub fn register(&mut self, template: DeploymentTemplate) -> Result<()> {
        if template.name.is_empty() {
            return Err(TemplateError::EmptyName);
        }

        self.templates
            .insert((template.name.clone(), template.kind), template);
        Ok(())
    }

    /// Look up a registered template.
    #[must_use]
    pub fn get(&self, name: &str, kind: InfrastructureKind) -> Option<&DeploymentTemplate> {
        self.templates.get(&(name.to_string(), kind))
    }

    /// Render a template with the supplied variables.
    ///
    /// Missing required variables are collected and reported together before
    /// any substitution happens; a successful render never contains a
    /// required placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownTemplate`] for an unregistered
    /// `(name, kind)` pair and [`TemplateError::MissingVariables`] listing
    /// every absent required variable.
    pub fn render(
        &self,
        name: &str,
        kind: InfrastructureKind,
        variables: &BTreeMap<String, String>,
    ) -> Result<Value> {
        let template = self
            .get(name, kind)
            .ok_or_else(|| TemplateError::UnknownTemplate {
                name: name.to_string(),
                kind,
            })?;

        let missing: Vec<String> = template
            .required_variables
            .iter()
            .filter(|v| !variables.contains_key(*v))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(TemplateError::MissingVariables {
                template: template.name.clone(),
                missing,
            });
        }

        Ok(substitute(&template.spec, variables))
    }
}

impl Default for TemplateManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively substitute `{{variable}}` placeholders in string leaves.
fn substitute(value: &Value, variables: &BTreeMap<String, String>) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str(s, variables)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, variables)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, variables)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Replace every `{{name}}` occurrence in one string leaf.
///
/// Unknown placeholders are left untouched so a render is always a pure
/// function of (template, variables).
fn substitute_str(input: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        if let Some(end) = after.find("}}") {
            let key = after[..end].trim();
            match variables.get(key) {
                Some(replacement) => out.push_str(replacement),
                None => {
                    out.push_str("{{");
                    out.push_str(&after[..end]);
                    out.push_str("}}");
                }
            }
            rest = &after[end + 2..];
        } else {
            out.push_str("{{");
            rest = after;
        }
    }

    out.push_str(rest);
    out
}
