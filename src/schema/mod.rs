//! Declarative attribute metadata for resources
//!
//! A schema tells the driver which attributes are user input (required),
//! which are filled in by the resource (computed), which changes force
//! replacement, and which validators run on configured values.

use std::collections::BTreeMap;

use crate::diagnostics::Diagnostics;

pub mod validation;

pub use validation::Validator;

/// Plan-time behaviour of an attribute, applied by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanModifier {
    /// A changed value destroys and recreates the resource
    RequiresReplace,
    /// An unknown planned value keeps the prior state value
    UseStateForUnknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub description: &'static str,
    pub required: bool,
    pub computed: bool,
    pub plan_modifiers: Vec<PlanModifier>,
    pub validators: Vec<Validator>,
}

impl Attribute {
    /// A string the caller must set
    pub fn required_string(description: &'static str) -> Self {
        Self {
            description,
            required: true,
            computed: false,
            plan_modifiers: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// A string only the resource sets
    pub fn computed_string(description: &'static str) -> Self {
        Self {
            description,
            required: false,
            computed: true,
            plan_modifiers: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn with_plan_modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn requires_replace(&self) -> bool {
        self.plan_modifiers.contains(&PlanModifier::RequiresReplace)
    }

    pub fn use_state_for_unknown(&self) -> bool {
        self.plan_modifiers
            .contains(&PlanModifier::UseStateForUnknown)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub description: &'static str,
    pub attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new(description: &'static str) -> Self {
        Self {
            description,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Names of attributes whose change forces replacement
    pub fn requires_replace(&self) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.requires_replace())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Check configured values against the schema
    ///
    /// `value` resolves an attribute name to its configured value, `None`
    /// meaning null or unknown. Computed attributes without a value are
    /// skipped.
    pub fn validate<'a, F>(&self, value: F) -> Diagnostics
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut diags = Diagnostics::new();

        for (&name, attribute) in &self.attributes {
            match value(name) {
                None if attribute.required => diags.log_and_add_error(
                    "Missing required argument",
                    &format!("The argument {:?} is required, but no definition was found.", name),
                ),
                None => {}
                Some(v) => {
                    for validator in &attribute.validators {
                        if let Err(e) = validator.validate(v) {
                            diags.log_and_add_error(
                                "Invalid attribute value",
                                &format!("Attribute {} {}: {}", name, validator.description(), e),
                            );
                        }
                    }
                }
            }
        }

        diags
    }
}
