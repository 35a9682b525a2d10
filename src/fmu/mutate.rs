// src/fmu/mutate.rs

//! Descriptor edits
//!
//! Both edits take the current descriptor by reference and hand back an
//! updated copy, so a failed edit leaves the caller's descriptor exactly as
//! it was.

use crate::error::{Error, Result};
use crate::fmu::descriptor::{
    Causality, ModelDescriptor, ScalarType, Variability, MODEL_STRUCTURE, MODEL_VARIABLES,
    SCALAR_VARIABLE,
};
use crate::fmu::xml::{Element, Node};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;
use tracing::{debug, info};

/// Typed value slot of a new variable, with an optional start value
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Real(Option<f64>),
    Integer(Option<i32>),
    Boolean(Option<bool>),
    String(Option<String>),
}

impl TypedValue {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Real(_) => ScalarType::Real,
            Self::Integer(_) => ScalarType::Integer,
            Self::Boolean(_) => ScalarType::Boolean,
            Self::String(_) => ScalarType::String,
        }
    }

    /// Start value rendered as xs:double / xs:int / xs:boolean / xs:string
    pub fn start_text(&self) -> Option<String> {
        match self {
            Self::Real(v) => v.map(format_real),
            Self::Integer(v) => v.map(|v| v.to_string()),
            Self::Boolean(v) => v.map(|v| v.to_string()),
            Self::String(v) => v.clone(),
        }
    }
}

fn format_real(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let inf = if value > 0.0 { "INF" } else { "-INF" };
        inf.to_string()
    } else {
        format!("{:?}", value)
    }
}

/// A variable to add to the descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub name: String,
    pub description: String,
    pub causality: Causality,
    pub variability: Variability,
    pub value: TypedValue,
}

impl VariableSpec {
    pub fn new(
        name: impl Into<String>,
        causality: Causality,
        variability: Variability,
        value: TypedValue,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            causality,
            variability,
            value,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Build the declaration element for the given FMI generation
    fn to_element(&self, value_reference: u32, fmi3: bool) -> Element {
        let scalar_type = self.value.scalar_type();
        let tag = if fmi3 {
            scalar_type.fmi3_element()
        } else {
            SCALAR_VARIABLE
        };

        let mut element = Element::new(tag)
            .with_attr("name", self.name.as_str())
            .with_attr("valueReference", value_reference.to_string());
        if !self.description.is_empty() {
            element.set_attr("description", self.description.as_str());
        }
        element.set_attr("causality", self.causality.as_str());
        element.set_attr("variability", self.variability.as_str());

        let start = self.value.start_text();
        if fmi3 {
            match (scalar_type, start) {
                (ScalarType::String, Some(s)) => {
                    element = element.with_child(Element::new("Start").with_attr("value", s));
                }
                (_, Some(s)) => element.set_attr("start", s),
                (_, None) => {}
            }
        } else {
            let mut typed = Element::new(scalar_type.fmi2_element());
            if let Some(s) = start {
                typed.set_attr("start", s);
            }
            element = element.with_child(typed);
        }

        element
    }
}

/// Provenance applied to the descriptor root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataStamp {
    /// Appended to the existing description; empty leaves it alone
    pub description_suffix: String,
    /// New `generationTool` value
    pub generation_tool: String,
    /// New `generationDateAndTime` value
    pub timestamp: DateTime<Utc>,
}

/// Add `specs` to the descriptor's variable list
///
/// New value references continue after the largest existing one, in input
/// order. Every name is checked against the document (and the rest of the
/// batch) before anything is changed.
pub fn inject_variables(
    descriptor: &ModelDescriptor,
    specs: &[VariableSpec],
) -> Result<ModelDescriptor> {
    info!("[3/6] Injecting {} variables", specs.len());

    let mut names: HashSet<&str> = descriptor.variable_names().into_iter().collect();
    for spec in specs {
        if spec.name.trim().is_empty() {
            return Err(Error::InvalidConfig("variable name must not be empty".to_string()));
        }
        if !names.insert(spec.name.as_str()) {
            return Err(Error::DuplicateName(spec.name.clone()));
        }
    }

    let first_ref = match descriptor.value_references()?.into_iter().max() {
        Some(max) => max.checked_add(1),
        None => Some(0),
    };
    let refs: Vec<u32> = (0..specs.len())
        .map(|offset| first_ref.and_then(|first| first.checked_add(offset as u32)))
        .collect::<Option<_>>()
        .ok_or_else(|| {
            Error::DescriptorFormat("no value references left to assign".to_string())
        })?;

    let mut updated = descriptor.clone();
    if specs.is_empty() {
        return Ok(updated);
    }

    let fmi3 = updated.is_fmi3();
    let mut outputs = Vec::new();

    let root = updated.root_mut();
    let insert_at = root
        .child_position(MODEL_STRUCTURE)
        .unwrap_or(root.children.len());
    let variables = root.ensure_child(MODEL_VARIABLES, insert_at);

    for (spec, vr) in specs.iter().zip(refs) {
        variables
            .children
            .push(Node::Element(spec.to_element(vr, fmi3)));
        info!("  Added {} (valueReference: {})", spec.name, vr);

        if spec.causality == Causality::Output {
            let index = variables
                .elements()
                .filter(|e| e.name == SCALAR_VARIABLE)
                .count();
            outputs.push((vr, index));
        }
    }

    for (vr, index) in outputs {
        register_output(updated.root_mut(), fmi3, vr, index);
    }

    Ok(updated)
}

/// List a new output in the structure section
///
/// FMI 2 references outputs by 1-based position in `ModelVariables`,
/// FMI 3 by value reference.
fn register_output(root: &mut Element, fmi3: bool, value_reference: u32, index: usize) {
    let after_variables = root
        .child_position(MODEL_VARIABLES)
        .map_or(root.children.len(), |p| p + 1);
    let structure = root.ensure_child(MODEL_STRUCTURE, after_variables);

    if fmi3 {
        let at = structure
            .children
            .iter()
            .rposition(|n| matches!(n, Node::Element(e) if e.name == "Output"))
            .map_or(0, |p| p + 1);
        structure.children.insert(
            at,
            Node::Element(
                Element::new("Output").with_attr("valueReference", value_reference.to_string()),
            ),
        );
    } else {
        let outputs = structure.ensure_child("Outputs", 0);
        outputs.children.push(Node::Element(
            Element::new("Unknown").with_attr("index", index.to_string()),
        ));
    }

    debug!("Registered output valueReference {} in {}", value_reference, MODEL_STRUCTURE);
}

/// Stamp provenance onto the descriptor root
///
/// The suffix is appended to the vendor description (never replacing it)
/// and is not appended twice. `generationTool` and `generationDateAndTime`
/// are overwritten.
pub fn annotate_metadata(descriptor: &ModelDescriptor, stamp: &MetadataStamp) -> ModelDescriptor {
    let mut updated = descriptor.clone();
    let root = updated.root_mut();

    let suffix = stamp.description_suffix.trim();
    if !suffix.is_empty() {
        let original = root.attr("description").unwrap_or_default().trim_end();
        if !original.ends_with(suffix) {
            let description = if original.is_empty() {
                suffix.to_string()
            } else {
                format!("{} {}", original, suffix)
            };
            root.set_attr("description", description);
        }
    }

    root.set_attr("generationTool", stamp.generation_tool.as_str());
    root.set_attr(
        "generationDateAndTime",
        stamp.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
    );

    info!("  Stamped generationTool: {}", stamp.generation_tool);
    updated
}
