// src/fmu/descriptor.rs

//! Model description documents
//!
//! Parsing and rendering of `modelDescription.xml`. The document is kept as
//! a generic element tree ([`Document`]) so untouched vendor content is
//! written back verbatim; typed accessors read the few fields this crate
//! cares about.

use crate::error::{Error, Result};
use crate::fmu::workdir::WorkingTree;
use crate::fmu::xml::{Document, Element};
use std::fmt;
use std::fs;
use std::str::FromStr;
use tracing::{debug, info};

/// Root element of every model description
pub const ROOT_ELEMENT: &str = "fmiModelDescription";

/// Element holding variable declarations
pub const MODEL_VARIABLES: &str = "ModelVariables";

/// Element holding the output/derivative structure
pub const MODEL_STRUCTURE: &str = "ModelStructure";

/// FMI 2.x variable element
pub const SCALAR_VARIABLE: &str = "ScalarVariable";

/// Version assumed when the root carries no `fmiVersion`
pub const DEFAULT_FMI_VERSION: &str = "2.0";

/// Role of a variable in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Causality {
    Input,
    Output,
    Parameter,
    CalculatedParameter,
    Local,
    Independent,
}

impl Causality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Parameter => "parameter",
            Self::CalculatedParameter => "calculatedParameter",
            Self::Local => "local",
            Self::Independent => "independent",
        }
    }
}

impl FromStr for Causality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            "parameter" => Ok(Self::Parameter),
            "calculatedParameter" => Ok(Self::CalculatedParameter),
            "local" => Ok(Self::Local),
            "independent" => Ok(Self::Independent),
            _ => Err(format!("Invalid causality: {s}")),
        }
    }
}

impl fmt::Display for Causality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a variable's value changes over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variability {
    Constant,
    Fixed,
    Tunable,
    Discrete,
    Continuous,
}

impl Variability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Fixed => "fixed",
            Self::Tunable => "tunable",
            Self::Discrete => "discrete",
            Self::Continuous => "continuous",
        }
    }
}

impl FromStr for Variability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Self::Constant),
            "fixed" => Ok(Self::Fixed),
            "tunable" => Ok(Self::Tunable),
            "discrete" => Ok(Self::Discrete),
            "continuous" => Ok(Self::Continuous),
            _ => Err(format!("Invalid variability: {s}")),
        }
    }
}

impl fmt::Display for Variability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value type of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Real,
    Integer,
    Boolean,
    String,
}

impl ScalarType {
    /// Element name used by FMI 2.x (`<Real start=".."/>` etc.)
    pub fn fmi2_element(&self) -> &'static str {
        match self {
            Self::Real => "Real",
            Self::Integer => "Integer",
            Self::Boolean => "Boolean",
            Self::String => "String",
        }
    }

    /// Element name used by FMI 3.x variable declarations
    pub fn fmi3_element(&self) -> &'static str {
        match self {
            Self::Real => "Float64",
            Self::Integer => "Int32",
            Self::Boolean => "Boolean",
            Self::String => "String",
        }
    }

    /// Classify an FMI 2 typed child or FMI 3 variable element name
    pub fn from_element(name: &str) -> Option<Self> {
        match name {
            "Real" | "Float64" | "Float32" => Some(Self::Real),
            "Integer" | "Enumeration" | "Int8" | "UInt8" | "Int16" | "UInt16" | "Int32"
            | "UInt32" | "Int64" | "UInt64" => Some(Self::Integer),
            "Boolean" => Some(Self::Boolean),
            "String" => Some(Self::String),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fmi2_element())
    }
}

/// Read-only view of a variable declared in the descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    pub value_reference: u32,
    pub description: Option<String>,
    /// `None` when absent or not a value this crate recognizes
    pub causality: Option<Causality>,
    pub variability: Option<Variability>,
    pub value_type: Option<ScalarType>,
    pub start: Option<String>,
}

/// Parsed `modelDescription.xml`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    document: Document,
}

impl ModelDescriptor {
    /// Parse descriptor text
    pub fn parse_str(input: &str) -> Result<Self> {
        let document = Document::parse(input)?;
        if document.root.name != ROOT_ELEMENT {
            return Err(Error::DescriptorFormat(format!(
                "expected root element <{}>, found <{}>",
                ROOT_ELEMENT, document.root.name
            )));
        }
        Ok(Self { document })
    }

    /// Underlying element tree
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn root(&self) -> &Element {
        &self.document.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Element {
        &mut self.document.root
    }

    /// `fmiVersion` attribute, defaulting to 2.0 when absent
    pub fn fmi_version(&self) -> &str {
        self.root().attr("fmiVersion").unwrap_or(DEFAULT_FMI_VERSION)
    }

    /// Whether the document follows the FMI 3 variable layout
    pub fn is_fmi3(&self) -> bool {
        self.fmi_version().trim().starts_with('3')
    }

    pub fn model_name(&self) -> Option<&str> {
        self.root().attr("modelName")
    }

    /// `guid` (FMI 2) or `instantiationToken` (FMI 3)
    pub fn guid(&self) -> Option<&str> {
        self.root()
            .attr("guid")
            .or_else(|| self.root().attr("instantiationToken"))
    }

    pub fn description(&self) -> Option<&str> {
        self.root().attr("description")
    }

    pub fn generation_tool(&self) -> Option<&str> {
        self.root().attr("generationTool")
    }

    pub fn generation_date_and_time(&self) -> Option<&str> {
        self.root().attr("generationDateAndTime")
    }

    /// The `ModelVariables` element, if present
    pub fn model_variables(&self) -> Option<&Element> {
        self.root().child(MODEL_VARIABLES)
    }

    /// Variable elements under `ModelVariables`
    ///
    /// Any child carrying a `valueReference` counts, which covers both the
    /// FMI 2 `ScalarVariable` wrapper and the FMI 3 typed elements.
    pub(crate) fn variable_elements(&self) -> impl Iterator<Item = &Element> {
        self.model_variables()
            .into_iter()
            .flat_map(|vars| vars.elements())
            .filter(|e| e.attr("valueReference").is_some())
    }

    /// Names of all declared variables
    pub fn variable_names(&self) -> Vec<&str> {
        self.variable_elements()
            .filter_map(|e| e.attr("name"))
            .collect()
    }

    /// Value references of all declared variables
    pub fn value_references(&self) -> Result<Vec<u32>> {
        self.variable_elements().map(parse_value_reference).collect()
    }

    /// Typed view of every declared variable, in document order
    pub fn variables(&self) -> Result<Vec<VariableDeclaration>> {
        self.variable_elements().map(declaration_from_element).collect()
    }

    /// Render the document as indented text
    pub fn to_xml_string(&self) -> String {
        self.document.to_xml_string()
    }
}

fn parse_value_reference(element: &Element) -> Result<u32> {
    let raw = element.attr("valueReference").unwrap_or_default();
    raw.trim().parse::<u32>().map_err(|_| {
        Error::DescriptorFormat(format!(
            "variable {:?} has invalid valueReference {:?}",
            element.attr("name").unwrap_or("?"),
            raw
        ))
    })
}

fn declaration_from_element(element: &Element) -> Result<VariableDeclaration> {
    let name = element.attr("name").ok_or_else(|| {
        Error::DescriptorFormat(format!("<{}> without a name attribute", element.name))
    })?;

    // FMI 2 keeps type and start on a typed child, FMI 3 on the element itself
    let (value_type, start) = if element.name == SCALAR_VARIABLE {
        let typed = element
            .elements()
            .find(|child| ScalarType::from_element(&child.name).is_some());
        (
            typed.and_then(|t| ScalarType::from_element(&t.name)),
            typed.and_then(|t| t.attr("start")).map(String::from),
        )
    } else {
        let start = element.attr("start").map(String::from).or_else(|| {
            element
                .child("Start")
                .and_then(|s| s.attr("value"))
                .map(String::from)
        });
        (ScalarType::from_element(&element.name), start)
    };

    Ok(VariableDeclaration {
        name: name.to_string(),
        value_reference: parse_value_reference(element)?,
        description: element.attr("description").map(String::from),
        causality: element.attr("causality").and_then(|c| c.parse().ok()),
        variability: element.attr("variability").and_then(|v| v.parse().ok()),
        value_type,
        start,
    })
}

/// Load the descriptor from the root of a working tree
pub fn parse(tree: &WorkingTree) -> Result<ModelDescriptor> {
    info!("[2/6] Parsing modelDescription.xml");

    let path = tree.descriptor_path();
    if !path.is_file() {
        return Err(Error::MissingDescriptor(tree.root().to_path_buf()));
    }

    let bytes = fs::read(&path)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::DescriptorFormat(format!("not valid UTF-8: {}", e)))?;
    let descriptor = ModelDescriptor::parse_str(&text)?;

    info!("  FMI Version: {}", descriptor.fmi_version());
    info!("  Model Name: {}", descriptor.model_name().unwrap_or("Unknown"));
    info!("  GUID: {}", descriptor.guid().unwrap_or("Unknown"));
    debug!(
        "Descriptor declares {} variables",
        descriptor.variable_elements().count()
    );

    Ok(descriptor)
}

/// Render `descriptor` over the descriptor file of `tree`
pub fn write(tree: &WorkingTree, descriptor: &ModelDescriptor) -> Result<()> {
    info!("[5/6] Writing modelDescription.xml");

    let path = tree.descriptor_path();
    let rendered = descriptor.to_xml_string();
    fs::write(&path, rendered.as_bytes())?;

    debug!("Wrote {} bytes to {}", rendered.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FMI2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="2.0" modelName="Plant" guid="{abc}" description="A plant">
  <ModelVariables>
    <ScalarVariable name="u" valueReference="0" causality="input" variability="continuous">
      <Real start="1.5" unit="V"/>
    </ScalarVariable>
    <ScalarVariable name="mode" valueReference="7" causality="parameter" variability="fixed">
      <Integer start="2"/>
    </ScalarVariable>
  </ModelVariables>
</fmiModelDescription>
"#;

    const FMI3: &str = r#"<fmiModelDescription fmiVersion="3.0" modelName="Plant3" instantiationToken="{tok}">
  <ModelVariables>
    <Float64 name="time" valueReference="0" causality="independent" variability="continuous"/>
    <String name="label" valueReference="4" causality="parameter" variability="fixed">
      <Start value="hello"/>
    </String>
  </ModelVariables>
</fmiModelDescription>"#;

    #[test]
    fn test_identity_fields() {
        let d = ModelDescriptor::parse_str(FMI2).unwrap();
        assert_eq!(d.fmi_version(), "2.0");
        assert_eq!(d.model_name(), Some("Plant"));
        assert_eq!(d.guid(), Some("{abc}"));
        assert_eq!(d.description(), Some("A plant"));
        assert!(!d.is_fmi3());
    }

    #[test]
    fn test_fmi_version_defaults() {
        let d = ModelDescriptor::parse_str(r#"<fmiModelDescription modelName="M"/>"#).unwrap();
        assert_eq!(d.fmi_version(), DEFAULT_FMI_VERSION);
        assert!(d.variables().unwrap().is_empty());
    }

    #[test]
    fn test_fmi2_variables() {
        let d = ModelDescriptor::parse_str(FMI2).unwrap();
        let vars = d.variables().unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].name, "u");
        assert_eq!(vars[0].causality, Some(Causality::Input));
        assert_eq!(vars[0].value_type, Some(ScalarType::Real));
        assert_eq!(vars[0].start.as_deref(), Some("1.5"));
        assert_eq!(vars[1].value_reference, 7);
        assert_eq!(vars[1].variability, Some(Variability::Fixed));
        assert_eq!(d.value_references().unwrap(), vec![0, 7]);
    }

    #[test]
    fn test_fmi3_variables() {
        let d = ModelDescriptor::parse_str(FMI3).unwrap();
        assert!(d.is_fmi3());
        assert_eq!(d.guid(), Some("{tok}"));
        let vars = d.variables().unwrap();
        assert_eq!(vars[0].causality, Some(Causality::Independent));
        assert_eq!(vars[0].value_type, Some(ScalarType::Real));
        assert_eq!(vars[1].value_type, Some(ScalarType::String));
        assert_eq!(vars[1].start.as_deref(), Some("hello"));
    }

    #[test]
    fn test_wrong_root_rejected() {
        let err = ModelDescriptor::parse_str("<notAnFmu/>").unwrap_err();
        assert!(matches!(err, Error::DescriptorFormat(_)));
    }

    #[test]
    fn test_invalid_value_reference() {
        let d = ModelDescriptor::parse_str(
            r#"<fmiModelDescription><ModelVariables><ScalarVariable name="x" valueReference="-1"/></ModelVariables></fmiModelDescription>"#,
        )
        .unwrap();
        assert!(matches!(d.value_references(), Err(Error::DescriptorFormat(_))));
    }

    #[test]
    fn test_missing_descriptor() {
        let tree = WorkingTree::new().unwrap();
        let err = parse(&tree).unwrap_err();
        assert!(matches!(err, Error::MissingDescriptor(_)));
    }

    #[test]
    fn test_write_then_parse_round_trip() {
        let tree = WorkingTree::new().unwrap();
        fs::write(tree.descriptor_path(), FMI2).unwrap();

        let original = parse(&tree).unwrap();
        write(&tree, &original).unwrap();
        let reparsed = parse(&tree).unwrap();

        assert_eq!(original, reparsed);
        assert_eq!(fs::read_dir(tree.root()).unwrap().count(), 1);
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!("calculatedParameter".parse::<Causality>(), Ok(Causality::CalculatedParameter));
        assert!("sideways".parse::<Causality>().is_err());
        assert_eq!(Variability::Tunable.to_string(), "tunable");
        assert_eq!(ScalarType::from_element("UInt16"), Some(ScalarType::Integer));
    }
}
