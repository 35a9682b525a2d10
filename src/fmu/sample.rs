// src/fmu/sample.rs

//! Sample vendor FMU
//!
//! Produces a small FMI 2.0 co-simulation FMU shaped like a vendor tool
//! export. Handy for trying the repackager without a real model.

use crate::error::Result;
use crate::fmu::builder::{self, OutputArchive};
use crate::fmu::workdir::WorkingTree;
use std::fs;
use std::path::Path;
use tracing::info;

pub const SAMPLE_MODEL_NAME: &str = "VendorECU_Controller";

const SAMPLE_DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription
    fmiVersion="2.0"
    modelName="VendorECU_Controller"
    guid="{12345678-1234-1234-1234-123456789abc}"
    description="Sample ECU Controller from Vendor Tools"
    generationTool="Vendor FMU Export Tool v3.2.1"
    generationDateAndTime="2024-01-15T10:30:00Z"
    variableNamingConvention="structured"
    numberOfEventIndicators="0">

    <CoSimulation
        modelIdentifier="VendorECU_Controller"
        canHandleVariableCommunicationStepSize="true"
        canInterpolateInputs="false"
        maxOutputDerivativeOrder="0"
        canGetAndSetFMUstate="false"
        canSerializeFMUstate="false"/>

    <ModelVariables>
        <ScalarVariable name="input_voltage" valueReference="0" description="Input voltage signal" causality="input" variability="continuous">
            <Real start="0.0" unit="V"/>
        </ScalarVariable>
        <ScalarVariable name="output_current" valueReference="1" description="Output current" causality="output" variability="continuous">
            <Real start="0.0" unit="A"/>
        </ScalarVariable>
        <ScalarVariable name="controller_mode" valueReference="2" description="Controller operating mode" causality="parameter" variability="fixed">
            <Integer start="1"/>
        </ScalarVariable>
    </ModelVariables>

    <ModelStructure>
        <Outputs>
            <Unknown index="2"/>
        </Outputs>
    </ModelStructure>

</fmiModelDescription>
"#;

const PLACEHOLDER_BINARY: &str = "# Placeholder binary - replace with actual FMU binary\n";

/// Write the sample FMU to `path`
pub fn create_sample(path: impl AsRef<Path>) -> Result<OutputArchive> {
    let path = path.as_ref();
    info!("Creating sample vendor FMU: {}", path.display());

    let tree = WorkingTree::new()?;
    fs::write(tree.descriptor_path(), SAMPLE_DESCRIPTOR)?;

    let binaries = tree.root().join("binaries").join("linux64");
    fs::create_dir_all(&binaries)?;
    fs::write(
        binaries.join(format!("{}.so", SAMPLE_MODEL_NAME)),
        PLACEHOLDER_BINARY,
    )?;

    let archive = builder::build_from_dir(tree.root(), path)?;
    tree.close();
    Ok(archive)
}
