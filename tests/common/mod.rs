// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use fmurepack::RepackageConfig;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Descriptor of a typical vendor export: three variables, refs 0..=2.
pub const VENDOR_DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- exported by Vendor Tool -->
<fmiModelDescription fmiVersion="2.0" modelName="Plant" guid="{0f1e2d3c-aaaa-bbbb-cccc-000000000001}" description="Vendor plant model" generationTool="Vendor Tool 9.1" generationDateAndTime="2023-05-01T08:00:00Z" numberOfEventIndicators="0">
  <CoSimulation modelIdentifier="Plant" canHandleVariableCommunicationStepSize="true"/>
  <UnitDefinitions>
    <Unit name="V"/>
  </UnitDefinitions>
  <ModelVariables>
    <ScalarVariable name="u" valueReference="0" causality="input" variability="continuous">
      <Real start="0.0" unit="V"/>
    </ScalarVariable>
    <ScalarVariable name="y" valueReference="1" causality="output" variability="continuous">
      <Real/>
    </ScalarVariable>
    <ScalarVariable name="mode" valueReference="2" causality="parameter" variability="fixed">
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

/// Stand-in for a platform binary; not valid UTF-8 on purpose.
pub const VENDOR_BINARY: &[u8] = &[0x7f, b'E', b'L', b'F', 0x02, 0x01, 0x00, 0xff, 0xfe, 0x80];

/// Write a zip at `path` with the given raw entry names and contents.
///
/// Names are stored verbatim, so hostile names like `../evil` can be used.
pub fn write_fmu(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

/// Write a vendor-style FMU into `dir` and return its path.
pub fn vendor_fmu(dir: &Path) -> PathBuf {
    vendor_fmu_with(dir, "vendor.fmu", &[])
}

/// Vendor FMU plus extra entries.
pub fn vendor_fmu_with(dir: &Path, name: &str, extra: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let mut entries: Vec<(&str, &[u8])> = vec![
        ("modelDescription.xml", VENDOR_DESCRIPTOR.as_bytes()),
        ("binaries/linux64/Plant.so", VENDOR_BINARY),
        ("binaries/win64/Plant.dll", b"MZ\x90\x00"),
        ("documentation/index.html", b"<html><body>Plant</body></html>"),
        ("resources/lookup.csv", b"t,y\n0,1\n"),
    ];
    entries.extend_from_slice(extra);
    write_fmu(&path, &entries);
    path
}

/// Overwrite the uncompressed size the central directory records for `entry`.
///
/// The stored data is left alone, so the archive lies about its content.
pub fn set_declared_size(path: &Path, entry: &str, size: u32) {
    let mut bytes = std::fs::read(path).unwrap();
    let u16_at = |b: &[u8], i: usize| u16::from_le_bytes([b[i], b[i + 1]]) as usize;

    // End of central directory record, written without a comment
    let eocd = bytes.len() - 22;
    assert_eq!(&bytes[eocd..eocd + 4], b"PK\x05\x06");
    let count = u16_at(&bytes, eocd + 10);
    let mut record = u32::from_le_bytes(bytes[eocd + 16..eocd + 20].try_into().unwrap()) as usize;

    for _ in 0..count {
        assert_eq!(&bytes[record..record + 4], b"PK\x01\x02");
        let name_len = u16_at(&bytes, record + 28);
        let extra_len = u16_at(&bytes, record + 30);
        let comment_len = u16_at(&bytes, record + 32);
        if &bytes[record + 46..record + 46 + name_len] == entry.as_bytes() {
            bytes[record + 24..record + 28].copy_from_slice(&size.to_le_bytes());
            std::fs::write(path, bytes).unwrap();
            return;
        }
        record += 46 + name_len + extra_len + comment_len;
    }
    panic!("{} not in central directory", entry);
}

/// Fixed generation time so outputs are predictable.
pub fn fixed_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap()
}

/// Default config pinned to [`fixed_timestamp`].
pub fn test_config() -> RepackageConfig {
    RepackageConfig::new().with_timestamp(fixed_timestamp())
}

/// Working trees of this process still present in the temp dir.
pub fn leftover_working_trees() -> Vec<PathBuf> {
    let prefix = format!("fmu_repackage_{}_", std::process::id());
    std::fs::read_dir(std::env::temp_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
        .map(|e| e.path())
        .collect()
}
