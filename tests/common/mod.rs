//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use xml_compare::XmlDocument;

/// A scratch workspace holding `ControlXML/` and `TestXML/`
pub struct Workspace {
    pub temp_dir: TempDir,
    pub control_dir: PathBuf,
    pub test_dir: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let control_dir = temp_dir.path().join("ControlXML");
        let test_dir = temp_dir.path().join("TestXML");
        fs::create_dir_all(&control_dir).expect("Failed to create control dir");
        fs::create_dir_all(&test_dir).expect("Failed to create test dir");

        Self {
            temp_dir,
            control_dir,
            test_dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn control(&self, name: &str, content: &str) -> &Self {
        write_file(&self.control_dir.join(name), content);
        self
    }

    pub fn test(&self, name: &str, content: &str) -> &Self {
        write_file(&self.test_dir.join(name), content);
        self
    }

    /// Same name on both sides
    pub fn pair(&self, name: &str, control: &str, test: &str) -> &Self {
        self.control(name, control).test(name, test)
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        write_file(&path, content);
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.root().join(name)).expect("Failed to read file")
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, content).expect("Failed to write file");
}

pub fn doc(source: &str) -> XmlDocument {
    XmlDocument::parse_str("inline", source).expect("Invalid test XML")
}

/// Order document with `n` lines, used for larger inputs
pub fn order_document(lines: usize, price_offset: f64) -> String {
    let mut xml = String::from("<order id=\"42\"><customer>ACME</customer><lines>");
    for i in 0..lines {
        xml.push_str(&format!(
            "<line no=\"{}\"><sku>SKU-{}</sku><qty>{}</qty><price currency=\"EUR\">{:.4}</price></line>",
            i,
            i,
            i % 7 + 1,
            10.0 + i as f64 * 0.25 + price_offset
        ));
    }
    xml.push_str("</lines><debug>generated</debug></order>");
    xml
}
