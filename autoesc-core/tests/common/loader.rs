//! Fixture loading from YAML files

use serde::Deserialize;

use std::path::Path;

/// A single test case from a fixture file
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub desc: String,
    /// Log events in append order, each `[kind, args...]`.
    pub events: Vec<Vec<String>>,
    /// Expected long-form tree dump, one entry per line.
    #[serde(default)]
    pub tree: Vec<String>,
    /// Expected tree build failure, matched as a substring of the message.
    #[serde(default)]
    pub error: Option<String>,
}

impl TestCase {
    /// The expected dump as `OutputTree::dump` renders it.
    pub fn expected_dump(&self) -> String {
        self.tree.iter().map(|line| format!("{}\n", line)).collect()
    }
}

/// Load all test cases from a YAML fixture file
pub fn load_fixtures(path: &Path) -> Vec<TestCase> {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read fixture file {:?}: {}", path, e));
    serde_yaml::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture file {:?}: {}", path, e))
}

/// Load fixtures from the standard fixtures directory
pub fn load_fixtures_by_name(name: &str) -> Vec<TestCase> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.yaml", name));
    load_fixtures(&path)
}
