//! # xml-compare Library
//!
//! Compares control XML documents against test XML documents node by node,
//! with numeric tolerance for values and an ignore list of node names, and
//! batches the comparison over two directories of same-named files.
//!
//! ```
//! use xml_compare::{Epsilon, IgnoreSet, XmlDocument, compare};
//!
//! let control = XmlDocument::parse_str("control", "<root><v>1.000</v></root>").unwrap();
//! let test = XmlDocument::parse_str("test", "<root><v>1.0004</v></root>").unwrap();
//!
//! let report = compare(&control, &test, &IgnoreSet::new(), Epsilon::new(0.001).unwrap());
//! assert!(!report.has_differences());
//! ```

pub mod cli;
pub mod comparator;
pub mod comparison;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod file_discovery;
pub mod filter;
pub mod matcher;
pub mod normalizer;
pub mod output;
pub mod report;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use comparator::{ComparisonSettings, TreeComparator, compare};
pub use comparison::{
    ComparisonEntry, ComparisonKind, ComparisonResult, DifferenceEvaluator, ToleranceEvaluator,
};
pub use config::{Config, ConfigManager, EnvProvider, SystemEnvProvider};
pub use document::{NodeKind, XmlDocument, XmlNode};
pub use engine::{
    ComparisonEngine, ComparisonResults, ComparisonStatus, FileComparisonResult, SkipReason,
};
pub use error::{CompareError, ConfigError, DocumentError};
pub use file_discovery::{FileDiscovery, FilePair};
pub use filter::{IgnoreSet, should_compare};
pub use normalizer::{Epsilon, is_equal};
pub use output::Output;
pub use report::{DiffReport, Difference};
