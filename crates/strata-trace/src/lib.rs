//! Test-to-source traceability.
//!
//! Resolves which test file covers a given source file by combining two
//! signals: the structural mirror convention (`src/a/b.py` maps to
//! `tests/a/test_b.py`) and actual Python import statements
//! extracted from test files with tree-sitter.

pub mod imports;
pub mod mirror;
pub mod resolver;
