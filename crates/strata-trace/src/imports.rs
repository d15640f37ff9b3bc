//! Python import extraction via tree-sitter.

use strata_core::StrataError;
use tree_sitter::{Node, Parser};

/// A single import statement found in Python source.
///
/// `from m import a, b` yields one [`PythonImport::From`] per imported
/// symbol. Aliased imports record the original dotted name, not the alias.
/// Relative imports (`from . import x`) are not represented; they cannot be
/// qualified without package context and are skipped at extraction.
///
/// # Examples
///
/// ```
/// use strata_trace::imports::PythonImport;
///
/// let import = PythonImport::From {
///     module: "pkg.mod".into(),
///     symbol: Some("Thing".into()),
///     line: 3,
/// };
/// assert_eq!(import.qualified_names(), vec!["pkg.mod", "pkg.mod.Thing"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PythonImport {
    /// `import pkg.mod` (possibly `as alias`).
    Plain {
        /// Dotted module name.
        module: String,
        /// Line where the statement starts (1-indexed).
        line: u32,
    },
    /// `from pkg.mod import symbol` (possibly `as alias`).
    From {
        /// Dotted module name after `from`.
        module: String,
        /// Imported symbol; `None` for a wildcard import.
        symbol: Option<String>,
        /// Line where the statement starts (1-indexed).
        line: u32,
    },
}

impl PythonImport {
    /// Every qualified name this import can refer to.
    ///
    /// A plain or wildcard import names the module; a from-import names the
    /// module and `module.symbol`, since the symbol may itself be a
    /// submodule.
    pub fn qualified_names(&self) -> Vec<String> {
        match self {
            PythonImport::Plain { module, .. } => vec![module.clone()],
            PythonImport::From {
                module,
                symbol: Some(symbol),
                ..
            } => vec![module.clone(), format!("{module}.{symbol}")],
            PythonImport::From {
                module,
                symbol: None,
                ..
            } => vec![module.clone()],
        }
    }
}

/// Extract all import statements from Python source.
///
/// Walks the whole parse tree, so imports nested inside functions or
/// conditionals are found too. Tree-sitter is error-tolerant; files with
/// syntax errors still yield the imports it can recognize.
///
/// # Errors
///
/// Returns [`StrataError::Parse`] if the grammar cannot be loaded or the
/// source cannot be parsed at all.
///
/// # Examples
///
/// ```
/// use strata_trace::imports::{extract_imports, PythonImport};
///
/// let imports = extract_imports("import os\nfrom pkg.mod import Thing\n").unwrap();
/// assert_eq!(imports.len(), 2);
/// assert_eq!(
///     imports[0],
///     PythonImport::Plain { module: "os".into(), line: 1 }
/// );
/// ```
pub fn extract_imports(source: &str) -> Result<Vec<PythonImport>, StrataError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| StrataError::Parse(format!("failed to set language: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| StrataError::Parse("parser produced no tree".into()))?;

    let mut imports = Vec::new();
    collect_imports(tree.root_node(), source.as_bytes(), &mut imports);
    Ok(imports)
}

fn collect_imports(node: Node, source: &[u8], imports: &mut Vec<PythonImport>) {
    match node.kind() {
        "import_statement" => collect_plain(node, source, imports),
        "import_from_statement" => collect_from(node, source, imports),
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_imports(child, source, imports);
    }
}

fn collect_plain(node: Node, source: &[u8], imports: &mut Vec<PythonImport>) {
    let line = node.start_position().row as u32 + 1;
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        if let Some(module) = imported_name(name, source) {
            imports.push(PythonImport::Plain { module, line });
        }
    }
}

fn collect_from(node: Node, source: &[u8], imports: &mut Vec<PythonImport>) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };
    // Relative imports cannot be qualified without package context.
    if module_node.kind() == "relative_import" {
        return;
    }
    let module = node_text(&module_node, source);
    if module.is_empty() {
        return;
    }
    let line = node.start_position().row as u32 + 1;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "wildcard_import" {
            imports.push(PythonImport::From {
                module: module.clone(),
                symbol: None,
                line,
            });
            return;
        }
    }

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        if let Some(symbol) = imported_name(name, source) {
            imports.push(PythonImport::From {
                module: module.clone(),
                symbol: Some(symbol),
                line,
            });
        }
    }
}

/// The original dotted name of an import entry, looking through aliases.
fn imported_name(node: Node, source: &[u8]) -> Option<String> {
    let target = if node.kind() == "aliased_import" {
        node.child_by_field_name("name")?
    } else {
        node
    };
    let text = node_text(&target, source);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn node_text(node: &Node, source: &[u8]) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    if start >= source.len() || end > source.len() {
        return String::new();
    }
    String::from_utf8_lossy(&source[start..end]).to_string()
}
