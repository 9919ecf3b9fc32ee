//! Grammar-parsed symbol extraction for Go.
//!
//! Uses the bundled tree-sitter grammar to walk the top-level declarations of
//! a file exactly: functions, methods (with their receiver type), type
//! declarations and grouped `const` / `var` declarations. A tree containing
//! error or missing nodes is reported as [`ParseError::Syntax`]; callers scan
//! corpora treat that as "this file contributes no symbols".

use tree_sitter::{Node, Parser, Tree};

use crate::errors::ParseError;
use crate::types::{Symbol, SymbolKind};

/// Create a new [`Parser`] configured for Go.
fn go_parser() -> Result<Parser, ParseError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_go::LANGUAGE.into())?;
    Ok(parser)
}

/// Parse Go source into a syntax tree, rejecting trees with syntax errors.
fn parse_tree(path: &str, src: &[u8]) -> Result<Tree, ParseError> {
    let mut parser = go_parser()?;
    let tree = parser.parse(src, None).ok_or_else(|| ParseError::NoTree {
        path: path.to_string(),
    })?;
    let root = tree.root_node();
    if root.has_error() {
        let line = first_error(root).map_or(1, |n| n.start_position().row + 1);
        return Err(ParseError::Syntax {
            path: path.to_string(),
            line,
        });
    }
    Ok(tree)
}

/// Extract the top-level declarations of a Go file.
///
/// `path` is only used to label errors.
pub fn extract(path: &str, src: &[u8]) -> Result<Vec<Symbol>, ParseError> {
    let tree = parse_tree(path, src)?;
    let root = tree.root_node();
    let mut symbols = Vec::new();

    for i in 0..root.named_child_count() {
        let Some(decl) = root.named_child(i as u32) else {
            continue;
        };
        match decl.kind() {
            "function_declaration" => symbols.extend(extract_func(decl, src)),
            "method_declaration" => symbols.extend(extract_method(decl, src)),
            "type_declaration" => extract_types(decl, src, &mut symbols),
            "const_declaration" => extract_values(decl, src, SymbolKind::Const, &mut symbols),
            "var_declaration" => extract_values(decl, src, SymbolKind::Var, &mut symbols),
            _ => {}
        }
    }

    Ok(symbols)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Get the text content of a node.
fn node_text<'a>(node: Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

/// Find a named child by its field name and return its text.
fn field_text<'a>(node: Node, field: &str, src: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| node_text(n, src))
}

/// Collapse runs of whitespace (including newlines) to single spaces.
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Depth-first search for the first error or missing node.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    for i in 0..node.child_count() {
        if let Some(found) = node.child(i as u32).and_then(first_error) {
            return Some(found);
        }
    }
    None
}

/// Go exports identifiers that start with an upper-case letter.
fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn make_symbol(
    name: &str,
    kind: SymbolKind,
    span: Node,
    signature: String,
    parent: Option<String>,
) -> Symbol {
    Symbol {
        name: name.to_string(),
        kind,
        line: span.start_position().row + 1,
        end_line: Some(span.end_position().row + 1),
        exported: is_exported(name),
        signature,
        parent,
    }
}

/// `(params) results` portion shared by functions and methods.
fn call_shape(node: Node, src: &[u8]) -> String {
    let mut sig = String::new();
    if let Some(tp) = field_text(node, "type_parameters", src) {
        sig.push_str(&one_line(tp));
    }
    sig.push_str(&one_line(field_text(node, "parameters", src).unwrap_or("()")));
    if let Some(result) = field_text(node, "result", src) {
        sig.push(' ');
        sig.push_str(&one_line(result));
    }
    sig
}

// ---------------------------------------------------------------------------
// Functions and methods
// ---------------------------------------------------------------------------

fn extract_func(node: Node, src: &[u8]) -> Option<Symbol> {
    let name = field_text(node, "name", src)?;
    let signature = format!("func {name}{}", call_shape(node, src));
    Some(make_symbol(name, SymbolKind::Func, node, signature, None))
}

fn extract_method(node: Node, src: &[u8]) -> Option<Symbol> {
    let name = field_text(node, "name", src)?;
    let receiver = node.child_by_field_name("receiver");
    let owner = receiver.and_then(|r| receiver_type(r, src));
    let receiver_text = receiver.map_or("()", |r| node_text(r, src));
    let signature = format!(
        "func {} {name}{}",
        one_line(receiver_text),
        call_shape(node, src)
    );
    // `parent` is set iff kind is method; an unnameable receiver degrades
    // to a plain function.
    match owner {
        Some(owner) => Some(make_symbol(
            name,
            SymbolKind::Method,
            node,
            signature,
            Some(owner),
        )),
        None => Some(make_symbol(name, SymbolKind::Func, node, signature, None)),
    }
}

/// Bare owner type name of a receiver list: `(s *Store[K, V])` -> `Store`.
fn receiver_type(receiver: Node, src: &[u8]) -> Option<String> {
    let param = receiver.named_child(0u32)?;
    let ty = param.child_by_field_name("type")?;
    let bare = node_text(ty, src)
        .trim()
        .trim_start_matches('(')
        .trim_start_matches('*')
        .split(['[', ')'])
        .next()
        .unwrap_or("")
        .trim();
    (!bare.is_empty()).then(|| bare.to_string())
}

// ---------------------------------------------------------------------------
// Type declarations
// ---------------------------------------------------------------------------

fn extract_types(decl: Node, src: &[u8], symbols: &mut Vec<Symbol>) {
    let specs = collect_specs(decl, &["type_spec", "type_alias"]);
    let grouped = specs.len() > 1 || is_grouped(decl);
    for spec in specs {
        let Some(name) = field_text(spec, "name", src) else {
            continue;
        };
        let Some(ty) = spec.child_by_field_name("type") else {
            continue;
        };
        let type_params = field_text(spec, "type_parameters", src)
            .map(one_line)
            .unwrap_or_default();
        let (kind, signature) = if spec.kind() == "type_alias" {
            (
                SymbolKind::Type,
                format!("type {name}{type_params} = {}", one_line(node_text(ty, src))),
            )
        } else {
            match ty.kind() {
                "struct_type" => (
                    SymbolKind::Struct,
                    format!("type {name}{type_params} struct"),
                ),
                "interface_type" => (
                    SymbolKind::Interface,
                    format!("type {name}{type_params} interface"),
                ),
                _ => (
                    SymbolKind::Type,
                    format!("type {name}{type_params} {}", one_line(node_text(ty, src))),
                ),
            }
        };
        let span = if grouped { spec } else { decl };
        symbols.push(make_symbol(name, kind, span, signature, None));
    }
}

// ---------------------------------------------------------------------------
// Value declarations
// ---------------------------------------------------------------------------

fn extract_values(decl: Node, src: &[u8], kind: SymbolKind, symbols: &mut Vec<Symbol>) {
    let keyword = if kind == SymbolKind::Const { "const" } else { "var" };
    let specs = collect_specs(decl, &["const_spec", "var_spec"]);
    let grouped = specs.len() > 1 || is_grouped(decl);
    for spec in specs {
        let ty = field_text(spec, "type", src).map(one_line);
        let span = if grouped { spec } else { decl };
        let mut cursor = spec.walk();
        for name_node in spec.children_by_field_name("name", &mut cursor) {
            let name = node_text(name_node, src);
            if name.is_empty() || name == "_" {
                continue;
            }
            let signature = match &ty {
                Some(ty) => format!("{keyword} {name} {ty}"),
                None => format!("{keyword} {name}"),
            };
            symbols.push(make_symbol(name, kind, span, signature, None));
        }
    }
}

/// Declaration specs of the given kinds, looking through the list wrapper
/// some grammar versions put around parenthesized groups.
fn collect_specs<'t>(decl: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut specs = Vec::new();
    for i in 0..decl.named_child_count() {
        let Some(child) = decl.named_child(i as u32) else {
            continue;
        };
        if kinds.contains(&child.kind()) {
            specs.push(child);
        } else if child.kind().ends_with("_list") {
            specs.extend(collect_specs(child, kinds));
        }
    }
    specs
}

/// Whether a declaration uses the parenthesized `kw ( ... )` form.
fn is_grouped(decl: Node) -> bool {
    (0..decl.child_count()).any(|i| decl.child(i as u32).is_some_and(|c| c.kind() == "("))
        || (0..decl.named_child_count()).any(|i| {
            decl.named_child(i as u32)
                .is_some_and(|c| c.kind().ends_with("_list"))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
