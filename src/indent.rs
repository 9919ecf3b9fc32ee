//! Indentation-tracking symbol extraction for Python.
//!
//! Blocks are inferred from leading-whitespace width. Lines are classified
//! first (blank, comment, code, bracket continuation, triple-quoted string
//! body), then walked with a small state: the open class and its body
//! indentation, plus the decorators waiting for the next declaration.
//!
//! Functions nested inside other functions are deliberately not recorded.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Symbol, SymbolKind};

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class\s+(?P<name>[A-Za-z_]\w*)").expect("class regex should compile")
});

static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:async\s+)?def\s+(?P<name>[A-Za-z_]\w*)\s*\(").expect("def regex should compile")
});

/// Module-level `UPPER_CASE = ...` (annotations allowed, comparisons not).
static CONST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>_*[A-Z][A-Z0-9_]*)\s*(?::[^=]+)?=[^=]").expect("const regex should compile")
});

/// Columns a tab advances to.
const TAB_STOP: usize = 8;

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Comment,
    Code,
    /// Inside an open `(`, `[` or `{` from an earlier line.
    Continuation,
    /// Inside a triple-quoted string opened on an earlier line.
    InString,
}

#[derive(Debug, Clone)]
struct Line<'a> {
    indent: usize,
    text: &'a str,
    kind: LineKind,
}

impl Line<'_> {
    /// Lines that can end a block.
    fn is_statement(&self) -> bool {
        self.kind == LineKind::Code
    }
}

fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / TAB_STOP + 1) * TAB_STOP,
            _ => break,
        }
    }
    width
}

/// Net bracket movement of a line, skipping comments and string literals.
///
/// `triple` carries a triple-quoted string across lines: it is read as the
/// delimiter still open before the line and left as the one open after it.
fn scan_line(line: &str, triple: &mut Option<&'static str>) -> i32 {
    let bytes = line.as_bytes();
    let mut delta = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if let Some(delim) = *triple {
            if bytes[i..].starts_with(delim.as_bytes()) {
                *triple = None;
                i += delim.len();
            } else {
                i += if c == b'\\' { 2 } else { 1 };
            }
            continue;
        }
        if let Some(q) = quote {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'#' => break,
            b'"' | b'\'' => {
                let delim = if c == b'"' { "\"\"\"" } else { "'''" };
                if bytes[i..].starts_with(delim.as_bytes()) {
                    *triple = Some(delim);
                    i += delim.len();
                    continue;
                }
                quote = Some(c);
            }
            b'(' | b'[' | b'{' => delta += 1,
            b')' | b']' | b'}' => delta -= 1,
            _ => {}
        }
        i += 1;
    }
    delta
}

fn classify(content: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut open_brackets = 0i32;
    let mut in_triple: Option<&'static str> = None;

    for raw in content.lines() {
        let text = raw.trim();
        let indent = indent_width(raw);

        if in_triple.is_some() {
            open_brackets = (open_brackets + scan_line(raw, &mut in_triple)).max(0);
            lines.push(Line {
                indent,
                text,
                kind: LineKind::InString,
            });
            continue;
        }

        let kind = if open_brackets > 0 {
            LineKind::Continuation
        } else if text.is_empty() {
            LineKind::Blank
        } else if text.starts_with('#') {
            LineKind::Comment
        } else {
            LineKind::Code
        };

        if matches!(kind, LineKind::Code | LineKind::Continuation) {
            open_brackets = (open_brackets + scan_line(raw, &mut in_triple)).max(0);
        }

        lines.push(Line { indent, text, kind });
    }
    lines
}

/// Last line (1-based) of the block opened at `start` (0-based): the line
/// before the next statement indented no deeper than the opener, or the end
/// of the file.
fn block_end(lines: &[Line], start: usize) -> usize {
    let own = lines[start].indent;
    lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, l)| l.is_statement() && l.indent <= own)
        .map_or(lines.len(), |(idx, _)| idx)
}

// ---------------------------------------------------------------------------
// The walk
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct OpenClass {
    name: String,
    indent: usize,
    /// Indentation of the first statement in the class body.
    body_indent: Option<usize>,
}

#[derive(Debug, Default)]
struct IndentWalk {
    open_class: Option<OpenClass>,
    decorators: Vec<String>,
}

impl IndentWalk {
    fn step(&mut self, lines: &[Line], idx: usize) -> Option<Symbol> {
        let line = &lines[idx];
        if line.kind != LineKind::Code {
            if matches!(line.kind, LineKind::Blank | LineKind::Comment) {
                self.decorators.clear();
            }
            return None;
        }

        if line.indent == 0 {
            self.open_class = None;
        } else if let Some(class) = &mut self.open_class
            && line.indent > class.indent
            && class.body_indent.is_none()
        {
            class.body_indent = Some(line.indent);
        }

        if line.text.starts_with('@') {
            self.decorators.push(line.text.to_string());
            return None;
        }

        let decorators = std::mem::take(&mut self.decorators);
        let symbol = self.declaration(lines, idx, &decorators);

        if let Some(sym) = &symbol
            && sym.kind == SymbolKind::Class
        {
            self.open_class = Some(OpenClass {
                name: sym.name.clone(),
                indent: line.indent,
                body_indent: None,
            });
        }
        symbol
    }

    fn declaration(&self, lines: &[Line], idx: usize, decorators: &[String]) -> Option<Symbol> {
        let line = &lines[idx];
        let text = line.text;

        if line.indent == 0
            && let Some(caps) = CLASS_RE.captures(text)
        {
            return Some(make_symbol(&caps["name"], SymbolKind::Class, None, lines, idx, decorators));
        }

        if let Some(caps) = DEF_RE.captures(text) {
            if line.indent == 0 {
                return Some(make_symbol(&caps["name"], SymbolKind::Func, None, lines, idx, decorators));
            }
            let class = self.open_class.as_ref()?;
            if line.indent > class.indent && class.body_indent == Some(line.indent) {
                return Some(make_symbol(
                    &caps["name"],
                    SymbolKind::Method,
                    Some(&class.name),
                    lines,
                    idx,
                    decorators,
                ));
            }
            return None;
        }

        if line.indent == 0
            && let Some(caps) = CONST_RE.captures(text)
        {
            return Some(make_symbol(&caps["name"], SymbolKind::Const, None, lines, idx, decorators));
        }

        None
    }
}

fn make_symbol(
    name: &str,
    kind: SymbolKind,
    parent: Option<&str>,
    lines: &[Line],
    idx: usize,
    decorators: &[String],
) -> Symbol {
    let head = lines[idx].text.trim_end_matches(':').trim_end();
    let signature = if decorators.is_empty() {
        head.to_string()
    } else {
        format!("{} {head}", decorators.join(" "))
    };
    Symbol {
        name: name.to_string(),
        kind,
        line: idx + 1,
        end_line: Some(block_end(lines, idx).max(idx + 1)),
        exported: !name.starts_with('_'),
        signature,
        parent: parent.map(str::to_string),
    }
}

/// Extract module-level functions, classes, methods and constants.
pub fn extract(content: &str) -> Vec<Symbol> {
    let lines = classify(content);
    let mut walk = IndentWalk::default();
    (0..lines.len())
        .filter_map(|idx| walk.step(&lines, idx))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
