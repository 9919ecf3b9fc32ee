//! Brace-tracking symbol extraction for TypeScript and JavaScript.
//!
//! There is no grammar here. Each file is first reduced to "code lines" with
//! comments removed, then walked once while tracking net `{}` depth:
//!
//! 1. lines that are empty after comment stripping are skipped
//! 2. decorator, import, re-export and `require` lines only move the depth
//! 3. at depth 0 the top-level patterns are tried in priority order
//! 4. one level inside an open class body, the member patterns are tried
//! 5. the depth is updated; falling back to the class depth closes the class
//!
//! Quotes and template literals suppress brace counting inside them. The
//! body of a template literal that continues past its opening line is
//! dropped from the code lines.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::{Symbol, SymbolKind};

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Lines that contribute braces but never declare anything.
static SKIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        ^(?:
            @                                              |
            import\b                                       |
            export\s+\*                                    |
            export\s+(?:type\s+)?\{[^}]*\}\s*from\b        |
            (?:const|let|var)\s+[^=]+=\s*require\s*\(      |
            require\s*\(
        )"#,
    )
    .expect("skip regex should compile")
});

static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<export>export\s+)?(?:default\s+)?(?:declare\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)",
    )
    .expect("function regex should compile")
});

/// `const name = (...) =>`, `const name = async x =>`, `const name = function`.
static ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<export>export\s+)?(?:declare\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|(?:<[^>]*>\s*)?\([^)]*\)\s*(?::\s*[^=]+?)?\s*=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("arrow regex should compile")
});

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<export>export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?class\s+(?P<name>[A-Za-z_$][\w$]*)",
    )
    .expect("class regex should compile")
});

static INTERFACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<export>export\s+)?(?:declare\s+)?interface\s+(?P<name>[A-Za-z_$][\w$]*)")
        .expect("interface regex should compile")
});

static ENUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<export>export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+(?P<name>[A-Za-z_$][\w$]*)",
    )
    .expect("enum regex should compile")
});

static TYPE_ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<export>export\s+)?(?:declare\s+)?type\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?:<[^=]*>)?\s*=",
    )
    .expect("type alias regex should compile")
});

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<export>export\s+)?(?:declare\s+)?(?P<kw>const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)",
    )
    .expect("variable regex should compile")
});

/// Methods, constructors and accessors inside a class body.
static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<mods>(?:(?:public|private|protected|static|readonly|async|abstract|override|declare|get|set)\s+)*)(?:\*\s*)?(?P<name>#?[A-Za-z_$][\w$]*)\s*[?!]?\s*(?:<[^>]*>\s*)?\(",
    )
    .expect("method regex should compile")
});

/// Class properties initialised with a function: `handle = (e) => {`.
static PROPERTY_FN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<mods>(?:(?:public|private|protected|static|readonly|override)\s+)*)(?P<name>#?[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|(?:<[^>]*>\s*)?\([^)]*\)\s*(?::\s*[^=]+?)?\s*=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("property function regex should compile")
});

/// Words that look like `name(` inside a class body but are not members.
const NOT_MEMBERS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "new", "await", "typeof",
    "super", "else", "do", "with",
];

// ---------------------------------------------------------------------------
// Line preparation
// ---------------------------------------------------------------------------

/// Lexical state carried from one line to the next.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LineState {
    in_block_comment: bool,
    in_template: bool,
}

/// Remove comments from one line, carrying block-comment and template
/// literal state across lines.
///
/// String and single-line template contents are kept verbatim so later
/// passes can still see (and ignore) them. Text of a template literal that
/// opened on an earlier line, including its closing backtick, is dropped.
fn strip_comments(line: &str, state: &mut LineState) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if state.in_block_comment {
            if c == '*' && next == Some('/') {
                state.in_block_comment = false;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        if state.in_template {
            match c {
                '\\' => i += 2,
                '`' => {
                    state.in_template = false;
                    i += 1;
                }
                _ => i += 1,
            }
            continue;
        }

        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(n) = next {
                    out.push(n);
                    i += 2;
                    continue;
                }
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match (c, next) {
            ('/', Some('/')) => break,
            ('/', Some('*')) => {
                state.in_block_comment = true;
                out.push(' ');
                i += 2;
                continue;
            }
            ('"' | '\'' | '`', _) => {
                quote = Some(c);
                out.push(c);
            }
            _ => out.push(c),
        }
        i += 1;
    }

    if quote == Some('`') {
        state.in_template = true;
    }
    out
}

/// Reduce source text to comment-free code lines, one per input line.
fn code_lines(content: &str) -> Vec<String> {
    let mut state = LineState::default();
    content
        .lines()
        .map(|line| strip_comments(line, &mut state))
        .collect()
}

/// Net delimiter movement of one code line, ignoring quoted text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Delims {
    braces: i32,
    parens: i32,
    opens_brace: bool,
}

fn count_delims(code: &str) -> Delims {
    let mut d = Delims::default();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in code.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => {
                d.braces += 1;
                d.opens_brace = true;
            }
            '}' => d.braces -= 1,
            '(' => d.parens += 1,
            ')' => d.parens -= 1,
            _ => {}
        }
    }
    d
}

/// Last line (1-based) of the declaration starting at `start` (0-based).
///
/// Continues the brace scan until the depth returns to where it was before
/// the declaration. Declarations that never open a brace end once their
/// parentheses balance and the line does not continue with `=`.
fn block_end(code: &[String], start: usize) -> usize {
    let mut braces = 0;
    let mut parens = 0;
    let mut opened = false;

    for (idx, line) in code.iter().enumerate().skip(start) {
        let d = count_delims(line);
        braces += d.braces;
        parens += d.parens;
        opened |= d.opens_brace;

        if opened {
            if braces <= 0 {
                return idx + 1;
            }
        } else if parens <= 0 && !line.trim_end().ends_with('=') {
            return idx + 1;
        }
    }

    if opened { code.len() } else { start + 1 }
}

/// Declaration text without the trailing block opener.
fn signature_of(line: &str) -> String {
    line.trim().trim_end_matches('{').trim_end().to_string()
}

// ---------------------------------------------------------------------------
// The walk
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct OpenClass {
    name: String,
    depth: i32,
    entered: bool,
}

/// State of the line walk.
#[derive(Debug, Default)]
struct BraceWalk {
    depth: i32,
    open_class: Option<OpenClass>,
}

impl BraceWalk {
    /// Apply the per-line rules to code line `idx`, returning a declaration
    /// if the line holds one.
    fn step(&mut self, code: &[String], idx: usize) -> Option<Symbol> {
        let line = &code[idx];
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let symbol = if SKIP_RE.is_match(trimmed) {
            None
        } else if self.depth == 0 {
            top_level(trimmed, code, idx)
        } else {
            match &self.open_class {
                Some(class) if self.depth == class.depth + 1 => {
                    member(trimmed, &class.name, code, idx)
                }
                _ => None,
            }
        };

        if let Some(sym) = &symbol
            && sym.kind == SymbolKind::Class
        {
            self.open_class = Some(OpenClass {
                name: sym.name.clone(),
                depth: self.depth,
                entered: false,
            });
        }

        let delims = count_delims(line);
        self.depth = (self.depth + delims.braces).max(0);

        if let Some(class) = &mut self.open_class {
            class.entered |= delims.opens_brace;
            if class.entered && self.depth <= class.depth {
                self.open_class = None;
            }
        }

        symbol
    }
}

/// Extract top-level declarations and class methods from TS/JS source.
pub fn extract(content: &str) -> Vec<Symbol> {
    let code = code_lines(content);
    let mut walk = BraceWalk::default();
    let mut symbols = Vec::new();

    for idx in 0..code.len() {
        if let Some(sym) = walk.step(&code, idx) {
            symbols.push(sym);
        }
    }
    symbols
}

fn declared(
    caps: &Captures,
    kind: SymbolKind,
    exported: bool,
    parent: Option<&str>,
    code: &[String],
    idx: usize,
) -> Symbol {
    Symbol {
        name: caps["name"].to_string(),
        kind,
        line: idx + 1,
        end_line: Some(block_end(code, idx)),
        exported,
        signature: signature_of(&code[idx]),
        parent: parent.map(str::to_string),
    }
}

/// Top-level rules, first match wins.
fn top_level(trimmed: &str, code: &[String], idx: usize) -> Option<Symbol> {
    let rules: [(&Regex, SymbolKind); 6] = [
        (&*FUNCTION_RE, SymbolKind::Func),
        (&*ARROW_RE, SymbolKind::Func),
        (&*CLASS_RE, SymbolKind::Class),
        (&*INTERFACE_RE, SymbolKind::Interface),
        (&*ENUM_RE, SymbolKind::Enum),
        (&*TYPE_ALIAS_RE, SymbolKind::Type),
    ];

    for (re, kind) in rules {
        if let Some(caps) = re.captures(trimmed) {
            // `export default class extends Base` has no name of its own.
            if kind == SymbolKind::Class && &caps["name"] == "extends" {
                return None;
            }
            let exported = caps.name("export").is_some();
            return Some(declared(&caps, kind, exported, None, code, idx));
        }
    }

    let caps = VARIABLE_RE.captures(trimmed)?;
    let kind = if &caps["kw"] == "const" {
        SymbolKind::Const
    } else {
        SymbolKind::Var
    };
    let exported = caps.name("export").is_some();
    Some(declared(&caps, kind, exported, None, code, idx))
}

/// Member rule for lines directly inside an open class body.
fn member(trimmed: &str, class: &str, code: &[String], idx: usize) -> Option<Symbol> {
    let caps = METHOD_RE
        .captures(trimmed)
        .or_else(|| PROPERTY_FN_RE.captures(trimmed))?;
    let name = &caps["name"];
    if NOT_MEMBERS.contains(&name) {
        return None;
    }
    let private_marked = caps["mods"].split_whitespace().any(|m| m == "private");
    let exported = !(name.starts_with('_') || name.starts_with('#') || private_marked);
    Some(declared(
        &caps,
        SymbolKind::Method,
        exported,
        Some(class),
        code,
        idx,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
