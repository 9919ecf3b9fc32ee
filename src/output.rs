//! Output formatting: grep-compatible (default) and JSON (`--json`).
//!
//! All result data flows through a [`Formatter`] which writes to an
//! arbitrary [`std::io::Write`] destination (typically stdout).
//! Headers, hints and errors always go to stderr.

use std::io::Write;

use serde::Serialize;

use ripple::errors::RippleError;
use ripple::types::{ImpactResult, RefMatch, RefsResult, Symbol};

/// A symbol row for `symbols` output, carrying the file it came from.
#[derive(Debug, Serialize)]
pub struct SymbolOutput<'a> {
    pub file: &'a str,
    #[serde(flatten)]
    pub symbol: &'a Symbol,
}

/// Output formatter that can render results in either grep-compatible text
/// or JSON.
pub struct Formatter<W: Write> {
    writer: W,
    json: bool,
}

impl<W: Write> Formatter<W> {
    /// * `writer` - The destination for output (e.g. `std::io::stdout()`).
    /// * `json`   - When `true`, emit JSON; otherwise, emit grep-style text.
    pub fn new(writer: W, json: bool) -> Self {
        Self { writer, json }
    }

    fn write_json<T: Serialize>(&mut self, value: &T) -> std::io::Result<()> {
        let line = serde_json::to_string(value).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    /// `file:line:  kind name`, or one JSON object per symbol.
    pub fn format_symbol(&mut self, file: &str, sym: &Symbol) -> std::io::Result<()> {
        if self.json {
            return self.write_json(&SymbolOutput { file, symbol: sym });
        }
        match &sym.parent {
            Some(parent) => writeln!(self.writer, "{file}:{}:  {} {parent}.{}", sym.line, sym.kind, sym.name),
            None => writeln!(self.writer, "{file}:{}:  {} {}", sym.line, sym.kind, sym.name),
        }
    }

    fn format_ref(&mut self, m: &RefMatch) -> std::io::Result<()> {
        if self.json {
            return self.write_json(m);
        }
        writeln!(self.writer, "{}:{}:{}", m.path, m.line, m.content)
    }

    /// Definition first (when found), then every reference in scan order.
    pub fn format_refs(&mut self, result: &RefsResult) -> std::io::Result<()> {
        if let Some(def) = &result.definition {
            self.format_ref(def)?;
        }
        for m in &result.references {
            self.format_ref(m)?;
        }
        Ok(())
    }

    /// Layer rows on the writer, `depth N` headers and the summary on
    /// stderr. JSON mode emits the whole result as one document.
    pub fn format_impact(&mut self, result: &ImpactResult) -> std::io::Result<()> {
        if self.json {
            return self.write_json(result);
        }
        for layer in &result.layers {
            print_category_header(&format!("depth {}", layer.depth));
            for r in &layer.refs {
                match &r.enclosing_symbol {
                    Some(enclosing) => writeln!(self.writer, "{}:{}: [{enclosing}] {}", r.path, r.line, r.content)?,
                    None => writeln!(self.writer, "{}:{}: {}", r.path, r.line, r.content)?,
                }
            }
        }
        let s = &result.summary;
        print_category_header(&format!(
            "{} site(s) in {} file(s), max depth {}",
            s.total_ref_sites, s.total_files, s.max_depth_reached
        ));
        Ok(())
    }
}

/// Print a hint message to stderr (suppressed when `json` is true).
pub fn print_hint(msg: &str, json: bool) {
    if !json {
        eprintln!("hint: {msg}");
    }
}

/// Print a category header to stderr.
///
/// Headers go to stderr so they don't break grep-compatible stdout parsing.
pub fn print_category_header(header: &str) {
    eprintln!("{header}");
}

/// Print an error message to stderr.
pub fn print_error(msg: &str) {
    eprintln!("error: {msg}");
}

/// Format a [`RippleError`] to stderr with `error:` / `hint:` lines and
/// return the exit code.
pub fn format_error(err: &RippleError, json: bool) -> i32 {
    print_error(&format!("{err}"));
    if let Some(hint) = err.hint() {
        print_hint(hint, json);
    }
    err.exit_code()
}
