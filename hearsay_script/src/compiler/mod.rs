//! Grammar rules for the scripting language and the compile entry points.
//!
//! Rules are plain functions with the [`Parser`] signature, so they can call each
//! other recursively and be passed straight into combinators.

use std::fmt;

use hearsay_data::{BindingRegistry, NoBindings, Script, ValueType};
use log::info;
use thiserror::Error;

use crate::config::CompileOptions;
use crate::parse::{ParseError, ParseState, Parser, whitespaces};

mod context;
pub mod expression;
pub mod script;
pub mod text;

pub use context::{Context, Mark};

/// A position in the source, with 1-based line and column.
///
/// `offset` counts characters from the start of the source; `byte_offset` is the
/// same position in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub byte_offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to line and column numbers. `\n`, `\r\n` and a lone `\r`
/// each end a line.
pub struct SourceMap {
    line_starts: Vec<usize>,
    src: String,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut starts = vec![0usize];
        for (i, &b) in bytes.iter().enumerate() {
            let ends_line = b == b'\n' || (b == b'\r' && bytes.get(i + 1) != Some(&b'\n'));
            if ends_line {
                starts.push(i + 1);
            }
        }
        Self {
            line_starts: starts,
            src: source.to_string(),
        }
    }

    pub fn locate(&self, offset: usize) -> Location {
        let mut offset = offset.min(self.src.len());
        while !self.src.is_char_boundary(offset) {
            offset -= 1;
        }
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(idx).copied().unwrap_or(0);
        let column = self.src[line_start..offset].chars().count() + 1;
        Location {
            offset: self.src[..offset].chars().count(),
            byte_offset: offset,
            line: idx + 1,
            column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{at}: expected {}", .expected.join(" or "))]
    Syntax { at: Location, expected: Vec<String> },
    #[error("{at}: {reason}")]
    Semantic { at: Location, reason: String },
    #[error("{at}: cannot jump to \"{id}\", no block has that name")]
    UnresolvedJump { at: Location, id: String },
    #[error("{at}: \"{name}\" is used as a {found} but it is a {expected}")]
    VariableType {
        at: Location,
        name: String,
        expected: ValueType,
        found: ValueType,
    },
}

impl CompileError {
    pub fn from_parse(error: ParseError, map: &SourceMap) -> Self {
        match error {
            ParseError::Expected(failure) => CompileError::Syntax {
                at: map.locate(failure.index),
                expected: failure.expected,
            },
            ParseError::Reason { index, reason } => CompileError::Semantic {
                at: map.locate(index),
                reason,
            },
        }
    }

    pub fn location(&self) -> Location {
        match self {
            CompileError::Syntax { at, .. }
            | CompileError::Semantic { at, .. }
            | CompileError::UnresolvedJump { at, .. }
            | CompileError::VariableType { at, .. } => *at,
        }
    }
}

/// Compile a script that calls no bindings.
///
/// # Errors
/// Returns the syntax or semantic error that stopped compilation.
pub fn compile(source: &str, options: &CompileOptions) -> Result<Script, CompileError> {
    compile_with(source, options, &NoBindings)
}

/// Compile a script, checking binding calls against `registry`.
///
/// # Errors
/// Returns the syntax or semantic error that stopped compilation.
pub fn compile_with(
    source: &str,
    options: &CompileOptions,
    registry: &dyn BindingRegistry,
) -> Result<Script, CompileError> {
    info!(
        "compiling {} bytes of script (tab size {})",
        source.len(),
        options.tab_size
    );
    let map = SourceMap::new(source);
    let mut ctx = Context::new(registry);
    let graph = parse_source(source, options.tab_size, &mut ctx).map_err(|e| CompileError::from_parse(e, &map))?;
    ctx.resolve_variables(&map)?;
    ctx.check_jumps(&graph, &map)?;
    info!("compiled {} block(s)", graph.len());
    Ok(graph)
}

fn parse_source(source: &str, tab_size: usize, ctx: &mut Context<'_>) -> Result<Script, ParseError> {
    let start = ParseState::new(source, tab_size);
    let (_, first) = whitespaces().parse(start, ctx)?;
    if first.is_eof() {
        return Ok(Script::new());
    }
    let (graph, end) = script::script(start, ctx)?;
    let (_, rest) = whitespaces().parse(end, ctx)?;
    if !rest.is_eof() {
        return Err(ParseError::expected(
            rest.index(),
            format!("line indented to column {}", first.column()),
        ));
    }
    Ok(graph)
}
