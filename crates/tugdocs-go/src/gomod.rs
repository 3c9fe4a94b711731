//! `go.mod` parsing.
//!
//! Only the directives import resolution needs are interpreted: `module`,
//! `go`, `require` and `replace`. Other directives (`exclude`, `retract`,
//! `toolchain`, `godebug`, ...) are accepted and ignored. Both the single-line
//! and the parenthesized block forms are supported.

use thiserror::Error;
use winnow::ascii::space0;
use winnow::combinator::{alt, delimited, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};
use winnow::ModalResult;

/// Error type for `go.mod` parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoModError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("no module directive")]
    MissingModule,
}

/// A `require` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
}

/// A `replace` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old_path: String,
    pub old_version: Option<String>,
    pub new_path: String,
    pub new_version: Option<String>,
}

impl Replace {
    /// True when the replacement is a directory rather than a module.
    pub fn is_local(&self) -> bool {
        self.new_path.starts_with("./")
            || self.new_path.starts_with("../")
            || self.new_path.starts_with('/')
    }
}

/// Parsed contents of a `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoMod {
    pub module: String,
    pub go_version: Option<String>,
    pub requires: Vec<Require>,
    pub replaces: Vec<Replace>,
}

impl GoMod {
    /// Version required for module `path`.
    pub fn require_version(&self, path: &str) -> Option<&str> {
        self.requires
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.version.as_str())
    }

    /// The required module that provides `import_path`, by longest prefix.
    pub fn providing_module(&self, import_path: &str) -> Option<&Require> {
        self.requires
            .iter()
            .filter(|r| within_module(import_path, &r.path))
            .max_by_key(|r| r.path.len())
    }

    /// Replacement for module `path` at `version`. A replacement without an
    /// old version applies to every version.
    pub fn replacement(&self, path: &str, version: Option<&str>) -> Option<&Replace> {
        self.replaces.iter().rev().find(|r| {
            r.old_path == path
                && match (&r.old_version, version) {
                    (None, _) => true,
                    (Some(old), Some(v)) => old == v,
                    (Some(_), None) => false,
                }
        })
    }
}

/// True if `import_path` is `module` or a package inside it.
pub fn within_module(import_path: &str, module: &str) -> bool {
    import_path == module
        || import_path
            .strip_prefix(module)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Escape a module path or version for the module cache: each upper-case
/// letter becomes `!` followed by its lower-case form.
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(ch.to_ascii_lowercase());
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

/// Parse the contents of a `go.mod` file.
pub fn parse_go_mod(text: &str) -> Result<GoMod, GoModError> {
    let mut module = None;
    let mut go_version = None;
    let mut requires = Vec::new();
    let mut replaces = Vec::new();
    let mut block: Option<String> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        if block.is_some() && line == ")" {
            block = None;
            continue;
        }

        let words = line_words(line).map_err(|message| GoModError::Syntax {
            line: line_no,
            message,
        })?;
        let (verb, args) = match block.clone() {
            Some(verb) => (verb, &words[..]),
            None => match words.split_first() {
                Some((verb, args)) => (verb.clone(), args),
                None => continue,
            },
        };
        if block.is_none() && args.len() == 1 && args[0] == "(" {
            block = Some(verb);
            continue;
        }
        let verb = verb.as_str();

        let syntax = |message: &str| GoModError::Syntax {
            line: line_no,
            message: format!("{}: {}", verb, message),
        };
        match verb {
            "module" => match args {
                [path] => module = Some(path.clone()),
                _ => return Err(syntax("expected a module path")),
            },
            "go" => match args {
                [version] => go_version = Some(version.clone()),
                _ => return Err(syntax("expected a version")),
            },
            "require" => match args {
                [path, version] => requires.push(Require {
                    path: path.clone(),
                    version: version.clone(),
                }),
                _ => return Err(syntax("expected a module path and version")),
            },
            "replace" => replaces.push(parse_replace(args).ok_or_else(|| {
                syntax("expected 'old [version] => new [version]'")
            })?),
            _ => {}
        }
    }

    Ok(GoMod {
        module: module.ok_or(GoModError::MissingModule)?,
        go_version,
        requires,
        replaces,
    })
}

fn parse_replace(args: &[String]) -> Option<Replace> {
    let arrow = args.iter().position(|w| w == "=>")?;
    let (old, new) = (&args[..arrow], &args[arrow + 1..]);
    let (old_path, old_version) = match old {
        [path] => (path.clone(), None),
        [path, version] => (path.clone(), Some(version.clone())),
        _ => return None,
    };
    let (new_path, new_version) = match new {
        [path] => (path.clone(), None),
        [path, version] => (path.clone(), Some(version.clone())),
        _ => return None,
    };
    Some(Replace {
        old_path,
        old_version,
        new_path,
        new_version,
    })
}

/// Drop a `//` comment, unless it appears inside a quoted string.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev = '\0';
    for (i, ch) in line.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '`' => quote = Some(ch),
            None if ch == '/' && prev == '/' => return &line[..i - 1],
            None => {}
        }
        prev = ch;
    }
    line
}

// ============================================================================
// Word splitting using winnow
// ============================================================================

fn line_words(line: &str) -> Result<Vec<String>, String> {
    terminated(words, space0)
        .parse(line)
        .map_err(|e| format!("{:?}", e))
}

fn words(input: &mut &str) -> ModalResult<Vec<String>> {
    repeat(0.., preceded(space0, word)).parse_next(input)
}

/// A quoted string (without its quotes) or a run of non-space characters.
fn word(input: &mut &str) -> ModalResult<String> {
    alt((
        delimited('"', take_till(0.., |c: char| c == '"'), '"').map(str::to_string),
        delimited('`', take_till(0.., |c: char| c == '`'), '`').map(str::to_string),
        take_while(1.., |c: char| !c.is_whitespace()).map(str::to_string),
    ))
    .parse_next(input)
}

// ============================================================================
// Tests
// ============================================================================
