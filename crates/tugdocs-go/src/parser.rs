//! Declaration parser for Go source files.
//!
//! Parses a token stream into a [`SourceFile`]. Parsing happens in two
//! passes:
//!
//! 1. Comment grouping: comments are separated from code, grouped the way Go
//!    groups them, and each group that ends on the line just above a code
//!    token becomes that token's *lead* comment.
//! 2. Declarations: a `peg` grammar over the code tokens ([`TokVec`]) parses
//!    the top level of the file. Function bodies and constant declarations
//!    only need balanced brackets, so only the shapes in [`crate::ast`] are
//!    understood in detail. Shapes the grammar does not model (struct, map,
//!    func types, composite literals...) become `Other` spans.
//!
//! ## Comment grouping
//!
//! - Comments on adjacent lines form one group.
//! - A group that starts on the same line as the preceding code token is a
//!   *trailing* group and only extends over comments on that same line. It
//!   is never a lead comment.
//! - The last group before a code token is the token's lead comment when it
//!   ends on the line immediately above the token.
//! - Automatically inserted semicolons are transparent for these rules.

use std::fmt;
use std::path::PathBuf;

use peg::{Parse, ParseElem, RuleResult};
use thiserror::Error;
use tugdocs_core::text::{LineIndex, Span};

use crate::ast::{
    Decl, Expr, Field, FuncDecl, Ident, ImportSpec, InterfaceMethod, InterfaceType, SourceFile,
    TypeExpr, TypeSpec, ValueSpec,
};
use crate::comments::{Comment, CommentGroup, CommentSet, GroupId};
use crate::lexer::{tokenize, LexError, Token, TokenKind};

// ============================================================================
// Errors
// ============================================================================

/// Failure to parse a source file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{path}:{source}")]
    Lex {
        path: String,
        #[source]
        source: LexError,
    },

    #[error("{path}:{line}:{col}: {message}")]
    Syntax {
        path: String,
        line: u32,
        col: u32,
        message: String,
    },
}

impl ParseError {
    fn syntax(path: &str, err: peg::error::ParseError<SourcePosition>) -> Self {
        ParseError::Syntax {
            path: path.to_string(),
            line: err.location.line,
            col: err.location.col,
            message: format!("expected {}", err.expected),
        }
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse a Go source file.
///
/// `path` is where the file lives on disk; `display_path` is used in error
/// messages and reports.
pub fn parse_file(
    path: impl Into<PathBuf>,
    display_path: impl Into<String>,
    source: impl Into<String>,
) -> Result<SourceFile, ParseError> {
    let path = path.into();
    let display_path = display_path.into();
    let source = source.into();

    let tokens = tokenize(&source).map_err(|source| ParseError::Lex {
        path: display_path.clone(),
        source,
    })?;
    let line_index = LineIndex::new(&source);
    let layout = group_comments(&source, &tokens);

    let input = TokVec {
        tokens: &layout.code,
        line_index: &line_index,
        eof: source.len(),
    };
    let (package, imports, decls) =
        go::file(&input, &source, &layout.code, &layout.leads)
            .map_err(|err| ParseError::syntax(&display_path, err))?;

    Ok(SourceFile {
        path,
        display_path,
        package,
        imports,
        decls,
        comments: CommentSet::new(layout.groups.clone()),
        original_groups: layout.groups,
        line_index,
        source,
    })
}

// ============================================================================
// Comment grouping
// ============================================================================

#[derive(Debug, Default)]
struct CommentLayout {
    /// Tokens other than comments.
    code: Vec<Token>,
    /// Lead comment group of each code token.
    leads: Vec<Option<GroupId>>,
    groups: Vec<CommentGroup>,
}

fn group_comments(source: &str, tokens: &[Token]) -> CommentLayout {
    let mut layout = CommentLayout::default();
    let mut run: Vec<Token> = Vec::new();
    let mut prev_line: Option<u32> = None;

    for tok in tokens {
        match tok.kind {
            TokenKind::Comment => run.push(*tok),
            TokenKind::Semi { implicit: true } => {
                layout.code.push(*tok);
                layout.leads.push(None);
            }
            _ => {
                let last = flush_run(source, &mut layout.groups, &run, prev_line);
                run.clear();
                let lead = last
                    .filter(|(_, end_line)| end_line + 1 == tok.line)
                    .map(|(id, _)| id);
                layout.code.push(*tok);
                layout.leads.push(lead);
                prev_line = Some(tok.end_line);
            }
        }
    }
    flush_run(source, &mut layout.groups, &run, prev_line);
    layout
}

/// Group a run of consecutive comments. Returns the id and end line of the
/// last non-trailing group, the only candidate for a lead comment.
fn flush_run(
    source: &str,
    groups: &mut Vec<CommentGroup>,
    run: &[Token],
    prev_line: Option<u32>,
) -> Option<(GroupId, u32)> {
    let mut k = 0;
    if run.first().is_some_and(|c| Some(c.line) == prev_line) {
        take_group(source, groups, run, &mut k, 0);
    }
    let mut last = None;
    while k < run.len() {
        last = Some(take_group(source, groups, run, &mut k, 1));
    }
    last
}

/// Take comments from `run[*k..]` while each starts no more than `gap` lines
/// after the previous one ended.
fn take_group(
    source: &str,
    groups: &mut Vec<CommentGroup>,
    run: &[Token],
    k: &mut usize,
    gap: u32,
) -> (GroupId, u32) {
    let first = *k;
    let mut end_line = run[first].end_line;
    *k += 1;
    while *k < run.len() && run[*k].line <= end_line + gap {
        end_line = run[*k].end_line;
        *k += 1;
    }

    let id = GroupId(groups.len() as u32);
    let comments: Vec<Comment> = run[first..*k]
        .iter()
        .map(|c| Comment {
            span: c.span,
            text: c.text(source).to_string(),
        })
        .collect();
    groups.push(CommentGroup::Original {
        id,
        span: run[first].span.cover(&run[*k - 1].span),
        comments,
    });
    (id, end_line)
}

// ============================================================================
// Grammar input
// ============================================================================

/// Line and column of a grammar position, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// The code tokens of a file (comments removed) as grammar input.
pub struct TokVec<'a> {
    tokens: &'a [Token],
    line_index: &'a LineIndex,
    /// Source length, reported as the position of end of input.
    eof: usize,
}

impl Parse for TokVec<'_> {
    type PositionRepr = SourcePosition;

    fn start(&self) -> usize {
        0
    }

    fn is_eof(&self, pos: usize) -> bool {
        pos >= self.tokens.len()
    }

    fn position_repr(&self, pos: usize) -> SourcePosition {
        let offset = self.tokens.get(pos).map_or(self.eof, |t| t.span.start);
        let (line, col) = self.line_index.position_of(offset);
        SourcePosition { line, col }
    }
}

impl<'input, 'a: 'input> ParseElem<'input> for TokVec<'a> {
    type Element = Token;

    fn parse_elem(&'input self, pos: usize) -> RuleResult<Token> {
        match self.tokens.get(pos) {
            Some(tok) => RuleResult::Matched(pos + 1, *tok),
            None => RuleResult::Failed,
        }
    }
}

// ============================================================================
// Grammar
// ============================================================================

type Parsed = (Ident, Vec<ImportSpec>, Vec<Decl>);

/// Top-level declaration, before imports and other declarations are split.
enum Item {
    Imports(Vec<ImportSpec>),
    Decls(Vec<Decl>),
}

/// Receiver list entry: `r *T` is named, `T` or `*T` alone is not.
enum Param {
    Named(Ident, TypeExpr),
    Unnamed(TypeExpr),
}

enum Element {
    Method(InterfaceMethod),
    Embed(TypeExpr),
}

fn ident(source: &str, tok: &Token) -> Ident {
    Ident {
        name: tok.text(source).to_string(),
        span: tok.span,
    }
}

fn is_bracket(source: &str, tok: &Token) -> bool {
    tok.kind == TokenKind::Punct && matches!(tok.text(source), "(" | ")" | "[" | "]" | "{" | "}")
}

/// Span from token `start` up to, not including, token `end`.
fn span(code: &[Token], start: usize, end: usize) -> Span {
    code[start].span.cover(&code[end - 1].span)
}

fn unquote(literal: &str) -> String {
    literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default()
        .to_string()
}

/// Group receiver entries into fields. In `(a, b T)` the bare `a` shares
/// the type of the next named entry.
fn fields(params: Vec<Param>) -> Vec<Field> {
    let any_named = params.iter().any(|p| matches!(p, Param::Named(..)));
    let mut fields = Vec::new();
    let mut pending = Vec::new();
    for param in params {
        match param {
            Param::Named(name, ty) => {
                pending.push(name);
                fields.push(Field {
                    names: std::mem::take(&mut pending),
                    ty,
                });
            }
            Param::Unnamed(TypeExpr::Name(name)) if any_named => pending.push(name),
            Param::Unnamed(ty) => fields.push(Field {
                names: Vec::new(),
                ty,
            }),
        }
    }
    fields
}

fn interface(span: Span, elements: Vec<Element>) -> InterfaceType {
    let mut methods = Vec::new();
    let mut embeds = Vec::new();
    for element in elements {
        match element {
            Element::Method(method) => methods.push(method),
            Element::Embed(ty) => embeds.push(ty),
        }
    }
    InterfaceType {
        span,
        methods,
        embeds,
    }
}

peg::parser! {
    grammar go<'a>(src: &'a str, code: &'a [Token], leads: &'a [Option<GroupId>]) for TokVec<'a> {

        // --------------------------------------------------------------
        // File
        // --------------------------------------------------------------

        pub rule file() -> Parsed
            = semi()* keyword("package") package:name() stmt_end() semi()*
              items:(top_level() ** semis()) semi()* ![_]
            {
                let mut imports = Vec::new();
                let mut decls = Vec::new();
                for item in items {
                    match item {
                        Item::Imports(specs) => imports.extend(specs),
                        Item::Decls(specs) => decls.extend(specs),
                    }
                }
                (package, imports, decls)
            }

        rule top_level() -> Item
            = keyword("import") v:specs(<import_spec()>) { Item::Imports(v) }
            / keyword("type") v:specs(<type_spec()>) {
                Item::Decls(v.into_iter().map(Decl::Type).collect())
            }
            / keyword("var") v:specs(<value_spec()>) {
                Item::Decls(v.into_iter().map(Decl::Var).collect())
            }
            / keyword("const") specs(<const_spec()>) { Item::Decls(Vec::new()) }
            / f:func_decl() { Item::Decls(vec![Decl::Func(f)]) }

        // The single form `kw spec` or the grouped form `kw ( spec; ... )`.
        rule specs<T>(spec: rule<T>) -> Vec<T>
            = punct("(") semi()* v:(spec() ** semis()) semi()* punct(")") { v }
            / v:spec() { vec![v] }

        rule spec_end() -> () = semi() {} / punct(")") / ![_]

        // --------------------------------------------------------------
        // Declarations
        // --------------------------------------------------------------

        rule import_spec() -> ImportSpec
            = s:position!() name:import_name()? path:literal() e:position!()
            {
                ImportSpec {
                    name,
                    path: unquote(path.text(src)),
                    span: span(code, s, e),
                }
            }

        rule import_name() -> String
            = [t] {?
                if t.kind == TokenKind::Ident || t.is_punct(src, ".") {
                    Ok(t.text(src).to_string())
                } else {
                    Err("import name")
                }
            }

        rule type_spec() -> TypeSpec
            = s:position!() name:name() params:type_params()? alias:punct("=")?
              ty:type_in(<spec_end()>) e:position!()
            {
                TypeSpec {
                    name,
                    alias: alias.is_some(),
                    has_type_params: params.is_some(),
                    ty,
                    span: span(code, s, e),
                }
            }

        // `[T any]`; `[N]T` and `[]T` are array and slice types instead.
        rule type_params() -> () = punct("[") name() !punct("]") chunk() punct("]") {}

        rule value_spec() -> ValueSpec
            = s:position!() names:(name() ++ punct(","))
              ty:(!punct("=") t:type_in(<var_type_end()>) { t })?
              values:(punct("=") v:(expr_in(<value_end()>) ++ punct(",")) { v })?
              e:position!() &spec_end()
            {
                ValueSpec {
                    names,
                    ty,
                    values: values.unwrap_or_default(),
                    span: span(code, s, e),
                }
            }

        rule var_type_end() -> () = punct("=") / spec_end()
        rule value_end() -> () = punct(",") / spec_end()

        rule const_spec() -> () = (balanced() / plain())+ {}

        rule func_decl() -> FuncDecl
            = s:position!() keyword("func") recv:receiver()? name:name() chunk() e:position!()
            {
                FuncDecl {
                    doc: leads[s],
                    recv,
                    name,
                    span: span(code, s, e),
                }
            }

        rule receiver() -> Vec<Field>
            = punct("(") params:(param() ** punct(",")) punct(",")? punct(")") { fields(params) }

        rule param() -> Param
            = n:name() !(punct(".") / punct("[") / param_end()) t:type_in(<param_end()>) {
                Param::Named(n, t)
            }
            / t:type_in(<param_end()>) { Param::Unnamed(t) }

        rule param_end() -> () = punct(",") / punct(")")

        // --------------------------------------------------------------
        // Types
        // --------------------------------------------------------------

        // A type running up to `end`, or the `Other` span of whatever does.
        rule type_in(end: rule<()>) -> TypeExpr
            = t:type_expr() &end() { t }
            / s:position!() (!end() (balanced() / plain()))+ e:position!() {
                TypeExpr::Other(span(code, s, e))
            }

        rule type_expr() -> TypeExpr
            = punct("*") t:type_expr() { TypeExpr::Pointer(Box::new(t)) }
            / punct("(") t:type_in(<punct(")")>) punct(")") { TypeExpr::Paren(Box::new(t)) }
            / i:interface_type() { TypeExpr::Interface(i) }
            / base:named_type() args:type_args()? {
                match args {
                    Some(args) => TypeExpr::Generic { base: Box::new(base), args },
                    None => base,
                }
            }

        rule named_type() -> TypeExpr
            = package:name() punct(".") name:name() { TypeExpr::Qualified { package, name } }
            / n:name() { TypeExpr::Name(n) }

        rule type_args() -> Vec<TypeExpr>
            = punct("[") args:(type_in(<arg_end()>) ++ punct(",")) punct(",")? punct("]") { args }

        rule arg_end() -> () = punct(",") / punct("]")

        rule interface_type() -> InterfaceType
            = s:position!() keyword("interface") punct("{") semi()*
              elements:(element() ** semis()) semi()* punct("}") e:position!()
            { interface(span(code, s, e), elements) }

        rule element() -> Element
            = s:position!() n:name() &punct("(") chunk() e:position!() &element_end() {
                Element::Method(InterfaceMethod {
                    name: n,
                    doc: leads[s],
                    span: span(code, s, e),
                })
            }
            / t:type_in(<element_end()>) { Element::Embed(t) }

        rule element_end() -> () = semi() {} / punct("}")

        // --------------------------------------------------------------
        // Expressions
        // --------------------------------------------------------------

        rule expr_in(end: rule<()>) -> Expr
            = x:expr() &end() { x }
            / s:position!() (!end() (balanced() / plain()))+ e:position!() {
                Expr::Other(span(code, s, e))
            }

        // Unary `*` binds looser than calls: `*f(x)` is `*(f(x))`.
        rule expr() -> Expr
            = s:position!() punct("*") inner:expr() e:position!() {
                Expr::Star { inner: Box::new(inner), span: span(code, s, e) }
            }
            / s:position!() fun:operand() calls:(a:call_args() e:position!() { (a, e) })* {
                calls.into_iter().fold(fun, |fun, (args, e)| Expr::Call {
                    fun: Box::new(fun),
                    args,
                    span: span(code, s, e),
                })
            }

        rule operand() -> Expr
            = n:name() { Expr::Ident(n) }
            / s:position!() punct("(") inner:expr_in(<punct(")")>) punct(")") e:position!() {
                Expr::Paren { inner: Box::new(inner), span: span(code, s, e) }
            }

        rule call_args() -> Vec<Expr>
            = punct("(") args:(expr_in(<param_end()>) ** punct(",")) punct(",")? punct(")") { args }

        // --------------------------------------------------------------
        // Tokens
        // --------------------------------------------------------------

        // Tokens up to the next semicolon or unmatched closing bracket.
        rule chunk() = (balanced() / plain())*

        rule balanced()
            = punct("(") (balanced() / plain() / semi())* punct(")")
            / punct("[") (balanced() / plain() / semi())* punct("]")
            / punct("{") (balanced() / plain() / semi())* punct("}")

        rule plain()
            = [t] {? if t.is_semi() || is_bracket(src, &t) { Err("token") } else { Ok(()) } }

        rule punct(p: &'static str) -> ()
            = [t] {? if t.is_punct(src, p) { Ok(()) } else { Err(p) } }

        rule keyword(kw: &'static str)
            = [t] {? if t.is_keyword(src, kw) { Ok(()) } else { Err(kw) } }

        rule name() -> Ident
            = [t] {? if t.is_name(src) { Ok(ident(src, &t)) } else { Err("identifier") } }

        rule literal() -> Token
            = [t] {? if t.kind == TokenKind::Literal { Ok(t) } else { Err("literal") } }

        rule semi() = [t] {? if t.is_semi() { Ok(()) } else { Err("';' or newline") } }

        rule semis() = semi()+

        rule stmt_end() = semi() / ![_]
    }
}

// ============================================================================
// Tests
// ============================================================================
