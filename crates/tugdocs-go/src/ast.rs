//! Declaration-level syntax model for Go source files.
//!
//! Only what documentation syncing needs is modeled: the package clause,
//! imports, top-level type, var and func declarations, and interface method
//! lists. Function bodies, constants and expressions outside the marker
//! shape are kept as opaque spans.

use std::path::PathBuf;

use tugdocs_core::text::{LineIndex, Span};

use crate::comments::{CommentGroup, CommentSet, GroupId};

/// An identifier with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    /// True for the blank identifier `_`.
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

/// A type expression, as far as declarations need one resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `T`
    Name(Ident),
    /// `pkg.T`
    Qualified { package: Ident, name: Ident },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `(T)`
    Paren(Box<TypeExpr>),
    /// `T[A, B]`
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    /// `interface { ... }`
    Interface(InterfaceType),
    /// Anything else (struct, func, map, slice, channel, union...).
    Other(Span),
}

impl TypeExpr {
    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &TypeExpr {
        match self {
            TypeExpr::Paren(inner) => inner.unparen(),
            other => other,
        }
    }
}

/// An interface type literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub span: Span,
    pub methods: Vec<InterfaceMethod>,
    /// Embedded interfaces and type-set elements.
    pub embeds: Vec<TypeExpr>,
}

/// A method element of an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMethod {
    pub name: Ident,
    /// Lead comment group of the element.
    pub doc: Option<GroupId>,
    pub span: Span,
}

/// The subset of expressions a marker declaration is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(Ident),
    Paren { inner: Box<Expr>, span: Span },
    Star { inner: Box<Expr>, span: Span },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Other(Span),
}

/// `import name "path"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name (`f`, `.` or `_`), if any.
    pub name: Option<String>,
    /// Unquoted import path.
    pub path: String,
    pub span: Span,
}

/// `type Name[P any] = Type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: Ident,
    pub alias: bool,
    pub has_type_params: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `var a, b Type = x, y`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// A receiver or parameter field: zero or more names sharing one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    /// Lead comment group of the `func` keyword.
    pub doc: Option<GroupId>,
    /// Receiver fields; `None` for plain functions.
    pub recv: Option<Vec<Field>>,
    pub name: Ident,
    /// From `func` through the end of the body or signature.
    pub span: Span,
}

impl FuncDecl {
    /// The receiver type of a method with exactly one receiver parameter.
    pub fn single_receiver(&self) -> Option<&TypeExpr> {
        match self.recv.as_deref() {
            Some([field]) if field.names.len() <= 1 => Some(&field.ty),
            _ => None,
        }
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Type(TypeSpec),
    Var(ValueSpec),
    Func(FuncDecl),
}

/// A parsed Go source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path the file is read from and written back to.
    pub path: PathBuf,
    /// Path used in reports, relative to the workspace when possible.
    pub display_path: String,
    pub source: String,
    /// Name in the package clause.
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    /// Comment groups as parsed, indexed by [`GroupId`].
    pub original_groups: Vec<CommentGroup>,
    /// Comment groups currently attached to the file.
    pub comments: CommentSet,
    pub line_index: LineIndex,
}

impl SourceFile {
    /// 1-indexed `(line, col)` of a byte offset.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        self.line_index.position_of(offset)
    }

    /// Original comment group by id, whether or not it is still attached.
    pub fn original_group(&self, id: GroupId) -> Option<&CommentGroup> {
        self.original_groups.get(id.0 as usize)
    }

    /// True if a `//go:build ignore` (or legacy `// +build ignore`) constraint
    /// precedes the package clause.
    pub fn is_build_ignored(&self) -> bool {
        self.original_groups
            .iter()
            .filter(|g| g.pos() < self.package.span.start)
            .flat_map(|g| g.texts())
            .any(|text| {
                let constraint = text
                    .strip_prefix("//go:build ")
                    .or_else(|| text.strip_prefix("// +build "));
                constraint.is_some_and(|c| c.split_whitespace().any(|word| word == "ignore"))
            })
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Type(spec) => Some(spec),
            _ => None,
        })
    }

    pub fn vars(&self) -> impl Iterator<Item = &ValueSpec> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Var(spec) => Some(spec),
            _ => None,
        })
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(func) => Some(func),
            _ => None,
        })
    }
}
