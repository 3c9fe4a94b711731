//! Resolution of package-level named types.
//!
//! This is not a type checker. It answers the three questions documentation
//! syncing asks about declared types:
//!
//! - does a type expression denote an interface, and which one
//!   ([`resolve_interface`]);
//! - which interface literal holds the methods of an interface declaration
//!   ([`interface_shape`]);
//! - which declared type a method receiver belongs to
//!   ([`PackageScope::receiver_type_name`]).
//!
//! Named types and aliases are followed at most one step.

use std::collections::HashMap;
use std::fmt;

use crate::ast::{InterfaceType, SourceFile, TypeExpr, TypeSpec};
use crate::loader::{Loader, Package};

/// Access to loaded packages by import path.
pub trait PackageLookup {
    fn lookup(&self, import_path: &str) -> Option<&Package>;
}

impl PackageLookup for Loader {
    fn lookup(&self, import_path: &str) -> Option<&Package> {
        self.package(import_path)
    }
}

/// An interface type as it is displayed and keyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceRef {
    /// A declared interface, `<import path>.<Name>`.
    Named { package: String, name: String },
    /// The predeclared `error`.
    Error,
    /// The predeclared `any`.
    Any,
    /// An interface literal, whitespace-normalized.
    Literal(String),
}

impl fmt::Display for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceRef::Named { package, name } => write!(f, "{}.{}", package, name),
            InterfaceRef::Error => write!(f, "error"),
            InterfaceRef::Any => write!(f, "any"),
            InterfaceRef::Literal(text) => write!(f, "{}", text),
        }
    }
}

/// A named type reference after resolution.
enum NamedType<'p> {
    Declared {
        pkg: &'p Package,
        file: &'p SourceFile,
        spec: &'p TypeSpec,
    },
    Error,
    Any,
}

/// Resolve a `Name` or `pkg.Name` type expression seen in `file` of `pkg`.
fn lookup_named<'p>(
    lookup: &'p impl PackageLookup,
    pkg: &'p Package,
    file: &'p SourceFile,
    ty: &TypeExpr,
) -> Option<NamedType<'p>> {
    match ty.unparen() {
        TypeExpr::Name(ident) => match pkg.type_spec(&ident.name) {
            Some((file, spec)) => Some(NamedType::Declared { pkg, file, spec }),
            None => match ident.name.as_str() {
                "error" => Some(NamedType::Error),
                "any" => Some(NamedType::Any),
                _ => None,
            },
        },
        TypeExpr::Qualified { package, name } => {
            let target = resolve_qualifier(lookup, file, &package.name)?;
            let (file, spec) = target.type_spec(&name.name)?;
            Some(NamedType::Declared {
                pkg: target,
                file,
                spec,
            })
        }
        _ => None,
    }
}

/// The package a qualifier refers to in `file`: an import with that explicit
/// name, or an unnamed import whose package clause has that name.
pub fn resolve_qualifier<'p>(
    lookup: &'p impl PackageLookup,
    file: &SourceFile,
    qualifier: &str,
) -> Option<&'p Package> {
    for import in &file.imports {
        match import.name.as_deref() {
            Some(name) if name == qualifier => return lookup.lookup(&import.path),
            Some(_) => {}
            None => {
                if let Some(pkg) = lookup.lookup(&import.path) {
                    if pkg.name == qualifier {
                        return Some(pkg);
                    }
                }
            }
        }
    }
    None
}

/// Import paths that may provide `qualifier` in `file`, before any of them
/// is loaded. An explicitly named import wins; otherwise unnamed imports
/// whose last path element looks like the qualifier, and failing that every
/// unnamed import.
pub fn qualifier_candidates<'f>(file: &'f SourceFile, qualifier: &str) -> Vec<&'f str> {
    if let Some(import) = file
        .imports
        .iter()
        .find(|i| i.name.as_deref() == Some(qualifier))
    {
        return vec![import.path.as_str()];
    }
    let unnamed: Vec<&str> = file
        .imports
        .iter()
        .filter(|i| i.name.is_none() && i.path != "C")
        .map(|i| i.path.as_str())
        .collect();
    let guessed: Vec<&str> = unnamed
        .iter()
        .copied()
        .filter(|path| guess_package_name(path) == qualifier)
        .collect();
    if guessed.is_empty() {
        unnamed
    } else {
        guessed
    }
}

/// Conventional package name of an import path: its last element, skipping
/// a `/vN` major version suffix.
fn guess_package_name(path: &str) -> &str {
    let mut parts = path.rsplit('/');
    let last = parts.next().unwrap_or(path);
    let is_major = last
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
    match parts.next() {
        Some(prev) if is_major => prev,
        _ => last,
    }
}

/// The interface denoted by `ty`, written in `file` of `pkg`.
///
/// Accepts an interface literal, the predeclared `error` and `any`, a named
/// type whose underlying type is an interface (directly or through one more
/// named type), and an alias of such a named type. Generic types, pointers
/// and everything else are not interfaces.
pub fn resolve_interface(
    lookup: &impl PackageLookup,
    pkg: &Package,
    file: &SourceFile,
    ty: &TypeExpr,
) -> Option<InterfaceRef> {
    if let TypeExpr::Interface(literal) = ty.unparen() {
        return Some(literal_ref(file, literal));
    }
    match lookup_named(lookup, pkg, file, ty)? {
        NamedType::Error => Some(InterfaceRef::Error),
        NamedType::Any => Some(InterfaceRef::Any),
        NamedType::Declared { pkg, file, spec } => declared_interface(lookup, pkg, file, spec),
    }
}

fn declared_interface(
    lookup: &impl PackageLookup,
    pkg: &Package,
    file: &SourceFile,
    spec: &TypeSpec,
) -> Option<InterfaceRef> {
    if spec.has_type_params {
        return None;
    }
    if !spec.alias {
        return underlying_is_interface(lookup, pkg, file, spec, 1).then(|| InterfaceRef::Named {
            package: pkg.path.clone(),
            name: spec.name.name.clone(),
        });
    }

    if let TypeExpr::Interface(literal) = spec.ty.unparen() {
        return Some(literal_ref(file, literal));
    }
    match lookup_named(lookup, pkg, file, &spec.ty)? {
        NamedType::Error => Some(InterfaceRef::Error),
        NamedType::Any => Some(InterfaceRef::Any),
        NamedType::Declared {
            pkg: target_pkg,
            file: target_file,
            spec: target,
        } => (!target.alias
            && !target.has_type_params
            && underlying_is_interface(lookup, target_pkg, target_file, target, 0))
        .then(|| InterfaceRef::Named {
            package: target_pkg.path.clone(),
            name: target.name.name.clone(),
        }),
    }
}

fn underlying_is_interface(
    lookup: &impl PackageLookup,
    pkg: &Package,
    file: &SourceFile,
    spec: &TypeSpec,
    hops: u32,
) -> bool {
    if let TypeExpr::Interface(_) = spec.ty.unparen() {
        return true;
    }
    if hops == 0 {
        return false;
    }
    match lookup_named(lookup, pkg, file, &spec.ty) {
        Some(NamedType::Error | NamedType::Any) => true,
        Some(NamedType::Declared { pkg, file, spec }) => {
            !spec.has_type_params && underlying_is_interface(lookup, pkg, file, spec, hops - 1)
        }
        None => false,
    }
}

fn literal_ref(file: &SourceFile, literal: &InterfaceType) -> InterfaceRef {
    let text = &file.source[literal.span.start..literal.span.end];
    InterfaceRef::Literal(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// The interface literal holding the methods of `spec`, and the file it is
/// written in. Follows one named type or alias to reach the literal.
pub fn interface_shape<'p>(
    lookup: &'p impl PackageLookup,
    pkg: &'p Package,
    file: &'p SourceFile,
    spec: &'p TypeSpec,
) -> Option<(&'p SourceFile, &'p InterfaceType)> {
    if let TypeExpr::Interface(literal) = spec.ty.unparen() {
        return Some((file, literal));
    }
    match lookup_named(lookup, pkg, file, &spec.ty)? {
        NamedType::Declared { file, spec, .. } => match spec.ty.unparen() {
            TypeExpr::Interface(literal) => Some((file, literal)),
            _ => None,
        },
        NamedType::Error | NamedType::Any => None,
    }
}

// ============================================================================
// Receivers
// ============================================================================

/// Owned summary of one package's type declarations, used while the
/// package's files are being rewritten.
#[derive(Debug, Clone)]
pub struct PackageScope {
    pub path: String,
    /// Declared type name to its alias target (`None` for defined types).
    types: HashMap<String, Option<TypeExpr>>,
}

impl PackageScope {
    pub fn new(pkg: &Package) -> Self {
        let types = pkg
            .files
            .iter()
            .flat_map(|f| f.types())
            .map(|spec| {
                let target = spec.alias.then(|| spec.ty.clone());
                (spec.name.name.clone(), target)
            })
            .collect();
        PackageScope {
            path: pkg.path.clone(),
            types,
        }
    }

    /// Name of the declared type a method receiver belongs to.
    ///
    /// Strips parentheses, one pointer and type arguments, then follows an
    /// alias one step. Returns `None` unless the result is a type defined in
    /// this package.
    pub fn receiver_type_name(&self, recv: &TypeExpr) -> Option<String> {
        let base = strip_receiver(recv)?;
        match self.types.get(&base)? {
            None => Some(base),
            Some(target) => {
                let target = strip_generic(target.unparen())?;
                matches!(self.types.get(&target), Some(None)).then_some(target)
            }
        }
    }
}

fn strip_receiver(recv: &TypeExpr) -> Option<String> {
    match recv.unparen() {
        TypeExpr::Pointer(inner) => strip_generic(inner.unparen()),
        other => strip_generic(other),
    }
}

fn strip_generic(ty: &TypeExpr) -> Option<String> {
    match ty {
        TypeExpr::Name(ident) => Some(ident.name.clone()),
        TypeExpr::Generic { base, .. } => match base.unparen() {
            TypeExpr::Name(ident) => Some(ident.name.clone()),
            _ => None,
        },
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use crate::test_support::Packages;

    /// Resolve the declared type of each `var _ T` in the package's first file.
    fn marker_types(pkgs: &Packages, path: &str) -> Vec<Option<String>> {
        let pkg = pkgs.pkg(path);
        let file = &pkg.files[0];
        file.vars()
            .map(|v| {
                v.ty.as_ref()
                    .and_then(|ty| resolve_interface(pkgs, pkg, file, ty))
                    .map(|r| r.to_string())
            })
            .collect()
    }

    mod interfaces {
        use super::*;

        #[test]
        fn named_predeclared_and_literal() {
            let mut pkgs = Packages::default();
            pkgs.add(
                "example.com/p",
                &["package p\n\ntype Fooer interface{ Foo() }\ntype S struct{}\n\nvar _ Fooer\nvar _ error\nvar _ any\nvar _ interface {\n\tFoo()\n}\nvar _ S\nvar _ *Fooer\nvar _ Unknown\n"],
            );
            assert_eq!(
                marker_types(&pkgs, "example.com/p"),
                vec![
                    Some("example.com/p.Fooer".to_string()),
                    Some("error".to_string()),
                    Some("any".to_string()),
                    Some("interface { Foo() }".to_string()),
                    None,
                    None,
                    None,
                ]
            );
        }

        #[test]
        fn one_indirection_only() {
            let mut pkgs = Packages::default();
            pkgs.add(
                "example.com/p",
                &["package p\n\ntype Fooer interface{ Foo() }\ntype MyFooer Fooer\ntype Twice MyFooer\ntype Alias = Fooer\ntype AliasOfNamed = MyFooer\ntype G[T any] interface{ Get() T }\n\nvar _ MyFooer\nvar _ Twice\nvar _ Alias\nvar _ AliasOfNamed\nvar _ G[int]\n"],
            );
            assert_eq!(
                marker_types(&pkgs, "example.com/p"),
                vec![
                    Some("example.com/p.MyFooer".to_string()),
                    None,
                    Some("example.com/p.Fooer".to_string()),
                    None,
                    None,
                ]
            );
        }

        #[test]
        fn qualified_through_imports() {
            let mut pkgs = Packages::default();
            pkgs.add("io", &["package io\n\ntype Writer interface{ Write(p []byte) (int, error) }\n"]);
            pkgs.add(
                "example.com/x/v2",
                &["package x\n\ntype Doer interface{ Do() }\n"],
            );
            pkgs.add(
                "example.com/p",
                &["package p\n\nimport (\n\t\"io\"\n\tdo \"example.com/x/v2\"\n)\n\nvar _ io.Writer\nvar _ do.Doer\nvar _ x.Doer\nvar _ io.Reader\n"],
            );
            assert_eq!(
                marker_types(&pkgs, "example.com/p"),
                vec![
                    Some("io.Writer".to_string()),
                    Some("example.com/x/v2.Doer".to_string()),
                    None,
                    None,
                ]
            );
        }

        #[test]
        fn interface_shape_follows_one_step() {
            let mut pkgs = Packages::default();
            pkgs.add(
                "example.com/p",
                &["package p\n\ntype Fooer interface {\n\tFoo()\n}\ntype MyFooer Fooer\ntype S struct{}\n"],
            );
            let pkg = pkgs.pkg("example.com/p");
            let file = &pkg.files[0];
            let shapes: Vec<usize> = file
                .types()
                .map(|spec| {
                    interface_shape(&pkgs, pkg, file, spec)
                        .map(|(_, it)| it.methods.len())
                        .unwrap_or(0)
                })
                .collect();
            assert_eq!(shapes, vec![1, 1, 0]);
        }
    }

    mod qualifiers {
        use super::*;

        #[test]
        fn candidates_prefer_explicit_names() {
            let file = parse_file(
                "f.go",
                "f.go",
                "package p\n\nimport (\n\t\"io\"\n\tw \"example.com/writer\"\n\t\"gopkg.in/yaml.v3\"\n\t\"example.com/mod/v2\"\n)\n",
            )
            .unwrap();
            assert_eq!(qualifier_candidates(&file, "w"), vec!["example.com/writer"]);
            assert_eq!(qualifier_candidates(&file, "io"), vec!["io"]);
            assert_eq!(qualifier_candidates(&file, "mod"), vec!["example.com/mod/v2"]);
            assert_eq!(
                qualifier_candidates(&file, "yaml"),
                vec!["io", "gopkg.in/yaml.v3", "example.com/mod/v2"]
            );
        }
    }

    mod receivers {
        use super::*;

        fn receiver_names(source: &str) -> Vec<Option<String>> {
            let mut pkgs = Packages::default();
            pkgs.add("example.com/p", &[source]);
            let pkg = pkgs.pkg("example.com/p");
            let scope = PackageScope::new(pkg);
            pkg.files[0]
                .funcs()
                .map(|f| f.single_receiver().and_then(|r| scope.receiver_type_name(r)))
                .collect()
        }

        #[test]
        fn receiver_shapes() {
            let names = receiver_names(
                "package p\n\ntype T struct{}\ntype G[K any] struct{}\ntype A = T\ntype AP = *T\n\nfunc (t *T) A() {}\nfunc (t T) B() {}\nfunc (g *G[K]) C() {}\nfunc (a A) D() {}\nfunc (u *Undeclared) E() {}\nfunc (x, y T) F() {}\nfunc Plain() {}\nfunc (t (*T)) H() {}\nfunc (a AP) I() {}\n",
            );
            assert_eq!(
                names,
                vec![
                    Some("T".to_string()),
                    Some("T".to_string()),
                    Some("G".to_string()),
                    Some("T".to_string()),
                    None,
                    None,
                    None,
                    Some("T".to_string()),
                    None,
                ]
            );
        }
    }
}
