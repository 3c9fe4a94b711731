//! Concrete types asserted to implement an interface.
//!
//! The assertion is the marker declaration
//!
//! ```go
//! var _ Iface = (*Concrete)(nil)
//! ```
//!
//! Nothing else is inferred: a type that satisfies an interface without a
//! marker has no edge.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace, warn};
use tugdocs_go::ast::{Expr, Ident, SourceFile, TypeExpr, ValueSpec};
use tugdocs_go::loader::Package;
use tugdocs_go::types::{qualifier_candidates, resolve_interface, PackageLookup};

/// Interface display string per concrete type, keyed `"<pkg>.<Type>"`.
#[derive(Debug, Clone, Default)]
pub struct ImplementsMap {
    edges: HashMap<String, String>,
}

impl ImplementsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for type `type_name` declared in package `package`.
    pub fn key(package: &str, type_name: &str) -> String {
        format!("{}.{}", package, type_name)
    }

    /// Record an edge for every marker declaration in `pkg`. Returns how
    /// many markers were accepted.
    pub fn resolve(&mut self, lookup: &impl PackageLookup, pkg: &Package) -> usize {
        let mut count = 0;
        for file in &pkg.files {
            for spec in file.vars() {
                let Some((ty, concrete)) = marker(spec) else {
                    continue;
                };
                let Some(interface) = resolve_interface(lookup, pkg, file, ty) else {
                    trace!(
                        file = %file.display_path,
                        concrete = %concrete.name,
                        "Skipping marker whose declared type is not an interface"
                    );
                    continue;
                };
                self.insert(Self::key(&pkg.path, &concrete.name), interface.to_string());
                count += 1;
            }
        }
        count
    }

    /// Record that `key` implements `interface`. Last write wins.
    pub fn insert(&mut self, key: String, interface: String) {
        debug!(concrete = %key, interface = %interface, "Found implements marker");
        if let Some(previous) = self.edges.get(&key) {
            if *previous != interface {
                warn!(
                    concrete = %key,
                    previous = %previous,
                    interface = %interface,
                    "Type has several implements markers; using the last"
                );
            }
        }
        self.edges.insert(key, interface);
    }

    /// Interface asserted for `type_name` of `package`.
    pub fn get(&self, package: &str, type_name: &str) -> Option<&str> {
        self.edges
            .get(&Self::key(package, type_name))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Declared type and concrete type of a marker declaration.
///
/// Accepts exactly `var _ T = (*Ident)()` or `var _ T = (*Ident)(nil)`.
fn marker(spec: &ValueSpec) -> Option<(&TypeExpr, &Ident)> {
    let ty = spec.ty.as_ref()?;
    let ([name], [value]) = (spec.names.as_slice(), spec.values.as_slice()) else {
        return None;
    };
    if !name.is_blank() {
        return None;
    }
    let Expr::Call { fun, args, .. } = value else {
        return None;
    };
    let nil_only = match args.as_slice() {
        [] => true,
        [Expr::Ident(arg)] => arg.name == "nil",
        _ => false,
    };
    if !nil_only {
        return None;
    }
    let Expr::Paren { inner, .. } = fun.as_ref() else {
        return None;
    };
    let Expr::Star { inner, .. } = inner.as_ref() else {
        return None;
    };
    match inner.as_ref() {
        Expr::Ident(concrete) => Some((ty, concrete)),
        _ => None,
    }
}

/// Import paths that must be loaded before the markers of `pkg` can be
/// resolved: those that may provide a qualified marker type, or the
/// qualified target of a local type those markers name.
pub fn marker_imports(pkg: &Package) -> BTreeSet<String> {
    let mut wanted = BTreeSet::new();
    for file in &pkg.files {
        for spec in file.vars() {
            let Some((ty, _)) = marker(spec) else {
                continue;
            };
            let target = match ty.unparen() {
                TypeExpr::Name(ident) => pkg.type_spec(&ident.name).map(|(f, s)| (f, &s.ty)),
                _ => Some((file, ty)),
            };
            if let Some((file, ty)) = target {
                collect_qualified(file, ty, &mut wanted);
            }
        }
    }
    wanted
}

fn collect_qualified(file: &SourceFile, ty: &TypeExpr, wanted: &mut BTreeSet<String>) {
    if let TypeExpr::Qualified { package, .. } = ty.unparen() {
        wanted.extend(
            qualifier_candidates(file, &package.name)
                .into_iter()
                .map(str::to_string),
        );
    }
}
