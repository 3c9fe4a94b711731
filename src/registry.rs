//! Interface method documentation, indexed by interface and method.

use std::collections::HashMap;

use tracing::{debug, trace};
use tugdocs_go::comments::CommentGroup;
use tugdocs_go::loader::Package;
use tugdocs_go::types::{interface_shape, PackageLookup};

/// Documentation of interface methods, keyed `"<pkg>.<Iface>/<Method>"`.
///
/// Values are the raw comment texts of the method's doc group, markers
/// included, in source order.
#[derive(Debug, Clone, Default)]
pub struct InterfaceRegistry {
    docs: HashMap<String, Vec<String>>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for method `method` of the interface displayed as `interface`.
    pub fn key(interface: &str, method: &str) -> String {
        format!("{}/{}", interface, method)
    }

    /// Record the documented methods of every interface declared in `pkg`.
    /// Returns how many methods were recorded.
    pub fn register(&mut self, lookup: &impl PackageLookup, pkg: &Package) -> usize {
        let mut count = 0;
        for file in &pkg.files {
            for spec in file.types() {
                let Some((shape_file, shape)) = interface_shape(lookup, pkg, file, spec) else {
                    continue;
                };
                let interface = format!("{}.{}", pkg.path, spec.name.name);
                for method in &shape.methods {
                    let Some(group) = method.doc.and_then(|id| shape_file.original_group(id))
                    else {
                        trace!(interface = %interface, method = %method.name.name, "Skipping undocumented method");
                        continue;
                    };
                    if group.text().is_empty() {
                        trace!(interface = %interface, method = %method.name.name, "Skipping directive-only doc");
                        continue;
                    }
                    self.insert(Self::key(&interface, &method.name.name), raw_lines(group));
                    count += 1;
                }
            }
        }
        debug!(package = %pkg.path, methods = count, "Registered interface docs");
        count
    }

    /// Store `lines` under `key`, replacing any earlier entry.
    pub fn insert(&mut self, key: String, lines: Vec<String>) {
        debug!(key = %key, lines = lines.len(), "Registered method doc");
        self.docs.insert(key, lines);
    }

    /// Doc lines of `method` on the interface displayed as `interface`.
    pub fn lookup(&self, interface: &str, method: &str) -> Option<&[String]> {
        self.docs
            .get(&Self::key(interface, method))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn raw_lines(group: &CommentGroup) -> Vec<String> {
    group.texts().into_iter().map(str::to_string).collect()
}
