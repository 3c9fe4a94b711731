//! In-memory packages for unit tests.
//!
//! Available to this crate's tests and, through the `test-support` feature,
//! to dependents' tests.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::ast::SourceFile;
use crate::loader::Package;
use crate::parser::parse_file;
use crate::types::PackageLookup;

/// Packages parsed from strings, by import path.
#[derive(Default)]
pub struct Packages(BTreeMap<String, Package>);

impl Packages {
    /// Add a package whose files have the given sources, in order.
    ///
    /// Panics if a source does not parse.
    pub fn add(&mut self, path: &str, sources: &[&str]) {
        let files: Vec<SourceFile> = sources
            .iter()
            .enumerate()
            .map(|(i, src)| {
                let name = format!("{}/file{}.go", path, i);
                parse_file(PathBuf::from(&name), name.clone(), *src)
                    .unwrap_or_else(|err| panic!("{}: {}", name, err))
            })
            .collect();
        let pkg = Package {
            path: path.to_string(),
            name: files[0].package.name.clone(),
            dir: PathBuf::from(path),
            module_root: None,
            files,
        };
        self.0.insert(path.to_string(), pkg);
    }

    pub fn pkg(&self, path: &str) -> &Package {
        &self.0[path]
    }
}

impl PackageLookup for Packages {
    fn lookup(&self, import_path: &str) -> Option<&Package> {
        self.0.get(import_path)
    }
}
