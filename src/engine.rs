//! The documentation sync pipeline.
//!
//! A run goes through four phases, each finished before the next starts:
//!
//! 1. **Load** the target packages, then the imports they need: every
//!    direct import with `imports` on, otherwise only imports that may
//!    provide a marker's interface.
//! 2. **Scan** interface docs (targets, plus direct imports with `imports`
//!    on) and implements markers (targets only).
//! 3. **Annotate** every file of every target package.
//! 4. **Finalize** changed files through the emitter: disk, or memory for a
//!    dry run.
//!
//! Any error aborts the run. Loading errors come before anything is written.

use std::path::PathBuf;

use tracing::debug;
use tugdocs_core::diff::generate_unified_diff;
use tugdocs_core::error::DocsError;
use tugdocs_core::output::{MethodChange, RunResponse};
use tugdocs_go::loader::{GoEnv, LoadError, Loader, Package};
use tugdocs_go::types::PackageScope;

use crate::annotate::annotate_file;
use crate::implements::{marker_imports, ImplementsMap};
use crate::registry::InterfaceRegistry;
use crate::rewrite::{finalize, CaptureEmitter, DiskEmitter, Emitter};

/// Options of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocSyncOptions {
    /// Also copy docs from interfaces of directly imported packages.
    pub imports: bool,
    /// Replace existing method documentation.
    pub replace: bool,
    /// Render changes as a diff instead of writing files.
    pub dry_run: bool,
}

/// Copies interface method docs onto implementing methods.
#[derive(Debug)]
pub struct DocSync {
    loader: Loader,
    options: DocSyncOptions,
}

impl DocSync {
    pub fn new(workspace: impl Into<PathBuf>, env: GoEnv, options: DocSyncOptions) -> Self {
        DocSync {
            loader: Loader::new(workspace, env),
            options,
        }
    }

    pub fn options(&self) -> DocSyncOptions {
        self.options
    }

    /// Run on the packages named by `selectors`.
    pub fn run(&mut self, selectors: &[String]) -> Result<RunResponse, DocsError> {
        if selectors.is_empty() {
            return Err(DocsError::invalid_args("no package selector given"));
        }

        let targets = self.loader.load(selectors)?;
        let sources = self.load_imports(&targets)?;
        let (registry, implements) = self.scan(&targets, &sources)?;
        debug!(
            docs = registry.len(),
            edges = implements.len(),
            "Scanned packages"
        );

        let mut disk = DiskEmitter;
        let mut capture = CaptureEmitter::default();
        let emitter: &mut dyn Emitter = if self.options.dry_run {
            &mut capture
        } else {
            &mut disk
        };

        let mut changes: Vec<MethodChange> = Vec::new();
        let mut files = Vec::new();
        let mut diff = String::new();
        for target in &targets {
            let scope = self.scope(target)?;
            let pkg = self
                .loader
                .package_mut(target)
                .ok_or_else(|| DocsError::internal(format!("package {} not loaded", target)))?;
            for file in &mut pkg.files {
                let annotation = annotate_file(
                    file,
                    &scope,
                    &registry,
                    &implements,
                    self.options.replace,
                );
                if let Some(text) = finalize(file, annotation.changed, emitter)? {
                    if self.options.dry_run {
                        let patch = generate_unified_diff(&file.display_path, &file.source, &text);
                        diff.push_str(&patch);
                    }
                    files.push(file.display_path.clone());
                }
                changes.extend(annotation.changes);
            }
        }

        let diff = self.options.dry_run.then_some(diff);
        Ok(RunResponse::new(
            self.options.dry_run,
            targets.len(),
            changes,
            files,
            diff,
        ))
    }

    /// Load the imports each target needs; returns the packages to scan for
    /// interface docs.
    fn load_imports(&mut self, targets: &[String]) -> Result<Vec<String>, DocsError> {
        let mut sources: Vec<String> = targets.to_vec();
        for target in targets {
            if self.options.imports {
                for import in self.loader.load_imports(target, |_| true)? {
                    if !sources.contains(&import) {
                        sources.push(import);
                    }
                }
            } else {
                let wanted = match self.loader.package(target) {
                    Some(pkg) => marker_imports(pkg),
                    None => continue,
                };
                for import in wanted {
                    // Docs of imported interfaces are not copied in this mode,
                    // so a missing import only costs the marker that needs it.
                    match self.loader.load_imports(target, |i| i == import) {
                        Ok(_) => {}
                        Err(LoadError::UnresolvedImport { import, importer }) => {
                            debug!(import = %import, importer = %importer, "Marker import not found");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
        Ok(sources)
    }

    fn scan(
        &self,
        targets: &[String],
        sources: &[String],
    ) -> Result<(InterfaceRegistry, ImplementsMap), DocsError> {
        let mut registry = InterfaceRegistry::new();
        for path in sources {
            let pkg = self.package(path)?;
            registry.register(&self.loader, pkg);
        }
        let mut implements = ImplementsMap::new();
        for path in targets {
            let pkg = self.package(path)?;
            implements.resolve(&self.loader, pkg);
        }
        Ok((registry, implements))
    }

    fn scope(&self, path: &str) -> Result<PackageScope, DocsError> {
        Ok(PackageScope::new(self.package(path)?))
    }

    fn package(&self, path: &str) -> Result<&Package, DocsError> {
        self.loader
            .package(path)
            .ok_or_else(|| DocsError::internal(format!("package {} not loaded", path)))
    }
}
