//! Package loading.
//!
//! The [`Loader`] turns package selectors into parsed [`Package`]s and
//! resolves import paths to directories the way the Go tool does for module
//! builds, looking in order at:
//!
//! 1. the module of the importing package,
//! 2. for a required module, its `replace` directive, the `vendor/`
//!    directory, then the module cache at the required version,
//! 3. the `vendor/` directory,
//! 4. `$GOROOT/src` (standard library).
//!
//! Imports are loaded on demand; nothing is read that the caller did not ask
//! for.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::{SourceFile, TypeSpec};
use crate::files::{self, find_module_root, relative_slash_path};
use crate::gomod::{escape_module_path, parse_go_mod, within_module, GoMod, GoModError};
use crate::parser::{parse_file, ParseError};

// ============================================================================
// Errors
// ============================================================================

/// Failure to load a package or one of its imports.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{path}: {source}")]
    GoMod {
        path: String,
        #[source]
        source: GoModError,
    },

    #[error("found packages {first} and {second} in {dir}")]
    MixedPackages {
        dir: String,
        first: String,
        second: String,
    },

    #[error("no Go files in {dir}")]
    NoGoFiles { dir: String },

    #[error("pattern {selector} matched no packages")]
    NoPackages { selector: String },

    #[error("cannot find package {import} imported by {importer}")]
    UnresolvedImport { import: String, importer: String },

    #[error("{selector} is neither a directory nor a package of the main module")]
    UnknownSelector { selector: String },
}

impl LoadError {
    fn io(path: &Path, source: io::Error) -> Self {
        LoadError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// The package, selector or file the error is about.
    pub fn subject(&self) -> &str {
        match self {
            LoadError::Io { path, .. } | LoadError::GoMod { path, .. } => path,
            LoadError::Parse(ParseError::Lex { path, .. })
            | LoadError::Parse(ParseError::Syntax { path, .. }) => path,
            LoadError::MixedPackages { dir, .. } | LoadError::NoGoFiles { dir } => dir,
            LoadError::NoPackages { selector } | LoadError::UnknownSelector { selector } => {
                selector
            }
            LoadError::UnresolvedImport { importer, .. } => importer,
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Go toolchain locations, captured once from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoEnv {
    /// `$GOROOT`, holding the standard library under `src/`.
    pub goroot: Option<PathBuf>,
    /// Module cache directory.
    pub mod_cache: Option<PathBuf>,
}

/// Standard install locations probed when `GOROOT` is unset.
const GOROOT_CANDIDATES: &[&str] = &["/usr/local/go", "/usr/lib/go"];

impl GoEnv {
    /// Read `GOROOT`, `GOMODCACHE`, `GOPATH` and `HOME` from the process
    /// environment.
    pub fn from_env() -> Self {
        Self::from_lookup(std::env::var_os)
    }

    /// Build from a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<OsString>) -> Self {
        let var = |key: &'static str| lookup(key).filter(|v| !v.is_empty());
        let goroot = var("GOROOT").map(PathBuf::from).or_else(|| {
            GOROOT_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|p| p.join("src").is_dir())
        });
        let mod_cache = var("GOMODCACHE")
            .map(PathBuf::from)
            .or_else(|| {
                var("GOPATH")
                    .and_then(|gopath| std::env::split_paths(&gopath).next())
                    .map(|p| p.join("pkg").join("mod"))
            })
            .or_else(|| var("HOME").map(|home| PathBuf::from(home).join("go/pkg/mod")));
        GoEnv { goroot, mod_cache }
    }
}

// ============================================================================
// Packages
// ============================================================================

/// A loaded package.
#[derive(Debug, Clone)]
pub struct Package {
    /// Import path.
    pub path: String,
    /// Name from the package clause.
    pub name: String,
    pub dir: PathBuf,
    /// Root of the module the package belongs to.
    pub module_root: Option<PathBuf>,
    pub files: Vec<SourceFile>,
}

impl Package {
    /// The type declaration named `name`, with the file declaring it.
    pub fn type_spec(&self, name: &str) -> Option<(&SourceFile, &TypeSpec)> {
        self.files.iter().find_map(|file| {
            file.types()
                .find(|spec| spec.name.name == name)
                .map(|spec| (file, spec))
        })
    }

    /// Distinct import paths of all files, sorted. `import "C"` is not a
    /// package and is left out.
    pub fn imports(&self) -> Vec<String> {
        let paths: BTreeSet<&str> = self
            .files
            .iter()
            .flat_map(|f| f.imports.iter().map(|i| i.path.as_str()))
            .filter(|p| *p != "C")
            .collect();
        paths.into_iter().map(str::to_string).collect()
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Loads packages and their imports.
#[derive(Debug)]
pub struct Loader {
    workspace: PathBuf,
    env: GoEnv,
    /// Parsed `go.mod` files by module root.
    modules: HashMap<PathBuf, GoMod>,
    packages: BTreeMap<String, Package>,
}

impl Loader {
    pub fn new(workspace: impl Into<PathBuf>, env: GoEnv) -> Self {
        let workspace = workspace.into();
        let workspace = workspace.canonicalize().unwrap_or(workspace);
        Loader {
            workspace,
            env,
            modules: HashMap::new(),
            packages: BTreeMap::new(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    pub fn package_mut(&mut self, path: &str) -> Option<&mut Package> {
        self.packages.get_mut(path)
    }

    /// Every package loaded so far, by import path.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Load the packages named by `selectors`; returns their import paths in
    /// selector order, without duplicates.
    pub fn load(&mut self, selectors: &[String]) -> Result<Vec<String>, LoadError> {
        let mut targets = Vec::new();
        for selector in selectors {
            let dirs = self.expand(selector)?;
            if dirs.is_empty() {
                return Err(LoadError::NoPackages {
                    selector: selector.clone(),
                });
            }
            for dir in dirs {
                let path = self.load_dir(&dir)?;
                if !targets.contains(&path) {
                    targets.push(path);
                }
            }
        }
        Ok(targets)
    }

    /// Load the direct imports of `importer` accepted by `wanted`; returns
    /// the import paths now available.
    pub fn load_imports(
        &mut self,
        importer: &str,
        wanted: impl Fn(&str) -> bool,
    ) -> Result<Vec<String>, LoadError> {
        let Some(pkg) = self.packages.get(importer) else {
            return Ok(Vec::new());
        };
        let imports = pkg.imports();
        let module_root = pkg.module_root.clone();

        let mut loaded = Vec::new();
        for import in imports.into_iter().filter(|i| wanted(i)) {
            if !self.packages.contains_key(&import) {
                let dir = self
                    .resolve_import(&import, module_root.as_deref())
                    .ok_or_else(|| LoadError::UnresolvedImport {
                        import: import.clone(),
                        importer: importer.to_string(),
                    })?;
                let module_root = find_module_root(&dir);
                let pkg = self.read_package(&dir, import.clone(), module_root)?;
                self.packages.insert(import.clone(), pkg);
            }
            loaded.push(import);
        }
        Ok(loaded)
    }

    // ------------------------------------------------------------------
    // Selectors
    // ------------------------------------------------------------------

    fn expand(&mut self, selector: &str) -> Result<Vec<PathBuf>, LoadError> {
        let recursive = selector == "..." || selector.ends_with("/...");
        if recursive {
            let base = selector.trim_end_matches("...").trim_end_matches('/');
            let base = if base.is_empty() { "." } else { base };
            let dir = self.selector_dir(base, selector)?;
            files::package_dirs(&dir).map_err(|e| LoadError::io(&dir, e))
        } else {
            Ok(vec![self.selector_dir(selector, selector)?])
        }
    }

    /// Directory named by a selector: a path (relative to the workspace) or
    /// an import path inside the workspace's module.
    fn selector_dir(&mut self, base: &str, selector: &str) -> Result<PathBuf, LoadError> {
        let as_path = self.workspace.join(base);
        if as_path.is_dir() {
            return Ok(as_path);
        }
        if let Some(root) = find_module_root(&self.workspace) {
            let module = self.module(&root)?.module.clone();
            if within_module(base, &module) {
                let dir = join_slash(&root, &base[module.len()..]);
                if dir.is_dir() {
                    return Ok(dir);
                }
            }
        }
        Err(LoadError::UnknownSelector {
            selector: selector.to_string(),
        })
    }

    fn load_dir(&mut self, dir: &Path) -> Result<String, LoadError> {
        let dir = dir.canonicalize().map_err(|e| LoadError::io(dir, e))?;
        let module_root = find_module_root(&dir);
        let import_path = match &module_root {
            Some(root) => {
                let module = &self.module(root)?.module;
                match relative_slash_path(&dir, root) {
                    Some(rel) if !rel.is_empty() => format!("{}/{}", module, rel),
                    _ => module.clone(),
                }
            }
            None => self.display(&dir),
        };
        if !self.packages.contains_key(&import_path) {
            let pkg = self.read_package(&dir, import_path.clone(), module_root)?;
            self.packages.insert(import_path.clone(), pkg);
        }
        Ok(import_path)
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    fn module(&mut self, root: &Path) -> Result<&GoMod, LoadError> {
        if !self.modules.contains_key(root) {
            let path = root.join("go.mod");
            let text = fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
            let go_mod = parse_go_mod(&text).map_err(|source| LoadError::GoMod {
                path: self.display(&path),
                source,
            })?;
            self.modules.insert(root.to_path_buf(), go_mod);
        }
        self.modules
            .get(root)
            .ok_or_else(|| LoadError::io(root, io::Error::from(io::ErrorKind::NotFound)))
    }

    fn read_package(
        &self,
        dir: &Path,
        import_path: String,
        module_root: Option<PathBuf>,
    ) -> Result<Package, LoadError> {
        let mut files = Vec::new();
        let mut name: Option<String> = None;
        for path in files::go_files(dir).map_err(|e| LoadError::io(dir, e))? {
            let source = fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
            let file = parse_file(&path, self.display(&path), source)?;
            if file.is_build_ignored() {
                trace!(file = %file.display_path, "Skipping file excluded by build constraint");
                continue;
            }
            match &name {
                None => name = Some(file.package.name.clone()),
                Some(first) if *first != file.package.name => {
                    return Err(LoadError::MixedPackages {
                        dir: self.display(dir),
                        first: first.clone(),
                        second: file.package.name.clone(),
                    })
                }
                Some(_) => {}
            }
            files.push(file);
        }

        let name = name.ok_or_else(|| LoadError::NoGoFiles {
            dir: self.display(dir),
        })?;
        debug!(package = %import_path, files = files.len(), "Loaded package");
        Ok(Package {
            path: import_path,
            name,
            dir: dir.to_path_buf(),
            module_root,
            files,
        })
    }

    /// `path` relative to the workspace when inside it.
    fn display(&self, path: &Path) -> String {
        match relative_slash_path(path, &self.workspace) {
            Some(rel) if !rel.is_empty() => rel,
            Some(_) => ".".to_string(),
            None => path.display().to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Import resolution
    // ------------------------------------------------------------------

    /// Directory holding package `import`, as seen from the module rooted at
    /// `module_root`.
    pub fn resolve_import(&self, import: &str, module_root: Option<&Path>) -> Option<PathBuf> {
        if let Some((root, go_mod)) =
            module_root.and_then(|root| self.modules.get(root).map(|m| (root, m)))
        {
            if within_module(import, &go_mod.module) {
                return existing_dir(join_slash(root, &import[go_mod.module.len()..]));
            }
            if let Some(require) = go_mod.providing_module(import) {
                let rest = &import[require.path.len()..];
                if let Some(replace) = go_mod.replacement(&require.path, Some(&require.version)) {
                    if replace.is_local() {
                        return existing_dir(join_slash(&root.join(&replace.new_path), rest));
                    }
                    if let Some(version) = &replace.new_version {
                        if let Some(dir) = self.cache_dir(&replace.new_path, version, rest) {
                            return Some(dir);
                        }
                    }
                }
                if let Some(dir) = existing_dir(join_slash(&root.join("vendor"), import)) {
                    return Some(dir);
                }
                return self.cache_dir(&require.path, &require.version, rest);
            }
            if let Some(dir) = existing_dir(join_slash(&root.join("vendor"), import)) {
                return Some(dir);
            }
        }
        let goroot = self.env.goroot.as_ref()?;
        existing_dir(join_slash(&goroot.join("src"), import))
    }

    fn cache_dir(&self, module: &str, version: &str, rest: &str) -> Option<PathBuf> {
        let cache = self.env.mod_cache.as_ref()?;
        let root = cache.join(format!(
            "{}@{}",
            escape_module_path(module),
            escape_module_path(version)
        ));
        existing_dir(join_slash(&root, rest))
    }
}

/// Join a `/`-separated relative path onto `base`.
fn join_slash(base: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |dir, part| dir.join(part))
}

fn existing_dir(dir: PathBuf) -> Option<PathBuf> {
    dir.is_dir().then_some(dir)
}

// ============================================================================
// Tests
// ============================================================================
