//! Engine tests on fixture packages.
//!
//! Each fixture under `tests/fixtures/<name>/` is a small Go module. Tests
//! copy it into a temp dir, run the sync there and compare rewritten files
//! with the `*.golden` files next to the originals.
//!
//! ## Updating Golden Files
//!
//! ```bash
//! TUGDOCS_UPDATE_GOLDEN=1 cargo nextest run -p tugdocs --test engine
//! git diff tests/fixtures/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tugdocs::engine::{DocSync, DocSyncOptions};
use tugdocs::error::{DocsError, OutputErrorCode};
use tugdocs::output::{DocAction, RunResponse};
use tugdocs_go::loader::GoEnv;

// ============================================================================
// Test Infrastructure
// ============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn update_mode() -> bool {
    std::env::var("TUGDOCS_UPDATE_GOLDEN").is_ok()
}

/// Copy fixture `name` into a fresh temp dir, leaving golden files behind.
fn copy_fixture(name: &str) -> TempDir {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    copy_dir(&fixtures_dir().join(name), tmp.path());
    tmp
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("Failed to create directory");
    for entry in fs::read_dir(from).expect("Failed to read fixture dir") {
        let entry = entry.unwrap();
        let path = entry.path();
        let target = to.join(entry.file_name());
        if path.is_dir() {
            copy_dir(&path, &target);
        } else if path.extension().is_none_or(|ext| ext != "golden") {
            fs::copy(&path, &target).expect("Failed to copy fixture file");
        }
    }
}

/// Write a set of files under `root`.
fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn run(root: &Path, selectors: &[&str], options: DocSyncOptions) -> Result<RunResponse, DocsError> {
    run_with_env(root, selectors, options, GoEnv::default())
}

fn run_with_env(
    root: &Path,
    selectors: &[&str],
    options: DocSyncOptions,
    env: GoEnv,
) -> Result<RunResponse, DocsError> {
    let selectors: Vec<String> = selectors.iter().map(|s| s.to_string()).collect();
    DocSync::new(root, env, options).run(&selectors)
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

/// Compare `rel` in the workspace with `<fixture>/<golden>`.
fn assert_golden(root: &Path, fixture: &str, rel: &str, golden: &str) {
    let actual = read(root, rel);
    let golden_path = fixtures_dir().join(fixture).join(golden);
    if update_mode() {
        fs::write(&golden_path, &actual).unwrap();
        return;
    }
    let expected = fs::read_to_string(&golden_path).unwrap();
    assert_eq!(
        actual, expected,
        "{} does not match {}",
        rel,
        golden_path.display()
    );
}

fn replace() -> DocSyncOptions {
    DocSyncOptions {
        replace: true,
        ..DocSyncOptions::default()
    }
}

fn with_imports() -> DocSyncOptions {
    DocSyncOptions {
        imports: true,
        ..DocSyncOptions::default()
    }
}

// ============================================================================
// Fooer / Concrete
// ============================================================================

mod fooer {
    use super::*;

    #[test]
    fn copies_docs_onto_concrete_methods() {
        let tmp = copy_fixture("fooer");
        let response = run(tmp.path(), &["."], DocSyncOptions::default()).unwrap();

        assert_golden(tmp.path(), "fooer", "test.go", "test.golden");
        assert_eq!(response.packages, 1);
        assert_eq!(response.files, vec!["test.go".to_string()]);
        let methods: Vec<(&str, &str, DocAction)> = response
            .changes
            .iter()
            .map(|c| (c.receiver.as_str(), c.method.as_str(), c.action))
            .collect();
        assert_eq!(
            methods,
            vec![
                ("Concrete", "Foo", DocAction::Injected),
                ("Concrete", "Bar", DocAction::Injected),
            ]
        );
        assert_eq!(response.changes[0].interface, "example.com/fooer.Fooer");
        assert_eq!(response.changes[0].location.line, 15);
    }

    #[test]
    fn second_run_changes_nothing() {
        let tmp = copy_fixture("fooer");
        run(tmp.path(), &["."], DocSyncOptions::default()).unwrap();
        let first = read(tmp.path(), "test.go");

        let response = run(tmp.path(), &["."], DocSyncOptions::default()).unwrap();
        assert!(response.changes.is_empty());
        assert!(response.files.is_empty());
        assert_eq!(read(tmp.path(), "test.go"), first);

        let response = run(tmp.path(), &["."], replace()).unwrap();
        assert!(response.changes.is_empty());
        assert_eq!(read(tmp.path(), "test.go"), first);
    }

    #[test]
    fn dry_run_leaves_files_alone() {
        let tmp = copy_fixture("fooer");
        let before = read(tmp.path(), "test.go");
        let options = DocSyncOptions {
            dry_run: true,
            ..DocSyncOptions::default()
        };
        let response = run(tmp.path(), &["."], options).unwrap();

        assert_eq!(read(tmp.path(), "test.go"), before);
        assert!(response.dry_run);
        assert_eq!(response.changes.len(), 2);
        let diff = response.diff.unwrap();
        assert!(diff.contains("+// Foo does some foo stuff"));
        assert!(diff.contains("+// Bar is different"));
    }

    #[test]
    fn import_path_selector() {
        let tmp = copy_fixture("fooer");
        let response = run(tmp.path(), &["example.com/fooer"], DocSyncOptions::default()).unwrap();
        assert_eq!(response.changes.len(), 2);
        assert_golden(tmp.path(), "fooer", "test.go", "test.golden");
    }
}

// ============================================================================
// Existing documentation
// ============================================================================

mod existing_docs {
    use super::*;

    #[test]
    fn custom_docs_are_preserved() {
        let tmp = copy_fixture("stale");
        let response = run(tmp.path(), &["."], DocSyncOptions::default()).unwrap();

        assert_golden(tmp.path(), "stale", "memory.go", "memory.golden");
        let methods: Vec<&str> = response.changes.iter().map(|c| c.method.as_str()).collect();
        assert_eq!(methods, vec!["Len"]);
    }

    #[test]
    fn stale_docs_are_replaced() {
        let tmp = copy_fixture("stale");
        let response = run(tmp.path(), &["."], replace()).unwrap();

        assert_golden(tmp.path(), "stale", "memory.go", "memory.replace.golden");
        let actions: Vec<(&str, DocAction)> = response
            .changes
            .iter()
            .map(|c| (c.method.as_str(), c.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("Get", DocAction::Replaced),
                ("Put", DocAction::Replaced),
                ("Len", DocAction::Injected),
            ]
        );
    }

    #[test]
    fn replace_is_stable() {
        let tmp = copy_fixture("stale");
        run(tmp.path(), &["."], replace()).unwrap();
        let first = read(tmp.path(), "memory.go");
        let response = run(tmp.path(), &["."], replace()).unwrap();
        assert!(response.files.is_empty());
        assert_eq!(read(tmp.path(), "memory.go"), first);
    }

    #[test]
    fn interface_file_is_untouched() {
        let tmp = copy_fixture("stale");
        let before = read(tmp.path(), "store.go");
        let response = run(tmp.path(), &["."], replace()).unwrap();
        assert_eq!(read(tmp.path(), "store.go"), before);
        assert_eq!(response.files, vec!["memory.go".to_string()]);
    }
}

// ============================================================================
// Imported interfaces
// ============================================================================

mod imports {
    use super::*;

    #[test]
    fn imported_docs_need_the_imports_option() {
        let tmp = copy_fixture("split");
        let before = read(tmp.path(), "store/memory.go");
        let response = run(tmp.path(), &["./store"], DocSyncOptions::default()).unwrap();
        assert!(response.changes.is_empty());
        assert_eq!(read(tmp.path(), "store/memory.go"), before);
    }

    #[test]
    fn imported_docs_are_copied() {
        let tmp = copy_fixture("split");
        let response = run(tmp.path(), &["./store"], with_imports()).unwrap();

        assert_golden(tmp.path(), "split", "store/memory.go", "store/memory.golden");
        assert_eq!(response.files, vec!["store/memory.go".to_string()]);
        assert_eq!(response.changes[0].interface, "example.com/split/api.Store");
    }

    #[test]
    fn recursive_selector_covers_every_package() {
        let tmp = copy_fixture("split");
        let api_before = read(tmp.path(), "api/api.go");
        let doc_before = read(tmp.path(), "store/doc.go");
        let response = run(tmp.path(), &["./..."], with_imports()).unwrap();

        assert_eq!(response.packages, 2);
        assert_golden(tmp.path(), "split", "store/memory.go", "store/memory.golden");
        assert_eq!(read(tmp.path(), "api/api.go"), api_before);
        assert_eq!(read(tmp.path(), "store/doc.go"), doc_before);
    }

    #[test]
    fn standard_library_interfaces_from_goroot() {
        let goroot = TempDir::new().unwrap();
        write_files(
            goroot.path(),
            &[(
                "src/io/io.go",
                "package io\n\n// Writer is the interface that wraps the basic Write method.\ntype Writer interface {\n\t// Write writes len(p) bytes from p to the underlying data stream.\n\tWrite(p []byte) (n int, err error)\n}\n",
            )],
        );
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[
                ("go.mod", "module example.com/sink\n\ngo 1.21\n"),
                (
                    "sink.go",
                    "package sink\n\nimport \"io\"\n\nvar _ io.Writer = (*Sink)(nil)\n\ntype Sink struct{}\n\nfunc (s *Sink) Write(p []byte) (int, error) {\n\treturn len(p), nil\n}\n",
                ),
            ],
        );
        let env = GoEnv {
            goroot: Some(goroot.path().to_path_buf()),
            mod_cache: None,
        };

        let response = run_with_env(tmp.path(), &["."], with_imports(), env).unwrap();
        assert_eq!(response.changes[0].interface, "io.Writer");
        assert!(read(tmp.path(), "sink.go").contains(
            "}\n\n// Write writes len(p) bytes from p to the underlying data stream.\nfunc (s *Sink) Write("
        ));
    }

    #[test]
    fn missing_import_fails_with_imports_option() {
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[
                ("go.mod", "module example.com/m\n"),
                ("m.go", "package m\n\nimport \"example.com/elsewhere\"\n\nvar _ elsewhere.I = (*T)(nil)\n\ntype T struct{}\n"),
            ],
        );
        let err = run(tmp.path(), &["."], with_imports()).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::LoadError);

        // Without the option the marker is simply not resolved.
        let response = run(tmp.path(), &["."], DocSyncOptions::default()).unwrap();
        assert!(response.changes.is_empty());
    }
}

// ============================================================================
// Errors
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn no_selectors_is_invalid() {
        let tmp = copy_fixture("fooer");
        let err = run(tmp.path(), &[], DocSyncOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
    }

    #[test]
    fn unknown_selector_is_a_load_error() {
        let tmp = copy_fixture("fooer");
        let err = run(tmp.path(), &["./nope"], DocSyncOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::LoadError);
    }

    #[test]
    fn syntax_errors_abort_before_writing() {
        let tmp = copy_fixture("split");
        write_files(tmp.path(), &[("store/broken.go", "package store\n\nfunc (m *Memory) {\n")]);
        let before = read(tmp.path(), "store/memory.go");

        let err = run(tmp.path(), &["./..."], with_imports()).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::LoadError);
        assert_eq!(read(tmp.path(), "store/memory.go"), before);
    }

    #[test]
    fn unclosed_method_body_is_not_rewritten() {
        let tmp = TempDir::new().unwrap();
        let source = "package m\n\ntype Fooer interface {\n\t// Foo does some foo stuff\n\tFoo()\n}\n\nvar _ Fooer = (*C)(nil)\n\ntype C struct{}\n\nfunc (c *C) Foo() {\n\tif true {\n";
        write_files(
            tmp.path(),
            &[("go.mod", "module example.com/m\n"), ("m.go", source)],
        );

        let err = run(tmp.path(), &["."], DocSyncOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::LoadError);
        assert_eq!(err.error_code().code(), 3);
        assert_eq!(read(tmp.path(), "m.go"), source);
    }

    #[test]
    fn mixed_package_clauses_are_rejected() {
        let tmp = copy_fixture("fooer");
        write_files(tmp.path(), &[("other.go", "package other\n")]);
        let err = run(tmp.path(), &["."], DocSyncOptions::default()).unwrap_err();
        match err {
            DocsError::LoadFailed { message, .. } => {
                assert!(message.contains("found packages"), "{}", message)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
