//! Handing changed files to an emitter.

use std::collections::BTreeMap;

use tracing::info;
use tugdocs_go::ast::SourceFile;
use tugdocs_go::printer::{self, EmitError};

/// Destination for rewritten files.
pub trait Emitter {
    /// Print `file` and deliver it; returns the printed text.
    fn emit(&mut self, file: &SourceFile) -> Result<String, EmitError>;
}

/// Writes files in place.
#[derive(Debug, Default)]
pub struct DiskEmitter;

impl Emitter for DiskEmitter {
    fn emit(&mut self, file: &SourceFile) -> Result<String, EmitError> {
        printer::emit(file)
    }
}

/// Keeps printed files in memory, for dry runs.
#[derive(Debug, Default)]
pub struct CaptureEmitter {
    /// Printed text by display path.
    pub files: BTreeMap<String, String>,
}

impl Emitter for CaptureEmitter {
    fn emit(&mut self, file: &SourceFile) -> Result<String, EmitError> {
        let text = printer::render(file)?;
        self.files.insert(file.display_path.clone(), text.clone());
        Ok(text)
    }
}

/// Sort the comment set of a changed file and emit it. Unchanged files are
/// left alone; returns the printed text of an emitted file.
pub fn finalize(
    file: &mut SourceFile,
    changed: bool,
    emitter: &mut dyn Emitter,
) -> Result<Option<String>, EmitError> {
    if !changed {
        return Ok(None);
    }
    file.comments.sort_by_position();
    let text = emitter.emit(file)?;
    info!(file = %file.display_path, "Rewrote file");
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tugdocs_go::comments::{CommentGroup, CommentLine};
    use tugdocs_go::parser::parse_file;

    fn file_with_injection() -> SourceFile {
        let src = "package p\n\n// a\nfunc A() {}\n\nfunc B() {}\n";
        let mut file = parse_file("p.go", "p.go", src).unwrap();
        file.comments.append(CommentGroup::Injected {
            anchor: src.find("func B").unwrap(),
            indent: String::new(),
            lines: vec![CommentLine {
                text: "// b".to_string(),
                leading_blank: true,
            }],
        });
        // Appended after a later group: unsorted on purpose.
        file.comments.append(CommentGroup::Injected {
            anchor: src.find("func A").unwrap(),
            indent: String::new(),
            lines: vec![CommentLine {
                text: "// also a".to_string(),
                leading_blank: false,
            }],
        });
        file
    }

    #[test]
    fn finalize_sorts_before_emitting() {
        let mut file = file_with_injection();
        assert!(!file.comments.is_sorted());
        let mut emitter = CaptureEmitter::default();
        let text = finalize(&mut file, true, &mut emitter).unwrap().unwrap();
        assert!(file.comments.is_sorted());
        assert_eq!(
            text,
            "package p\n\n// a\n// also a\nfunc A() {}\n\n// b\nfunc B() {}\n"
        );
        assert_eq!(emitter.files.get("p.go"), Some(&text));
    }

    #[test]
    fn unchanged_files_are_not_emitted() {
        let mut file = file_with_injection();
        let mut emitter = CaptureEmitter::default();
        assert!(finalize(&mut file, false, &mut emitter).unwrap().is_none());
        assert!(emitter.files.is_empty());
    }
}
