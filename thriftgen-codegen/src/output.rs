//! Output finalization: whitespace normalization and the file write.

use crate::error::CodegenError;
use std::fs;
use std::path::{Path, PathBuf};

/// Normalizes generated source.
///
/// Whitespace-only lines become empty, runs of blank lines collapse into one,
/// leading blank lines are dropped and the text ends with exactly one newline.
#[must_use]
pub fn finalize(source: &str) -> String {
    let mut output = String::with_capacity(source.len());
    let mut blank_run = true;

    for line in source.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !blank_run {
                output.push('\n');
            }
            blank_run = true;
        } else {
            output.push_str(line);
            output.push('\n');
            blank_run = false;
        }
    }

    while output.ends_with("\n\n") {
        output.pop();
    }
    if output.is_empty() {
        output.push('\n');
    }
    output
}

/// Returns the path generated code for `package` is written to:
/// `<output_dir>/<package>/tchan-<package>.rs`.
#[must_use]
pub fn output_path(output_dir: &Path, package: &str) -> PathBuf {
    output_dir.join(package).join(format!("tchan-{}.rs", package))
}

/// Finalizes `source` and writes it for `package` under `output_dir`.
///
/// The file is written to a temporary sibling and renamed into place; the
/// temporary is removed if anything fails.
///
/// # Errors
/// Returns `CodegenError::Io` if a directory or the file cannot be written.
pub fn write_output(
    output_dir: &Path,
    package: &str,
    source: &str,
) -> Result<PathBuf, CodegenError> {
    let path = output_path(output_dir, package);
    let dir = output_dir.join(package);
    fs::create_dir_all(&dir)?;

    let tmp = dir.join(format!(".tchan-{}.rs.tmp", package));
    let result = fs::write(&tmp, finalize(source)).and_then(|()| fs::rename(&tmp, &path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    tracing::info!(path = %path.display(), "wrote generated bindings");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_collapses_blank_lines() {
        let src = "\n\nfn a() {}\n   \n\n\t\nfn b() {}   \n\n\n";
        assert_eq!(finalize(src), "fn a() {}\n\nfn b() {}\n");
    }

    #[test]
    fn test_finalize_adds_trailing_newline() {
        assert_eq!(finalize("fn a() {}"), "fn a() {}\n");
        assert_eq!(finalize(""), "\n");
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let once = finalize("a\n\n\n  b\n\n");
        assert_eq!(finalize(&once), once);
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("gen-go"), "echo");
        assert_eq!(path, PathBuf::from("gen-go/echo/tchan-echo.rs"));
    }

    #[test]
    fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_output(dir.path(), "echo", "fn a() {}\n\n\n").unwrap();

        assert_eq!(path, dir.path().join("echo").join("tchan-echo.rs"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "fn a() {}\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("echo"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_write_output_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        write_output(dir.path(), "echo", "old").unwrap();
        let path = write_output(dir.path(), "echo", "new").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new\n");
    }

    #[test]
    fn test_write_output_failure_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go makes the rename fail.
        fs::create_dir_all(dir.path().join("echo").join("tchan-echo.rs").join("x")).unwrap();

        let err = write_output(dir.path(), "echo", "fn a() {}").unwrap_err();
        assert!(matches!(err, CodegenError::Io(_)));
        assert!(!dir.path().join("echo").join(".tchan-echo.rs.tmp").exists());
    }
}
