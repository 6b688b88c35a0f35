//! Command line driver: flag parsing and the generation pipeline.

use crate::error::DriverError;
use std::path::{Path, PathBuf};
use std::process::Command;
use thriftgen_codegen::{GeneratorOptions, generator::DEFAULT_RUNTIME_CRATE};

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "gen-go";

/// Default upstream compiler executable.
pub const DEFAULT_THRIFT_BINARY: &str = "thrift";

/// Usage text printed for `-h` and on usage errors.
pub const USAGE: &str = "\
Usage: thriftgen -inputFile <file.thrift> [options]

Options:
  -inputFile <path>      IDL file to generate bindings for (required)
  -outputDir <path>      Output directory (default: gen-go)
  -generateThrift        Run the upstream Thrift compiler first
  -runtimeCrate <path>   Runtime crate path used by generated code
                         (default: thriftgen_runtime)
  -typesModule <path>    Module to glob-import upstream types from
  -thriftBinary <path>   Upstream compiler executable (default: thrift)
  -h, -help              Print this help

Flags accept `-flag value`, `-flag=value` and a `--` prefix.
Set RUST_LOG=debug for progress output.";

/// Driver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    /// IDL file to generate bindings for.
    pub input_file: PathBuf,
    /// Directory the package directory is created in.
    pub output_dir: PathBuf,
    /// Whether to run the upstream compiler before generating.
    pub generate_thrift: bool,
    /// Runtime crate path written into generated code.
    pub runtime_crate: String,
    /// Module to glob-import upstream types from.
    pub types_module: Option<String>,
    /// Upstream compiler executable.
    pub thrift_binary: String,
    /// Help was requested; nothing else is meaningful.
    pub help: bool,
}

impl DriverOptions {
    /// Creates options for an input file with every other setting at its default.
    #[must_use]
    pub fn new(input_file: impl Into<PathBuf>) -> Self {
        Self {
            input_file: input_file.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            generate_thrift: false,
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
            types_module: None,
            thrift_binary: DEFAULT_THRIFT_BINARY.to_string(),
            help: false,
        }
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Enables or disables the upstream compiler step.
    #[must_use]
    pub fn generate_thrift(mut self, enabled: bool) -> Self {
        self.generate_thrift = enabled;
        self
    }

    /// Sets the upstream compiler executable.
    #[must_use]
    pub fn thrift_binary(mut self, binary: impl Into<String>) -> Self {
        self.thrift_binary = binary.into();
        self
    }

    /// Parses command line arguments, program name excluded.
    ///
    /// # Errors
    /// Returns `DriverError::Usage` on unknown flags, missing values,
    /// positional arguments or a missing `-inputFile`.
    pub fn from_args<I, S>(args: I) -> Result<Self, DriverError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::new(PathBuf::new());
        let mut input_file = None;
        let mut args = args.into_iter().map(|a| a.as_ref().to_string());

        while let Some(arg) = args.next() {
            let Some(flag) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
                return Err(DriverError::usage(format!("unexpected argument '{}'", arg)));
            };
            let (name, inline) = match flag.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (flag, None),
            };

            match name {
                "h" | "help" => options.help = true,
                "generateThrift" => {
                    options.generate_thrift = match inline.as_deref() {
                        None | Some("true") | Some("1") => true,
                        Some("false") | Some("0") => false,
                        Some(other) => {
                            return Err(DriverError::usage(format!(
                                "invalid boolean value '{}' for -generateThrift",
                                other
                            )));
                        }
                    }
                }
                "inputFile" | "outputDir" | "runtimeCrate" | "typesModule" | "thriftBinary" => {
                    let value = match inline {
                        Some(value) => value,
                        None => args.next().ok_or_else(|| {
                            DriverError::usage(format!("flag needs an argument: -{}", name))
                        })?,
                    };
                    match name {
                        "inputFile" => input_file = Some(PathBuf::from(value)),
                        "outputDir" => options.output_dir = PathBuf::from(value),
                        "runtimeCrate" => options.runtime_crate = value,
                        "typesModule" => options.types_module = Some(value),
                        _ => options.thrift_binary = value,
                    }
                }
                _ => {
                    return Err(DriverError::usage(format!(
                        "flag provided but not defined: -{}",
                        name
                    )));
                }
            }
        }

        if options.help {
            return Ok(options);
        }
        options.input_file = input_file
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| DriverError::usage("-inputFile is required"))?;
        Ok(options)
    }

    /// Returns the generator options derived from these settings.
    #[must_use]
    pub fn generator_options(&self) -> GeneratorOptions {
        let options = GeneratorOptions::new().runtime_crate(&self.runtime_crate);
        match &self.types_module {
            Some(types) => options.types_module(types),
            None => options,
        }
    }
}

/// Runs the whole pipeline and returns the path of the written file.
///
/// Steps: create the output directory, optionally run the upstream compiler,
/// parse, resolve, generate and write. The first failure aborts the run and
/// nothing is written.
///
/// # Errors
/// Returns `DriverError` describing the failed step.
pub fn run(options: &DriverOptions) -> Result<PathBuf, DriverError> {
    if !options.input_file.is_file() {
        return Err(DriverError::input(format!(
            "input file '{}' does not exist",
            options.input_file.display()
        )));
    }
    std::fs::create_dir_all(&options.output_dir).map_err(|e| {
        DriverError::input(format!(
            "cannot create output directory '{}': {}",
            options.output_dir.display(),
            e
        ))
    })?;

    if options.generate_thrift {
        run_upstream_compiler(
            &options.thrift_binary,
            &options.input_file,
            &options.output_dir,
        )?;
    }

    tracing::debug!(input = %options.input_file.display(), "generating bindings");
    let generated = thriftgen_codegen::generate_from_file(
        &options.input_file,
        &options.generator_options(),
    )?;
    let path = generated.write_to(&options.output_dir)?;
    Ok(path)
}

/// Runs `<binary> -r --gen rs -out <output_dir> <input_file>`.
fn run_upstream_compiler(
    binary: &str,
    input_file: &Path,
    output_dir: &Path,
) -> Result<(), DriverError> {
    tracing::debug!(binary, input = %input_file.display(), "running upstream compiler");
    let output = Command::new(binary)
        .args(["-r", "--gen", "rs", "-out"])
        .arg(output_dir)
        .arg(input_file)
        .output()
        .map_err(|e| DriverError::UpstreamCompiler {
            message: format!("cannot run '{}': {}", binary, e),
        })?;

    if !output.status.success() {
        return Err(DriverError::UpstreamCompiler {
            message: format!(
                "'{}' exited with {}: {}",
                binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ECHO: &str = "service Echo {
    string ping(1: string arg1)
    oneway void fireAndForget(1: string arg1)
}
";

    #[test]
    fn test_from_args_defaults() {
        let options = DriverOptions::from_args(["-inputFile", "idl/echo.thrift"]).unwrap();
        assert_eq!(options, DriverOptions::new("idl/echo.thrift"));
        assert_eq!(options.output_dir, PathBuf::from("gen-go"));
        assert!(!options.generate_thrift);
    }

    #[test]
    fn test_from_args_all_forms() {
        let options = DriverOptions::from_args([
            "--inputFile=a.thrift",
            "-outputDir",
            "out",
            "-generateThrift",
            "-runtimeCrate=crate::rt",
            "-typesModule",
            "crate::types",
            "--thriftBinary=/usr/bin/thrift",
        ])
        .unwrap();
        assert_eq!(options.input_file, PathBuf::from("a.thrift"));
        assert_eq!(options.output_dir, PathBuf::from("out"));
        assert!(options.generate_thrift);
        assert_eq!(options.runtime_crate, "crate::rt");
        assert_eq!(options.types_module.as_deref(), Some("crate::types"));
        assert_eq!(options.thrift_binary, "/usr/bin/thrift");
    }

    #[test]
    fn test_from_args_bool_value() {
        let options =
            DriverOptions::from_args(["-generateThrift=false", "-inputFile", "a.thrift"]).unwrap();
        assert!(!options.generate_thrift);
        assert!(DriverOptions::from_args(["-generateThrift=maybe", "-inputFile", "a"]).is_err());
    }

    #[test]
    fn test_from_args_errors() {
        let err = DriverOptions::from_args(Vec::<String>::new()).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("-inputFile is required"));

        let err = DriverOptions::from_args(["-inputFile"]).unwrap_err();
        assert!(err.to_string().contains("flag needs an argument: -inputFile"));

        let err = DriverOptions::from_args(["-bogus"]).unwrap_err();
        assert!(err.to_string().contains("flag provided but not defined: -bogus"));

        let err = DriverOptions::from_args(["echo.thrift"]).unwrap_err();
        assert!(err.to_string().contains("unexpected argument 'echo.thrift'"));
    }

    #[test]
    fn test_from_args_help() {
        let options = DriverOptions::from_args(["-h"]).unwrap();
        assert!(options.help);
    }

    #[test]
    fn test_generator_options() {
        let mut options = DriverOptions::new("a.thrift");
        options.types_module = Some("crate::types".to_string());
        let generator = options.generator_options();
        assert_eq!(generator.get_runtime_crate(), "thriftgen_runtime");
        assert_eq!(generator.get_types_module(), Some("crate::types"));
    }

    #[test]
    fn test_run_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Echo.thrift");
        fs::write(&input, ECHO).unwrap();
        let out = dir.path().join("gen");

        let path = run(&DriverOptions::new(&input).output_dir(&out)).unwrap();
        assert_eq!(path, out.join("echo").join("tchan-echo.rs"));

        let code = fs::read_to_string(&path).unwrap();
        assert!(code.contains("pub trait TChanEcho: Send + Sync {"));
        assert!(code.contains("async fn fire_and_forget("));

        let again = run(&DriverOptions::new(&input).output_dir(&out)).unwrap();
        assert_eq!(fs::read_to_string(again).unwrap(), code);
    }

    #[test]
    fn test_run_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let options = DriverOptions::new(dir.path().join("missing.thrift"));
        let err = run(&options).unwrap_err();
        assert!(matches!(err, DriverError::Input { .. }));
    }

    #[test]
    fn test_run_resolution_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cycle.thrift");
        fs::write(&input, "service A extends B {}\nservice B extends A {}\n").unwrap();
        let out = dir.path().join("gen");

        let err = run(&DriverOptions::new(&input).output_dir(&out)).unwrap_err();
        assert!(err.to_string().contains("cyclic service inheritance"));
        assert!(!out.join("cycle").exists());
    }

    #[test]
    fn test_run_missing_upstream_compiler() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("echo.thrift");
        fs::write(&input, ECHO).unwrap();

        let options = DriverOptions::new(&input)
            .output_dir(dir.path().join("gen"))
            .generate_thrift(true)
            .thrift_binary("thriftgen-test-no-such-binary");
        let err = run(&options).unwrap_err();
        assert!(matches!(err, DriverError::UpstreamCompiler { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failing_upstream_compiler() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("echo.thrift");
        fs::write(&input, ECHO).unwrap();

        let options = DriverOptions::new(&input)
            .output_dir(dir.path().join("gen"))
            .generate_thrift(true)
            .thrift_binary("false");
        let err = run(&options).unwrap_err();
        assert!(err.to_string().contains("'false' exited with"));
        assert!(!dir.path().join("gen").join("echo").exists());
    }
}
