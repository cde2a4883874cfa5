//! Backend that shells out to a transcription program once per source file.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use scribe_config::{BASIC_PITCH_COMMAND, BASIC_PITCH_OUTPUT_SUFFIX, Config, InstrumentsMode};
use thiserror::Error;
use tracing::{debug, warn};

use super::{Backend, BackendError, BackendReport};

const BACKEND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backend");

const INPUT: &str = "{input}";
const OUTPUT_DIR: &str = "{output_dir}";
const OUTPUT: &str = "{output}";
const INSTRUMENTS: &str = "{instruments}";

/// Errors raised while parsing a command template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template names no program.
    #[error("command template is empty")]
    Empty,
    /// The template never references the source file.
    #[error("command template '{0}' does not reference {{input}}")]
    MissingInput(String),
}

/// Whitespace-separated program invocation with placeholders.
///
/// Recognised placeholders are `{input}`, `{output_dir}`, `{output}` and
/// `{instruments}`; each may appear inside a larger argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Parses a template such as `basic-pitch {output_dir} {input}`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when the template is blank or never
    /// mentions `{input}`.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut tokens = template.split_whitespace().map(str::to_owned);
        let program = tokens.next().ok_or(TemplateError::Empty)?;
        let args: Vec<String> = tokens.collect();
        if !program.contains(INPUT) && !args.iter().any(|arg| arg.contains(INPUT)) {
            return Err(TemplateError::MissingInput(template.trim().to_owned()));
        }
        Ok(Self { program, args })
    }

    fn render(&self, invocation: &Invocation<'_>) -> (String, Vec<String>) {
        (
            invocation.substitute(&self.program),
            self.args.iter().map(|arg| invocation.substitute(arg)).collect(),
        )
    }
}

struct Invocation<'a> {
    input: &'a Path,
    output_dir: &'a Path,
    output: &'a Path,
    instruments: InstrumentsMode,
}

impl Invocation<'_> {
    fn substitute(&self, token: &str) -> String {
        token
            .replace(INPUT, &self.input.to_string_lossy())
            .replace(OUTPUT_DIR, &self.output_dir.to_string_lossy())
            .replace(OUTPUT, &self.output.to_string_lossy())
            .replace(INSTRUMENTS, &self.instruments.value().to_string())
    }
}

/// Runs a command template for each matching file in the source directory.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    template: CommandTemplate,
    extension: String,
    output_suffix: String,
    instruments: InstrumentsMode,
}

impl CommandBackend {
    /// Builds a backend from explicit parts.
    #[must_use]
    pub fn new(
        template: CommandTemplate,
        extension: impl Into<String>,
        output_suffix: impl Into<String>,
        instruments: InstrumentsMode,
    ) -> Self {
        let extension = extension.into();
        Self {
            template,
            extension: extension.trim_start_matches('.').to_owned(),
            output_suffix: output_suffix.into(),
            instruments,
        }
    }

    /// Backend driven by the configured `backend_command` and
    /// `output_suffix`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when the configured template is unusable.
    pub fn from_config(config: &Config) -> Result<Self, TemplateError> {
        Ok(Self::new(
            CommandTemplate::parse(&config.backend_command)?,
            config.source_extension.as_str(),
            config.output_suffix.as_str(),
            config.instruments,
        ))
    }

    /// Backend invoking the `basic-pitch` command line tool.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] only if the built-in template is broken.
    pub fn basic_pitch(config: &Config) -> Result<Self, TemplateError> {
        Ok(Self::new(
            CommandTemplate::parse(BASIC_PITCH_COMMAND)?,
            config.source_extension.as_str(),
            BASIC_PITCH_OUTPUT_SUFFIX,
            config.instruments,
        ))
    }

    fn list_sources(&self, source_dir: &Path) -> Result<Vec<PathBuf>, BackendError> {
        let list_error = |source: io::Error| BackendError::ListSources {
            path: source_dir.to_path_buf(),
            source,
        };
        let mut sources = Vec::new();
        for entry in fs::read_dir(source_dir).map_err(list_error)? {
            let path = entry.map_err(list_error)?.path();
            if path.is_file() && self.matches_extension(&path) {
                sources.push(path);
            }
        }
        sources.sort();
        Ok(sources)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|extension| extension.eq_ignore_ascii_case(&self.extension))
    }

    fn artefact_name(&self, source: &Path) -> Option<String> {
        let stem = source.file_stem()?.to_str()?;
        Some(format!("{stem}{}", self.output_suffix))
    }

    fn transcribe(&self, source_dir: &Path, source: &Path) -> Result<Option<String>, BackendError> {
        let Some(name) = self.artefact_name(source) else {
            warn!(
                target: BACKEND_TARGET,
                source = %source.display(),
                "skipping source with a non UTF-8 name"
            );
            return Ok(None);
        };
        let output = source_dir.join(&name);
        let (program, args) = self.template.render(&Invocation {
            input: source,
            output_dir: source_dir,
            output: &output,
            instruments: self.instruments,
        });
        debug!(target: BACKEND_TARGET, program = %program, ?args, "running backend command");
        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| BackendError::Launch { program, source })?;
        if !status.success() {
            warn!(
                target: BACKEND_TARGET,
                source = %source.display(),
                status = %status,
                "backend command failed; skipping file"
            );
            return Ok(None);
        }
        if !output.is_file() {
            warn!(
                target: BACKEND_TARGET,
                source = %source.display(),
                expected = %output.display(),
                "backend command left no artefact; skipping file"
            );
            return Ok(None);
        }
        Ok(Some(name))
    }
}

impl Backend for CommandBackend {
    fn run(&mut self, source_dir: &Path) -> Result<BackendReport, BackendError> {
        let sources = self.list_sources(source_dir)?;
        let mut produced = Vec::with_capacity(sources.len());
        for source in &sources {
            if let Some(name) = self.transcribe(source_dir, source)? {
                produced.push(name);
            }
        }
        Ok(BackendReport::new(sources.len(), produced))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn source_dir() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        for name in ["b.wav", "a.WAV", "notes.txt"] {
            fs::write(dir.path().join(name), b"RIFF").expect("write source");
        }
        fs::create_dir(dir.path().join("nested.wav")).expect("nested dir");
        dir
    }

    fn backend(template: &str) -> CommandBackend {
        CommandBackend::new(
            CommandTemplate::parse(template).expect("template"),
            "wav",
            ".mid",
            InstrumentsMode::Many,
        )
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_template_is_rejected(#[case] template: &str) {
        assert_eq!(CommandTemplate::parse(template), Err(TemplateError::Empty));
    }

    #[test]
    fn template_must_reference_input() {
        assert!(matches!(
            CommandTemplate::parse("touch {output}"),
            Err(TemplateError::MissingInput(_))
        ));
    }

    #[test]
    fn basic_pitch_template_places_output_dir_first() {
        let template = CommandTemplate::parse(BASIC_PITCH_COMMAND).expect("template");
        let (program, args) = template.render(&Invocation {
            input: Path::new("/in/a.wav"),
            output_dir: Path::new("/in"),
            output: Path::new("/in/a_basic_pitch.mid"),
            instruments: InstrumentsMode::Single,
        });
        assert_eq!(program, "basic-pitch");
        assert_eq!(args, vec!["/in".to_owned(), "/in/a.wav".to_owned()]);
    }

    #[cfg(unix)]
    #[rstest]
    fn produces_one_artefact_per_matching_source(source_dir: TempDir) {
        let mut backend = backend("cp {input} {output}");
        let report = backend.run(source_dir.path()).expect("run");
        assert_eq!(report.attempted, 2);
        assert_eq!(report.produced, vec!["a.mid".to_owned(), "b.mid".to_owned()]);
    }

    #[cfg(unix)]
    #[rstest]
    fn failing_command_skips_files(source_dir: TempDir) {
        let mut backend = backend("false {input}");
        let report = backend.run(source_dir.path()).expect("run");
        assert_eq!(report.attempted, 2);
        assert!(report.produced.is_empty());
    }

    #[rstest]
    fn missing_program_is_a_launch_error(source_dir: TempDir) {
        let mut backend = backend("scribe-test-no-such-program {input}");
        let error = backend.run(source_dir.path()).expect_err("launch failure");
        assert!(matches!(error, BackendError::Launch { .. }));
    }

    #[test]
    fn empty_directory_attempts_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let report = backend("cp {input} {output}").run(dir.path()).expect("run");
        assert_eq!(report, BackendReport::default());
    }

    #[test]
    fn unreadable_directory_is_a_list_error() {
        let dir = TempDir::new().expect("temp dir");
        let missing = dir.path().join("absent");
        let error = backend("cp {input} {output}")
            .run(&missing)
            .expect_err("missing dir");
        assert!(matches!(error, BackendError::ListSources { .. }));
    }
}
