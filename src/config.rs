#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bon::Builder;

use crate::{analysis::PatternSet, extract::DEFAULT_EXTRACT_PATTERN};

/// Prompt truncation length for submission source sent for review.
pub const PROMPT_TRUNCATE: usize = 60_000;

/// Default OpenAI-compatible endpoint.
const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default chat model used for escalation reviews.
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Reads a trimmed, non-empty value from a lookup function.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// OpenAI credentials and tuning parameters sourced from the environment.
#[derive(Clone, Debug)]
pub struct OpenAiEnv {
    /// Base URL for the OpenAI-compatible API endpoint.
    api_base:    String,
    /// API key used to authenticate OpenAI requests.
    api_key:     String,
    /// Model identifier for chat completions.
    model:       String,
    /// Sampling temperature.
    temperature: f32,
}

impl OpenAiEnv {
    /// Creates a configuration for `api_key` with the default endpoint, model,
    /// and a temperature of zero.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base:    DEFAULT_OPENAI_ENDPOINT.to_string(),
            api_key:     api_key.into(),
            model:       DEFAULT_OPENAI_MODEL.to_string(),
            temperature: 0.0,
        }
    }

    /// Construct an `OpenAiEnv` from a variable lookup; returns `None` if
    /// no API key is available.
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = non_empty(lookup, "OPENAI_API_KEY")?;
        let mut env = Self::new(api_key);

        if let Some(base) = non_empty(lookup, "OPENAI_ENDPOINT") {
            env.api_base = base;
        }
        if let Some(model) = non_empty(lookup, "OPENAI_MODEL") {
            env.model = model;
        }
        if let Some(raw) = non_empty(lookup, "OPENAI_TEMPERATURE") {
            match raw.parse() {
                Ok(t) => env.temperature = t,
                Err(e) => tracing::warn!(
                    "Ignoring OPENAI_TEMPERATURE={raw:?} ({e}); using {}",
                    env.temperature
                ),
            }
        }

        Some(env)
    }

    /// Returns the API base URL used for OpenAI requests.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Returns the API key used for OpenAI requests.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

/// How the external C++ toolchain is invoked.
#[derive(Clone, Debug)]
pub struct CompilerConfig {
    /// Compiler program, resolved on `PATH`.
    program: String,
    /// Extra flags placed before the source path.
    flags:   Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "g++".to_string(),
            flags:   Vec::new(),
        }
    }
}

impl CompilerConfig {
    /// Creates a compiler configuration.
    pub fn new(program: impl Into<String>, flags: Vec<String>) -> Self {
        Self {
            program: program.into(),
            flags,
        }
    }

    /// Returns the compiler program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the extra compiler flags.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }
}

/// Values given on the command line; each one wins over its environment
/// counterpart.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    /// `--submissions`
    pub submissions_dir: Option<PathBuf>,
    /// `--fixtures`
    pub fixtures_dir:    Option<PathBuf>,
    /// `--workspace`
    pub workspace_dir:   Option<PathBuf>,
    /// `--problem`
    pub problem:         Option<String>,
    /// `--problem-file`
    pub problem_file:    Option<PathBuf>,
    /// `--patterns`
    pub patterns_file:   Option<PathBuf>,
    /// `--extract`
    pub extract_pattern: Option<String>,
    /// `--cxx`
    pub compiler:        Option<String>,
}

/// Immutable configuration for one grading run, built once at startup and
/// passed to every stage.
#[derive(Clone, Debug, Builder)]
pub struct JudgeConfig {
    /// Flat directory of submission source files.
    #[builder(into, default = PathBuf::from("students_submission"))]
    submissions_dir: PathBuf,
    /// Directory with one subdirectory per fixture.
    #[builder(into, default = PathBuf::from("testcases"))]
    fixtures_dir:    PathBuf,
    /// Root under which per-submission workspaces are created.
    #[builder(into, default = std::env::temp_dir().join("codejudge"))]
    workspace_dir:   PathBuf,
    /// File name of the stdin fixture inside each fixture directory.
    #[builder(into, default = "input.txt".to_string())]
    input_file:      String,
    /// File name of the expected output inside each fixture directory.
    #[builder(into, default = "expected_output.txt".to_string())]
    expected_file:   String,
    /// Problem statement sent along with escalation reviews.
    #[builder(into, default)]
    problem:         String,
    /// Lexical rules used by the analyzer.
    #[builder(default)]
    patterns:        PatternSet,
    /// Regular expression used to extract the compared value.
    #[builder(into, default = DEFAULT_EXTRACT_PATTERN.to_string())]
    extract_pattern: String,
    /// Compiler invocation settings.
    #[builder(default)]
    compiler:        CompilerConfig,
    /// OpenAI settings, if a review service is configured.
    openai:          Option<OpenAiEnv>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl JudgeConfig {
    /// Loads configuration from the environment with command-line overrides
    /// applied on top.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn load_with(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let path_var = |key: &str| non_empty(&lookup, key).map(PathBuf::from);

        let submissions_dir = overrides
            .submissions_dir
            .clone()
            .or_else(|| path_var("CODEJUDGE_SUBMISSIONS_DIR"))
            .unwrap_or_else(|| PathBuf::from("students_submission"));
        let fixtures_dir = overrides
            .fixtures_dir
            .clone()
            .or_else(|| path_var("CODEJUDGE_FIXTURES_DIR"))
            .unwrap_or_else(|| PathBuf::from("testcases"));
        let workspace_dir = overrides
            .workspace_dir
            .clone()
            .or_else(|| path_var("CODEJUDGE_WORKSPACE_DIR"))
            .unwrap_or_else(|| std::env::temp_dir().join("codejudge"));

        let problem = match (&overrides.problem, &overrides.problem_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => read_problem(path)?,
            (None, None) => match path_var("CODEJUDGE_PROBLEM_FILE") {
                Some(path) => read_problem(&path)?,
                None => non_empty(&lookup, "CODEJUDGE_PROBLEM").unwrap_or_default(),
            },
        };

        let patterns = match overrides
            .patterns_file
            .clone()
            .or_else(|| path_var("CODEJUDGE_PATTERNS"))
        {
            Some(path) => PatternSet::from_json_file(&path)?,
            None => PatternSet::default(),
        };

        let extract_pattern = overrides
            .extract_pattern
            .clone()
            .or_else(|| non_empty(&lookup, "CODEJUDGE_EXTRACT_PATTERN"))
            .unwrap_or_else(|| DEFAULT_EXTRACT_PATTERN.to_string());

        let compiler = CompilerConfig::new(
            overrides
                .compiler
                .clone()
                .or_else(|| non_empty(&lookup, "CODEJUDGE_CXX"))
                .unwrap_or_else(|| "g++".to_string()),
            non_empty(&lookup, "CODEJUDGE_CXXFLAGS")
                .map(|flags| flags.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default(),
        );

        let input_file =
            non_empty(&lookup, "CODEJUDGE_INPUT_FILE").unwrap_or_else(|| "input.txt".to_string());
        let expected_file = non_empty(&lookup, "CODEJUDGE_EXPECTED_FILE")
            .unwrap_or_else(|| "expected_output.txt".to_string());

        Ok(Self::builder()
            .submissions_dir(submissions_dir)
            .fixtures_dir(fixtures_dir)
            .workspace_dir(workspace_dir)
            .input_file(input_file)
            .expected_file(expected_file)
            .problem(problem)
            .patterns(patterns)
            .extract_pattern(extract_pattern)
            .compiler(compiler)
            .maybe_openai(OpenAiEnv::from_lookup(&lookup))
            .build())
    }

    /// Returns the submissions directory.
    pub fn submissions_dir(&self) -> &Path {
        &self.submissions_dir
    }

    /// Returns the fixtures directory.
    pub fn fixtures_dir(&self) -> &Path {
        &self.fixtures_dir
    }

    /// Returns the workspace root.
    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    /// Returns the fixture input file name.
    pub fn input_file(&self) -> &str {
        &self.input_file
    }

    /// Returns the fixture expected-output file name.
    pub fn expected_file(&self) -> &str {
        &self.expected_file
    }

    /// Returns the problem statement.
    pub fn problem(&self) -> &str {
        &self.problem
    }

    /// Returns the analyzer rules.
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Returns the extraction pattern.
    pub fn extract_pattern(&self) -> &str {
        &self.extract_pattern
    }

    /// Returns the compiler settings.
    pub fn compiler(&self) -> &CompilerConfig {
        &self.compiler
    }

    /// Returns the OpenAI settings, if configured.
    pub fn openai(&self) -> Option<&OpenAiEnv> {
        self.openai.as_ref()
    }
}

/// Reads the problem statement from `path`.
fn read_problem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .with_context(|| format!("Could not read problem statement {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_conventional_layout() {
        let cfg = JudgeConfig::load_with(lookup(&[]), &Overrides::default()).expect("config");
        assert_eq!(cfg.submissions_dir(), Path::new("students_submission"));
        assert_eq!(cfg.fixtures_dir(), Path::new("testcases"));
        assert_eq!(cfg.input_file(), "input.txt");
        assert_eq!(cfg.expected_file(), "expected_output.txt");
        assert_eq!(cfg.extract_pattern(), DEFAULT_EXTRACT_PATTERN);
        assert_eq!(cfg.compiler().program(), "g++");
        assert!(cfg.openai().is_none());
    }

    #[test]
    fn overrides_win_over_environment() {
        let vars = lookup(&[
            ("CODEJUDGE_SUBMISSIONS_DIR", "from-env"),
            ("CODEJUDGE_FIXTURES_DIR", "fixtures-env"),
            ("CODEJUDGE_CXX", "clang++"),
            ("CODEJUDGE_CXXFLAGS", "-O2  -std=c++17"),
        ]);
        let overrides = Overrides {
            submissions_dir: Some(PathBuf::from("from-cli")),
            ..Default::default()
        };
        let cfg = JudgeConfig::load_with(vars, &overrides).expect("config");
        assert_eq!(cfg.submissions_dir(), Path::new("from-cli"));
        assert_eq!(cfg.fixtures_dir(), Path::new("fixtures-env"));
        assert_eq!(cfg.compiler().program(), "clang++");
        assert_eq!(cfg.compiler().flags(), ["-O2", "-std=c++17"]);
    }

    #[test]
    fn openai_requires_a_key_and_applies_tuning() {
        let vars = lookup(&[
            ("OPENAI_API_KEY", " sk-test "),
            ("OPENAI_MODEL", "some-model"),
            ("OPENAI_TEMPERATURE", "0.3"),
        ]);
        let cfg = JudgeConfig::load_with(vars, &Overrides::default()).expect("config");
        let openai = cfg.openai().expect("openai configured");
        assert_eq!(openai.api_key(), "sk-test");
        assert_eq!(openai.model(), "some-model");
        assert_eq!(openai.api_base(), DEFAULT_OPENAI_ENDPOINT);
        assert!((openai.temperature() - 0.3).abs() < f32::EPSILON);

        let blank = lookup(&[("OPENAI_API_KEY", "   ")]);
        let cfg = JudgeConfig::load_with(blank, &Overrides::default()).expect("config");
        assert!(cfg.openai().is_none());
    }

    #[test]
    fn unparsable_temperature_keeps_default() {
        let vars = lookup(&[("OPENAI_API_KEY", "sk-test"), ("OPENAI_TEMPERATURE", "0,7")]);
        let cfg = JudgeConfig::load_with(vars, &Overrides::default()).expect("config");
        assert_eq!(cfg.openai().map(OpenAiEnv::temperature), Some(0.0));
    }

    #[test]
    fn pattern_file_from_env_or_override_replaces_defaults() {
        let dir = std::env::temp_dir().join(format!("codejudge-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let from_env = dir.join("env.json");
        let from_cli = dir.join("cli.json");
        std::fs::write(&from_env, r#"{"returns": "\\breturn\\b"}"#).expect("write env rules");
        std::fs::write(&from_cli, r#"{"loops": "\\bfor\\b"}"#).expect("write cli rules");

        let env_path = from_env.to_string_lossy().into_owned();
        let cfg = JudgeConfig::load_with(
            lookup(&[("CODEJUDGE_PATTERNS", env_path.as_str())]),
            &Overrides::default(),
        )
        .expect("config");
        assert_eq!(cfg.patterns().analyze("return 0; return 1;").get("returns"), Some(2));

        let overrides = Overrides {
            patterns_file: Some(from_cli),
            ..Default::default()
        };
        let vars = lookup(&[("CODEJUDGE_PATTERNS", env_path.as_str())]);
        let cfg = JudgeConfig::load_with(vars, &overrides).expect("config");
        let analysis = cfg.patterns().analyze("for (;;) {}");
        assert_eq!(analysis.get("loops"), Some(1));
        assert_eq!(analysis.get("returns"), None);

        std::fs::write(dir.join("bad.json"), "[1, 2]").expect("write bad rules");
        let overrides = Overrides {
            patterns_file: Some(dir.join("bad.json")),
            ..Default::default()
        };
        assert!(JudgeConfig::load_with(lookup(&[]), &overrides).is_err());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_problem_file_is_an_error() {
        let overrides = Overrides {
            problem_file: Some(PathBuf::from("/definitely/not/here/problem.md")),
            ..Default::default()
        };
        assert!(JudgeConfig::load_with(lookup(&[]), &overrides).is_err());
    }
}
