//! Skill implementations

mod scene_index;
mod search;
mod transcript;
mod upload;

use crate::cli::{Cli, Commands};
use crate::config_loader;
use crate::errors::{ErrorCode, Failure, Skill};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use vskill_backend::VideoDbBackend;
use vskill_core::config::SkillConfig;
use vskill_core::ports::RetryPolicy;

/// The JSON document of a successful run, or the failure to report
pub type SkillOutcome = std::result::Result<Value, Failure>;

/// Resolved settings shared by every skill
pub struct SkillContext {
    config: SkillConfig,
}

impl SkillContext {
    pub fn new(config: SkillConfig) -> Self {
        Self { config }
    }

    /// Connect to VideoDB; reached only after input validation
    pub fn connect(&self, skill: Skill) -> Result<VideoDbBackend, Failure> {
        VideoDbBackend::connect(&self.config).map_err(|e| Failure::from_skill(e, skill))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.config.retry_policy()
    }
}

/// Execute a CLI command
pub fn execute(cli: Cli) -> SkillOutcome {
    let skill = match cli.command {
        Commands::Search(_) => Skill::Search,
        Commands::SceneIndex(_) => Skill::SceneIndex,
        Commands::Transcript(_) => Skill::Transcript,
        Commands::Upload(_) => Skill::Upload,
    };

    let input = match cli.command.input() {
        Some(raw) => parse_argument(raw)?,
        None => read_stdin(std::io::stdin().lock(), skill)?,
    };

    let config = config_loader::load_config(cli.env_file.as_deref(), cli.base_url.clone())
        .map_err(|e| Failure::new(skill.generic_code(), format!("{:#}", e)))?;
    let ctx = SkillContext::new(config);

    match skill {
        Skill::Search => search::execute(input, &ctx),
        Skill::SceneIndex => scene_index::execute(input, &ctx),
        Skill::Transcript => transcript::execute(input, &ctx),
        Skill::Upload => upload::execute(input, &ctx),
    }
}

/// Input given as the positional argument
fn parse_argument(raw: &str) -> Result<Value, Failure> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| Failure::new(ErrorCode::InvalidJson, e.to_string()))?;
    require_object(value)
}

/// Input piped on stdin; anything unreadable counts as no input
fn read_stdin(mut reader: impl Read, skill: Skill) -> Result<Value, Failure> {
    let no_input = || {
        Failure::new(ErrorCode::NoInput, "Provide JSON as argument or stdin").with_example(skill.example())
    };

    let mut raw = String::new();
    reader.read_to_string(&mut raw).map_err(|_| no_input())?;
    if raw.trim().is_empty() {
        return Err(no_input());
    }

    let value: Value = serde_json::from_str(&raw).map_err(|_| no_input())?;
    require_object(value)
}

fn require_object(value: Value) -> Result<Value, Failure> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(Failure::new(ErrorCode::InvalidJson, "Input must be a JSON object"))
    }
}

/// Deserialize a skill's typed input from the raw object
pub(crate) fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, Failure> {
    serde_json::from_value(input)
        .map_err(|e| Failure::new(ErrorCode::InvalidJson, format!("Invalid input: {}", e)))
}

/// Serialize a skill's output document
pub(crate) fn to_document<T: Serialize>(output: &T, skill: Skill) -> SkillOutcome {
    serde_json::to_value(output).map_err(|e| Failure::new(skill.generic_code(), e.to_string()))
}

/// Treat blank strings as absent
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_must_be_json_object() {
        assert_eq!(parse_argument("{not json").unwrap_err().code, ErrorCode::InvalidJson);
        assert_eq!(parse_argument("[1, 2]").unwrap_err().code, ErrorCode::InvalidJson);
        assert!(parse_argument(r#"{"query": "x"}"#).is_ok());
    }

    #[test]
    fn test_empty_stdin_is_no_input() {
        let failure = read_stdin("  \n".as_bytes(), Skill::Search).unwrap_err();
        assert_eq!(failure.code, ErrorCode::NoInput);
        assert!(failure.example.is_some());

        let failure = read_stdin("garbage".as_bytes(), Skill::Upload).unwrap_err();
        assert_eq!(failure.code, ErrorCode::NoInput);

        let value = read_stdin(r#"{"action": "list"}"#.as_bytes(), Skill::Upload).unwrap();
        assert_eq!(value["action"], "list");
    }
}
