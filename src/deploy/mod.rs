//! Deploy pipeline: a fixed sequence of named stages, each returning a typed
//! outcome. The run stops at the first fatal stage and exits with its code.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::config::DeployConfig;

pub mod stages;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Success(String),
    /// Something was off but later stages can still run.
    Warning(String),
    Fatal { code: i32, message: String },
}

impl StageOutcome {
    pub fn fatal(code: i32, message: impl Into<String>) -> Self {
        StageOutcome::Fatal {
            code,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StageOutcome::Fatal { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageOutcome::Success(_) => "ok",
            StageOutcome::Warning(_) => "warning",
            StageOutcome::Fatal { .. } => "fatal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            StageOutcome::Success(msg) | StageOutcome::Warning(msg) => msg,
            StageOutcome::Fatal { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageResult {
    pub name: &'static str,
    pub outcome: StageOutcome,
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Every external program the pipeline touches goes through here.
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput>;

    fn has_program(&self, program: &str) -> bool;
}

pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
        log::debug!("$ {program} {}", args.join(" "));
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .with_context(|| format!("spawn {program}"))?;
        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn has_program(&self, program: &str) -> bool {
        find_on_path(program).is_some()
    }
}

pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}

pub struct DeployContext {
    pub config: DeployConfig,
    pub runner: Box<dyn CommandRunner>,
    /// Results of the stages that already ran, in order.
    pub results: Vec<StageResult>,
}

impl DeployContext {
    pub fn new(config: DeployConfig, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            results: Vec::new(),
        }
    }

    pub fn run_in_repo(&mut self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let cwd = self.config.repo_dir.clone();
        self.runner.run(program, args, &cwd)
    }
}

pub trait Stage {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &mut DeployContext) -> StageOutcome;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub results: Vec<StageResult>,
    pub exit_code: i32,
}

impl PipelineReport {
    pub fn ran(&self, name: &str) -> bool {
        self.results.iter().any(|r| r.name == name)
    }
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// tools → database → generate → publish → pages → report.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(stages::ToolCheck),
            Box::new(stages::DatabaseSync),
            Box::new(stages::SiteGenerate),
            Box::new(stages::GitPublish),
            Box::new(stages::PagesInstructions),
            Box::new(stages::ReportWrite),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, ctx: &mut DeployContext) -> PipelineReport {
        let mut exit_code = 0;
        for stage in &self.stages {
            log::info!("==> {}", stage.name());
            let outcome = stage.run(ctx);
            match &outcome {
                StageOutcome::Success(msg) => log::info!("[{}] {msg}", stage.name()),
                StageOutcome::Warning(msg) => log::warn!("[{}] {msg}", stage.name()),
                StageOutcome::Fatal { code, message } => {
                    log::error!("[{}] {message} (exit {code})", stage.name());
                    exit_code = *code;
                }
            }
            let fatal = outcome.is_fatal();
            ctx.results.push(StageResult {
                name: stage.name(),
                outcome,
            });
            if fatal {
                break;
            }
        }
        PipelineReport {
            results: ctx.results.clone(),
            exit_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_stage_order() {
        assert_eq!(
            Pipeline::standard().stage_names(),
            vec!["tools", "database", "generate", "publish", "pages", "report"]
        );
    }

    #[test]
    fn outcome_accessors() {
        let fatal = StageOutcome::fatal(4, "no output");
        assert!(fatal.is_fatal());
        assert_eq!(fatal.label(), "fatal");
        assert_eq!(fatal.message(), "no output");
        assert!(!StageOutcome::Warning("db".into()).is_fatal());
    }
}
