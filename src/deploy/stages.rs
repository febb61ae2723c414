use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, Utc};

use super::{DeployContext, Stage, StageOutcome};
use crate::db_reader;
use crate::site_builder::SiteBuilder;

pub const EXIT_TOOLS: i32 = 2;
pub const EXIT_DATABASE: i32 = 3;
pub const EXIT_GENERATE: i32 = 4;
pub const EXIT_PUBLISH: i32 = 5;
pub const EXIT_REPORT: i32 = 6;

pub struct ToolCheck;

impl Stage for ToolCheck {
    fn name(&self) -> &'static str {
        "tools"
    }

    fn run(&self, ctx: &mut DeployContext) -> StageOutcome {
        let mut installed = Vec::new();
        for tool in ctx.config.required_tools.clone() {
            if ctx.runner.has_program(&tool) {
                continue;
            }
            let Some(pm) = ctx.config.package_manager.clone() else {
                return StageOutcome::fatal(EXIT_TOOLS, format!("{tool} is not installed"));
            };
            log::warn!("{tool} missing, installing with {pm}");
            let attempt = ctx.run_in_repo(&pm, &["install", "-y", &tool]);
            let ok = attempt.as_ref().is_ok_and(|out| out.success());
            if !ok || !ctx.runner.has_program(&tool) {
                return StageOutcome::fatal(
                    EXIT_TOOLS,
                    format!("{tool} is not installed and {pm} could not install it"),
                );
            }
            installed.push(tool);
        }
        if installed.is_empty() {
            StageOutcome::Success("all required tools present".to_string())
        } else {
            StageOutcome::Success(format!("installed: {}", installed.join(", ")))
        }
    }
}

pub struct DatabaseSync;

impl Stage for DatabaseSync {
    fn name(&self) -> &'static str {
        "database"
    }

    fn run(&self, ctx: &mut DeployContext) -> StageOutcome {
        let target = ctx.config.data_db_path();
        let source = ctx.config.db_source.clone();

        if !target.exists() {
            if !source.exists() {
                return StageOutcome::Warning(format!(
                    "prepared database {} not found, continuing without sync",
                    source.display()
                ));
            }
            if let Err(err) = copy_db(&source, &target) {
                return StageOutcome::fatal(EXIT_DATABASE, format!("{err:#}"));
            }
            log::info!("copied {} -> {}", source.display(), target.display());
        }

        let size = fs::metadata(&target).map(|m| m.len()).unwrap_or(0);
        match db_reader::open_db(&target).and_then(|conn| db_reader::count_actionable(&conn)) {
            Ok(count) => StageOutcome::Success(format!(
                "{}: {size} bytes, {count} actionable fixtures",
                target.display()
            )),
            Err(err) => StageOutcome::Warning(format!(
                "{}: {size} bytes, could not count fixtures: {err:#}",
                target.display()
            )),
        }
    }
}

fn copy_db(source: &Path, target: &Path) -> Result<()> {
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    fs::copy(source, target)
        .with_context(|| format!("copy {} -> {}", source.display(), target.display()))?;
    Ok(())
}

pub struct SiteGenerate;

impl Stage for SiteGenerate {
    fn name(&self) -> &'static str {
        "generate"
    }

    fn run(&self, ctx: &mut DeployContext) -> StageOutcome {
        let generated = match ctx.config.generator_cmd.clone() {
            Some(cmd) => run_external_generator(ctx, &cmd),
            None => generate_in_process(ctx),
        };
        if let Err(err) = generated {
            return StageOutcome::fatal(EXIT_GENERATE, format!("{err:#}"));
        }

        let index = ctx.config.output_dir.join("index.html");
        if !index.is_file() {
            return StageOutcome::fatal(
                EXIT_GENERATE,
                format!("generator output {} is missing", index.display()),
            );
        }
        StageOutcome::Success(format!("generated {}", index.display()))
    }
}

fn run_external_generator(ctx: &mut DeployContext, cmd: &[String]) -> Result<()> {
    let Some((program, args)) = cmd.split_first() else {
        anyhow::bail!("empty generator command");
    };
    let resolved = if ctx.runner.has_program(program) {
        program.clone()
    } else {
        let local = ctx.config.repo_dir.join(program);
        if !local.is_file() {
            anyhow::bail!("generator {program} not found");
        }
        // not on PATH: spawn the repo copy by its full path
        local.to_string_lossy().into_owned()
    };
    let args = args.iter().map(String::as_str).collect::<Vec<_>>();
    let out = ctx.run_in_repo(&resolved, &args)?;
    if !out.success() {
        anyhow::bail!(
            "generator exited with {}: {}",
            out.status,
            out.stderr.trim()
        );
    }
    Ok(())
}

fn generate_in_process(ctx: &mut DeployContext) -> Result<()> {
    let conn = db_reader::open_db(&ctx.config.data_db_path())?;
    let targets = ctx
        .config
        .target_league_ids
        .iter()
        .copied()
        .collect::<HashSet<_>>();
    let fixtures = db_reader::get_fixtures(
        &conn,
        Utc::now().date_naive(),
        ctx.config.days_ahead,
        &targets,
    )?;
    let builder = SiteBuilder::new(&ctx.config.output_dir)?;
    builder.generate_all(&fixtures, ctx.config.days_ahead)?;
    Ok(())
}

pub struct GitPublish;

impl Stage for GitPublish {
    fn name(&self) -> &'static str {
        "publish"
    }

    fn run(&self, ctx: &mut DeployContext) -> StageOutcome {
        if !ctx.config.repo_dir.join(".git").exists() {
            return StageOutcome::fatal(
                EXIT_PUBLISH,
                format!("{} is not a git repository", ctx.config.repo_dir.display()),
            );
        }
        match publish(ctx) {
            Ok(msg) => StageOutcome::Success(msg),
            Err(err) => StageOutcome::fatal(EXIT_PUBLISH, format!("{err:#}")),
        }
    }
}

fn publish(ctx: &mut DeployContext) -> Result<String> {
    git(ctx, &["add", "-A"])?;
    let status = git(ctx, &["status", "--porcelain"])?;
    let committed = if status.trim().is_empty() {
        log::info!("working tree clean, nothing to commit");
        false
    } else {
        let msg = format!("Update fixtures {}", Local::now().format("%Y-%m-%d %H:%M"));
        git(ctx, &["commit", "-m", &msg])?;
        true
    };

    let refspec = format!("HEAD:{}", ctx.config.branch);
    let ssh = ctx.config.ssh_remote.clone();
    let https = ctx.config.https_remote.clone();
    let transport = match git(ctx, &["push", &ssh, &refspec]) {
        Ok(_) => "ssh",
        Err(err) => {
            log::warn!("ssh push failed ({err:#}), retrying over https");
            git(ctx, &["push", &https, &refspec])
                .context("push failed over both ssh and https")?;
            "https"
        }
    };
    Ok(format!(
        "{} pushed to {} over {transport}",
        if committed { "commit" } else { "HEAD" },
        ctx.config.branch
    ))
}

fn git(ctx: &mut DeployContext, args: &[&str]) -> Result<String> {
    let out = ctx.run_in_repo("git", args)?;
    if !out.success() {
        anyhow::bail!(
            "git {} exited with {}: {}",
            args.first().copied().unwrap_or_default(),
            out.status,
            out.stderr.trim()
        );
    }
    Ok(out.stdout)
}

pub struct PagesInstructions;

impl Stage for PagesInstructions {
    fn name(&self) -> &'static str {
        "pages"
    }

    fn run(&self, ctx: &mut DeployContext) -> StageOutcome {
        for line in pages_instructions(&ctx.config.branch, &ctx.config.pages_url) {
            log::info!("{line}");
        }
        StageOutcome::Success("pages instructions printed".to_string())
    }
}

pub fn pages_instructions(branch: &str, pages_url: &str) -> Vec<String> {
    vec![
        "GitHub Pages must be enabled once by hand:".to_string(),
        "  1. open the repository Settings -> Pages".to_string(),
        format!("  2. set Source to 'Deploy from a branch', branch '{branch}', folder '/ (root)'"),
        "  3. save and wait a few minutes for the first build".to_string(),
        format!("  site: {pages_url}"),
    ]
}

pub struct ReportWrite;

impl Stage for ReportWrite {
    fn name(&self) -> &'static str {
        "report"
    }

    fn run(&self, ctx: &mut DeployContext) -> StageOutcome {
        let last_commit = git(ctx, &["log", "-1", "--oneline"])
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "n/a".to_string());
        let counts = FileCounts::scan(&ctx.config.output_dir);

        let now = Local::now();
        let mut text = format!(
            "Deploy report - {}\n\nOutput: {}\nHTML files: {}\nJSON files: {}\nCSS files: {}\nJS files: {}\nTotal files: {}\nLast commit: {last_commit}\n\nStages:\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            ctx.config.output_dir.display(),
            counts.html,
            counts.json,
            counts.css,
            counts.js,
            counts.total,
        );
        for result in &ctx.results {
            text.push_str(&format!(
                "  {}: {} - {}\n",
                result.name,
                result.outcome.label(),
                result.outcome.message()
            ));
        }

        let path = ctx
            .config
            .report_dir
            .join(format!("deploy_report_{}.txt", now.format("%Y%m%d_%H%M%S")));
        let written = fs::create_dir_all(&ctx.config.report_dir)
            .and_then(|_| fs::write(&path, text));
        match written {
            Ok(()) => StageOutcome::Success(format!("report written to {}", path.display())),
            Err(err) => StageOutcome::fatal(
                EXIT_REPORT,
                format!("write report {}: {err}", path.display()),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCounts {
    pub html: usize,
    pub json: usize,
    pub css: usize,
    pub js: usize,
    pub total: usize,
}

impl FileCounts {
    /// Recursive count by extension; unreadable directories are skipped.
    pub fn scan(root: &Path) -> Self {
        let mut counts = FileCounts::default();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                counts.total += 1;
                match path.extension().and_then(|e| e.to_str()) {
                    Some("html") => counts.html += 1,
                    Some("json") => counts.json += 1,
                    Some("css") => counts.css += 1,
                    Some("js") => counts.js += 1,
                    _ => {}
                }
            }
        }
        counts
    }
}
