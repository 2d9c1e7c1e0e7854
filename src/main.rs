use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use lookout_core::{GitHubConfig, LookoutConfig, LookoutError, PrTarget};
use lookout_review::agent::AgentClient;
use lookout_review::github::{parse_pr_reference, GitHubClient};
use lookout_review::pipeline::ReviewPipeline;
use lookout_review::publish::publish_review;

#[derive(Parser)]
#[command(
    name = "lookout",
    version,
    about = "AI pull request reviews with a human in the loop",
    long_about = "Lookout fetches a GitHub pull request, generates a structured review with\n\
                   an LLM, shows it to you, and posts it back only when you say 'send'.\n\n\
                   Examples:\n  \
                     lookout review --pr owner/repo#123   Review a specific pull request\n  \
                     lookout review                       Resolve the PR from env vars or prompts\n  \
                     lookout init                         Create a .lookout.toml config file\n  \
                     lookout doctor                       Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .lookout.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Review a GitHub pull request, then post it after confirmation
    #[command(long_about = "Review a GitHub pull request, then post it after confirmation.\n\n\
        Fetches the PR metadata and diff, asks the configured model for a structured\n\
        review, and prints it. Posting only happens after you type 'send' at the\n\
        prompt; any other answer leaves GitHub untouched.\n\n\
        The target is resolved from --pr, then GITHUB_REPO_OWNER / GITHUB_REPO_NAME /\n\
        GITHUB_PR_NUMBER, then the [github] config section, then interactive prompts.\n\n\
        Examples:\n  lookout review --pr rust-lang/rust#12345\n  GITHUB_PR_NUMBER=7 lookout review")]
    Review {
        /// GitHub PR to review (format: owner/repo#123)
        #[arg(
            long,
            long_help = "GitHub PR to review.\n\nFormat: owner/repo#123\nRequires GITHUB_TOKEN or [github] token."
        )]
        pr: Option<String>,
    },
    /// Create a default .lookout.toml configuration file
    #[command(long_about = "Create a default .lookout.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .lookout.toml already exists.")]
    Init,
    /// Check your Lookout setup and environment
    #[command(long_about = "Check your Lookout setup and environment.\n\n\
        Runs diagnostics for the config file, the agent API key, the GitHub\n\
        token, and the optional review-target variables.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m⚑\x1b[0m \x1b[1mlookout\x1b[0m v{version} — AI pull request reviews with a human in the loop\n");

        println!("Quick start:");
        println!("  \x1b[36mlookout init\x1b[0m                      Create a .lookout.toml config file");
        println!("  \x1b[36mlookout review --pr owner/repo#1\x1b[0m  Review a pull request\n");

        println!("All commands:");
        println!("  \x1b[32mreview\x1b[0m   Generate a PR review and post it after a 'send' confirmation");
        println!("  \x1b[32mdoctor\x1b[0m   Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m     Create default configuration\n");
    } else {
        println!("lookout v{version} — AI pull request reviews with a human in the loop\n");

        println!("Quick start:");
        println!("  lookout init                      Create a .lookout.toml config file");
        println!("  lookout review --pr owner/repo#1  Review a pull request\n");

        println!("All commands:");
        println!("  review   Generate a PR review and post it after a 'send' confirmation");
        println!("  doctor   Check your setup and environment");
        println!("  init     Create default configuration\n");
    }

    println!("Run 'lookout <command> --help' for details.");
}

struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(config: &LookoutConfig, use_color: bool) {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Config file
    let config_path = std::path::Path::new(".lookout.toml");
    if config_path.exists() {
        checks.push(CheckResult::pass("config_file", ".lookout.toml found"));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            ".lookout.toml not found",
            "run 'lookout init' to create a default config",
        ));
    }

    // 2. Agent provider + API key
    checks.push(CheckResult::pass(
        "agent_provider",
        format!("{} (model: {})", config.agent.provider, config.agent.model),
    ));
    if config.agent.api_key.is_some() || std::env::var("GOOGLE_API_KEY").is_ok() {
        checks.push(CheckResult::pass("agent_api_key", "GOOGLE_API_KEY set"));
    } else {
        checks.push(CheckResult::fail(
            "agent_api_key",
            "GOOGLE_API_KEY not set",
            "export GOOGLE_API_KEY=... or set api_key in .lookout.toml [agent]",
        ));
    }

    // 3. GitHub token
    if config.github.token.is_some() || std::env::var("GITHUB_TOKEN").is_ok() {
        checks.push(CheckResult::pass("github_token", "GITHUB_TOKEN set"));
    } else {
        checks.push(CheckResult::fail(
            "github_token",
            "GITHUB_TOKEN not set",
            "export GITHUB_TOKEN=... (needed for fetching and posting)",
        ));
    }

    // 4. Review target
    let owner = std::env::var("GITHUB_REPO_OWNER")
        .ok()
        .or_else(|| config.github.owner.clone());
    let repo = std::env::var("GITHUB_REPO_NAME")
        .ok()
        .or_else(|| config.github.repo.clone());
    let number = std::env::var("GITHUB_PR_NUMBER")
        .ok()
        .or_else(|| config.github.pr_number.clone());
    match (owner, repo, number) {
        (Some(o), Some(r), Some(n)) => {
            checks.push(CheckResult::info("review_target", format!("{o}/{r}#{n}")));
        }
        _ => {
            checks.push(CheckResult::info(
                "review_target",
                "not fully set (missing pieces are asked for interactively)",
            ));
        }
    }

    let version = env!("CARGO_PKG_VERSION");
    println!("Lookout v{version} — Environment Check\n");

    for check in &checks {
        let sym = if use_color {
            check.colored_symbol()
        } else {
            check.symbol().to_string()
        };
        let label = check.name.replace('_', " ");
        println!("  {sym} {label:<20} {}", check.detail);
        if let Some(hint) = &check.hint {
            println!("    hint: {hint}");
        }
    }

    let passed = checks.iter().filter(|c| c.status == "pass").count();
    let failed = checks.iter().filter(|c| c.status == "fail").count();
    let info = checks.iter().filter(|c| c.status == "info").count();
    println!("\n{passed} checks passed, {failed} failed, {info} info");
}

/// Ask a question on stdout and read one trimmed line from stdin.
fn prompt_line(question: &str) -> Result<String, LookoutError> {
    print!("{question}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// The confirmation gate recognizes exactly the literal `send`
/// (case-insensitive); everything else declines.
fn send_decision(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("send")
}

/// Resolve one target field: environment variable, then config file, then
/// interactive prompt.
fn resolve_field(
    env_var: &str,
    configured: Option<&str>,
    question: &str,
) -> Result<String, LookoutError> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Ok(value);
        }
    }
    if let Some(value) = configured {
        return Ok(value.to_string());
    }
    prompt_line(question)
}

/// Resolve the pull request to review: `--pr` reference first, then the
/// per-field env/config/prompt chain. Nothing here validates the number;
/// a bad value fails at the HTTP layer.
fn resolve_target(pr_flag: Option<&str>, github: &GitHubConfig) -> Result<PrTarget, LookoutError> {
    if let Some(pr_ref) = pr_flag {
        return parse_pr_reference(pr_ref);
    }
    let owner = resolve_field(
        "GITHUB_REPO_OWNER",
        github.owner.as_deref(),
        "Enter the repository owner: ",
    )?;
    let repo = resolve_field(
        "GITHUB_REPO_NAME",
        github.repo.as_deref(),
        "Enter the repository name: ",
    )?;
    let number = resolve_field(
        "GITHUB_PR_NUMBER",
        github.pr_number.as_deref(),
        "Enter the PR number: ",
    )?;
    Ok(PrTarget::new(owner, repo, number))
}

/// Map workflow errors onto diagnostics, giving classified quota
/// exhaustion its dedicated remedy text.
fn render_workflow_error(err: LookoutError) -> miette::Report {
    match err {
        LookoutError::Quota(detail) => miette::miette!(
            help = "You've exceeded your Gemini API quota. Some options:\n  \
                    1. Wait for the quota reset (free tier quotas reset daily)\n  \
                    2. Upgrade to a paid tier for higher quotas\n  \
                    3. Use an API key from a different Google Cloud project\n\
                    More on quotas: https://ai.google.dev/gemini-api/docs/rate-limits",
            "Gemini API quota exhausted: {detail}"
        ),
        other => other.into(),
    }
}

async fn run_review(config: &LookoutConfig, pr_flag: Option<&str>, verbose: bool) -> Result<()> {
    // Credential preconditions come before any network activity, agent key
    // first. The hints name the variable the operator has to set.
    if config.agent.api_key.is_none() && std::env::var("GOOGLE_API_KEY").is_err() {
        miette::bail!(miette::miette!(
            help = "Export GOOGLE_API_KEY or set api_key in your .lookout.toml under [agent]",
            "GOOGLE_API_KEY is not set in the environment"
        ));
    }
    if config.github.token.is_none() && std::env::var("GITHUB_TOKEN").is_err() {
        miette::bail!(miette::miette!(
            help = "Export GITHUB_TOKEN or set token in your .lookout.toml under [github]",
            "GITHUB_TOKEN is not set in the environment"
        ));
    }

    let target = resolve_target(pr_flag, &config.github)?;
    if verbose {
        eprintln!("target: {target}");
        eprintln!(
            "model: {} (provider: {})",
            config.agent.model, config.agent.provider
        );
    }

    let github = GitHubClient::new(&config.github)?;
    let agent = AgentClient::new(&config.agent)?;
    let pipeline = ReviewPipeline::new(agent);

    println!("\nFetching PR details...");
    let pr = github.get_pr(&target).await?;

    println!("Fetching PR diff...");
    let diff = github.get_pr_diff(&target).await?;

    let is_tty = std::io::stderr().is_terminal();
    let spinner = if is_tty {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})").unwrap(),
        );
        pb.set_message("Generating review...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        println!("\nGenerating review...");
        None
    };

    let review = match pipeline.generate(&pr, &diff).await {
        Ok(review) => {
            if let Some(pb) = spinner {
                pb.finish_with_message("Done");
            }
            review
        }
        Err(e) => {
            if let Some(pb) = spinner {
                pb.finish_with_message("Failed");
            }
            return Err(render_workflow_error(e));
        }
    };

    println!("\nGenerated PR review:");
    println!("{}", review.review_comment);
    if verbose {
        eprintln!("model used: {}", review.model_used);
    }

    let decision = prompt_line("\nDo you want to post this review to GitHub? (send/not-send): ")?;
    if send_decision(&decision) {
        println!("\nPosting review to GitHub...");
        let outcome = publish_review(&github, &target, &review.review_comment)
            .await
            .map_err(render_workflow_error)?;
        println!("\nReview successfully posted to GitHub as {outcome}!");
        println!("Review URL: {}", outcome.url().unwrap_or("N/A"));
    } else {
        println!("\nReview was not posted to GitHub.");
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Lookout Configuration
# See: https://github.com/lookout-dev/lookout

[agent]
# provider = "google"
# model = "gemini-1.5-flash-latest"
# api_key = "..."          # falls back to GOOGLE_API_KEY
# base_url = "https://generativelanguage.googleapis.com"

[github]
# token = "..."            # falls back to GITHUB_TOKEN
# api_base = "https://api.github.com"

# Pre-seeded review target; anything missing is read from
# GITHUB_REPO_OWNER / GITHUB_REPO_NAME / GITHUB_PR_NUMBER or prompted for.
# owner = "octocat"
# repo = "hello-world"
# pr_number = "42"
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LookoutConfig::from_file(path)?,
        None => {
            let default_path = std::path::Path::new(".lookout.toml");
            if default_path.exists() {
                LookoutConfig::from_file(default_path)?
            } else {
                LookoutConfig::default()
            }
        }
    };

    let use_color = std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err();

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Review { ref pr }) => {
            run_review(&config, pr.as_deref(), cli.verbose).await?;
        }
        Some(Command::Init) => {
            let path = std::path::Path::new(".lookout.toml");
            if path.exists() {
                miette::bail!(".lookout.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .lookout.toml with default configuration");
        }
        Some(Command::Doctor) => {
            run_doctor(&config, use_color);
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "lookout", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_decision_accepts_send_case_insensitively() {
        assert!(send_decision("send"));
        assert!(send_decision("SEND"));
        assert!(send_decision("  Send  "));
    }

    #[test]
    fn send_decision_declines_everything_else() {
        assert!(!send_decision("no"));
        assert!(!send_decision(""));
        assert!(!send_decision("yes"));
        assert!(!send_decision("not-send"));
        assert!(!send_decision("sent"));
    }

    #[test]
    fn default_config_template_parses() {
        let config = LookoutConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.agent.provider, "google");
    }
}
