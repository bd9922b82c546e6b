//! post-ai-cli: translate or summarize posts and inspect backend jobs from
//! the command line.
//!
//! Usage:
//!   post-ai-cli translate <post-id>
//!   post-ai-cli summarize <post-id> [--source-text <text>]
//!   post-ai-cli job <job-id>
//!   post-ai-cli wait <job-id>
//!   post-ai-cli login <handle-or-email> <password>
//!   post-ai-cli logout

use anyhow::{anyhow, bail, Context};
use post_ai_client::{
    ClientConfig, JobHandle, KeyringTokenStore, MemoryTokenStore, PostAiClient, SummarizeOptions,
    TokenStore,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "translate" => cmd_translate(&args[2..]).await,
        "summarize" => cmd_summarize(&args[2..]).await,
        "job" => cmd_job(&args[2..]).await,
        "wait" => cmd_wait(&args[2..]).await,
        "login" => cmd_login(&args[2..]).await,
        "logout" => cmd_logout(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("post-ai-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"post-ai-cli: blog AI client

USAGE:
    post-ai-cli <COMMAND> [OPTIONS]

COMMANDS:
    translate <post-id>                         Translate a post
    summarize <post-id> [--source-text <text>]  Summarize a post or the given text
    job <job-id>                                Show the current status of a job
    wait <job-id>                               Poll a job until it finishes
    login <handle-or-email> <password>          Sign in and store the token
    logout                                      Forget the stored token
    version                                     Show version information
    help                                        Show this help message

OPTIONS:
    --base-url <url>        Backend base URL
    --config <path>         YAML configuration file
    --account <name>        Keyring account holding the token (default: "default")

ENVIRONMENT:
    POST_AI_BASE_URL            Backend base URL
    POST_AI_TOKEN               Use this token instead of the keyring
    POST_AI_POLL_INTERVAL_MS    Job poll interval
    POST_AI_JOB_TIMEOUT_SECS    Job deadline
    RUST_LOG                    Log filter (default: warn)"#
    );
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String], index: usize) -> Option<&str> {
    let mut skip_next = false;
    args.iter()
        .filter(|a| {
            if skip_next {
                skip_next = false;
                return false;
            }
            if a.starts_with("--") {
                skip_next = true;
                return false;
            }
            true
        })
        .nth(index)
        .map(String::as_str)
}

fn token_store(args: &[String]) -> Arc<dyn TokenStore> {
    if let Ok(token) = std::env::var("POST_AI_TOKEN") {
        return Arc::new(MemoryTokenStore::with_token(token));
    }
    let account = flag_value(args, "--account").unwrap_or("default");
    Arc::new(KeyringTokenStore::new(account))
}

fn build_client(args: &[String]) -> anyhow::Result<PostAiClient> {
    let config = match flag_value(args, "--config") {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {path}"))?,
        None => ClientConfig::from_env(),
    };
    let mut builder = PostAiClient::builder()
        .config(config)
        .token_store(token_store(args));
    if let Some(url) = flag_value(args, "--base-url") {
        builder = builder.base_url(url);
    }
    Ok(builder.build()?)
}

async fn cmd_translate(args: &[String]) -> anyhow::Result<()> {
    let post_id = positional(args, 0).ok_or_else(|| anyhow!("missing <post-id>"))?;
    let client = build_client(args)?;
    let out = client.try_translate_post(post_id).await?;
    println!("{}", out.text().unwrap_or_default());
    Ok(())
}

async fn cmd_summarize(args: &[String]) -> anyhow::Result<()> {
    let post_id = positional(args, 0).ok_or_else(|| anyhow!("missing <post-id>"))?;
    let options = flag_value(args, "--source-text")
        .map(SummarizeOptions::from_source_text)
        .unwrap_or_default();
    let client = build_client(args)?;
    let out = client.try_summarize_post(post_id, &options).await?;
    println!("{}", out.text().unwrap_or_default());
    Ok(())
}

async fn cmd_job(args: &[String]) -> anyhow::Result<()> {
    let job_id = positional(args, 0).ok_or_else(|| anyhow!("missing <job-id>"))?;
    let client = build_client(args)?;
    match client.poller().status(&JobHandle::new(job_id)).await? {
        Some(body) => println!("{}", serde_json::to_string_pretty(&body)?),
        None => bail!("job {job_id} not found"),
    }
    Ok(())
}

async fn cmd_wait(args: &[String]) -> anyhow::Result<()> {
    let job_id = positional(args, 0).ok_or_else(|| anyhow!("missing <job-id>"))?;
    let client = build_client(args)?;
    let cancel = post_ai_client::CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });
    let outcome = client.poller().poll(&JobHandle::new(job_id), &cancel).await?;
    println!("{}", outcome.name());
    if let post_ai_client::JobOutcome::Completed(body) | post_ai_client::JobOutcome::Failed(body) =
        &outcome
    {
        println!("{}", serde_json::to_string_pretty(body)?);
    }
    Ok(())
}

async fn cmd_login(args: &[String]) -> anyhow::Result<()> {
    let who = positional(args, 0).ok_or_else(|| anyhow!("missing <handle-or-email>"))?;
    let password = positional(args, 1).ok_or_else(|| anyhow!("missing <password>"))?;
    let client = build_client(args)?;
    client.auth().login(who, password).await?;
    let account = client.auth().me().await?;
    println!("Signed in as {}", account.label());
    Ok(())
}

fn cmd_logout(args: &[String]) -> anyhow::Result<()> {
    let client = build_client(args)?;
    client.auth().logout()?;
    println!("Signed out");
    Ok(())
}
