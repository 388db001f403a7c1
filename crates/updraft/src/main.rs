mod cli;
mod error;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use updraft_core::{ReleaseCache, ReleaseConfig, UpdateDecision, resolve_update};
use updraft_github::{GitHubAssetProxy, GitHubSource, build_client};
use updraft_routes::{Request, Response, Router, UpdatePayload};

use crate::cli::{Cli, Command};
use crate::error::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(
        logging::resolve_level(cli.debug, cli.log_level.as_deref()),
        cli.log_file.as_deref(),
    );

    match run(cli).await {
        Ok(code) => code,
        Err(app_error) => {
            error!("{app_error}");
            eprintln!("error: {app_error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let config = ReleaseConfig::from_env()?;
    info!(
        "Serving {} ({})",
        config.slug(),
        if config.is_private() { "private" } else { "public" }
    );
    let router = build_router(config, cli.timeout())?;

    match cli.command {
        Command::Version => {
            let response = router.handle(&Request::get("/version")).await;
            print_body(&response);
            Ok(exit_code(&response))
        }
        Command::Check { platform, version } => {
            check(&router, &platform, &version).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Get { path, user_agent } => {
            let mut request = Request::get(&path);
            if let Some(user_agent) = user_agent {
                request = request.with_user_agent(user_agent);
            }
            let response = router.handle(&request).await;
            print_response(&response);
            Ok(exit_code(&response))
        }
    }
}

fn build_router(config: ReleaseConfig, timeout: Duration) -> Result<Router, AppError> {
    let source = GitHubSource::new(
        build_client(timeout)?,
        config.api_base_url.clone(),
        config.token.clone(),
    );
    let private = config.is_private();

    let router = Router::new(Arc::new(ReleaseCache::new(config, Arc::new(source))));
    if private {
        return Ok(router.with_proxy(Arc::new(GitHubAssetProxy::new(timeout)?)));
    }
    Ok(router)
}

async fn check(router: &Router, platform: &str, version: &str) -> Result<(), AppError> {
    match resolve_update(router.cache(), platform, version).await? {
        UpdateDecision::Invalid(reason) => Err(AppError::Rejected(reason)),
        UpdateDecision::NoUpdate => {
            println!("{platform} {version} is up to date");
            Ok(())
        }
        UpdateDecision::UpdateAvailable(update) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&UpdatePayload::from(&update))?
            );
            Ok(())
        }
    }
}

fn exit_code(response: &Response) -> ExitCode {
    if response.status < 400 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_response(response: &Response) {
    println!("HTTP {}", response.status);
    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }
    if !response.body.is_empty() {
        println!();
        print_body(response);
    }
}

fn print_body(response: &Response) {
    match std::str::from_utf8(&response.body) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("<{} bytes of binary data>", response.body.len()),
    }
}
