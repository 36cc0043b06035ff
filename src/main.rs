use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use merge_gate::approvals::ApprovalStore;
use merge_gate::build::TeamCityTrigger;
use merge_gate::config::Config;
use merge_gate::git::LocalGit;
use merge_gate::github::OctocrabClient;
use merge_gate::orchestrator::Orchestrator;
use merge_gate::permissions::PermissionResolver;
use merge_gate::server::{AppState, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merge_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    config.validate()?;

    let approvals = ApprovalStore::open(&config.db)
        .with_context(|| format!("opening approval store {}", config.db.display()))?;
    let github =
        OctocrabClient::from_token(config.github_token.clone()).context("building GitHub client")?;
    std::fs::create_dir_all(&config.workdir)
        .with_context(|| format!("creating working directory {}", config.workdir.display()))?;
    let git = LocalGit::new(config.workdir.clone());
    let build = config.teamcity()?.map(TeamCityTrigger::new);
    if build.is_none() {
        tracing::info!("no TeamCity server configured, rebuild commands are ignored");
    }

    let orchestrator = Orchestrator::new(
        config.orchestrator_config(),
        github,
        git,
        build,
        PermissionResolver::new(config.always_allowed()),
        approvals,
    );
    let app = build_router(AppState::new(
        orchestrator,
        config.webhook_secret.clone().into_bytes(),
    ));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!(addr = %config.listen, user = %config.username, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("serving HTTP")?;
    Ok(())
}
