use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stackflow::prelude::*;
use stackflow::provider::HttpProvisioningClient;

use crate::cli::{Cli, Command, HookCommand, TargetArgs};

/// Where templates go under dry-run when no directory was given.
const DEFAULT_TEMPLATE_DIR: &str = ".serverless";

pub async fn run(cli: Cli, cancel: Arc<CancellationToken>) -> Result<()> {
    let config = ServiceConfig::from_path(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let stacks = resolve(&config.custom.additional_stacks)?;
    let context = config.compile_context(cli.stage.as_deref())?;

    let Some(endpoint) = cli.endpoint.clone().or_else(|| config.provider.endpoint.clone()) else {
        bail!("No provisioning endpoint configured; pass --endpoint or set STACKFLOW_ENDPOINT");
    };
    let mut client = HttpProvisioningClient::new(endpoint)?;
    if let Some(region) = cli.region.clone().or_else(|| config.provider.region.clone()) {
        client = client.with_region(region);
    }
    if let Some(ref token) = cli.token {
        client = client.with_token(token);
    }

    let orchestrator = Orchestrator::builder(Arc::new(client), stacks)
        .context(context)
        .settings(settings(&cli))
        .cancellation(cancel)
        .build();

    match cli.command {
        Command::Deploy(target) => {
            let result = match target_name(&target) {
                Some(name) => orchestrator.deploy_one(name).await?,
                None => orchestrator.deploy_all().await?,
            };
            report(&result);
        }
        Command::Remove(target) => {
            let result = match target_name(&target) {
                Some(name) => orchestrator.remove_one(name).await?,
                None => orchestrator.remove_all().await?,
            };
            report(&result);
        }
        Command::Info => {
            for info in orchestrator.info_all().await? {
                println!("{info}");
            }
        }
        Command::Hook(HookCommand::BeforeDeploy) => report(&orchestrator.before_deploy().await?),
        Command::Hook(HookCommand::AfterDeploy) => report(&orchestrator.after_deploy().await?),
    }
    Ok(())
}

fn settings(cli: &Cli) -> EngineSettings {
    let mut settings = EngineSettings::new()
        .with_poll_interval(Duration::from_secs(cli.poll_interval))
        .with_max_wait(cli.timeout.map(Duration::from_secs))
        .with_dry_run(cli.dry_run)
        .with_skip(cli.skip);

    let template_dir = cli
        .template_dir
        .clone()
        .or_else(|| cli.dry_run.then(|| PathBuf::from(DEFAULT_TEMPLATE_DIR)));
    if let Some(dir) = template_dir {
        settings = settings.with_template_dir(dir);
    }
    settings
}

fn target_name(target: &TargetArgs) -> Option<&str> {
    if target.all {
        None
    } else {
        target.stack.as_deref()
    }
}

fn report(result: &BatchResult) {
    for (name, outcome) in &result.outcomes {
        println!("{name}: {outcome}");
    }
}
