use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use code_model::{
    CloneProgress, CloneProgressPatch, CloneWorkerProgress, IndexProgressPatch, IndexWorkerProgress,
    ProgressPatch, Repository, RepositoryConfig, RepositoryConfigPatch, RepositoryPatch,
    RepositoryUri, WorkerProgress,
};
use code_repo::{ClientConfig, RepoResult, RepositoryObjectClient, ReservedField};
use code_store::InMemoryDocumentStore;
use colored::Colorize;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    let store = Arc::new(open_store(&cli.store)?);
    let client = RepositoryObjectClient::with_config(store.clone(), config)?;
    let json = matches!(cli.format, OutputFormat::Json);

    let mutated = match cli.command {
        Command::Repo(args) => cmd_repo(&client, args.action, json).await?,
        Command::Status(args) => cmd_status(&client, &args.uri, json).await?,
        Command::Progress(args) => cmd_progress(&client, args).await?,
    };

    if mutated {
        store
            .save_snapshot(&cli.store)
            .with_context(|| format!("saving store to {}", cli.store.display()))?;
    }
    Ok(())
}

fn open_store(path: &Path) -> anyhow::Result<InMemoryDocumentStore> {
    if path.exists() {
        InMemoryDocumentStore::load_snapshot(path)
            .with_context(|| format!("loading store from {}", path.display()))
    } else {
        debug!(path = %path.display(), "no store snapshot yet, starting empty");
        Ok(InMemoryDocumentStore::new())
    }
}

fn parse_uri(raw: &str) -> anyhow::Result<RepositoryUri> {
    Ok(RepositoryUri::new(raw)?)
}

/// Run `op`; a not-found error becomes `Ok(None)`.
async fn optional<T>(
    op: impl std::future::Future<Output = RepoResult<T>>,
) -> RepoResult<Option<T>> {
    match op.await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

async fn cmd_repo(
    client: &RepositoryObjectClient,
    action: RepoAction,
    json: bool,
) -> anyhow::Result<bool> {
    match action {
        RepoAction::Add { url } => {
            let repo = Repository::from_url(&url)?;
            client.set_repository(&repo.uri, &repo).await?;
            let started = WorkerProgress::new(repo.uri.clone(), 0.0, Utc::now())?;
            let status = CloneWorkerProgress::new(started);
            client.set_repository_git_status(&repo.uri, &status).await?;
            println!("{} Registered {}", "✓".green().bold(), repo.uri.to_string().bold());
            println!("  Index: {}", client.layout().index_name(&repo.uri).cyan());
            Ok(true)
        }
        RepoAction::Show { uri } => {
            let repo = client.get_repository(&parse_uri(&uri)?).await?;
            print_repository(&repo, json)?;
            Ok(false)
        }
        RepoAction::List => {
            let repos = client.get_all_repositories().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&repos)?);
            } else if repos.is_empty() {
                println!("No repositories registered.");
            } else {
                for repo in &repos {
                    println!("{}  {}", repo.uri.to_string().yellow(), repo.url.dimmed());
                }
            }
            Ok(false)
        }
        RepoAction::Remove { uri } => {
            let uri = parse_uri(&uri)?;
            let started =
                CloneWorkerProgress::new(WorkerProgress::new(uri.clone(), 0.0, Utc::now())?);
            client.set_repository_delete_status(&uri, &started).await?;
            client.delete_repository(&uri).await?;
            let done = ProgressPatch::progress(100.0).with_timestamp(Utc::now());
            client
                .update_repository_delete_status(&uri, &CloneProgressPatch::from(done))
                .await?;
            println!("{} Removed {}", "✓".green().bold(), uri.to_string().bold());
            Ok(true)
        }
        RepoAction::SetUrl { uri, url } => {
            let uri = parse_uri(&uri)?;
            client.update_repository(&uri, &RepositoryPatch::url(&url)).await?;
            println!("Updated {} → {}", uri.to_string().bold(), url.blue());
            Ok(true)
        }
        RepoAction::Lsp { uri, language, enable } => {
            let uri = parse_uri(&uri)?;
            let patch = RepositoryConfigPatch::disable(language.into(), !enable);
            match optional(client.get_repository_config(&uri)).await? {
                Some(_) => client.update_repository_config(&uri, &patch).await?,
                None => {
                    let mut config = RepositoryConfig::new(uri.clone());
                    config.disable_go = patch.disable_go;
                    config.disable_java = patch.disable_java;
                    config.disable_typescript = patch.disable_typescript;
                    client.set_repository_config(&uri, &config).await?;
                }
            }
            let state = if enable { "enabled".green() } else { "disabled".red() };
            println!("{language:?} language server {state} for {}", uri.to_string().bold());
            Ok(true)
        }
    }
}

fn print_repository(repo: &Repository, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(repo)?);
        return Ok(());
    }
    println!("{}", repo.uri.to_string().yellow().bold());
    println!("  URL: {}", repo.url.blue());
    println!("  Org: {}", repo.org);
    println!("  Name: {}", repo.name);
    if let Some(branch) = &repo.default_branch {
        println!("  Default branch: {}", branch.green());
    }
    if let Some(revision) = &repo.revision {
        println!("  Revision: {}", revision.dimmed());
    }
    Ok(())
}

async fn cmd_status(
    client: &RepositoryObjectClient,
    uri: &str,
    json: bool,
) -> anyhow::Result<bool> {
    let uri = parse_uri(uri)?;
    let found = collect_status(client, &uri).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(false);
    }

    println!("Status of {}", uri.to_string().yellow().bold());
    if found.is_empty() {
        println!("  No worker status recorded.");
    }
    for (field, value) in &found {
        let progress: WorkerProgress = serde_json::from_value(value.clone())?;
        let label = match progress.state() {
            Ok(state) if state.is_terminal() && progress.error_message.is_none() => {
                format!("{:>6.1}%", progress.progress).green()
            }
            Ok(_) if progress.error_message.is_none() => {
                format!("{:>6.1}%", progress.progress).yellow()
            }
            _ => format!("{:>6.1}", progress.progress).red(),
        };
        println!("  {field:<28} {label}  {}", progress.timestamp.to_rfc3339().dimmed());
        let clone: Option<CloneProgress> = value
            .get("cloneProgress")
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?;
        if let Some(clone) = clone {
            println!(
                "    cloned: {:.1}% ({}/{} objects)",
                clone.percentage(),
                clone.received_objects,
                clone.total_objects
            );
        }
        if let Some(message) = &progress.error_message {
            println!("    error: {}", message.red());
        }
    }
    Ok(false)
}

/// Every worker status recorded for `uri`, keyed by its reserved field.
async fn collect_status(
    client: &RepositoryObjectClient,
    uri: &RepositoryUri,
) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    let mut found = serde_json::Map::new();
    for field in ReservedField::STATUSES {
        let value = match field {
            ReservedField::GitStatus => {
                to_json(optional(client.get_repository_git_status(uri))).await?
            }
            ReservedField::LspIndexStatus => {
                to_json(optional(client.get_repository_lsp_index_status(uri))).await?
            }
            ReservedField::DeleteStatus => {
                to_json(optional(client.get_repository_delete_status(uri))).await?
            }
            ReservedField::IndexStatus => {
                to_json(optional(client.get_repository_index_status(uri))).await?
            }
            _ => None,
        };
        if let Some(value) = value {
            found.insert(field.as_str().to_string(), value);
        }
    }
    Ok(found)
}

async fn to_json<T: serde::Serialize>(
    op: impl std::future::Future<Output = RepoResult<Option<T>>>,
) -> anyhow::Result<Option<serde_json::Value>> {
    Ok(op.await?.map(|v| serde_json::to_value(&v)).transpose()?)
}

async fn cmd_progress(
    client: &RepositoryObjectClient,
    args: ProgressArgs,
) -> anyhow::Result<bool> {
    let uri = parse_uri(&args.uri)?;
    let now = Utc::now();

    let mut patch = ProgressPatch::progress(args.value).with_timestamp(now);
    patch.error_message = args.error.clone();
    patch.revision = args.revision.clone();
    patch.validate()?;

    let mut fresh = WorkerProgress::new(uri.clone(), args.value, now)?;
    fresh.error_message = args.error;
    fresh.revision = args.revision;

    let field = args.worker.field();
    let updated = match args.worker {
        WorkerKind::Git | WorkerKind::Delete => {
            let patch = CloneProgressPatch::from(patch);
            upsert(
                client.update_object(&uri, field, &patch),
                client.set_object(&uri, field, &CloneWorkerProgress::new(fresh)),
            )
            .await?
        }
        WorkerKind::Lsp => {
            upsert(
                client.update_object(&uri, field, &patch),
                client.set_object(&uri, field, &fresh),
            )
            .await?
        }
        WorkerKind::Index => {
            let patch = IndexProgressPatch::from(patch);
            upsert(
                client.update_object(&uri, field, &patch),
                client.set_object(&uri, field, &IndexWorkerProgress::new(fresh)),
            )
            .await?
        }
    };

    let verb = if updated { "Updated" } else { "Recorded" };
    println!(
        "{} {verb} {} = {}",
        "✓".green().bold(),
        field.as_str().cyan(),
        args.value
    );
    Ok(true)
}

/// Merge into the existing record, or create it if there is none yet.
/// Returns `true` if an existing record was updated.
async fn upsert(
    update: impl std::future::Future<Output = RepoResult<()>>,
    create: impl std::future::Future<Output = RepoResult<()>>,
) -> RepoResult<bool> {
    match update.await {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => {
            create.await?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
