//! bgmcli — Bangumi collection manager
//!
//! Command-line client for the Bangumi API:
//! 1. Loads TOML config (app credentials, endpoints, credential file path)
//! 2. Builds the token lifecycle guard around the credential file
//! 3. Dispatches one subcommand, authorizing or refreshing as needed
//! 4. Prints API responses as pretty JSON on stdout

mod config;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bangumi_api::{
    CollectionClient, CollectionStatus, Privacy, ResponseGroup, SubjectType, SubjectUpdate,
    UserClient, WatchingCategory,
};
use bangumi_auth::{
    AuthorizationFlow, CredentialProvider, CredentialStore, RefreshFlow, StdinPrompt, TokenGuard,
    token_status, unix_now,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const USAGE: &str = "\
bgmcli — Bangumi collection manager

Usage: bgmcli [--config <path>] <command>

Commands:
  auth login                        run the interactive authorization flow
  auth refresh [--force]            refresh the access token (--force even if fresh)
  auth status                       show local and provider-side token status
  collection get <subject_id>       show your collection entry for a subject
  collection update <subject_id> --status <wish|collect|do|on_hold|dropped>
        [--comment <text>] [--tags <t1,t2>] [--rating <1-10>] [--private]
  user info <name>                  public profile info
  user collection <name> [--all-watching] [--small] [--ids <id1,id2>]
  user list <name> <book|anime|music|game|real> [--max <n>]
  user status <name>                collection summary counts
  user progress <name> [--subject <id>]  episode watching progress

Config file resolution: --config, then BGMCLI_CONFIG, then ./bgmcli.toml
Client secret: BGM_CLIENT_SECRET env var, or app.client_secret_file
";

#[tokio::main]
async fn main() -> Result<()> {
    // LOG_LEVEL / RUST_LOG control verbosity; logs go to stderr so stdout
    // stays clean JSON for piping.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args: Vec<&str> = args.iter().map(String::as_str).collect();

    // Global --config flag, anywhere on the line
    let cli_config_path = take_flag_value(&mut args, "--config");
    let config_path = Config::resolve_path(cli_config_path.as_deref());

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    info!(path = %config_path.display(), "configuration loaded");

    let oauth = config.oauth()?;
    let store = CredentialStore::new(config.user.credentials_file.clone());
    let client = reqwest::Client::new();
    let guard = Arc::new(TokenGuard::new(
        oauth,
        store,
        client.clone(),
        Box::new(StdinPrompt),
    ));
    let provider: Arc<dyn CredentialProvider> = guard.clone();

    match args.as_slice() {
        ["auth", "login"] => {
            let tokens = AuthorizationFlow::new(
                guard.config(),
                guard.store(),
                &client,
                &StdinPrompt,
            )
            .run()
            .await?;
            println!("Authorized. Access token expires at unix {}.", tokens.expires);
        }
        ["auth", "refresh", rest @ ..] => {
            let force = match rest {
                [] => false,
                ["--force"] => true,
                _ => bail!("unexpected arguments after 'auth refresh'\n\n{USAGE}"),
            };
            let tokens = RefreshFlow::new(guard.config(), guard.store(), &client)
                .refresh(force)
                .await?;
            println!("Access token expires at unix {}.", tokens.expires);
        }
        ["auth", "status"] => {
            let tokens = guard.store().load().await?;
            let now = unix_now();
            println!(
                "Local credential: {} (expires at unix {}, now {})",
                if tokens.is_fresh(now) { "fresh" } else { "expired" },
                tokens.expires,
                now,
            );
            if let Some(status_uri) = &guard.config().token_status_uri {
                let status = token_status(&client, status_uri, &tokens.access_token).await?;
                print_json(&status)?;
            }
        }
        ["collection", "get", subject_id] => {
            let subject_id = parse_subject_id(subject_id)?;
            let collection = CollectionClient::new(&config.uri.base, client.clone(), provider);
            print_json(&collection.get_subject(subject_id).await?)?;
        }
        ["collection", "update", subject_id, rest @ ..] => {
            let subject_id = parse_subject_id(subject_id)?;
            let mut rest = rest.to_vec();
            let update = parse_subject_update(&mut rest)?;
            if !rest.is_empty() {
                bail!("unexpected arguments: {}\n\n{USAGE}", rest.join(" "));
            }
            let collection = CollectionClient::new(&config.uri.base, client.clone(), provider);
            print_json(&collection.update_subject(subject_id, &update).await?)?;
        }
        ["user", rest @ ..] => {
            let user = UserClient::new(
                &config.uri.base,
                &config.app.client_id,
                client.clone(),
                provider,
            );
            run_user_command(&user, rest).await?;
        }
        [] | ["help"] | ["--help"] => {
            print!("{USAGE}");
        }
        other => {
            bail!("unknown command: {}\n\n{USAGE}", other.join(" "));
        }
    }

    Ok(())
}

async fn run_user_command(user: &UserClient, args: &[&str]) -> Result<()> {
    match args {
        ["info", name] => print_json(&user.info(name).await?),
        ["collection", name, rest @ ..] => {
            let mut rest = rest.to_vec();
            let category = if take_flag(&mut rest, "--all-watching") {
                WatchingCategory::AllWatching
            } else {
                WatchingCategory::Watching
            };
            let group = if take_flag(&mut rest, "--small") {
                ResponseGroup::Small
            } else {
                ResponseGroup::Medium
            };
            let ids = match take_flag_value(&mut rest, "--ids") {
                Some(list) => parse_id_list(&list)?,
                None => Vec::new(),
            };
            if !rest.is_empty() {
                bail!("unexpected arguments: {}\n\n{USAGE}", rest.join(" "));
            }
            print_json(&user.collection(name, category, &ids, group).await?)
        }
        ["list", name, subject_type, rest @ ..] => {
            let subject_type = parse_subject_type(subject_type)?;
            let mut rest = rest.to_vec();
            let max_results = match take_flag_value(&mut rest, "--max") {
                Some(n) => n
                    .parse()
                    .with_context(|| format!("invalid --max value: {n}"))?,
                None => 10,
            };
            if !rest.is_empty() {
                bail!("unexpected arguments: {}\n\n{USAGE}", rest.join(" "));
            }
            print_json(&user.collections_by_type(name, subject_type, max_results).await?)
        }
        ["status", name] => print_json(&user.collection_status(name).await?),
        ["progress", name, rest @ ..] => {
            let mut rest = rest.to_vec();
            let subject_id = match take_flag_value(&mut rest, "--subject") {
                Some(id) => Some(parse_subject_id(&id)?),
                None => None,
            };
            if !rest.is_empty() {
                bail!("unexpected arguments: {}\n\n{USAGE}", rest.join(" "));
            }
            print_json(&user.progress(name, subject_id).await?)
        }
        other => bail!("unknown user command: {}\n\n{USAGE}", other.join(" ")),
    }
}

/// Remove `flag` followed by its value from `args`, returning the value.
fn take_flag_value(args: &mut Vec<&str>, flag: &str) -> Option<String> {
    let i = args.iter().position(|a| *a == flag)?;
    if i + 1 >= args.len() {
        return None;
    }
    let value = args[i + 1].to_owned();
    args.drain(i..=i + 1);
    Some(value)
}

/// Remove a bare `flag` from `args`, returning whether it was present.
fn take_flag(args: &mut Vec<&str>, flag: &str) -> bool {
    match args.iter().position(|a| *a == flag) {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    }
}

fn parse_subject_id(raw: &str) -> Result<u64> {
    raw.parse()
        .with_context(|| format!("invalid subject id: {raw}"))
}

fn parse_id_list(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(|id| {
            id.trim()
                .parse()
                .with_context(|| format!("invalid subject id: {id}"))
        })
        .collect()
}

fn parse_subject_type(raw: &str) -> Result<SubjectType> {
    Ok(match raw {
        "book" => SubjectType::Book,
        "anime" => SubjectType::Anime,
        "music" => SubjectType::Music,
        "game" => SubjectType::Game,
        "real" => SubjectType::Real,
        other => bail!("invalid subject type: {other} (book|anime|music|game|real)"),
    })
}

fn parse_collection_status(raw: &str) -> Result<CollectionStatus> {
    Ok(match raw {
        "wish" => CollectionStatus::Wish,
        "collect" => CollectionStatus::Collect,
        "do" => CollectionStatus::Do,
        "on_hold" => CollectionStatus::OnHold,
        "dropped" => CollectionStatus::Dropped,
        other => bail!("invalid status: {other} (wish|collect|do|on_hold|dropped)"),
    })
}

fn parse_subject_update(args: &mut Vec<&str>) -> Result<SubjectUpdate> {
    let status = match take_flag_value(args, "--status") {
        Some(s) => parse_collection_status(&s)?,
        None => bail!("collection update requires --status\n\n{USAGE}"),
    };
    let mut update = SubjectUpdate::new(status);
    update.comment = take_flag_value(args, "--comment");
    if let Some(tags) = take_flag_value(args, "--tags") {
        update.tags = tags.split(',').map(|t| t.trim().to_owned()).collect();
    }
    if let Some(raw) = take_flag_value(args, "--rating") {
        let rating: u8 = raw
            .parse()
            .with_context(|| format!("invalid --rating value: {raw}"))?;
        if !(1..=10).contains(&rating) {
            bail!("--rating must be between 1 and 10");
        }
        update.rating = Some(rating);
    }
    if take_flag(args, "--private") {
        update.privacy = Privacy::Private;
    }
    Ok(update)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
