//! The web-client commands: thin wrappers over `ApiClient` with a stored bearer token.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use propel_engine::{ApiClient, ApiError, PropelConfig, TokenStore};
use propel_logging::propel_info;

use super::cli::Command;
use super::render::{render_generated, render_history};

pub fn run(config: &PropelConfig, command: Command) -> Result<()> {
    let store = TokenStore::new(config.token_path.clone());
    if let Command::Logout = command {
        if store.clear()? {
            println!("Logged out.");
        } else {
            println!("Not logged in.");
        }
        return Ok(());
    }

    let client = ApiClient::new(config.clone(), Arc::new(store.clone()))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start runtime")?;
    runtime
        .block_on(execute(&client, &store, command))
        .map_err(|err| match err.downcast::<ApiError>() {
            Ok(api) => explain(api),
            Err(other) => other,
        })
}

async fn execute(client: &ApiClient, store: &TokenStore, command: Command) -> Result<()> {
    let mut out = io::stdout();
    match command {
        Command::Login { email, password } => {
            let login = client.login(&email, &password).await?;
            store.save(&login.access_token)?;
            propel_info!("token stored at {:?}", store.path());
            println!("Logged in as {email}.");
        }
        Command::Greeting => {
            let greeting = client.greeting().await?;
            println!("{}", greeting.message);
        }
        Command::Generate { prompt, tone } => {
            let generated = client.generate_idea(&prompt, tone.as_deref()).await?;
            render_generated(&mut out, &generated)?;
        }
        Command::History => {
            let entries = client.history().await?;
            render_history(&mut out, &entries)?;
        }
        Command::Star { id } => {
            let toggled = client.toggle_star(id).await?;
            let state = if toggled.is_starred { "starred" } else { "unstarred" };
            println!("Idea #{id} {state}.");
        }
        Command::Delete { id } => {
            let deleted = client.delete_idea(id).await?;
            println!(
                "{}",
                deleted
                    .message
                    .unwrap_or_else(|| format!("Idea #{id} deleted."))
            );
        }
        Command::Ideas { .. } | Command::Logout => {}
    }
    out.flush()?;
    Ok(())
}

/// Unauthorized responses get a login hint; everything else shows the server's detail.
fn explain(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::Unauthorized { detail } => {
            anyhow::anyhow!("{detail}. Run `propel login --email <EMAIL>` and try again.")
        }
        other => anyhow::anyhow!(other.detail()),
    }
}

