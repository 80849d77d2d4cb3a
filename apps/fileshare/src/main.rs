mod config;
mod views;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    files_controller, sign_up, users_controller, FileDetailController, FileShareApi,
    HttpFileShareClient, StatusPolicy,
};
use shared::domain::{FileRoute, UserId};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, validate_server_url, Settings};

#[derive(Parser, Debug)]
#[command(name = "fileshare", about = "Terminal client for the fileshare backend")]
struct Cli {
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    page_size: Option<u32>,
    #[arg(long, global = true)]
    status_policy: Option<StatusPolicy>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a user and print its id.
    SignUp {
        #[arg(long)]
        name: String,
    },
    /// Page through the files a user can see.
    Files {
        #[arg(long)]
        user_id: String,
    },
    /// Scroll through every registered user.
    Users,
    /// Show one file, or create one on the `:new` route.
    File {
        #[arg(long)]
        user_id: String,
        route: String,
        #[arg(long)]
        create: Option<String>,
    },
}

impl Cli {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(url) = &self.server_url {
            settings.server_url = url.clone();
        }
        if let Some(size) = self.page_size.filter(|size| *size > 0) {
            settings.files_page_size = size;
        }
        if let Some(policy) = self.status_policy {
            settings.status_policy = policy;
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout_secs = (secs > 0).then_some(secs);
        }
    }
}

fn connect(settings: &Settings) -> Result<Arc<dyn FileShareApi>> {
    let server_url = validate_server_url(&settings.server_url)?;
    info!(%server_url, policy = %settings.status_policy, "using backend");
    let client = match settings.request_timeout_secs {
        Some(secs) => HttpFileShareClient::with_timeout(
            server_url,
            settings.status_policy,
            Duration::from_secs(secs),
        )?,
        None => HttpFileShareClient::new(server_url, settings.status_policy),
    };
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    cli.apply_overrides(&mut settings);
    let api = connect(&settings)?;

    match cli.command {
        Command::SignUp { name } => {
            let user = sign_up(api.as_ref(), &name).await?;
            println!("signed up {} with user_id={}", user.name, user.id);
        }
        Command::Files { user_id } => {
            let files = files_controller(api, UserId::new(user_id), settings.files_page_size);
            views::browse_files(files).await?;
        }
        Command::Users => {
            views::browse_users(users_controller(api, settings.scroll_epsilon)).await?;
        }
        Command::File {
            user_id,
            route,
            create,
        } => {
            let detail =
                FileDetailController::new(api, UserId::new(user_id), FileRoute::parse(&route));
            views::show_file(&detail, create.as_deref()).await?;
        }
    }

    Ok(())
}
