use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use client_core::EditorClient;
use shared::domain::{PresentationId, SlideId};
use storage::CredentialStore;
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server_url: String,
    /// Value of the `deck_session` cookie to act as.
    #[arg(long, env = "DECK_SESSION")]
    session: Option<String>,
    #[arg(long, default_value = "sqlite://./data/sessions.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the projected document as JSON.
    Slides { presentation_id: String },
    /// Set a background colour on one slide, or every slide when `--slide` is omitted.
    Background {
        presentation_id: String,
        color: String,
        #[arg(long)]
        slide: Option<String>,
    },
    Templates,
    PurgeSessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let client = || {
        let client = EditorClient::new(cli.server_url.clone());
        match &cli.session {
            Some(session) => client.with_session(session.clone()),
            None => client,
        }
    };

    match &cli.command {
        Command::Slides { presentation_id } => {
            let document = client()
                .load_document(&PresentationId::from(presentation_id.as_str()))
                .await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Command::Background {
            presentation_id,
            color,
            slide,
        } => {
            let response = client()
                .update_background(
                    &PresentationId::from(presentation_id.as_str()),
                    slide.as_deref().map(SlideId::from),
                    color,
                )
                .await?;
            println!("{}", response.message);
        }
        Command::Templates => {
            for template in client().list_templates().await? {
                println!("{}\t{}", template.id, template.name);
            }
        }
        Command::PurgeSessions => {
            let store = CredentialStore::new(&cli.database_url).await?;
            let purged = store.purge_expired(Utc::now()).await?;
            info!(purged, "expired sessions removed");
            println!("purged {purged} session(s)");
        }
    }

    Ok(())
}
