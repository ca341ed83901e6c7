use clap::Subcommand;
use serde_json::json;

use focus_overlay_core::{Settings, SqliteStore};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Store the Notion API token and database id
    Set {
        /// Notion integration token
        #[arg(long)]
        token: String,
        /// Notion database id
        #[arg(long)]
        database: String,
    },
    /// Show stored settings (token masked)
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SettingsAction::Set { token, database } => {
            let mut store = SqliteStore::open()?;
            match Settings::new(token, database).save(&mut store) {
                Ok(_) => println!("{}", focus_overlay_core::settings::MSG_SAVED),
                Err(e) => return Err(e.status_message().into()),
            }
        }
        SettingsAction::Show { json } => {
            let store = SqliteStore::open()?;
            let settings = Settings::load(&store)?;
            if json {
                let out = json!({
                    "api_token": settings.masked_token(),
                    "database_id": settings.database_id,
                    "configured": settings.is_complete(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("api_token:   {}", settings.masked_token());
                println!("database_id: {}", settings.database_id);
            }
        }
    }
    Ok(())
}
