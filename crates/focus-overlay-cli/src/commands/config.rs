use clap::Subcommand;
use focus_overlay_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dotted key (e.g. "overlay.cooldown_secs")
    Get { key: String },
    /// Change one value and save; lists take JSON or "a.com, b.com"
    Set { key: String, value: String },
    /// Print the whole configuration
    List {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// Restore the default blocklist and timings
    Reset,
    /// Print where the configuration file lives
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            // Stored form, e.g. trimmed list items.
            let stored = config.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
            if key == "blocklist" {
                println!("{} host(s) blocked", config.blocklist().len());
            }
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("blocklist reset to: {}", config.blocklist.join(", "));
            println!(
                "unlock durations: {} min; cooldown {}s",
                config
                    .overlay
                    .durations_min
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                config.overlay.cooldown_secs
            );
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}
