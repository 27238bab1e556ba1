use clap::Subcommand;
use restbell_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a value by dot-separated key (e.g. timer.auto_start_rest_after_set)
    Get { key: String },
    /// Set a value by dot-separated key
    Set { key: String, value: String },
    /// Print the whole configuration
    Show,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {value}");
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
