pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::toml_config::{StoreConfig, TomlConfig};
    use crate::app::render::OutputFormat;
    use crate::utils::error::{LookupError, Result};
    use crate::utils::validation::{self, Validate};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "soldier-lookup")]
    #[command(about = "Look up a soldier with status, postings, visited places and birth location")]
    pub struct CliConfig {
        /// Service number to look up
        pub identifier: Option<String>,

        /// Look up by store document handle instead of service number
        #[arg(long, conflicts_with = "identifier")]
        pub handle: Option<String>,

        /// Path to TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        /// Record store base URL (overrides the config file)
        #[arg(long)]
        pub base_url: Option<String>,

        /// Answer lookups from a JSON fixture file instead of the store
        #[arg(long, conflicts_with = "base_url")]
        pub fixture: Option<String>,

        /// Seed for picking which visited places are shown
        #[arg(long)]
        pub seed: Option<u64>,

        #[arg(long, value_enum, default_value = "text")]
        pub format: OutputFormat,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,
    }

    impl CliConfig {
        pub fn load_toml(&self) -> Result<Option<TomlConfig>> {
            self.config
                .as_deref()
                .map(TomlConfig::from_file)
                .transpose()
        }

        /// Store settings with command-line flags layered over the file.
        pub fn store_config(&self, file: Option<&TomlConfig>) -> Result<StoreConfig> {
            let mut store = file.and_then(|f| f.store.clone());
            if let Some(base_url) = &self.base_url {
                store
                    .get_or_insert_with(|| StoreConfig::new(base_url.clone()))
                    .base_url = base_url.clone();
            }

            let store = validation::validate_required_field("store.base_url", &store)?;
            store.validate()?;
            Ok(store.clone())
        }

        pub fn seed(&self, file: Option<&TomlConfig>) -> Option<u64> {
            self.seed.or_else(|| file.and_then(|f| f.lookup.seed))
        }

        pub fn json_logs(&self, file: Option<&TomlConfig>) -> bool {
            self.json_logs || file.is_some_and(TomlConfig::json_logs)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if self.identifier.is_none() && self.handle.is_none() {
                return Err(LookupError::MissingConfigError {
                    field: "identifier or --handle".to_string(),
                });
            }

            if let Some(path) = &self.fixture {
                validation::validate_path("fixture", path)?;
            }

            if let Some(base_url) = &self.base_url {
                validation::validate_url("base_url", base_url)?;
            }

            Ok(())
        }
    }

}
