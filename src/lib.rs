pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{fixture_store::FixtureStore, http_store::HttpDocumentStore};
pub use app::render::{render, OutputFormat};
pub use config::toml_config::{StoreConfig, TomlConfig};
pub use core::{
    facade::LookupFacade,
    sampler::VisitSampler,
    screen::{LookupScreen, ScreenState, ScreenView},
};
pub use utils::error::{LookupError, Result};
