//! CLI runner - executes commands

use crate::auth::DEFAULT_ID_URL;
use crate::catalog::Catalog;
use crate::cli::commands::{Cli, Mode};
use crate::config::TapConfig;
use crate::discover::discover;
use crate::engine::{Orchestrator, SyncStats};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::output::{JsonLinesSink, SharedSink};
use crate::state::StateManager;
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
    id_url: String,
    token_url: Option<String>,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            id_url: DEFAULT_ID_URL.to_string(),
            token_url: None,
        }
    }

    /// Use a different id endpoint for base URL lookup
    #[must_use]
    pub fn with_id_url(mut self, id_url: impl Into<String>) -> Self {
        self.id_url = id_url.into();
        self
    }

    /// Use a different OAuth2 token endpoint
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = Some(token_url.into());
        self
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = TapConfig::from_file(&self.cli.config)?;
        match self.cli.mode() {
            Mode::Discover => {
                let catalog = self.discover(&config).await?;
                let json = serde_json::to_string_pretty(&catalog)?;
                println!("{json}");
                Ok(())
            }
            Mode::Sync => {
                let sink: SharedSink = Arc::new(JsonLinesSink::stdout());
                self.sync(&config, sink).await.map(|_| ())
            }
        }
    }

    /// Build an authenticated client, looking up the base URL if needed
    pub async fn build_client(&self, config: &TapConfig) -> Result<HttpClient> {
        let mut auth = config.auth_config();
        if let Some(ref url) = self.token_url {
            auth = auth.with_token_url(url);
        }
        let mut client = HttpClient::with_auth(config.http_config(), auth)?;
        if config.base_url.is_none() {
            let base_url = match client.authenticator() {
                Some(auth) => auth.discover_base_url(&self.id_url).await?,
                None => return Err(Error::auth("no authenticator configured")),
            };
            client.set_base_url(base_url);
        }
        Ok(client)
    }

    /// Discover the catalog
    pub async fn discover(&self, config: &TapConfig) -> Result<Catalog> {
        let client = self.build_client(config).await?;
        discover(&client).await.context("Catalog discovery failed")
    }

    /// Sync the selected streams into `sink`
    pub async fn sync(&self, config: &TapConfig, sink: SharedSink) -> Result<SyncStats> {
        let catalog_path = self
            .cli
            .catalog
            .as_ref()
            .ok_or_else(|| Error::config("either --discover or --catalog is required"))?;
        let catalog = Catalog::from_file(catalog_path)?;

        let mut state = match self.cli.state {
            Some(ref path) => StateManager::from_file(path)?,
            None => StateManager::in_memory(),
        };
        if let Some(ref path) = self.cli.state_output {
            state = state.persist_to(path);
        }

        let client = self.build_client(config).await?;
        let mut orchestrator =
            Orchestrator::new(Arc::new(client), state, sink, config.sync_config()?);
        let stats = orchestrator.run(&catalog).await?;

        info!(
            "Synced {} records from {} streams",
            stats.records_synced, stats.streams_synced
        );
        Ok(stats)
    }
}
