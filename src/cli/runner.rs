//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::AppConfig;
use crate::details::DetailsService;
use crate::error::Result;
use crate::http::HttpClient;
use crate::local::{DuckDbStore, LocalDataSource, MemoryStore, PokemonAndDetail, PokemonEntity};
use crate::paging::{
    LoadOutcome, LoadType, Page, Pager, PagingSnapshot, PokemonRemoteMediator,
};
use crate::remote::{PokeApiDataSource, RemoteDataSource};
use crate::types::StorageBackend;
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        let app = App::from_config(config)?;

        match &self.cli.command {
            Commands::Sync { pages, resume } => {
                let report = app.sync(*pages, *resume).await?;
                self.output(&report);
                Ok(())
            }
            Commands::List { offset, limit } => {
                let limit = limit.unwrap_or(app.config.paging.page_size);
                let rows = app.local.pokemons(*offset, limit).await?;
                self.output_rows(&rows);
                Ok(())
            }
            Commands::Show { name } => {
                let record = app.details().pokemon_and_detail(name).await?;
                match self.cli.format {
                    OutputFormat::Json => self.output(&record),
                    OutputFormat::Pretty => print!("{}", render_details(&record)),
                }
                Ok(())
            }
            Commands::Clear => {
                app.local.clear_all().await?;
                self.output(&json!({ "type": "CLEARED" }));
                Ok(())
            }
            Commands::Serve { port } => crate::cli::serve(app, *port).await,
        }
    }

    /// Config file (if any) with command-line overrides applied
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.cli.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(path) = &self.cli.database {
            config.storage.path = path.clone();
        }
        if let Some(backend) = self.cli.storage {
            config.storage.backend = backend;
        }
        if let Some(url) = &self.cli.base_url {
            config.api.base_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// Output a message
    fn output(&self, msg: &impl Serialize) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }

    fn output_rows(&self, rows: &[PokemonEntity]) {
        match self.cli.format {
            OutputFormat::Json => rows.iter().for_each(|row| self.output(row)),
            OutputFormat::Pretty => {
                for row in rows {
                    println!("{:>6}  {}", row.id_formatted(), row.display_name());
                }
            }
        }
    }
}

/// Summary of a `sync` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Mediator loads that ran
    pub loads: usize,
    /// Rows in the cache afterwards
    pub cached: usize,
    pub end_of_pagination_reached: bool,
    pub elapsed_ms: u128,
}

/// Data sources wired up from configuration
#[derive(Clone)]
pub struct App {
    pub config: AppConfig,
    pub remote: Arc<dyn RemoteDataSource>,
    pub local: Arc<dyn LocalDataSource>,
}

impl App {
    /// Build the PokeAPI client and the configured cache
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let client = HttpClient::with_config(config.http_client_config())?;
        let remote: Arc<dyn RemoteDataSource> = Arc::new(PokeApiDataSource::new(client));
        let local: Arc<dyn LocalDataSource> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Duckdb => {
                let store = DuckDbStore::open(&config.storage.path)?;
                info!(location = store.location(), "opened cache");
                Arc::new(store)
            }
        };
        info!(
            base_url = %config.api.base_url,
            backend = ?config.storage.backend,
            "data sources ready"
        );
        Ok(Self::with_sources(config, remote, local))
    }

    pub fn with_sources(
        config: AppConfig,
        remote: Arc<dyn RemoteDataSource>,
        local: Arc<dyn LocalDataSource>,
    ) -> Self {
        Self {
            config,
            remote,
            local,
        }
    }

    pub fn mediator(&self) -> PokemonRemoteMediator {
        PokemonRemoteMediator::with_config(
            self.remote.clone(),
            self.local.clone(),
            self.config.mediator_config(),
        )
    }

    pub fn pager(&self) -> Pager {
        Pager::new(
            self.mediator(),
            self.local.clone(),
            self.config.paging.page_size,
        )
    }

    pub fn details(&self) -> DetailsService {
        DetailsService::new(self.remote.clone(), self.local.clone())
            .with_language(self.config.paging.language.clone())
    }

    /// Run up to `pages` mediator loads: a refresh followed by appends, or
    /// appends only when resuming. Stops early at the end of the list.
    pub async fn sync(&self, pages: usize, resume: bool) -> Result<SyncReport> {
        let started = Instant::now();
        let mediator = self.mediator();
        let mut loads = 0;
        let mut end_of_pagination_reached = false;

        for index in 0..pages {
            let load_type = if index == 0 && !resume {
                LoadType::Refresh
            } else {
                LoadType::Append
            };
            let snapshot = self.cached_tail().await?;
            loads += 1;
            match mediator.load(load_type, &snapshot).await {
                LoadOutcome::Success {
                    end_of_pagination_reached: end,
                } => {
                    end_of_pagination_reached = end;
                    if end {
                        break;
                    }
                }
                LoadOutcome::Failure { cause } => return Err(cause),
            }
        }

        Ok(SyncReport {
            loads,
            cached: self.local.count().await?,
            end_of_pagination_reached,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }

    /// Snapshot holding only the last cached row
    async fn cached_tail(&self) -> Result<PagingSnapshot<PokemonEntity>> {
        let count = self.local.count().await?;
        let Some(last) = count.checked_sub(1) else {
            return Ok(PagingSnapshot::empty(self.config.paging.page_size));
        };
        let tail = self.local.pokemons(last, 1).await?;
        Ok(PagingSnapshot::new(
            vec![Page::new(tail, last)],
            Some(last),
            self.config.paging.page_size,
        ))
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Human-readable details view
pub fn render_details(record: &PokemonAndDetail) -> String {
    let mut out = String::new();
    let pokemon = &record.pokemon;
    let detail = &record.detail;

    let _ = writeln!(out, "{} {}", pokemon.id_formatted(), pokemon.display_name());
    let _ = writeln!(out, "  types:  {}", detail.types.join(", "));
    let _ = writeln!(
        out,
        "  height: {:.1} m   weight: {:.1} kg",
        f64::from(detail.height) / 10.0,
        f64::from(detail.weight) / 10.0
    );
    for stat in &detail.stats {
        let _ = writeln!(out, "  {:<16}{:>4}", stat.name, stat.base_stat);
    }
    if let Some(text) = record.species.as_ref().and_then(|s| s.flavor_text.as_deref()) {
        let _ = writeln!(out, "  {text}");
    }
    if let Some(chain) = &record.evolution_chain {
        let steps: Vec<String> = chain
            .steps
            .iter()
            .map(|step| match step.min_level {
                Some(level) => format!("{} (lv {level})", step.display_name()),
                None => step.display_name(),
            })
            .collect();
        let _ = writeln!(out, "  evolution: {}", steps.join(" -> "));
    }
    out
}
