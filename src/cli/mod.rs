//! Command-line interface
//!
//! Each subcommand opens the SQLite clip store lazily and drives it through
//! the same [`Library`] and [`ClipStore`] the host integrations use.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::capture::resolve_favicon;
use crate::clip::{now_millis, ClipId, ClipRecord};
use crate::clipboard::SystemClipboard;
use crate::config::Config;
use crate::library::{ClearOutcome, Library, LogFeedback};
use crate::store::{ClipStore, SqliteStorage, UpsertOutcome};
use crate::Error;

/// Shortest id prefix accepted on the command line
const MIN_ID_PREFIX: usize = 4;

/// Characters of clip text shown per line in listings
const PREVIEW_CHARS: usize = 60;

#[derive(Parser)]
#[command(name = "clipshelf")]
#[command(about = "Save text clips and browse them later")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Configuration for this invocation.
    ///
    /// `config init` starts from defaults so it can create a missing file or
    /// overwrite one that no longer validates.
    pub fn load_config(&self) -> crate::Result<Config> {
        match &self.command {
            Commands::Config {
                action: ConfigAction::Init { .. },
            } => Ok(Config::default()),
            _ => Ok(Config::load_config(self.config.clone())?),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Save a clip captured from a page")]
    Save {
        /// Page the text was captured on
        #[arg(short, long)]
        url: String,

        /// Icon URL; defaults to the page's /favicon.ico
        #[arg(short, long)]
        favicon: Option<String>,

        text: String,
    },

    #[command(about = "List saved clips, newest first")]
    List {
        /// Only show clips whose domain or text contains this
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    #[command(about = "Print the full text of a clip")]
    Show { id: String },

    #[command(about = "Replace the text of a clip")]
    Edit { id: String, text: String },

    #[command(about = "Delete a clip")]
    Delete { id: String },

    #[command(about = "Copy a clip to the system clipboard")]
    Copy { id: String },

    #[command(about = "Delete every clip")]
    Clear {
        /// Confirm deleting all clips
        #[arg(long)]
        yes: bool,
    },

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Generate example configuration")]
    Init {
        #[arg(long)]
        force: bool,
    },

    #[command(about = "Validate configuration")]
    Validate,
}

pub struct CliHandler {
    config: Arc<Config>,
    config_path: Option<PathBuf>,
    store: Option<Arc<ClipStore<SqliteStorage>>>,
}

impl CliHandler {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            store: None,
        }
    }

    /// Lazily open the clip store when needed
    fn ensure_store(&mut self) -> crate::Result<Arc<ClipStore<SqliteStorage>>> {
        if let Some(store) = &self.store {
            return Ok(Arc::clone(store));
        }

        info!("Opening clip store at {:?}", self.config.store.path);
        let storage = SqliteStorage::open(&self.config.store.path)?;
        let store =
            Arc::new(ClipStore::new(storage).with_policy(self.config.store.upsert_policy));
        self.store = Some(Arc::clone(&store));
        Ok(store)
    }

    async fn open_library(&mut self) -> crate::Result<Library<SqliteStorage>> {
        let store = self.ensure_store()?;
        let mut library =
            Library::new(store, Arc::new(LogFeedback)).with_config(&self.config.library);
        library.load().await?;
        Ok(library)
    }

    pub async fn handle_command(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Save { url, favicon, text } => self.save_clip(url, favicon, text).await,
            Commands::List { query, limit } => self.list_clips(query, limit).await,
            Commands::Show { id } => self.show_clip(&id).await,
            Commands::Edit { id, text } => self.edit_clip(&id, &text).await,
            Commands::Delete { id } => self.delete_clip(&id).await,
            Commands::Copy { id } => self.copy_clip(&id).await,
            Commands::Clear { yes } => self.clear_clips(yes).await,
            Commands::Config { action } => self.handle_config_action(action),
        }
    }

    async fn save_clip(&mut self, url: String, favicon: Option<String>, text: String) -> Result<()> {
        let favicon = favicon.or_else(|| resolve_favicon(&url, &[]));
        let record = ClipRecord::new(&text, url, favicon, now_millis());
        if record.text.is_empty() {
            bail!("Nothing to save: clip text is empty");
        }

        let store = self.ensure_store()?;
        match store.upsert(record).await? {
            UpsertOutcome::Inserted { id } => println!("Saved clip {}", id.short()),
            UpsertOutcome::Updated { id, index } => {
                println!("Updated clip {} (position {})", id.short(), index + 1)
            }
        }
        Ok(())
    }

    async fn list_clips(&mut self, query: Option<String>, limit: usize) -> Result<()> {
        let mut library = self.open_library().await?;
        if library.is_empty() {
            println!("No clips saved yet");
            return Ok(());
        }

        if let Some(query) = query {
            library.set_query(query);
        }

        let cards = library.cards(now_millis());
        if cards.is_empty() {
            println!("No clips match {:?}", library.query());
            return Ok(());
        }

        println!("Clips (showing {} of {}):", cards.len().min(limit), cards.len());
        for card in cards.iter().take(limit) {
            println!(
                "{}  [{}] {} - {}",
                card.id.short(),
                card.age,
                card.domain,
                preview(&card.text)
            );
        }

        Ok(())
    }

    async fn show_clip(&mut self, id: &str) -> Result<()> {
        let library = self.open_library().await?;
        let id = resolve_id(library.clips(), id)?;
        let clip = library.get(id).ok_or_else(|| anyhow!("Clip not found: {}", id))?;

        println!("{}", clip.text);
        Ok(())
    }

    async fn edit_clip(&mut self, id: &str, text: &str) -> Result<()> {
        let mut library = self.open_library().await?;
        let id = resolve_id(library.clips(), id)?;
        library.save_edit(id, text).await?;
        println!("Clip {} updated", id.short());
        Ok(())
    }

    async fn delete_clip(&mut self, id: &str) -> Result<()> {
        let mut library = self.open_library().await?;
        let id = resolve_id(library.clips(), id)?;
        let removed = library.delete(id).await?;
        println!("Deleted clip {} from {}", id.short(), removed.domain);
        Ok(())
    }

    async fn copy_clip(&mut self, id: &str) -> Result<()> {
        let library = self.open_library().await?;
        let id = resolve_id(library.clips(), id)?;
        library.copy(id, &SystemClipboard::new()).await?;
        println!("Clip {} copied to clipboard", id.short());
        Ok(())
    }

    async fn clear_clips(&mut self, yes: bool) -> Result<()> {
        let mut library = self.open_library().await?;
        match library.clear_all(yes).await? {
            ClearOutcome::Cancelled => {
                println!(
                    "Refusing to delete {} clips without --yes",
                    library.clips().len()
                );
            }
            ClearOutcome::Cleared(count) => println!("Deleted {} clips", count),
        }
        Ok(())
    }

    fn handle_config_action(&mut self, action: ConfigAction) -> Result<()> {
        match action {
            ConfigAction::Show => {
                println!("Current Configuration:");
                println!("{:#?}", self.config);
            }
            ConfigAction::Init { force } => {
                let path = match &self.config_path {
                    Some(path) => path.clone(),
                    None => Config::default_path()
                        .ok_or_else(|| anyhow!("Could not find config directory"))?,
                };
                Config::generate_example_config(&path, force)?;
                println!("Example configuration written to {}", path.display());
            }
            ConfigAction::Validate => {
                // Config is already loaded and validated before the handler exists
                println!("Configuration is valid");
            }
        }
        Ok(())
    }
}

/// Resolve a full id or a unique prefix of one
pub fn resolve_id(clips: &[ClipRecord], raw: &str) -> crate::Result<ClipId> {
    if let Ok(id) = raw.parse::<ClipId>() {
        return Ok(id);
    }

    let prefix = raw.trim().to_lowercase().replace('-', "");
    if prefix.len() < MIN_ID_PREFIX {
        return Err(Error::InvalidId(format!(
            "prefix must be at least {} characters",
            MIN_ID_PREFIX
        )));
    }

    let mut matches = clips
        .iter()
        .filter(|clip| clip.id.as_uuid().simple().to_string().starts_with(&prefix));

    match (matches.next(), matches.next()) {
        (Some(clip), None) => Ok(clip.id),
        (None, _) => Err(Error::InvalidId(format!("no clip matches {:?}", raw))),
        (Some(_), Some(_)) => Err(Error::InvalidId(format!("{:?} is ambiguous", raw))),
    }
}

fn preview(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() > PREVIEW_CHARS {
        let cut: String = single_line.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        single_line
    }
}
