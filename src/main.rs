//! `selcodec` - encode, decode and restore catalog selections from the shell.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use selcodec::{
    decode, encode_shortest, share_url, Catalog, CatalogIndex, CodecConfig, EncodingMode,
    FileStore, Restorer, SelectionSet, SelectionStateStore, Transport,
};

/// Selection state codec.
#[derive(Debug, Parser)]
#[command(name = "selcodec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog JSON (series → years → shows).
    #[arg(long, env = "SELCODEC_CATALOG")]
    catalog: PathBuf,

    /// JSON config file.
    #[arg(long, env = "SELCODEC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encode comma-separated indices with the shortest encoding.
    Encode {
        /// Indices, e.g. `0,1,2,7`.
        #[arg(long, value_delimiter = ',')]
        indices: Vec<u32>,
    },
    /// Decode a payload.
    Decode {
        /// Encoding tag: r, d or b.
        #[arg(long)]
        mode: String,
        /// Payload text.
        #[arg(long, default_value = "")]
        payload: String,
    },
    /// Build a share link.
    ShareUrl {
        /// Page URL to share from.
        #[arg(long)]
        base: Url,
        /// Selected indices.
        #[arg(long, value_delimiter = ',')]
        indices: Vec<u32>,
        /// Display name.
        #[arg(long, default_value = "")]
        name: String,
        /// Social handle, with or without `@`.
        #[arg(long, default_value = "")]
        handle: String,
    },
    /// Restore state from a page URL, falling back to the saved draft.
    Restore {
        /// The page URL as loaded.
        #[arg(long)]
        url: String,
        /// Directory holding the draft record.
        #[arg(long)]
        drafts: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CodecConfig::load(path)?,
        None => CodecConfig::default(),
    };
    let catalog = Catalog::load(&cli.catalog)
        .with_context(|| format!("loading catalog {}", cli.catalog.display()))?;
    let index = CatalogIndex::with_policy(&catalog, config.collision_policy)?;

    let output = match cli.command {
        Commands::Encode { indices } => {
            let selection: SelectionSet = indices.into_iter().collect();
            serde_json::to_value(encode_shortest(&selection, index.len()))?
        }
        Commands::Decode { mode, payload } => {
            let Some(mode) = EncodingMode::from_tag(&mode) else {
                bail!("unknown mode {:?}, expected r, d or b", mode);
            };
            let (indices, error) = match decode(mode, &payload, index.len()) {
                Ok(selection) => (selection, None),
                Err(partial) => (partial.recovered, Some(partial.error.to_string())),
            };
            json!({ "indices": indices.to_sorted_vec(), "error": error })
        }
        Commands::ShareUrl {
            base,
            indices,
            name,
            handle,
        } => {
            let selection: SelectionSet = indices.into_iter().collect();
            let encoded = encode_shortest(&selection, index.len());
            json!({ "url": share_url(&base, &encoded, &name, &handle).as_str() })
        }
        Commands::Restore { url, drafts } => {
            let transport = Transport::parse(&url)?;
            let restorer = Restorer::new(&index);
            let restoration = match drafts {
                Some(dir) => {
                    let mut store = SelectionStateStore::new(FileStore::open(dir)?, &config.draft);
                    restorer.restore(&transport, &mut store, Utc::now())
                }
                None => restorer.from_transport(&transport),
            };
            json!({
                "state": restoration.state,
                "indices": restoration.selection.as_ref().map(SelectionSet::to_sorted_vec),
                "name": restoration.name,
                "handle": restoration.handle,
                "replace_url": restoration.replace_url.as_ref().map(Url::as_str),
                "errors": restoration.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
