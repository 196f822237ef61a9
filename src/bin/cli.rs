//! filecache CLI
//!
//! Command-line interface for inspecting and filling a cache directory.

use std::fs;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use clap::{Parser, Subcommand};
use filecache::size::format_file_size_default;
use filecache::{Config, FileCache, FileContent, FileMetadata, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// filecache CLI
#[derive(Parser, Debug)]
#[command(name = "filecache")]
#[command(about = "Persistent file cache with transparent compression")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./filecache_data")]
    data_dir: PathBuf,

    /// Store name inside the data directory
    #[arg(short, long, default_value = "file-cache")]
    store: String,

    /// Gzip level (0-9)
    #[arg(short = 'l', long, default_value = "3")]
    level: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Cache a file under an id
    Put {
        /// The cache key
        id: String,

        /// File to cache
        path: PathBuf,

        /// Store the bytes as they are
        #[arg(long)]
        no_compress: bool,

        /// MIME type to record with the file
        #[arg(long, default_value = "")]
        mime_type: String,
    },

    /// Read a cached file
    Get {
        /// The cache key
        id: String,

        /// Write the original bytes here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show size metadata without reading the payload
    Stat {
        /// The cache key
        id: String,
    },

    /// List cached ids, oldest first
    List,

    /// Delete a cached file
    Del {
        /// The cache key
        id: String,
    },

    /// Delete every cached file
    Clear,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,filecache=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .store_name(&args.store)
        .compression_level(args.level)
        .build();

    let cache = FileCache::open(config)?;

    match args.command {
        Commands::Put {
            id,
            path,
            no_compress,
            mime_type,
        } => {
            let bytes = fs::read(&path)?;
            let last_modified = fs::metadata(&path)?
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let file = FileContent::new(name, bytes)
                .with_mime_type(mime_type)
                .with_last_modified(last_modified);

            cache.put_with(&id, &file, !no_compress)?;
            if let Some(metadata) = cache.metadata(&id)? {
                println!("{}\t{}", id, describe(&metadata));
            }
        }
        Commands::Get { id, output } => match cache.get(&id)? {
            Some(entry) => {
                println!(
                    "{}\t{}\t{}\t{}",
                    id,
                    entry.file.name,
                    entry.file.mime_type,
                    describe(&entry.metadata)
                );
                if let Some(output) = output {
                    fs::write(&output, &entry.file.bytes)?;
                }
            }
            None => {
                println!("{}\t(not cached)", id);
            }
        },
        Commands::Stat { id } => match cache.metadata(&id)? {
            Some(metadata) => println!("{}\t{}", id, describe(&metadata)),
            None => println!("{}\t(not cached)", id),
        },
        Commands::List => {
            for id in cache.ids()? {
                if let Some(metadata) = cache.metadata(&id)? {
                    println!("{}\t{}", id, describe(&metadata));
                }
            }
        }
        Commands::Del { id } => cache.delete(&id)?,
        Commands::Clear => cache.clear()?,
    }

    Ok(())
}

/// "13 Bytes (33 Bytes gzipped)" or "13 Bytes (raw)"
fn describe(metadata: &FileMetadata) -> String {
    match metadata.compressed_size {
        Some(compressed) => format!(
            "{} ({} gzipped)",
            format_file_size_default(metadata.size),
            format_file_size_default(compressed)
        ),
        None => format!("{} (raw)", format_file_size_default(metadata.size)),
    }
}
