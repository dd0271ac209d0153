use std::path::{Path, PathBuf};

use clap::Subcommand;

use statcache::state::codec::CACHE_VERSION;

#[derive(Subcommand)]
pub enum CacheAction {
    /// Delete the cache file
    Clear {
        /// Path to the cache file
        cache: PathBuf,
    },
    /// Show cache location, size, and recorded version
    Info {
        /// Path to the cache file
        cache: PathBuf,
    },
}

pub fn run_cache_action(action: &CacheAction) -> i32 {
    match action {
        CacheAction::Clear { cache } => cmd_cache_clear(cache),
        CacheAction::Info { cache } => cmd_cache_info(cache),
    }
}

fn cmd_cache_clear(cache: &Path) -> i32 {
    match std::fs::remove_file(cache) {
        Ok(()) => {
            eprintln!("[statcache] cache cleared: {}", cache.display());
            0
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("[statcache] cache: nothing to clear ({})", cache.display());
            0
        }
        Err(e) => {
            eprintln!("[statcache] cache clear error: {e}");
            1
        }
    }
}

fn cmd_cache_info(cache: &Path) -> i32 {
    println!("cache path: {}", cache.display());

    let bytes = match std::fs::read(cache) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("status: not present");
            return 0;
        }
        Err(e) => {
            eprintln!("[statcache] cache: error reading file: {e}");
            return 1;
        }
        Ok(b) => b,
    };

    println!("size: {} bytes", bytes.len());

    if bytes.len() < 4 {
        println!("status: truncated (no version header)");
        return 0;
    }
    let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    println!("version: {version}");
    println!("supported: {}", version == CACHE_VERSION);

    0
}
