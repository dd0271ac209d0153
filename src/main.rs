mod cache_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use statcache::{
    check_monitor_with_trace, update_monitor, CheckOutcome, Dependency, GlobPath, GlobSegment,
    TraceEvent,
};

#[derive(Parser)]
#[command(
    name = "statcache",
    about = "Persistent file status cache for build-oriented tools"
)]
struct Cli {
    /// Print diagnostic trace events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure declared dependencies and write the cache
    Update {
        /// Path to the cache file
        #[arg(long)]
        cache: PathBuf,
        /// Root directory dependency paths are relative to
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Opaque key stored alongside the measured state
        #[arg(long, default_value = "")]
        key: String,
        /// Opaque result stored alongside the measured state
        #[arg(long, default_value = "")]
        result: String,
        /// A file expected to exist, tracked by mtime (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// A file expected to exist, tracked by mtime and content hash (repeatable)
        #[arg(long = "hashed-file")]
        hashed_files: Vec<PathBuf>,
        /// A path expected not to exist (repeatable)
        #[arg(long = "absent")]
        absent: Vec<PathBuf>,
        /// A slash-separated glob, e.g. "pkgs/*.conf" (repeatable)
        #[arg(long = "glob")]
        globs: Vec<String>,
    },
    /// Probe the cache against the live filesystem
    Check {
        /// Path to the cache file
        #[arg(long)]
        cache: PathBuf,
        /// Root directory dependency paths are relative to
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Opaque key that must match the one passed to `update`
        #[arg(long, default_value = "")]
        key: String,
    },
    /// Manage a cache file directly
    Cache {
        #[command(subcommand)]
        action: cache_cmd::CacheAction,
    },
}

/// Parses a slash-separated glob spec like `"pkgs/*.conf"` into a
/// [`GlobPath`]: every component but the last becomes a directory segment,
/// the last becomes the file-matching segment.
fn parse_glob_spec(spec: &str) -> anyhow::Result<GlobPath> {
    let parts: Vec<&str> = spec.split('/').filter(|p| !p.is_empty()).collect();
    let Some((last, dirs)) = parts.split_last() else {
        anyhow::bail!("empty glob spec");
    };
    let file_seg = GlobSegment::new(*last)?;
    let mut gp = GlobPath::file(file_seg);
    for dir in dirs.iter().rev() {
        gp = GlobPath::dir(GlobSegment::new(*dir)?, gp);
    }
    Ok(gp)
}

fn trace_to_stderr(event: TraceEvent<'_>) {
    eprintln!("[statcache] {event:?}");
}

fn cmd_update(
    cache: &std::path::Path,
    root: &std::path::Path,
    key: &str,
    result: &str,
    files: &[PathBuf],
    hashed_files: &[PathBuf],
    absent: &[PathBuf],
    globs: &[String],
) -> anyhow::Result<i32> {
    let mut deps = Vec::new();
    deps.extend(files.iter().cloned().map(Dependency::File));
    deps.extend(hashed_files.iter().cloned().map(Dependency::HashedFile));
    deps.extend(absent.iter().cloned().map(Dependency::Absent));
    for spec in globs {
        deps.push(Dependency::Glob(parse_glob_spec(spec)?));
    }

    update_monitor(cache, root, &deps, &key.to_string(), &result.to_string())?;
    eprintln!(
        "[statcache] updated {} ({} dependencies)",
        cache.display(),
        deps.len()
    );
    Ok(0)
}

fn cmd_check(
    cache: &std::path::Path,
    root: &std::path::Path,
    key: &str,
    verbose: bool,
) -> anyhow::Result<i32> {
    let tracer: Option<&dyn statcache::Tracer> = if verbose {
        Some(&trace_to_stderr)
    } else {
        None
    };
    let outcome: CheckOutcome<String> =
        check_monitor_with_trace(cache, root, &key.to_string(), tracer)?;
    match outcome {
        CheckOutcome::Changed => {
            println!("changed");
            Ok(1)
        }
        CheckOutcome::Unchanged(result, deps) => {
            println!("unchanged");
            println!("result: {result}");
            println!("dependencies: {}", deps.len());
            Ok(0)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match &cli.command {
        Commands::Update {
            cache,
            root,
            key,
            result,
            files,
            hashed_files,
            absent,
            globs,
        } => cmd_update(cache, root, key, result, files, hashed_files, absent, globs)
            .unwrap_or_else(|e| {
                eprintln!("[statcache] error: {e:#}");
                1
            }),
        Commands::Check { cache, root, key } => {
            cmd_check(cache, root, key, cli.verbose).unwrap_or_else(|e| {
                eprintln!("[statcache] error: {e:#}");
                1
            })
        }
        Commands::Cache { action } => cache_cmd::run_cache_action(action),
    };
    std::process::exit(exit_code);
}
