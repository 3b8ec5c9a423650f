//! Lookaside CLI command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;

use crate::resolver::{FnResolver, Resolver, StaticResolver};
use crate::server::LookupServer;
use crate::service::LookupService;
use crate::types::config::{CacheConfig, Config, CONFIG_FILE};
use crate::types::errors::ResolveError;
use crate::types::responses::{ServiceStats, Source};
use crate::{LookasideError, LookasideResult};

/// Builds the lookup service described by the configuration.
pub fn build_service(config: &Config) -> LookupService {
    let resolver = StaticResolver::from_config(&config.resolver);
    LookupService::from_config(&config.cache, Arc::new(resolver))
}

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> LookasideResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    // Create directory if it doesn't exist
    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join(CONFIG_FILE);

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        println!("Use 'lookaside config' to modify.");
        return Ok(());
    }

    let mut config = Config::default_config();
    config.resolver.entries.insert(
        "example".to_string(),
        "Example payload served by the table resolver.".to_string(),
    );
    config.save(&config_path)?;

    println!("Lookaside initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Add payloads under [resolver.entries]");
    println!("  2. Try a lookup: lookaside lookup example");
    println!("  3. Serve over stdio: lookaside serve");

    Ok(())
}

/// Serves lookups over stdin/stdout.
pub async fn serve(config: &Config) -> LookasideResult<()> {
    let service = build_service(config);

    tracing::debug!(
        capacity = config.cache.capacity,
        single_flight = config.cache.single_flight,
        entries = config.resolver.entries.len(),
        "Configuration loaded"
    );

    LookupServer::new(Arc::new(service)).run_stdio().await
}

/// Looks up each key in order and prints the result.
pub async fn lookup(keys: &[String], config: &Config) -> LookasideResult<()> {
    let service = build_service(config);

    for key in keys {
        match service.lookup(key).await {
            Ok(found) => {
                let origin = match found.source {
                    Source::Cache => "HIT",
                    Source::Resolver => "MISS",
                };
                println!("{} [{}]", key, origin);
                println!("{}", String::from_utf8_lossy(&found.payload));
            }
            Err(err) => {
                println!("{} [NOT FOUND]", key);
                println!("  {}", err);
            }
        }
    }

    println!();
    print_stats(service.resolver().name(), &service.stats());

    Ok(())
}

/// Runs a concurrent workload and reports cache behaviour.
pub async fn simulate(
    tasks: usize,
    requests: usize,
    keys: usize,
    latency_ms: u64,
    cache: &CacheConfig,
) -> LookasideResult<()> {
    if keys == 0 {
        return Err(LookasideError::config("key space must not be empty"));
    }

    // Every 13th key has no payload, so failures show up too.
    let resolver = FnResolver::new("synthetic", |key: &str| {
        let index: usize = key
            .strip_prefix("key-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| ResolveError::not_found(key))?;
        if index % 13 == 12 {
            return Err(ResolveError::not_found(key));
        }
        Ok(Bytes::from(format!("payload for {}", key)))
    })
    .with_latency(Duration::from_millis(latency_ms));

    let service = Arc::new(LookupService::from_config(cache, Arc::new(resolver)));

    println!(
        "Simulating {} callers x {} lookups over {} keys (capacity {}, single-flight {})\n",
        tasks,
        requests,
        keys,
        cache.capacity,
        if service.single_flight() { "on" } else { "off" }
    );

    let progress = ProgressBar::new(total_lookups(tasks, requests));
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} lookups ({elapsed})")
            .map_err(|e| LookasideError::other(e.to_string()))?,
    );

    let started = Instant::now();
    let mut workers = JoinSet::new();
    for task in 0..tasks {
        let service = service.clone();
        let progress = progress.clone();
        workers.spawn(async move {
            for i in 0..requests {
                let key = format!("key-{}", workload_key(task, i, keys));
                // Failures are expected for some keys.
                let _ = service.lookup(&key).await;
                progress.inc(1);
            }
        });
    }
    while let Some(joined) = workers.join_next().await {
        joined.map_err(|e| LookasideError::other(format!("worker failed: {}", e)))?;
    }
    progress.finish_and_clear();

    let stats = service.stats();
    println!("Finished in {:.2?}\n", started.elapsed());
    print_stats(service.resolver().name(), &stats);

    if stats.cache.size <= stats.cache.capacity {
        println!("\n✓ Capacity bound held ({} <= {})", stats.cache.size, stats.cache.capacity);
        Ok(())
    } else {
        Err(LookasideError::other(format!(
            "cache holds {} entries, capacity is {}",
            stats.cache.size, stats.cache.capacity
        )))
    }
}

fn total_lookups(tasks: usize, requests: usize) -> u64 {
    (tasks as u64).saturating_mul(requests as u64)
}

/// Key picked by caller `task` for its `i`-th lookup. Skewed towards low
/// keys so the cache has something to keep.
fn workload_key(task: usize, i: usize, keys: usize) -> usize {
    let spread = task
        .wrapping_mul(7919)
        .wrapping_add(i.wrapping_mul(104_729))
        % keys;
    if i % 4 == 0 {
        spread
    } else {
        spread % (keys / 4).max(1)
    }
}

fn print_stats(resolver: &str, stats: &ServiceStats) {
    println!("Cache: {}/{} entries", stats.cache.size, stats.cache.capacity);
    println!(
        "  hits: {}  misses: {}  hit rate: {:.1}%",
        stats.cache.hits,
        stats.cache.misses,
        stats.cache.hit_rate() * 100.0
    );
    println!("  evictions: {}", stats.cache.evictions);
    println!(
        "Resolver '{}': {} calls, {} failures, {} shared",
        resolver, stats.resolutions, stats.failures, stats.shared
    );
}

/// Edits configuration interactively.
pub async fn config_cmd(config_path: &Path) -> LookasideResult<()> {
    use super::interactive::{run_interactive_config, show_config_summary};

    // Show summary before editing
    if config_path.exists() {
        let config = Config::load(config_path)?;
        show_config_summary(&config);
    }

    run_interactive_config(config_path)
}

/// Diagnoses configuration problems.
pub async fn doctor(config: &Config) -> LookasideResult<()> {
    println!("Diagnosing Lookaside configuration...\n");

    let mut issues: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    println!("✓ Configuration loaded");

    if config.cache.capacity == 0 {
        warnings.push("Cache capacity is 0 - nothing will be cached".to_string());
    } else {
        println!("✓ Cache capacity: {} entries", config.cache.capacity);
    }

    if config.cache.single_flight {
        println!("✓ Single-flight enabled for concurrent misses");
    }

    let valid_levels = ["error", "warn", "info", "debug", "trace"];
    if !valid_levels.contains(&config.general.log_level.as_str()) {
        issues.push(format!(
            "Unknown log level '{}' (expected one of: {})",
            config.general.log_level,
            valid_levels.join(", ")
        ));
    }

    if !["text", "json"].contains(&config.general.log_format.as_str()) {
        issues.push(format!(
            "Unknown log format '{}' (expected text or json)",
            config.general.log_format
        ));
    }

    let resolver = StaticResolver::from_config(&config.resolver);
    if resolver.is_empty() {
        warnings.push("No payloads under [resolver.entries] - every lookup will fail".to_string());
    } else {
        println!(
            "✓ Resolver '{}' knows {} key(s)",
            resolver.name(),
            resolver.len()
        );
    }

    if config.resolver.latency_ms > 0 {
        println!(
            "✓ Simulated resolver latency: {} ms",
            config.resolver.latency_ms
        );
    }

    // Summary
    println!();
    if issues.is_empty() && warnings.is_empty() {
        println!("✓ All good! Lookaside is ready.");
    } else {
        if !warnings.is_empty() {
            println!("Warnings:");
            for warning in warnings {
                println!("  ⚠ {}", warning);
            }
        }
        if !issues.is_empty() {
            println!("Problems:");
            for issue in issues {
                println!("  ✗ {}", issue);
            }
        }
    }

    Ok(())
}

/// Shows version.
pub fn version() {
    println!("lookaside {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Cache-aside lookup service with a bounded LRU cache");
}
