//! Interactive configuration editor built on dialoguer.

use std::path::Path;

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::types::config::Config;
use crate::LookasideResult;

/// Runs the interactive configuration menu.
pub fn run_interactive_config(config_path: &Path) -> LookasideResult<()> {
    let theme = ColorfulTheme::default();

    println!("\n🔧 Lookaside Configuration\n");

    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        println!("Creating a new configuration...\n");
        Config::default_config()
    };

    loop {
        let options = vec![
            "General",
            "Cache",
            "Resolver entries",
            "Save and exit",
            "Exit without saving",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt("What do you want to configure?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => configure_general(&theme, &mut config)?,
            1 => configure_cache(&theme, &mut config)?,
            2 => configure_resolver(&theme, &mut config)?,
            3 => {
                config.save(config_path)?;
                println!("\n✓ Configuration saved to: {}\n", config_path.display());
                break;
            }
            4 => {
                if Confirm::with_theme(&theme)
                    .with_prompt("Exit without saving?")
                    .default(false)
                    .interact()?
                {
                    println!("\nExiting without saving.\n");
                    break;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn configure_general(theme: &ColorfulTheme, config: &mut Config) -> LookasideResult<()> {
    println!("\n📋 General\n");

    let log_levels = vec!["error", "warn", "info", "debug", "trace"];
    let current_idx = log_levels
        .iter()
        .position(|&l| l == config.general.log_level)
        .unwrap_or(2);

    let log_level_idx = Select::with_theme(theme)
        .with_prompt("Log level")
        .items(&log_levels)
        .default(current_idx)
        .interact()?;

    config.general.log_level = log_levels[log_level_idx].to_string();

    let log_formats = vec!["text", "json"];
    let current_format_idx = log_formats
        .iter()
        .position(|&f| f == config.general.log_format)
        .unwrap_or(0);

    let log_format_idx = Select::with_theme(theme)
        .with_prompt("Log format")
        .items(&log_formats)
        .default(current_format_idx)
        .interact()?;

    config.general.log_format = log_formats[log_format_idx].to_string();

    println!("\n✓ General settings updated.\n");
    Ok(())
}

fn configure_cache(theme: &ColorfulTheme, config: &mut Config) -> LookasideResult<()> {
    println!("\n💾 Cache\n");

    let capacity: usize = Input::with_theme(theme)
        .with_prompt("Capacity (entries, 0 disables caching)")
        .default(config.cache.capacity)
        .interact_text()?;

    config.cache.capacity = capacity;

    config.cache.single_flight = Confirm::with_theme(theme)
        .with_prompt("Share one resolution between concurrent misses?")
        .default(config.cache.single_flight)
        .interact()?;

    println!("\n✓ Cache configured.\n");
    Ok(())
}

fn configure_resolver(theme: &ColorfulTheme, config: &mut Config) -> LookasideResult<()> {
    println!("\n📚 Resolver\n");

    let latency: u64 = Input::with_theme(theme)
        .with_prompt("Simulated latency (ms)")
        .default(config.resolver.latency_ms)
        .interact_text()?;

    config.resolver.latency_ms = latency;

    loop {
        let actions = vec!["Add or replace entry", "Remove entry", "Back"];
        let action = Select::with_theme(theme)
            .with_prompt(format!(
                "{} entr{} configured",
                config.resolver.entries.len(),
                if config.resolver.entries.len() == 1 { "y" } else { "ies" }
            ))
            .items(&actions)
            .default(0)
            .interact()?;

        match action {
            0 => {
                let key: String = Input::with_theme(theme)
                    .with_prompt("Key")
                    .interact_text()?;
                let payload: String = Input::with_theme(theme)
                    .with_prompt("Payload")
                    .default(config.resolver.entries.get(&key).cloned().unwrap_or_default())
                    .interact_text()?;
                config.resolver.entries.insert(key, payload);
            }
            1 => {
                let keys: Vec<String> = config.resolver.entries.keys().cloned().collect();
                if keys.is_empty() {
                    println!("No entries to remove.\n");
                    continue;
                }
                let idx = Select::with_theme(theme)
                    .with_prompt("Entry to remove")
                    .items(&keys)
                    .default(0)
                    .interact()?;
                config.resolver.entries.remove(&keys[idx]);
            }
            _ => break,
        }
    }

    println!("\n✓ Resolver configured.\n");
    Ok(())
}

/// Prints a summary of the configuration.
pub fn show_config_summary(config: &Config) {
    println!("\n📊 Configuration Summary\n");
    println!("┌─────────────────────────────────────────┐");
    println!("│ General                                 │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Log level: {:<28} │", config.general.log_level);
    println!("│ Log format: {:<27} │", config.general.log_format);
    println!("├─────────────────────────────────────────┤");
    println!("│ Cache                                   │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Capacity: {:<29} │", config.cache.capacity);
    println!(
        "│ Single-flight: {:<24} │",
        if config.cache.single_flight { "on" } else { "off" }
    );
    println!("├─────────────────────────────────────────┤");
    println!("│ Resolver                                │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Latency: {:<28}ms │", config.resolver.latency_ms);
    println!("│ Entries: {:<30} │", config.resolver.entries.len());
    println!("└─────────────────────────────────────────┘");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_config_summary() {
        let mut config = Config::default_config();
        config
            .resolver
            .entries
            .insert("ls".to_string(), "list".to_string());
        show_config_summary(&config);
    }
}
