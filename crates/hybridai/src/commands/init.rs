use hybridai_core::HybridConfig;
use hybridai_telemetry::Paths;

pub fn run(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let written = write_default_config(&paths, force)?;

    let config_path = paths.config_file();
    if written {
        println!("✓ Wrote default configuration to {}", config_path.display());
        println!("\nSections:");
        println!("  - router");
        println!("  - aggregator");
        println!("  - coordinator");
    } else {
        println!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }
    Ok(())
}

/// Returns false when a configuration exists and `force` is not set
fn write_default_config(paths: &Paths, force: bool) -> anyhow::Result<bool> {
    let config_path = paths.config_file();
    if config_path.exists() && !force {
        return Ok(false);
    }

    std::fs::create_dir_all(paths.telemetry_dir())?;
    let json = serde_json::to_string_pretty(&HybridConfig::default())?;
    hybridai_telemetry::atomic_write(&config_path, json.as_bytes())?;
    Ok(true)
}
