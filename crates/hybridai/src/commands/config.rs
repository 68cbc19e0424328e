use hybridai_core::HybridConfig;
use hybridai_telemetry::Paths;
use std::path::Path;

/// Configuration file contents, or defaults when absent or unreadable
pub fn load_config(paths: &Paths) -> HybridConfig {
    load_from(&paths.config_file())
}

fn load_from(config_path: &Path) -> HybridConfig {
    if !config_path.exists() {
        return HybridConfig::default();
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(path = %config_path.display(), error = %err, "unreadable config, using defaults");
            return HybridConfig::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %config_path.display(), error = %err, "invalid config, using defaults");
            HybridConfig::default()
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config_path = paths.config_file();
    let config = load_config(&paths);

    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        "defaults".to_string()
    };
    eprintln!("# source: {source}");
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
