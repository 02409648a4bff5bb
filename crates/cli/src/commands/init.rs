//! `hassist init`: Write a default config and a sample platform snapshot.

use std::path::{Path, PathBuf};

use hassist_config::AppConfig;
use hassist_platform::SAMPLE_SNAPSHOT;

const CONFIG_HEADER: &str = "\
# hassist configuration
#
# [model]     which endpoint answers and how (api_key may also come from
#             HASSIST_API_KEY, OPENAI_API_KEY or DASHSCOPE_API_KEY)
# [agent]     prompt templates, iteration cap and memory window
# [platform]  snapshot of the home and the directory for YAML documents
# [gateway]   HTTP listener for `hassist serve`

";

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Created,
    Kept,
}

fn write_if_absent(path: &Path, content: &str, force: bool) -> std::io::Result<Outcome> {
    if path.exists() && !force {
        return Ok(Outcome::Kept);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(Outcome::Created)
}

fn report(label: &str, path: &Path, outcome: Outcome) {
    match outcome {
        Outcome::Created => println!("✅ Created {label}: {}", path.display()),
        Outcome::Kept => println!("   {label} already exists: {}", path.display()),
    }
}

pub async fn run(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path: PathBuf = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    let defaults = AppConfig::default();

    println!("hassist - setup");
    println!("===============\n");

    let outcome = write_if_absent(&config_path, &default_config_text(), force)?;
    report("config", &config_path, outcome);

    let snapshot_path = &defaults.platform.snapshot_path;
    let outcome = write_if_absent(snapshot_path, SAMPLE_SNAPSHOT, force)?;
    report("sample snapshot", snapshot_path, outcome);

    std::fs::create_dir_all(&defaults.platform.config_dir)?;

    println!("\nNext steps:");
    println!("  1. Set an API key:   export HASSIST_API_KEY=sk-...");
    println!("  2. Replace the sample snapshot with your own home");
    println!("  3. Try it:           hassist chat -m \"turn on the kitchen light\"");

    Ok(())
}

fn default_config_text() -> String {
    format!("{CONFIG_HEADER}{}", AppConfig::default_toml())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, default_config_text()).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.agent.max_iterations, AppConfig::default().agent.max_iterations);
    }

    #[test]
    fn existing_file_is_kept_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert_eq!(write_if_absent(&path, "first", false).unwrap(), Outcome::Created);
        assert_eq!(write_if_absent(&path, "second", false).unwrap(), Outcome::Kept);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        assert_eq!(write_if_absent(&path, "third", true).unwrap(), Outcome::Created);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "third");
    }
}
