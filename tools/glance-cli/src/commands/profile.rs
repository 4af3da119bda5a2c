//! Manage saved stream profiles.

use std::path::Path;

use glance_common::config::AppConfig;

pub fn list(config: &AppConfig) -> anyhow::Result<()> {
    let names: Vec<&str> = config.profile_names().collect();
    if names.is_empty() {
        println!("No saved profiles.");
        return Ok(());
    }
    println!("Profiles:");
    for name in names {
        println!("  {name}");
    }
    Ok(())
}

pub fn save(config: &mut AppConfig, path: &Path, name: &str) -> anyhow::Result<()> {
    config
        .save_profile(name)
        .map_err(|e| anyhow::anyhow!("Failed to save profile: {e}"))?;
    write(config, path)?;
    println!("Profile '{}' saved to {}", name.trim(), path.display());
    Ok(())
}

pub fn apply(config: &mut AppConfig, path: &Path, name: &str) -> anyhow::Result<()> {
    config
        .apply_profile(name)
        .map_err(|e| anyhow::anyhow!("Failed to apply profile: {e}"))?;
    write(config, path)?;
    println!("Profile '{}' is now the default stream configuration", name.trim());
    Ok(())
}

pub fn remove(config: &mut AppConfig, path: &Path, name: &str) -> anyhow::Result<()> {
    if !config.remove_profile(name) {
        anyhow::bail!("No profile named '{}'", name.trim());
    }
    write(config, path)?;
    println!("Profile '{}' removed", name.trim());
    Ok(())
}

pub fn show(config: &AppConfig, name: &str) -> anyhow::Result<()> {
    let profile = config
        .profiles
        .profiles
        .get(name.trim())
        .ok_or_else(|| anyhow::anyhow!("No profile named '{}'", name.trim()))?;
    println!("{}", serde_json::to_string_pretty(profile)?);
    Ok(())
}

fn write(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    config
        .save_to(path)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("glance-cli-{}-{tag}", std::process::id()))
            .join("config.json")
    }

    #[test]
    fn test_save_apply_remove_roundtrip_on_disk() {
        let path = temp_config_path("profiles");
        let mut config = AppConfig::default();
        config.stream.target_fps = 12;
        save(&mut config, &path, "slow").unwrap();

        config.stream.target_fps = 60;
        apply(&mut config, &path, "slow").unwrap();
        assert_eq!(config.stream.target_fps, 12);

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.profile_names().collect::<Vec<_>>(), vec!["slow"]);
        assert_eq!(loaded.stream.target_fps, 12);

        remove(&mut config, &path, "slow").unwrap();
        assert!(remove(&mut config, &path, "slow").is_err());
        assert_eq!(AppConfig::load_from(&path).profile_names().count(), 0);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let config = AppConfig::default();
        assert!(show(&config, "nope").is_err());
    }
}
