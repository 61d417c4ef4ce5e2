use std::path::Path;

use crate::config::Config;

pub fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    println!("Configuration OK");
    println!("  Database:         {}", config.general.database_path);
    println!("  Port:             {}", config.server.port);
    println!("  Engagement scope: {:?}", config.social.engagement_scope);
    println!(
        "  OTP store:        {}",
        if config.redis.enabled { "redis" } else { "memory" }
    );
    println!(
        "  Mail transport:   {}",
        if config.email.enabled { "smtp" } else { "log" }
    );
    Ok(())
}

pub fn cmd_init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        );
    }

    Config::default().save_to_path(path)?;
    println!("✓ Config file written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        cmd_init_config(&path, false).unwrap();
        assert!(Config::load_from_path(&path).is_ok());

        assert!(cmd_init_config(&path, false).is_err());
        assert!(cmd_init_config(&path, true).is_ok());
    }
}
