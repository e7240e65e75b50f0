use anyhow::Result;

use crate::config::Config;

pub fn cmd_config(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
