use anyhow::Result;
use iptmon_core::config::Config;
use iptmon_core::paths;

pub fn path() -> Result<()> {
    println!("{}", paths::config_path().display());
    Ok(())
}

pub fn init() -> Result<()> {
    let path = paths::config_path();
    Config::init_at(&path)?;
    println!("Created config at {}", path.display());
    Ok(())
}
