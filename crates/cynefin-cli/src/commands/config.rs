use super::utils::StoreOptions;
use anyhow::{Context, Result};

pub fn show(options: &StoreOptions) -> Result<()> {
    let config = options.load_config()?;
    let path = options.config_service().paths().config_file()?;

    println!("# {}", path.display());
    println!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to render configuration")?
    );
    Ok(())
}

pub fn set_cap(options: &StoreOptions, cap: usize) -> Result<()> {
    options
        .config_service()
        .set_cap(cap)
        .context("Failed to update configuration")?;

    println!("History cap set to {}", cap);
    println!("Older sessions beyond the cap are dropped the next time a session is saved or deleted.");
    Ok(())
}
