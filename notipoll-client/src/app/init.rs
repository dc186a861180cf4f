use std::path::PathBuf;

use crate::AppError;
use crate::config::{self, ClientConfig};

pub fn write_config(
    cli_path: Option<PathBuf>,
    domain: &str,
    project: &str,
    interval: i64,
    force: bool,
) -> Result<(), AppError> {
    let path = config::resolve_config_path(cli_path)?;
    if path.exists() && !force {
        return Err(AppError::Config(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }

    let mut cfg = ClientConfig::new(domain);
    cfg.domain = cfg.base_url()?;
    cfg.project = project.trim().to_string();
    cfg.interval = config::validate_interval(interval)?.as_secs() as i64;

    config::save_config(&path, &cfg)?;
    println!("Wrote config to {}", path.display());
    Ok(())
}
