//! Environment readiness check.

use anyhow::Result;

use scrapedev::renderer::chromium::find_chromium;

use super::collect_cmd::{resolve_config, CollectArgs};

/// Check Chromium availability and the effective configuration.
pub async fn run(args: &CollectArgs) -> Result<()> {
    println!("scrapedev doctor");
    println!("================");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let config = match resolve_config(args) {
        Ok(config) => {
            println!("[OK] Configuration valid (base URL {})", config.base_url);
            Some(config)
        }
        Err(e) => {
            println!("[!!] Configuration invalid: {e:#}");
            None
        }
    };

    let chromium = config
        .as_ref()
        .and_then(|c| c.browser.chromium_path.clone())
        .or_else(find_chromium);
    match &chromium {
        Some(path) if path.exists() => println!("[OK] Chromium found: {}", path.display()),
        Some(path) => println!("[!!] Chromium path does not exist: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome/Chromium or set SCRAPEDEV_CHROMIUM_PATH."
        ),
    }

    println!();
    let ready = config.is_some() && chromium.is_some_and(|p| p.exists());
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}
