//! `warpprobe ports` — show the resolved port order.

use anyhow::Result;
use warpprobe_http::ports::resolve_for;

use super::TargetArgs;

pub fn ports(target: &TargetArgs, format: &str) -> Result<()> {
    let config = target.load_config()?;
    let resolved = resolve_for(&target.inspector(), &target.target_ports(&config));

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&resolved)?),
        _ => {
            if resolved.is_empty() {
                println!("no ports to probe");
            }
            for port in &resolved {
                println!("{port}");
            }
        }
    }

    Ok(())
}
