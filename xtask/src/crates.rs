use anyhow::{Context, Result};

use crate::cargo;

/// Layers in dependency order; each must build without the ones above it.
const CRATES: &[&str] = &["gamelink-domain", "gamelink-core", "gamelink-infra"];

/// Check that every crate compiles with only its own dependency set.
pub fn check_each_crate() -> Result<()> {
    println!("Checking {} crates in isolation...", CRATES.len());

    for (index, name) in CRATES.iter().enumerate() {
        println!("\n[{}/{}] cargo check -p {name} --all-targets", index + 1, CRATES.len());

        cargo(&["check", "-p", name, "--all-targets"])
            .with_context(|| format!("Crate '{name}' failed to compile"))?;

        println!("✅ {name} compiled successfully");
    }

    println!("\n✅ All {} crates compile on their own!", CRATES.len());

    Ok(())
}
