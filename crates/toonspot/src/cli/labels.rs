//! The `toonspot labels` command.

use toonspot_core::labels::ANIMATED_CHARACTERS;

/// Print every label with its index.
pub fn execute() -> anyhow::Result<()> {
    for (i, label) in ANIMATED_CHARACTERS.iter().enumerate() {
        println!("{i:>3}  {label}");
    }
    Ok(())
}
