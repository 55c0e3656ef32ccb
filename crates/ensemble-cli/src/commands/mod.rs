pub mod replay;
pub mod restore;
pub mod sessions;

use anyhow::Result;
use ensemble_application::SyncSnapshot;

/// Prints the synchronizer view as pretty JSON on stdout.
pub fn print_snapshot(snapshot: &SyncSnapshot) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}
