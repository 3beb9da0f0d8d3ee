pub mod auth;
pub mod contacts;
pub mod events;
pub mod pipeline;
pub mod tasks;

use anyhow::{Result, bail};
use nexus_application::NexusApp;

/// Fails early when no session is stored.
pub async fn require_login(app: &NexusApp) -> Result<()> {
    if !app.session().is_authenticated().await {
        bail!("Not signed in. Run `nexus login --email <email> --password <password>` first.");
    }
    Ok(())
}
