use anyhow::Result;
use nexus_application::NexusApp;
use nexus_core::api::ListParams;
use nexus_core::views::DateRange;

pub async fn between(app: &NexusApp, from: &str, to: &str) -> Result<()> {
    let range = DateRange::parse(from, to)?;
    super::require_login(app).await?;
    app.cache().fetch_calendar_events(&ListParams::new()).await?;

    let events = app.cache().events_between(&range).await;
    for event in &events {
        println!(
            "{:<26} {:<10} {}",
            event.start_time.as_deref().unwrap_or("-"),
            event.event_type,
            event.title
        );
    }
    println!("{} event(s)", events.len());
    Ok(())
}
