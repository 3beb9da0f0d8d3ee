use anyhow::Result;
use nexus_application::NexusApp;
use nexus_core::EntityId;
use nexus_core::api::ListParams;
use nexus_core::opportunity::Stage;

pub async fn show(app: &NexusApp, stage: Option<Stage>) -> Result<()> {
    super::require_login(app).await?;
    app.cache().fetch_opportunities(&ListParams::new()).await?;

    if let Some(stage) = stage {
        for opp in app.cache().opportunities_in_stage(stage).await {
            println!("{:<38} {:>12.2} {:>4}% {}", opp.id, opp.value, opp.probability, opp.title);
        }
        return Ok(());
    }

    let metrics = app.cache().pipeline_metrics().await;
    println!("Total value:    {:.2}", metrics.total_value);
    println!("Weighted value: {:.2}", metrics.weighted_value);
    println!(
        "Active / won / lost: {} / {} / {}",
        metrics.active_count, metrics.won_count, metrics.lost_count
    );
    println!("Win rate:       {:.1}%", metrics.win_rate);
    println!("Avg deal size:  {:.2}", metrics.avg_deal_size);
    println!();
    for row in app.cache().stage_breakdown().await {
        println!(
            "{:<12} {:>4} {:>14.2} {:>6.1}%",
            row.stage.label(),
            row.count,
            row.value,
            row.percentage
        );
    }
    Ok(())
}

pub async fn move_stage(app: &NexusApp, id: &EntityId, stage: Stage) -> Result<()> {
    super::require_login(app).await?;
    app.cache().update_opportunity_stage(id, stage).await?;
    println!("Opportunity {} moved to {}", id, stage.label());
    Ok(())
}

pub async fn dashboard(app: &NexusApp) -> Result<()> {
    super::require_login(app).await?;
    let data = app.cache().fetch_dashboard_data().await?;
    let stages = app.cache().fetch_pipeline_data().await?;

    println!("{}", serde_json::to_string_pretty(&data)?);
    for stage in stages {
        println!(
            "{:<12} {:>4} {:>14.2} {:>6.1}%",
            stage.name, stage.count, stage.value, stage.percentage
        );
    }
    Ok(())
}
