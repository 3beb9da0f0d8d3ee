use anyhow::Result;
use chrono::Utc;
use nexus_application::NexusApp;
use nexus_core::EntityId;
use nexus_core::api::ListParams;
use nexus_core::task::TaskStatus;
use nexus_core::views::{TaskFilter, filter_tasks};

pub async fn list(app: &NexusApp, status: Option<TaskStatus>, overdue: bool) -> Result<()> {
    super::require_login(app).await?;
    let tasks = app.cache().fetch_tasks(&ListParams::new()).await?;

    let filter = TaskFilter {
        status,
        overdue_only: overdue,
        ..TaskFilter::default()
    };
    let now = Utc::now();
    let selected = filter_tasks(&tasks, &filter, now);
    for task in &selected {
        println!(
            "{:<38} {:<12} {:<8} {:<26} {}{}",
            task.id,
            task.status,
            task.priority,
            task.due_date.as_deref().unwrap_or("-"),
            task.title,
            if task.is_overdue(now) { " (overdue)" } else { "" }
        );
    }
    println!("{} task(s)", selected.len());
    Ok(())
}

pub async fn complete(app: &NexusApp, id: &EntityId) -> Result<()> {
    super::require_login(app).await?;
    app.cache().complete_task(id).await?;
    println!("Task {} completed", id);
    Ok(())
}

pub async fn start(app: &NexusApp, id: &EntityId) -> Result<()> {
    super::require_login(app).await?;
    app.cache().start_task(id).await?;
    println!("Task {} in progress", id);
    Ok(())
}

pub async fn stats(app: &NexusApp) -> Result<()> {
    super::require_login(app).await?;
    app.cache().fetch_tasks(&ListParams::new()).await?;
    let stats = app.cache().task_stats(Utc::now()).await;

    println!("Total:       {}", stats.total);
    println!("Open:        {}", stats.open);
    println!("In progress: {}", stats.in_progress);
    println!("Completed:   {}", stats.completed);
    println!("Overdue:     {}", stats.overdue);
    println!("Completion:  {:.1}%", stats.completion_rate());
    Ok(())
}
