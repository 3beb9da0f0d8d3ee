use anyhow::Result;
use nexus_application::NexusApp;
use nexus_core::EntityId;
use nexus_core::api::ListParams;
use nexus_core::contact::Contact;

fn print_row(contact: &Contact) {
    println!(
        "{:<38} {:<24} {:<30} {}",
        contact.id,
        contact.full_name(),
        contact.email,
        contact.company_name
    );
}

pub async fn list(app: &NexusApp, search: Option<String>, page: Option<u32>) -> Result<()> {
    super::require_login(app).await?;
    let mut params = ListParams::new();
    if let Some(term) = search {
        params = params.search(term);
    }
    if let Some(page) = page {
        params = params.page(page);
    }

    let contacts = app.cache().fetch_contacts(&params).await?;
    for contact in &contacts {
        print_row(contact);
    }
    println!("{} contact(s)", contacts.len());
    Ok(())
}

pub async fn search(app: &NexusApp, term: &str) -> Result<()> {
    super::require_login(app).await?;
    app.cache().fetch_contacts(&ListParams::new()).await?;
    let found = app.cache().search_contacts(term).await;
    for contact in &found {
        print_row(contact);
    }
    println!("{} match(es)", found.len());
    Ok(())
}

pub async fn show(app: &NexusApp, id: &EntityId) -> Result<()> {
    super::require_login(app).await?;
    let contact = app.cache().fetch_contact(id).await?;
    println!("{}", serde_json::to_string_pretty(&contact)?);
    Ok(())
}

pub async fn touch(app: &NexusApp, id: &EntityId) -> Result<()> {
    super::require_login(app).await?;
    app.cache().update_last_contacted(id).await?;
    println!("Contact {} marked as contacted", id);
    Ok(())
}
