use anyhow::Result;
use nexus_application::NexusApp;
use nexus_core::auth::LoginCredentials;

pub async fn login(app: &NexusApp, email: String, password: String) -> Result<()> {
    let user = app
        .session()
        .login(&LoginCredentials::new(email, password))
        .await?;
    println!("Signed in as {} ({})", user.display_name(), user.email);
    Ok(())
}

pub async fn logout(app: &NexusApp) -> Result<()> {
    app.session().logout().await;
    println!("Signed out");
    Ok(())
}

pub async fn whoami(app: &NexusApp) -> Result<()> {
    super::require_login(app).await?;
    let user = app.session().fetch_profile().await?;
    println!("{} <{}>", user.display_name(), user.email);
    println!("  role: {}", user.role);
    Ok(())
}
