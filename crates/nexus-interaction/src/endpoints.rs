//! Endpoint paths, relative to the configured base URL.

use nexus_core::EntityId;

pub const AUTH_LOGIN: &str = "/auth/login/";
pub const AUTH_REGISTER: &str = "/auth/register/";
pub const AUTH_REFRESH: &str = "/auth/refresh_token/";
pub const AUTH_ME: &str = "/auth/me/";
pub const AUTH_UPDATE_PROFILE: &str = "/auth/update_profile/";
pub const AUTH_CHANGE_PASSWORD: &str = "/auth/change_password/";

pub const CONTACTS: &str = "/contacts/contacts/";
pub const OPPORTUNITIES: &str = "/opportunities/opportunities/";
pub const TASKS: &str = "/tasks/tasks/";
pub const CALENDAR_EVENTS: &str = "/calendar/events/";

pub const ANALYTICS_DASHBOARD: &str = "/analytics/dashboard/";
pub const ANALYTICS_PIPELINE: &str = "/analytics/pipeline/";

/// Endpoints that never carry a session and must not trigger a refresh.
pub const ANONYMOUS: [&str; 3] = [AUTH_LOGIN, AUTH_REGISTER, AUTH_REFRESH];

/// `<collection><id>/`
pub fn item(collection: &str, id: &EntityId) -> String {
    format!("{}{}/", collection, id)
}

/// `<collection><id>/<action>/`
pub fn action(collection: &str, id: &EntityId, action: &str) -> String {
    format!("{}{}/{}/", collection, id, action)
}
