//! Calendar event domain module.

mod model;

pub use model::{CalendarEvent, EventStatus, EventType};
