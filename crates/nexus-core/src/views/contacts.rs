//! Contact list views.

use crate::contact::{Contact, ContactSource};

/// Case-insensitive substring search over first name, last name, email and
/// company. A blank term matches every contact.
pub fn search_contacts<'a>(items: &'a [Contact], term: &str) -> Vec<&'a Contact> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|contact| {
            [
                &contact.first_name,
                &contact.last_name,
                &contact.email,
                &contact.company_name,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

pub fn filter_contacts_by_source(items: &[Contact], source: ContactSource) -> Vec<&Contact> {
    items.iter().filter(|contact| contact.source == source).collect()
}
