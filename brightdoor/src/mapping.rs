//! Maps a form submission and its feed configuration onto a contact payload.

use crate::api::ContactApi;
use crate::email::is_email;
use crate::feed::{FeedConfig, SubmissionRecord};
use crate::payload::{
    ADDRESS_LABEL_PRIMARY, AddressEntry, AttributeEntry, CONTACT_TYPE_PROSPECT, ContactPayload,
    EMAIL_LABEL_PRIMARY, EmailEntry, InitialContactType, LeadSourceEntry, NewContactFields,
    PHONE_LABEL_MOBILE, PhoneEntry,
};
use crate::types::{ContactId, LookupOutcome};

pub const NO_VALID_EMAIL: &str = "no valid email available";

/// The submission cannot be synced; the sync ends without an API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipSignal {
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MappingOutcome {
    Ready(ContactPayload),
    Skip(SkipSignal),
}

/// Resolves the contact's email address.
///
/// The configured value is used as-is if it is an address. Otherwise it is the
/// name of a submission field; that field is read once and not followed further.
pub fn resolve_email(feed: &FeedConfig, submission: &SubmissionRecord) -> Option<String> {
    let configured = feed.email_address.trim();
    if is_email(configured) {
        return Some(configured.to_string());
    }

    let resolved = submission.get_str(configured)?;
    let resolved = resolved.trim();
    is_email(resolved).then(|| resolved.to_string())
}

/// Builds the create-path payload for an already resolved email address.
pub fn assemble(feed: &FeedConfig, email: &str) -> ContactPayload {
    let contact_attributes = feed
        .contact_attributes
        .iter()
        .filter(|pair| pair.is_set())
        .map(|pair| AttributeEntry {
            contact_attribute_def_name: pair.label.clone(),
            value: pair.item_value.clone(),
        })
        .collect();

    let extra_fields = feed
        .extra_fields
        .iter()
        .filter(|pair| pair.is_set())
        .map(|pair| (pair.label.clone(), pair.item_value.clone()))
        .collect();

    ContactPayload {
        first_name: feed.first_name.clone(),
        last_name: feed.last_name.clone(),
        email_addresses: Some(vec![EmailEntry {
            email_address_label_id: EMAIL_LABEL_PRIMARY,
            email_address: email.to_string(),
        }]),
        phone_numbers: vec![PhoneEntry {
            phone_number_label_id: PHONE_LABEL_MOBILE,
            phone_number: feed.phone.clone(),
        }],
        physical_addresses: vec![AddressEntry {
            physical_address_label_id: ADDRESS_LABEL_PRIMARY,
            address1: feed.address1.clone(),
            address2: feed.address2.clone(),
            city: feed.city.clone(),
            state: feed.state.clone(),
            zip: feed.zip.clone(),
            country: feed.country.clone(),
        }],
        notes: feed.note.clone(),
        id: None,
        new_contact: Some(NewContactFields {
            contact_type_id: CONTACT_TYPE_PROSPECT.to_string(),
            contact_status_id: feed.contact_status_id.clone(),
            initial_contact_type: InitialContactType {
                initial_contact_type_id: feed.contact_initial_type.clone(),
            },
            contact_lead_sources: vec![LeadSourceEntry {
                lead_source_id: feed.contact_lead_source.clone(),
            }],
            contact_attributes,
        }),
        extra_fields,
    }
}

/// Looks the contact up by email. A failed lookup is logged and treated like
/// "not found", so the contact is created.
pub async fn lookup_existing(email: &str, lookup: &dyn ContactApi) -> Option<ContactId> {
    match lookup.lookup_by_email(email).await {
        Ok(LookupOutcome::Found(id)) => Some(id),
        Ok(LookupOutcome::NotFound) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Existing contact lookup failed, creating a new contact");
            None
        }
    }
}

/// Full mapping: email resolution, the optional existing-contact lookup, and
/// payload assembly.
pub async fn build_payload(
    feed: &FeedConfig,
    submission: &SubmissionRecord,
    lookup: &dyn ContactApi,
) -> MappingOutcome {
    let Some(email) = resolve_email(feed, submission) else {
        return MappingOutcome::Skip(SkipSignal {
            reason: NO_VALID_EMAIL,
        });
    };

    let mut payload = assemble(feed, &email);

    if feed.check_existing_email {
        if let Some(id) = lookup_existing(&email, lookup).await {
            payload.mark_existing(id);
        }
    }

    MappingOutcome::Ready(payload)
}
