//! Typed form of the BrightDoor `ContactDetails` object.
//!
//! The payload is assembled from typed records, converted to a JSON tree in
//! BrightDoor's field order, and pruned before it goes on the wire.

use crate::errors::Result;
use crate::prune::prune;
use crate::types::ContactId;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

pub const EMAIL_LABEL_PRIMARY: u32 = 1;
// 1 Home, 2 Work, 3 Mobile, 4 Pager, 5 Fax, 6 Other, 7 Spouse Home, 8 Spouse Work, 9 Spouse Mobile
pub const PHONE_LABEL_MOBILE: u32 = 3;
pub const ADDRESS_LABEL_PRIMARY: u32 = 1;
pub const CONTACT_TYPE_PROSPECT: &str = "1";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailEntry {
    pub email_address_label_id: u32,
    pub email_address: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PhoneEntry {
    pub phone_number_label_id: u32,
    pub phone_number: String,
}

impl PhoneEntry {
    /// Only the label is set.
    pub fn is_blank(&self) -> bool {
        self.phone_number.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressEntry {
    pub physical_address_label_id: u32,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl AddressEntry {
    /// Only the label is set.
    pub fn is_blank(&self) -> bool {
        [
            &self.address1,
            &self.address2,
            &self.city,
            &self.state,
            &self.zip,
            &self.country,
        ]
        .iter()
        .all(|field| field.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeEntry {
    pub contact_attribute_def_name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitialContactType {
    pub initial_contact_type_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LeadSourceEntry {
    pub lead_source_id: String,
}

/// Fields that only make sense when a new contact record is created.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewContactFields {
    pub contact_type_id: String,
    pub contact_status_id: String,
    pub initial_contact_type: InitialContactType,
    pub contact_lead_sources: Vec<LeadSourceEntry>,
    pub contact_attributes: Vec<AttributeEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    /// `None` once an existing contact is being updated.
    pub email_addresses: Option<Vec<EmailEntry>>,
    pub phone_numbers: Vec<PhoneEntry>,
    pub physical_addresses: Vec<AddressEntry>,
    pub notes: String,
    pub id: Option<ContactId>,
    pub new_contact: Option<NewContactFields>,
    /// Admin-defined overrides, applied last.
    pub extra_fields: IndexMap<String, String>,
}

impl ContactPayload {
    pub fn is_update(&self) -> bool {
        self.id.is_some()
    }

    /// Turns the payload into an update of `id`.
    ///
    /// The email list and the new-contact group are create-only and dropped.
    pub fn mark_existing(&mut self, id: ContactId) {
        self.id = Some(id);
        self.email_addresses = None;
        self.new_contact = None;
    }

    /// JSON tree before pruning.
    ///
    /// Keys are merged in precedence order: base fields, then the new-contact
    /// group, then extra fields. A later key replaces an earlier one in place.
    pub fn to_tree(&self) -> Result<Value> {
        let mut tree = Map::new();
        tree.insert("FirstName".into(), Value::from(self.first_name.as_str()));
        tree.insert("LastName".into(), Value::from(self.last_name.as_str()));
        if let Some(emails) = &self.email_addresses {
            tree.insert("ContactEmailAddresses".into(), serde_json::to_value(emails)?);
        }
        tree.insert(
            "ContactPhoneNumbers".into(),
            serde_json::to_value(&self.phone_numbers)?,
        );
        tree.insert(
            "ContactPhysicalAddresses".into(),
            serde_json::to_value(&self.physical_addresses)?,
        );
        tree.insert("Notes".into(), Value::from(self.notes.as_str()));
        if let Some(id) = &self.id {
            tree.insert("Id".into(), id.as_value().clone());
        }

        if let Some(group) = &self.new_contact {
            if let Value::Object(fields) = serde_json::to_value(group)? {
                for (key, value) in fields {
                    tree.insert(key, value);
                }
            }
        }

        for (label, value) in &self.extra_fields {
            tree.insert(label.clone(), Value::from(value.as_str()));
        }

        Ok(Value::Object(tree))
    }

    /// Pruned JSON tree, as sent in `ContactDetails`.
    ///
    /// Phone and address entries that carry nothing but their label id are
    /// dropped first, so an unfilled entry does not survive pruning.
    pub fn to_wire(&self) -> Result<Value> {
        let mut sendable = self.clone();
        sendable.phone_numbers.retain(|entry| !entry.is_blank());
        sendable.physical_addresses.retain(|entry| !entry.is_blank());
        Ok(prune(sendable.to_tree()?).unwrap_or_else(|| Value::Object(Map::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> ContactPayload {
        ContactPayload {
            first_name: "Jo".into(),
            last_name: "Lee".into(),
            email_addresses: Some(vec![EmailEntry {
                email_address_label_id: EMAIL_LABEL_PRIMARY,
                email_address: "jo@example.com".into(),
            }]),
            phone_numbers: vec![PhoneEntry {
                phone_number_label_id: PHONE_LABEL_MOBILE,
                phone_number: "555-0100".into(),
            }],
            physical_addresses: vec![],
            notes: String::new(),
            id: None,
            new_contact: Some(NewContactFields {
                contact_type_id: CONTACT_TYPE_PROSPECT.into(),
                contact_status_id: "6".into(),
                initial_contact_type: InitialContactType {
                    initial_contact_type_id: "6".into(),
                },
                contact_lead_sources: vec![LeadSourceEntry {
                    lead_source_id: "22".into(),
                }],
                contact_attributes: vec![],
            }),
            extra_fields: IndexMap::new(),
        }
    }

    #[test]
    fn tree_uses_brightdoor_field_names() {
        let tree = payload().to_tree().unwrap();
        assert_eq!(
            tree["ContactEmailAddresses"],
            json!([{"EmailAddressLabelId": 1, "EmailAddress": "jo@example.com"}])
        );
        assert_eq!(
            tree["ContactPhoneNumbers"],
            json!([{"PhoneNumberLabelId": 3, "PhoneNumber": "555-0100"}])
        );
        assert_eq!(tree["ContactTypeId"], json!("1"));
        assert_eq!(
            tree["InitialContactType"],
            json!({"InitialContactTypeId": "6"})
        );
        assert_eq!(tree["ContactLeadSources"], json!([{"LeadSourceId": "22"}]));
        assert_eq!(tree["ContactAttributes"], json!([]));
    }

    #[test]
    fn extra_fields_replace_in_place() {
        let mut payload = payload();
        payload
            .extra_fields
            .insert("FirstName".into(), "Joanna".into());
        payload
            .extra_fields
            .insert("ContactStatusId".into(), "1".into());

        let tree = payload.to_tree().unwrap();
        assert_eq!(tree["FirstName"], json!("Joanna"));
        assert_eq!(tree["ContactStatusId"], json!("1"));

        let keys: Vec<&String> = tree.as_object().unwrap().keys().collect();
        assert_eq!(keys[0], "FirstName");
    }

    #[test]
    fn mark_existing_drops_create_only_fields() {
        let mut payload = payload();
        payload.mark_existing(ContactId::from(99));
        assert!(payload.is_update());

        let wire = payload.to_wire().unwrap();
        assert_eq!(wire["Id"], json!(99));
        assert!(wire.get("ContactEmailAddresses").is_none());
        assert!(wire.get("ContactTypeId").is_none());
        assert!(wire.get("ContactLeadSources").is_none());
    }

    #[test]
    fn label_only_entries_are_not_sent() {
        let mut payload = payload();
        payload.phone_numbers[0].phone_number.clear();
        payload.physical_addresses = vec![AddressEntry {
            physical_address_label_id: ADDRESS_LABEL_PRIMARY,
            address1: String::new(),
            address2: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: String::new(),
        }];

        let tree = payload.to_tree().unwrap();
        assert_eq!(tree["ContactPhoneNumbers"].as_array().unwrap().len(), 1);
        assert_eq!(tree["ContactPhysicalAddresses"].as_array().unwrap().len(), 1);

        let wire = payload.to_wire().unwrap();
        assert!(wire.get("ContactPhoneNumbers").is_none());
        assert!(wire.get("ContactPhysicalAddresses").is_none());
    }

    #[test]
    fn wire_form_is_pruned() {
        let wire = payload().to_wire().unwrap();
        assert!(wire.get("Notes").is_none());
        assert!(wire.get("ContactPhysicalAddresses").is_none());
        assert!(wire.get("ContactAttributes").is_none());
        assert_eq!(wire["FirstName"], json!("Jo"));
    }
}
