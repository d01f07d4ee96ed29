//! Entity rules applied on create and update.
//!
//! Each function checks one entity kind and normalizes it in place: blank
//! optional strings become `None`, derived fields are filled in, and fields
//! that do not apply to an address's kind are cleared.

use abook_types::{Address, AddressType, Addressbook, Contact, Org, OrgType, ALL_ADDRESSBOOK_NAME};

use crate::error::{RegistryError, RegistryResult};

/// Validate a client-chosen addressbook name and return it trimmed.
pub fn addressbook_name(name: &str) -> RegistryResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::validation("addressbook name must not be empty"));
    }
    if Addressbook::is_reserved_name(trimmed) {
        return Err(RegistryError::validation(format!(
            "addressbook name '{ALL_ADDRESSBOOK_NAME}' is reserved"
        )));
    }
    Ok(trimmed.to_string())
}

/// A contact needs a first or last name; its full name is derived from
/// them.
pub fn contact(contact: &mut Contact) -> RegistryResult<()> {
    for field in [
        &mut contact.first_name,
        &mut contact.last_name,
        &mut contact.nick_name,
        &mut contact.maiden_name,
        &mut contact.prefix,
        &mut contact.suffix,
        &mut contact.company,
        &mut contact.department,
        &mut contact.job_title,
        &mut contact.birthday,
        &mut contact.photo_url,
        &mut contact.note,
    ] {
        trim_optional(field);
    }
    contact.full_name = contact.compose_full_name();
    if contact.full_name.is_none() {
        return Err(RegistryError::validation(
            "contact needs a first name or a last name",
        ));
    }
    Ok(())
}

/// An org needs a name. A missing type defaults to [`OrgType::Other`].
pub fn org(org: &mut Org) -> RegistryResult<()> {
    org.name = org.name.trim().to_string();
    if org.name.is_empty() {
        return Err(RegistryError::validation("org name must not be empty"));
    }
    org.org_type.get_or_insert(OrgType::Other);
    for field in [
        &mut org.description,
        &mut org.cost_center,
        &mut org.stock_exchange,
        &mut org.ticker_symbol,
        &mut org.logo_url,
    ] {
        trim_optional(field);
    }
    Ok(())
}

/// Check an address against the rules of its kind and clear the fields
/// that kind does not use. Returns the kind.
pub fn address(address: &mut Address) -> RegistryResult<AddressType> {
    let kind = address
        .address_type
        .ok_or_else(|| RegistryError::validation("address type is required"))?;
    if address.attribute_type.is_none() {
        return Err(RegistryError::validation("address attribute type is required"));
    }
    for field in [
        &mut address.value,
        &mut address.street,
        &mut address.postal_code,
        &mut address.city,
        &mut address.country,
    ] {
        trim_optional(field);
    }

    match kind {
        AddressType::Postal => {
            address.value = None;
            address.msg_type = None;
        }
        AddressType::Phone | AddressType::Email | AddressType::Web | AddressType::Messaging => {
            clear_postal(address);
            if address.value.is_none() {
                return Err(RegistryError::validation(format!(
                    "{kind} address needs a value"
                )));
            }
            if kind == AddressType::Messaging {
                if address.msg_type.is_none() {
                    return Err(RegistryError::validation(
                        "messaging address needs a message type",
                    ));
                }
            } else {
                address.msg_type = None;
            }
        }
    }
    Ok(kind)
}

/// The kind of an address is fixed at creation. An update that omits the
/// kind keeps the stored one.
pub fn address_kind_unchanged(
    stored: Option<AddressType>,
    submitted: Option<AddressType>,
) -> RegistryResult<()> {
    match (stored, submitted) {
        (Some(old), Some(new)) if old != new => Err(RegistryError::validation(format!(
            "address type cannot change from {old} to {new}"
        ))),
        _ => Ok(()),
    }
}

fn clear_postal(address: &mut Address) {
    address.street = None;
    address.postal_code = None;
    address.city = None;
    address.country = None;
}

fn trim_optional(field: &mut Option<String>) {
    *field = field
        .take()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
}
