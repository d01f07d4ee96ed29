use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::id::AddressId;

/// Kind of an address. Fixed at creation.
///
/// Declaration order is the default list ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    Phone,
    Email,
    Web,
    Messaging,
    Postal,
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Phone => "PHONE",
            Self::Email => "EMAIL",
            Self::Web => "WEB",
            Self::Messaging => "MESSAGING",
            Self::Postal => "POSTAL",
        };
        f.write_str(name)
    }
}

/// Which facet of the owner an address describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeType {
    Home,
    Work,
    Mobile,
    Fax,
    Main,
    Other,
}

/// Messaging network of a [`AddressType::Messaging`] address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Skype,
    Whatsapp,
    Telegram,
    Signal,
    Matrix,
    Other,
}

/// A single way of reaching a contact or org.
///
/// Which fields are meaningful depends on `address_type`: phone, email, and
/// web use `value`; messaging uses `value` and `msg_type`; postal uses the
/// street/postal code/city/country fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<AddressType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<AttributeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_type: Option<MessageType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Address {
    fn valued(kind: AddressType, attribute: AttributeType, value: impl Into<String>) -> Self {
        Self {
            address_type: Some(kind),
            attribute_type: Some(attribute),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn phone(attribute: AttributeType, number: impl Into<String>) -> Self {
        Self::valued(AddressType::Phone, attribute, number)
    }

    pub fn email(attribute: AttributeType, address: impl Into<String>) -> Self {
        Self::valued(AddressType::Email, attribute, address)
    }

    pub fn web(attribute: AttributeType, url: impl Into<String>) -> Self {
        Self::valued(AddressType::Web, attribute, url)
    }

    pub fn messaging(
        attribute: AttributeType,
        network: MessageType,
        handle: impl Into<String>,
    ) -> Self {
        Self {
            msg_type: Some(network),
            ..Self::valued(AddressType::Messaging, attribute, handle)
        }
    }

    pub fn postal(
        attribute: AttributeType,
        street: impl Into<String>,
        postal_code: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            address_type: Some(AddressType::Postal),
            attribute_type: Some(attribute),
            street: Some(street.into()),
            postal_code: Some(postal_code.into()),
            city: Some(city.into()),
            country: Some(country.into()),
            ..Default::default()
        }
    }

    /// Copy the attribute type and kind-specific fields from `input`. The
    /// address kind is not copied.
    pub fn copy_mutable_fields(&mut self, input: &Address) {
        self.attribute_type = input.attribute_type;
        self.msg_type = input.msg_type;
        self.value = input.value.clone();
        self.street = input.street.clone();
        self.postal_code = input.postal_code.clone();
        self.city = input.city.clone();
        self.country = input.country.clone();
    }

    /// Secondary key of the default list ordering.
    pub fn sort_value(&self) -> String {
        match self.address_type {
            Some(AddressType::Postal) => [&self.street, &self.postal_code, &self.city, &self.country]
                .iter()
                .filter_map(|part| part.as_deref())
                .collect::<Vec<_>>()
                .join(" "),
            _ => self.value.clone().unwrap_or_default(),
        }
    }
}
