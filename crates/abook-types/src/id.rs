use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares an opaque string identifier for one entity kind.
///
/// Server-assigned ids are UUID v7 strings so that they sort by creation
/// time. An empty id means "not assigned yet" and is how a client signals a
/// genuinely new entity.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh time-ordered identifier (UUID v7).
            pub fn generate() -> Self {
                Self(uuid::Uuid::now_v7().to_string())
            }

            /// Wrap an existing identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if no identifier has been assigned.
            pub fn is_unassigned(&self) -> bool {
                self.0.trim().is_empty()
            }

        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`Addressbook`](crate::Addressbook).
    AddressbookId
);
entity_id!(
    /// Identifier of a [`Contact`](crate::Contact).
    ContactId
);
entity_id!(
    /// Identifier of an [`Org`](crate::Org).
    OrgId
);
entity_id!(
    /// Identifier of an [`Address`](crate::Address).
    AddressId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = ContactId::generate();
        let b = ContactId::generate();
        assert_ne!(a, b);
        assert!(!a.is_unassigned());
    }

    #[test]
    fn default_is_unassigned() {
        assert!(OrgId::default().is_unassigned());
        assert!(OrgId::new("  ").is_unassigned());
        assert!(!OrgId::new("o-1").is_unassigned());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = AddressbookId::new("ab-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ab-1\"");
        let parsed: AddressbookId = serde_json::from_str("\"ab-1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn debug_and_display() {
        let id = ContactId::new("c-1");
        assert_eq!(format!("{id}"), "c-1");
        assert_eq!(format!("{id:?}"), "ContactId(c-1)");
    }
}
