use std::collections::{HashMap, HashSet};

use abook_store::EntityStore;
use abook_types::{AddressId, Addressbook, Contact, Org};

use crate::error::RegistryResult;
use crate::member::Member;
use crate::registry::{Registry, RegistryStats};

/// Result of a full registry audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub stats: RegistryStats,
    pub violations: Vec<Violation>,
}

impl ConsistencyReport {
    /// Returns `true` if no invariant is broken.
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// One broken invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// One side of a membership lists the other, but not vice versa.
    AsymmetricMembership,
    /// An addressbook lists an entity that does not exist.
    DanglingMember,
    /// An entity claims membership in an addressbook that does not exist.
    DanglingMembership,
    /// A member id or membership appears more than once in one list.
    DuplicateMembership,
    /// An entity is not a member of "all".
    MissingFromAll,
    /// An entity references an address that does not exist.
    DanglingAddress,
    /// Two entities reference the same address.
    SharedAddress,
    /// An address no entity references.
    OrphanAddress,
    /// The reserved name is missing, duplicated, or on the wrong addressbook.
    ReservedName,
}

/// Audits every cross-index invariant of a [`Registry`].
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    pub fn validate(registry: &Registry) -> RegistryResult<ConsistencyReport> {
        let _gate = registry.shared()?;
        let addressbooks = registry.addressbooks.values()?;
        let mut violations = Vec::new();

        check_reserved_name(registry, &addressbooks, &mut violations);

        let mut owners: HashMap<AddressId, usize> = HashMap::new();
        check_members::<Contact>(registry, &addressbooks, &mut owners, &mut violations)?;
        check_members::<Org>(registry, &addressbooks, &mut owners, &mut violations)?;

        for (address_id, count) in &owners {
            if *count > 1 {
                violations.push(Violation {
                    kind: ViolationKind::SharedAddress,
                    description: format!("address {address_id} has {count} owners"),
                });
            }
        }
        for address_id in registry.addresses.keys()? {
            if !owners.contains_key(&address_id) {
                violations.push(Violation {
                    kind: ViolationKind::OrphanAddress,
                    description: format!("address {address_id} has no owner"),
                });
            }
        }

        let stats = RegistryStats {
            addressbooks: addressbooks.len(),
            contacts: registry.contacts.len()?,
            orgs: registry.orgs.len()?,
            addresses: registry.addresses.len()?,
        };
        Ok(ConsistencyReport { stats, violations })
    }
}

fn check_reserved_name(
    registry: &Registry,
    addressbooks: &[Addressbook],
    violations: &mut Vec<Violation>,
) {
    let reserved: Vec<&Addressbook> = addressbooks
        .iter()
        .filter(|ab| ab.has_reserved_name())
        .collect();
    match reserved.as_slice() {
        [only] if registry.is_all(&only.id) => {}
        [] => violations.push(Violation {
            kind: ViolationKind::ReservedName,
            description: "no addressbook carries the reserved name".into(),
        }),
        found => violations.push(Violation {
            kind: ViolationKind::ReservedName,
            description: format!(
                "reserved name held by {} addressbook(s), expected only {}",
                found.len(),
                registry.all_addressbook_id()
            ),
        }),
    }
}

fn check_members<M: Member>(
    registry: &Registry,
    addressbooks: &[Addressbook],
    owners: &mut HashMap<AddressId, usize>,
    violations: &mut Vec<Violation>,
) -> RegistryResult<()> {
    let entities: HashMap<M::Key, M> = M::store(registry)
        .values()?
        .into_iter()
        .map(|entity| (entity.key().clone(), entity))
        .collect();
    let books: HashMap<_, _> = addressbooks.iter().map(|ab| (&ab.id, ab)).collect();

    // addressbook side
    for addressbook in addressbooks {
        let mut seen = HashSet::new();
        for id in M::member_ids(addressbook) {
            if !seen.insert(id) {
                violations.push(Violation {
                    kind: ViolationKind::DuplicateMembership,
                    description: format!("addressbook {} lists {} {id} twice", addressbook.id, M::KIND),
                });
            }
            match entities.get(id) {
                None => violations.push(Violation {
                    kind: ViolationKind::DanglingMember,
                    description: format!(
                        "addressbook {} lists missing {} {id}",
                        addressbook.id,
                        M::KIND
                    ),
                }),
                Some(entity) if !entity.memberships().contains(&addressbook.id) => {
                    violations.push(Violation {
                        kind: ViolationKind::AsymmetricMembership,
                        description: format!(
                            "addressbook {} lists {} {id}, which does not list it back",
                            addressbook.id,
                            M::KIND
                        ),
                    })
                }
                Some(_) => {}
            }
        }
    }

    // entity side
    for (id, entity) in &entities {
        let mut seen = HashSet::new();
        for addressbook_id in entity.memberships() {
            if !seen.insert(addressbook_id) {
                violations.push(Violation {
                    kind: ViolationKind::DuplicateMembership,
                    description: format!("{} {id} lists addressbook {addressbook_id} twice", M::KIND),
                });
            }
            match books.get(addressbook_id) {
                None => violations.push(Violation {
                    kind: ViolationKind::DanglingMembership,
                    description: format!(
                        "{} {id} is a member of missing addressbook {addressbook_id}",
                        M::KIND
                    ),
                }),
                Some(addressbook) if !M::member_ids(addressbook).contains(id) => {
                    violations.push(Violation {
                        kind: ViolationKind::AsymmetricMembership,
                        description: format!(
                            "{} {id} lists addressbook {addressbook_id}, which does not list it back",
                            M::KIND
                        ),
                    })
                }
                Some(_) => {}
            }
        }
        if !entity.memberships().contains(registry.all_addressbook_id()) {
            violations.push(Violation {
                kind: ViolationKind::MissingFromAll,
                description: format!("{} {id} is not a member of all", M::KIND),
            });
        }
        for address_id in entity.address_ids() {
            if !registry.addresses.contains(address_id)? {
                violations.push(Violation {
                    kind: ViolationKind::DanglingAddress,
                    description: format!("{} {id} references missing address {address_id}", M::KIND),
                });
            }
            *owners.entry(address_id.clone()).or_default() += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abook_types::{Address, AddressbookId, AttributeType, ContactId, Principal};
    use proptest::prelude::*;

    fn kinds(report: &ConsistencyReport) -> Vec<ViolationKind> {
        report.violations.iter().map(|v| v.kind).collect()
    }

    fn populated() -> (Registry, AddressbookId, Contact) {
        let p = Principal::new("t");
        let registry = Registry::new(&p).unwrap();
        let sales = registry.create_addressbook(Addressbook::named("Sales"), &p).unwrap();
        let contact = registry
            .create_member(&sales.id, Contact::named(Some("Ada"), None), &p)
            .unwrap();
        registry
            .create_address::<Contact>(
                &sales.id,
                &contact.id,
                Address::phone(AttributeType::Home, "1"),
                &p,
            )
            .unwrap();
        (registry, sales.id, contact)
    }

    #[test]
    fn fresh_registry_is_consistent() {
        let (registry, _, _) = populated();
        let report = ConsistencyValidator::validate(&registry).unwrap();
        assert!(report.is_consistent(), "{:?}", report.violations);
        assert_eq!(report.stats.contacts, 1);
        assert_eq!(report.stats.addresses, 1);
    }

    #[test]
    fn detects_asymmetric_membership() {
        let (registry, sales, contact) = populated();
        registry
            .addressbooks
            .modify(&sales, |ab| ab.contact_ids.clear())
            .unwrap();
        let report = ConsistencyValidator::validate(&registry).unwrap();
        assert_eq!(kinds(&report), vec![ViolationKind::AsymmetricMembership]);
        assert!(report.violations[0].description.contains(contact.id.as_str()));
    }

    #[test]
    fn detects_dangling_member_and_missing_all() {
        let (registry, sales, contact) = populated();
        registry
            .addressbooks
            .modify(&sales, |ab| ab.contact_ids.push(ContactId::new("ghost")))
            .unwrap();
        let all = registry.all_addressbook_id().clone();
        registry
            .contacts
            .modify(&contact.id, |c| c.memberships.retain(|id| *id != all))
            .unwrap();
        let report = ConsistencyValidator::validate(&registry).unwrap();
        let found = kinds(&report);
        assert!(found.contains(&ViolationKind::DanglingMember));
        assert!(found.contains(&ViolationKind::MissingFromAll));
        assert!(found.contains(&ViolationKind::AsymmetricMembership));
    }

    #[test]
    fn detects_address_problems() {
        let (registry, _, contact) = populated();
        registry.addresses.put(Address {
            id: AddressId::new("stray"),
            ..Address::phone(AttributeType::Home, "2")
        })
        .unwrap();
        registry
            .contacts
            .modify(&contact.id, |c| c.address_ids.push(AddressId::new("gone")))
            .unwrap();
        let found = kinds(&ConsistencyValidator::validate(&registry).unwrap());
        assert!(found.contains(&ViolationKind::OrphanAddress));
        assert!(found.contains(&ViolationKind::DanglingAddress));
    }

    #[derive(Clone, Debug)]
    enum Op {
        CreateBook(u8),
        DeleteBook(u8),
        CreateContact(u8),
        CreateOrg(u8),
        AttachContact(u8, u8),
        DeleteContact(u8, u8),
        DeleteOrg(u8, u8),
        AddAddress(u8),
        RemoveAddress(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u8>().prop_map(Op::CreateBook),
            any::<u8>().prop_map(Op::DeleteBook),
            any::<u8>().prop_map(Op::CreateContact),
            any::<u8>().prop_map(Op::CreateOrg),
            (any::<u8>(), any::<u8>()).prop_map(|(a, b)| Op::AttachContact(a, b)),
            (any::<u8>(), any::<u8>()).prop_map(|(a, b)| Op::DeleteContact(a, b)),
            (any::<u8>(), any::<u8>()).prop_map(|(a, b)| Op::DeleteOrg(a, b)),
            any::<u8>().prop_map(Op::AddAddress),
            any::<u8>().prop_map(Op::RemoveAddress),
        ]
    }

    fn pick<T: Clone>(items: &[T], index: u8) -> Option<T> {
        if items.is_empty() {
            None
        } else {
            Some(items[index as usize % items.len()].clone())
        }
    }

    fn apply(registry: &Registry, p: &Principal, op: Op) {
        let books: Vec<AddressbookId> = registry
            .list_addressbooks()
            .unwrap()
            .into_iter()
            .map(|ab| ab.id)
            .collect();
        let contacts: Vec<Contact> = registry.list_all_members().unwrap();
        let orgs: Vec<Org> = registry.list_all_members().unwrap();

        // Individual operations may fail (not a member, duplicate, ...);
        // only the resulting state matters.
        match op {
            Op::CreateBook(n) => {
                let _ = registry.create_addressbook(Addressbook::named(format!("book-{n}")), p);
            }
            Op::DeleteBook(i) => {
                if let Some(id) = pick(&books, i) {
                    let _ = registry.delete_addressbook(&id, p);
                }
            }
            Op::CreateContact(i) => {
                if let Some(book) = pick(&books, i) {
                    let _ = registry.create_member(&book, Contact::named(Some("c"), None), p);
                }
            }
            Op::CreateOrg(i) => {
                if let Some(book) = pick(&books, i) {
                    let _ = registry.create_member(&book, Org::named("o"), p);
                }
            }
            Op::AttachContact(c, b) => {
                if let (Some(contact), Some(book)) = (pick(&contacts, c), pick(&books, b)) {
                    let input = Contact {
                        id: contact.id,
                        ..Default::default()
                    };
                    let _ = registry.create_member(&book, input, p);
                }
            }
            Op::DeleteContact(c, b) => {
                if let (Some(contact), Some(book)) = (pick(&contacts, c), pick(&books, b)) {
                    let _ = registry.delete_member::<Contact>(&book, &contact.id, p);
                }
            }
            Op::DeleteOrg(o, b) => {
                if let (Some(org), Some(book)) = (pick(&orgs, o), pick(&books, b)) {
                    let _ = registry.delete_member::<Org>(&book, &org.id, p);
                }
            }
            Op::AddAddress(c) => {
                if let Some(contact) = pick(&contacts, c) {
                    let _ = registry.create_address::<Contact>(
                        registry.all_addressbook_id(),
                        &contact.id,
                        Address::email(AttributeType::Work, "x@example.org"),
                        p,
                    );
                }
            }
            Op::RemoveAddress(c) => {
                if let Some(contact) = pick(&contacts, c) {
                    if let Some(address_id) = contact.address_ids.first() {
                        let _ = registry.delete_address::<Contact>(
                            registry.all_addressbook_id(),
                            &contact.id,
                            address_id,
                            p,
                        );
                    }
                }
            }
        }
    }

    proptest! {
        #[test]
        fn random_operations_keep_registry_consistent(ops in prop::collection::vec(op(), 1..60)) {
            let p = Principal::new("prop");
            let registry = Registry::new(&p).unwrap();
            for op in ops {
                apply(&registry, &p, op);
                let report = ConsistencyValidator::validate(&registry).unwrap();
                prop_assert!(report.is_consistent(), "{:?}", report.violations);
            }

            let restored = Registry::restore(registry.to_documents().unwrap(), &p).unwrap();
            prop_assert_eq!(restored.stats().unwrap(), registry.stats().unwrap());
            prop_assert!(ConsistencyValidator::validate(&restored).unwrap().is_consistent());
        }
    }
}
