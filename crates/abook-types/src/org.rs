use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::id::{AddressId, AddressbookId, OrgId};

/// Legal or social form of an organization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgType {
    Clique,
    Coop,
    Company,
    Corporation,
    Government,
    Holding,
    Nonprofit,
    #[default]
    Other,
}

impl fmt::Display for OrgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clique => "CLIQUE",
            Self::Coop => "COOP",
            Self::Company => "COMPANY",
            Self::Corporation => "CORPORATION",
            Self::Government => "GOVERNMENT",
            Self::Holding => "HOLDING",
            Self::Nonprofit => "NONPROFIT",
            Self::Other => "OTHER",
        };
        f.write_str(name)
    }
}

/// An organization, shared across any number of addressbooks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Org {
    pub id: OrgId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_type: Option<OrgType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
    /// Every addressbook this org belongs to, including "all".
    pub memberships: Vec<AddressbookId>,
    pub address_ids: Vec<AddressId>,
}

impl Org {
    /// An unsaved org with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Copy the name, type, and profile fields from `input`.
    pub fn copy_mutable_fields(&mut self, input: &Org) {
        self.name = input.name.clone();
        self.org_type = input.org_type;
        self.description = input.description.clone();
        self.cost_center = input.cost_center.clone();
        self.stock_exchange = input.stock_exchange.clone();
        self.ticker_symbol = input.ticker_symbol.clone();
        self.logo_url = input.logo_url.clone();
    }
}
