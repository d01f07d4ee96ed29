//! List ordering and the position/size window.

use std::cmp::Ordering;

use abook_types::{Address, Addressbook, Contact, Org};
use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Parameters accepted by every list operation.
///
/// `query` and `query_type` are carried through to the logs but not
/// interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListQuery {
    pub query: Option<String>,
    pub query_type: Option<String>,
    pub position: usize,
    pub size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            query: None,
            query_type: None,
            position: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    pub fn window(position: usize, size: usize) -> Self {
        Self {
            position,
            size,
            ..Default::default()
        }
    }

    /// Stable-sort `items` with `compare`, then cut the window.
    pub fn apply<T, F>(&self, mut items: Vec<T>, compare: F) -> Vec<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        items.sort_by(compare);
        items
            .into_iter()
            .skip(self.position)
            .take(self.size)
            .collect()
    }
}

/// Default ordering of a listed entity kind.
pub trait DefaultOrder {
    fn default_order(a: &Self, b: &Self) -> Ordering;
}

impl DefaultOrder for Addressbook {
    fn default_order(a: &Self, b: &Self) -> Ordering {
        a.name.cmp(&b.name)
    }
}

impl DefaultOrder for Contact {
    fn default_order(a: &Self, b: &Self) -> Ordering {
        a.sort_name().cmp(b.sort_name())
    }
}

impl DefaultOrder for Org {
    fn default_order(a: &Self, b: &Self) -> Ordering {
        a.name.cmp(&b.name)
    }
}

impl DefaultOrder for Address {
    fn default_order(a: &Self, b: &Self) -> Ordering {
        a.address_type
            .cmp(&b.address_type)
            .then_with(|| a.sort_value().cmp(&b.sort_value()))
    }
}
