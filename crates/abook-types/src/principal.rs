use std::fmt;

use serde::{Deserialize, Serialize};

/// The identity on whose behalf a mutation is performed.
///
/// Principals are opaque names; resolving them from credentials is the
/// caller's concern. Every mutating registry operation takes one and stamps
/// it into the entity's audit metadata.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Create a principal; blank names fall back to [`Principal::anonymous`].
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            Self::anonymous()
        } else {
            Self(name)
        }
    }

    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.0)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
