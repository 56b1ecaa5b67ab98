//! Account identities as they appear on the wire and in the results file

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a player account on a given platform
///
/// Only `account_id` is used as a dedup key; `account_kind` is carried along
/// so requests can be built for the right platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    #[serde(rename = "membershipId")]
    pub account_id: String,

    #[serde(rename = "membershipType")]
    pub account_kind: i32,
}

impl AccountRef {
    pub fn new(account_id: impl Into<String>, account_kind: i32) -> Self {
        Self {
            account_id: account_id.into(),
            account_kind,
        }
    }

    /// Kind 0 marks a cross-save placeholder that cannot be inspected
    pub fn is_placeholder(&self) -> bool {
        self.account_kind == 0
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_kind, self.account_id)
    }
}

/// A qualifying account, as stored in the results file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredAccount {
    #[serde(rename = "membershipId")]
    pub account_id: String,

    #[serde(rename = "membershipType")]
    pub account_kind: i32,

    #[serde(rename = "collectibleState")]
    pub collectible_state: u32,
}

impl DiscoveredAccount {
    pub fn new(account: &AccountRef, collectible_state: u32) -> Self {
        Self {
            account_id: account.account_id.clone(),
            account_kind: account.account_kind,
            collectible_state,
        }
    }

    pub fn account_ref(&self) -> AccountRef {
        AccountRef::new(self.account_id.clone(), self.account_kind)
    }
}
