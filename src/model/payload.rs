//! Typed provider responses
//!
//! Only the fields the crawl reads are modelled; everything else in the
//! provider's payloads is ignored by serde.

use crate::model::AccountRef;
use crate::CrawlError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A profile component wrapper; `data` is absent when the component is private
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Account snapshot with the `Characters` and `Collectibles` components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<Component<BTreeMap<String, serde_json::Value>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_collectibles: Option<Component<ProfileCollectibles>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileCollectibles {
    #[serde(default)]
    pub collectibles: BTreeMap<String, CollectibleComponent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectibleComponent {
    pub state: u32,
}

impl ProfileSnapshot {
    /// The collectibles table, or `None` when the component is missing or private
    pub fn collectibles(&self) -> Option<&ProfileCollectibles> {
        self.profile_collectibles
            .as_ref()
            .and_then(|component| component.data.as_ref())
    }

    /// Raw state of one collectible
    ///
    /// Returns `Ok(None)` when the account has no collectibles table at all,
    /// and an error when the table exists but lacks `collectible_id`.
    pub fn collectible_state(
        &self,
        account: &AccountRef,
        collectible_id: &str,
    ) -> Result<Option<u32>, CrawlError> {
        let Some(table) = self.collectibles() else {
            return Ok(None);
        };

        table
            .collectibles
            .get(collectible_id)
            .map(|c| Some(c.state))
            .ok_or_else(|| CrawlError::MissingField {
                field: "profileCollectibles.data.collectibles",
                context: format!("collectible {} on account {}", collectible_id, account),
            })
    }

    /// Character ids of the account, in a stable order
    pub fn character_ids(&self, account: &AccountRef) -> Result<Vec<String>, CrawlError> {
        self.characters
            .as_ref()
            .and_then(|component| component.data.as_ref())
            .map(|data| data.keys().cloned().collect())
            .ok_or_else(|| CrawlError::MissingField {
                field: "characters.data",
                context: format!("account {}", account),
            })
    }
}

/// One page of a character's match history
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActivityHistory {
    #[serde(default)]
    pub activities: Option<Vec<Activity>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub activity_details: ActivityDetails,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetails {
    pub instance_id: String,
}

impl ActivityHistory {
    /// Match instance ids in this page
    pub fn match_ids(&self, context: &str) -> Result<Vec<String>, CrawlError> {
        self.activities
            .as_ref()
            .map(|list| {
                list.iter()
                    .map(|a| a.activity_details.instance_id.clone())
                    .collect()
            })
            .ok_or_else(|| CrawlError::MissingField {
                field: "activities",
                context: context.to_string(),
            })
    }
}

/// Full report of one match
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchReport {
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportEntry {
    pub player: ReportPlayer,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPlayer {
    pub destiny_user_info: AccountRef,
}

impl MatchReport {
    /// Account identities of every participant, in report order
    pub fn participants(&self) -> impl Iterator<Item = &AccountRef> {
        self.entries.iter().map(|e| &e.player.destiny_user_info)
    }
}
