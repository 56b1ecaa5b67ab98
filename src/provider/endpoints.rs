//! Request URL construction
//!
//! Every URL is built from the configured base URL so the same code talks to
//! the real provider and to a local mock server.

use crate::model::AccountRef;
use crate::CrawlError;
use url::Url;

/// Components requested with every account snapshot
pub const PROFILE_COMPONENTS: &str = "Characters,Collectibles";

/// Builds the fully-resolved URLs for provider resources
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    title: String,
}

impl Endpoints {
    /// Creates a URL builder rooted at `base_url`
    ///
    /// # Arguments
    ///
    /// * `base_url` - e.g. `https://www.bungie.net/Platform`
    /// * `title` - Title path segment, e.g. `Destiny2`
    pub fn new(base_url: &str, title: &str) -> Result<Self, CrawlError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(CrawlError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            base,
            title: title.to_string(),
        })
    }

    /// Account snapshot with characters and collectibles
    pub fn profile(&self, account: &AccountRef) -> Result<Url, CrawlError> {
        let kind = account.account_kind.to_string();
        let mut url = self.join(&[
            self.title.as_str(),
            kind.as_str(),
            "Profile",
            account.account_id.as_str(),
            "",
        ])?;
        url.set_query(Some(&format!("components={}", PROFILE_COMPONENTS)));
        Ok(url)
    }

    /// First page of one character's match history
    pub fn activity_history(
        &self,
        account: &AccountRef,
        character_id: &str,
    ) -> Result<Url, CrawlError> {
        let kind = account.account_kind.to_string();
        self.join(&[
            self.title.as_str(),
            kind.as_str(),
            "Account",
            account.account_id.as_str(),
            "Character",
            character_id,
            "Stats",
            "Activities",
            "",
        ])
    }

    /// Full report of one match
    pub fn match_report(&self, match_id: &str) -> Result<Url, CrawlError> {
        self.join(&[self.title.as_str(), "Stats", "PostGameCarnageReport", match_id])
    }

    fn join(&self, segments: &[&str]) -> Result<Url, CrawlError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| CrawlError::InvalidUrl(self.base.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}
