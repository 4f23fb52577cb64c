use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod youtube;

use crate::{utils, Result, SongdlError};

/// A single video hit returned by a search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Video id
    pub id: String,

    /// Video title if the page carried one
    pub title: Option<String>,

    /// Channel name
    pub channel: Option<String>,

    /// Duration as displayed by the site (e.g. "5:55")
    pub duration: Option<String>,

    /// View count as displayed by the site
    pub views: Option<String>,

    /// Path of the watch page relative to the site root, e.g. `/watch?v=fJ9rUzIMcZQ`
    pub url_suffix: String,
}

/// Trait for looking up videos by free-text query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a single query and return the hits in ranking order
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Get the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Maps a song name to a playable URL by taking the provider's first hit.
///
/// The first hit is not always the right recording; there is no ranking or
/// disambiguation on top of what the provider returns.
pub struct Resolver {
    provider: Box<dyn SearchProvider>,
    base_url: String,
}

impl Resolver {
    pub fn new(provider: Box<dyn SearchProvider>, base_url: impl Into<String>) -> Self {
        Self {
            provider,
            base_url: base_url.into(),
        }
    }

    /// Resolve a song name to `base_url` + the first result's path suffix
    pub async fn resolve(&self, song: &str) -> Result<String> {
        tracing::debug!("Searching {} for: {:?}", self.provider.provider_name(), song);

        let results = self.provider.search(song).await?;
        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| SongdlError::NoSearchResults(song.to_string()))?;

        let url = format!("{}{}", self.base_url, first.url_suffix);
        utils::validate_url(&url)?;

        tracing::debug!(
            "Resolved {:?} to {} ({})",
            song,
            url,
            first.title.as_deref().unwrap_or("untitled")
        );

        Ok(url)
    }
}
