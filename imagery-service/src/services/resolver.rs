//! Category-routed fetch-with-fallback chain.
//!
//! A category maps to an ordered list of tiers: its primary source (if any),
//! a keyword search with a category phrase, and finally the static pool. The
//! first tier that yields an image wins; the pool never fails, so
//! [`FallbackResolver::resolve`] always produces a URL.

use crate::models::Category;
use crate::services::metrics;
use crate::services::sources::{ImageSource, StaticPool};
use std::sync::Arc;

/// Primary source kinds a chain can start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimarySource {
    Space,
    Art,
    Nature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary(PrimarySource),
    Search(&'static str),
    StaticPool,
}

impl Tier {
    fn label(&self) -> &'static str {
        match self {
            Tier::Primary(_) => "primary",
            Tier::Search(_) => "search",
            Tier::StaticPool => "static_pool",
        }
    }
}

/// Ordered tiers for one category. Pure configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    pub category: Category,
    pub tiers: Vec<Tier>,
}

impl FallbackChain {
    pub fn for_category(category: Category) -> Self {
        let (primary, phrase) = match category {
            Category::Space => (Some(PrimarySource::Space), "space telescope nebula galaxy"),
            Category::Art => (Some(PrimarySource::Art), "classical art museum painting"),
            Category::Earth => (Some(PrimarySource::Nature), "natural scenery"),
            Category::Other => (None, "scenic photography"),
        };

        let mut tiers = Vec::with_capacity(3);
        if let Some(primary) = primary {
            tiers.push(Tier::Primary(primary));
        }
        tiers.push(Tier::Search(phrase));
        tiers.push(Tier::StaticPool);

        Self { category, tiers }
    }
}

pub struct FallbackResolver {
    space: Arc<dyn ImageSource>,
    art: Arc<dyn ImageSource>,
    nature: Arc<dyn ImageSource>,
    search: Arc<dyn ImageSource>,
    pool: StaticPool,
}

impl FallbackResolver {
    pub fn new(
        space: Arc<dyn ImageSource>,
        art: Arc<dyn ImageSource>,
        nature: Arc<dyn ImageSource>,
        search: Arc<dyn ImageSource>,
        pool: StaticPool,
    ) -> Self {
        Self {
            space,
            art,
            nature,
            search,
            pool,
        }
    }

    fn primary(&self, source: PrimarySource) -> &Arc<dyn ImageSource> {
        match source {
            PrimarySource::Space => &self.space,
            PrimarySource::Art => &self.art,
            PrimarySource::Nature => &self.nature,
        }
    }

    /// Resolve a category to an image URL. Never fails.
    #[tracing::instrument(skip(self), fields(category = %category))]
    pub async fn resolve(&self, category: Category) -> String {
        let chain = FallbackChain::for_category(category);

        for tier in &chain.tiers {
            let url = match tier {
                Tier::Primary(source) => self.primary(*source).fetch(None).await.map(|i| i.url),
                Tier::Search(phrase) => self.search.fetch(Some(phrase)).await.map(|i| i.url),
                Tier::StaticPool => Some(self.pool.pick()),
            };

            if let Some(url) = url {
                metrics::record_fallback_tier(category.as_str(), tier.label());
                tracing::info!(tier = tier.label(), url = %url, "Resolved image");
                return url;
            }
        }

        // Every chain ends with the pool; this is only reached if that changes.
        self.pool.pick()
    }
}
