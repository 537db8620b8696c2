//! Partial event data merged in by application code.

use std::collections::HashMap;

use serde_json::{Map, Value};
use widelog_events::{PerformanceMetrics, UserContext, WideEvent};

/// A bundle of optional additions to the current event.
///
/// Every section is merged, never replaced: user fields merge field by
/// field, the mapping sections merge key by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    /// User fields to merge.
    pub user: Option<UserContext>,
    /// Business keys to merge.
    pub business: Option<Map<String, Value>>,
    /// Performance counters to merge.
    pub performance: Option<PerformanceMetrics>,
    /// Feature flags to merge.
    pub feature_flags: Option<HashMap<String, bool>>,
}

impl Enrichment {
    /// Create an empty enrichment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge user fields.
    #[must_use]
    pub fn with_user(mut self, user: UserContext) -> Self {
        match &mut self.user {
            Some(existing) => existing.merge(user),
            None => self.user = Some(user),
        }
        self
    }

    /// Add one business key.
    #[must_use]
    pub fn with_business(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.business
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a map of business keys.
    #[must_use]
    pub fn with_business_map(mut self, partial: Map<String, Value>) -> Self {
        self.business.get_or_insert_with(Map::new).extend(partial);
        self
    }

    /// Merge performance counters.
    #[must_use]
    pub fn with_performance(mut self, performance: PerformanceMetrics) -> Self {
        self.performance
            .get_or_insert_with(PerformanceMetrics::default)
            .merge(performance);
        self
    }

    /// Add one feature flag.
    #[must_use]
    pub fn with_feature_flag(mut self, flag: impl Into<String>, enabled: bool) -> Self {
        self.feature_flags
            .get_or_insert_with(HashMap::new)
            .insert(flag.into(), enabled);
        self
    }

    /// Whether there is nothing to merge.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.business.is_none()
            && self.performance.is_none()
            && self.feature_flags.is_none()
    }

    /// Merge every present section into `event`.
    pub fn apply_to(self, event: &mut WideEvent) {
        if let Some(user) = self.user {
            event.merge_user(user);
        }
        if let Some(business) = self.business {
            event.merge_business(business);
        }
        if let Some(performance) = self.performance {
            event.merge_performance(performance);
        }
        if let Some(flags) = self.feature_flags {
            event.merge_feature_flags(flags);
        }
    }
}
