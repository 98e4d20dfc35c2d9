//! Funnel metrics per recommendation variant.
//!
//! Events are folded into per-variant counters. Counters form a
//! commutative monoid under [`FunnelCounts::merge`], so partial
//! aggregations computed at different times or by different replicas
//! combine into exactly the result of a single full scan. Rates are only
//! derived at the end, from the merged counters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Bucket for events that carry no variant group.
pub const UNKNOWN_VARIANT: &str = "unknown";

/// Metadata key holding the variant group an event was shown under.
pub const VARIANT_METADATA_KEY: &str = "variantGroupId";

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Impression,
    Click,
    AddToCart,
    Purchase,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Impression => "impression",
            Self::Click => "click",
            Self::AddToCart => "add_to_cart",
            Self::Purchase => "purchase",
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "impression" => Ok(Self::Impression),
            "click" => Ok(Self::Click),
            "add_to_cart" => Ok(Self::AddToCart),
            "purchase" => Ok(Self::Purchase),
            other => Err(CoreError::Validation(format!(
                "Unknown event type '{other}'"
            ))),
        }
    }
}

/// Variant group recorded in an event's metadata, if any.
pub fn variant_of(metadata: &serde_json::Value) -> Option<&str> {
    metadata
        .get(VARIANT_METADATA_KEY)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Raw funnel counters for one variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FunnelCounts {
    pub impressions: u64,
    pub clicks: u64,
    pub add_to_carts: u64,
    pub purchases: u64,
}

impl FunnelCounts {
    pub fn record(&mut self, event_type: EventType) {
        match event_type {
            EventType::Impression => self.impressions += 1,
            EventType::Click => self.clicks += 1,
            EventType::AddToCart => self.add_to_carts += 1,
            EventType::Purchase => self.purchases += 1,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            impressions: self.impressions + other.impressions,
            clicks: self.clicks + other.clicks,
            add_to_carts: self.add_to_carts + other.add_to_carts,
            purchases: self.purchases + other.purchases,
        }
    }

    pub fn metrics(&self) -> VariantMetrics {
        VariantMetrics {
            impressions: self.impressions,
            clicks: self.clicks,
            add_to_carts: self.add_to_carts,
            purchases: self.purchases,
            ctr: rate(self.clicks, self.impressions),
            conversion_rate: rate(self.purchases, self.impressions),
        }
    }
}

/// Reported metrics for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub add_to_carts: u64,
    pub purchases: u64,
    pub ctr: f64,
    pub conversion_rate: f64,
}

/// `numerator / denominator`, or `0.0` when there is no denominator.
fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Counters keyed by variant group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    groups: BTreeMap<String, FunnelCounts>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the aggregation.
    pub fn record(&mut self, event_type: EventType, variant_group_id: Option<&str>) {
        let key = variant_group_id.unwrap_or(UNKNOWN_VARIANT);
        self.groups
            .entry(key.to_string())
            .or_default()
            .record(event_type);
    }

    /// Combine two partial aggregations.
    pub fn merge(mut self, other: Self) -> Self {
        for (group, counts) in other.groups {
            let entry = self.groups.entry(group).or_default();
            *entry = entry.merge(counts);
        }
        self
    }

    pub fn counts(&self, variant_group_id: &str) -> Option<&FunnelCounts> {
        self.groups.get(variant_group_id)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Final per-variant metrics.
    pub fn metrics(&self) -> BTreeMap<String, VariantMetrics> {
        self.groups
            .iter()
            .map(|(group, counts)| (group.clone(), counts.metrics()))
            .collect()
    }
}

/// Fold a sequence of `(event type, variant group)` facts.
pub fn aggregate<'a, I>(events: I) -> Aggregation
where
    I: IntoIterator<Item = (EventType, Option<&'a str>)>,
{
    let mut aggregation = Aggregation::new();
    for (event_type, variant) in events {
        aggregation.record(event_type, variant);
    }
    aggregation
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ctr_and_conversion_from_literal_events() {
        let events = [
            (EventType::Impression, Some("v1")),
            (EventType::Impression, Some("v1")),
            (EventType::Impression, Some("v1")),
            (EventType::Click, Some("v1")),
            (EventType::Purchase, Some("v1")),
        ];
        let metrics = aggregate(events).metrics();
        let v1 = metrics["v1"];
        assert_eq!(v1.impressions, 3);
        assert_eq!(v1.clicks, 1);
        assert_eq!(v1.purchases, 1);
        assert!((v1.ctr - 1.0 / 3.0).abs() < 1e-12);
        assert!((v1.conversion_rate - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_impressions_yield_zero_rates() {
        let events = [(EventType::Click, Some("v1")), (EventType::Purchase, Some("v1"))];
        let v1 = aggregate(events).metrics()["v1"];
        assert_eq!(v1.ctr, 0.0);
        assert_eq!(v1.conversion_rate, 0.0);
        assert!(!v1.ctr.is_nan());
    }

    #[test]
    fn events_without_variant_bucket_as_unknown() {
        let events = [(EventType::Impression, None), (EventType::AddToCart, None)];
        let agg = aggregate(events);
        let unknown = agg.counts(UNKNOWN_VARIANT).unwrap();
        assert_eq!(unknown.impressions, 1);
        assert_eq!(unknown.add_to_carts, 1);
    }

    #[test]
    fn empty_stream_is_empty() {
        assert!(aggregate(std::iter::empty()).is_empty());
    }

    #[test]
    fn variant_read_from_metadata() {
        let meta = serde_json::json!({ "variantGroupId": "g7", "source": "pdp" });
        assert_eq!(variant_of(&meta), Some("g7"));
        assert_eq!(variant_of(&serde_json::json!({ "variantGroupId": "" })), None);
        assert_eq!(variant_of(&serde_json::json!({})), None);
        assert_eq!(variant_of(&serde_json::Value::Null), None);
    }

    #[test]
    fn event_type_round_trips_through_str() {
        for t in [
            EventType::Impression,
            EventType::Click,
            EventType::AddToCart,
            EventType::Purchase,
        ] {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
        assert!("view".parse::<EventType>().is_err());
    }

    fn event_strategy() -> impl Strategy<Value = (EventType, Option<&'static str>)> {
        let event_type = prop_oneof![
            Just(EventType::Impression),
            Just(EventType::Click),
            Just(EventType::AddToCart),
            Just(EventType::Purchase),
        ];
        let variant = prop_oneof![Just(None), Just(Some("a")), Just(Some("b"))];
        (event_type, variant)
    }

    proptest! {
        #[test]
        fn split_fold_equals_full_fold(
            events in prop::collection::vec(event_strategy(), 0..200),
            split in 0usize..200,
        ) {
            let split = split.min(events.len());
            let (left, right) = events.split_at(split);
            let merged = aggregate(left.iter().copied()).merge(aggregate(right.iter().copied()));
            prop_assert_eq!(merged, aggregate(events.iter().copied()));
        }

        #[test]
        fn fold_ignores_event_order(events in prop::collection::vec(event_strategy(), 0..200)) {
            let mut reversed = events.clone();
            reversed.reverse();
            prop_assert_eq!(
                aggregate(events.iter().copied()),
                aggregate(reversed.iter().copied())
            );
        }

        #[test]
        fn merge_is_commutative(
            a in prop::collection::vec(event_strategy(), 0..100),
            b in prop::collection::vec(event_strategy(), 0..100),
        ) {
            let ab = aggregate(a.iter().copied()).merge(aggregate(b.iter().copied()));
            let ba = aggregate(b.iter().copied()).merge(aggregate(a.iter().copied()));
            prop_assert_eq!(ab, ba);
        }
    }
}
