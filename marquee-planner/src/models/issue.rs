//! Verification issues
//!
//! One [`Issue`] per problem found in a verification pass. The message is
//! shown to users and sent back to the language model during refinement, so it
//! always names the venue, event or route concerned.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Plan has no venues or no events
    EmptyPlan,
    /// Places lookup returned no candidates
    VenueNotFound,
    /// Venue is permanently or temporarily closed
    VenueClosed,
    /// Places lookup failed (network, quota, parse)
    VenueLookupFailed,
    /// Event references a venue id not in the itinerary
    UnknownVenue,
    /// Event is held at a venue that failed verification
    UnverifiedVenue,
    /// Event does not end after it starts
    InvalidTimeRange,
    /// Event starts while its venue is closed
    OutsideOpeningHours,
    /// Route references an event id not in the itinerary
    UnknownEvent,
    /// Route endpoints have no coordinates to route between
    MissingCoordinates,
    /// Directions service found no route
    NoRouteFound,
    /// Directions lookup failed (network, quota, parse)
    RouteLookupFailed,
    /// Real travel time exceeds the scheduled gap
    InsufficientTravelTime,
    /// Destination event starts before the origin event ends
    EventsOutOfOrder,
    OverBudget,
    OutsideTimeWindow,
    /// Wall-clock budget ran out before the plan settled
    TimeBudgetExhausted,
}

impl IssueKind {
    /// Issues produced by a failed external call rather than by the plan itself
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, IssueKind::VenueLookupFailed | IssueKind::RouteLookupFailed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Venue, event or route id the issue is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: Some(entity_id.into()),
            message: message.into(),
        }
    }

    /// Issue about the plan as a whole
    pub fn plan_wide(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: None,
            message: message.into(),
        }
    }

    pub fn is_about(&self, entity_id: &str) -> bool {
        self.entity_id.as_deref() == Some(entity_id)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_serializes_kind_snake_case() {
        let issue = Issue::new(IssueKind::VenueNotFound, "venue-1", "Venue not found: Foo");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "venue_not_found");
        assert_eq!(json["entity_id"], "venue-1");
        assert_eq!(issue.to_string(), "Venue not found: Foo");
    }

    #[test]
    fn test_plan_wide_issue_omits_entity() {
        let issue = Issue::plan_wide(IssueKind::EmptyPlan, "No events found in plan");
        let json = serde_json::to_value(&issue).unwrap();
        assert!(json.get("entity_id").is_none());
        assert!(!issue.is_about("anything"));
    }

    #[test]
    fn test_lookup_failure_kinds() {
        assert!(IssueKind::VenueLookupFailed.is_lookup_failure());
        assert!(IssueKind::RouteLookupFailed.is_lookup_failure());
        assert!(!IssueKind::VenueNotFound.is_lookup_failure());
    }
}
