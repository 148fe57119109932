//! Data models for marquee-planner
//!
//! - Itinerary: venues, events, routes and the issues found by the last
//!   verification pass
//! - Plan request: query, transport mode, caller constraints
//! - Plan session: orchestration state machine and verification history

pub mod issue;
pub mod itinerary;
pub mod opening_hours;
pub mod plan_session;
pub mod request;

pub use issue::{Issue, IssueKind};
pub use itinerary::{Event, Itinerary, Route, Venue, VenueAttributes};
pub use opening_hours::{DayTime, OpeningHours, OpeningPeriod};
pub use plan_session::{PlanOutcome, PlanSession, PlanState, StateTransition, VerificationRecord};
pub use request::{Constraints, PlanRequest, TransportMode};
