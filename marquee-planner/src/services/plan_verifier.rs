//! Plan verifier
//!
//! One verification pass checks every venue against the places service, every
//! event against its venue, and every route against the directions service,
//! then applies caller constraints. Each per-entity check yields
//! `Result<_, Issue>`; a failed lookup downgrades only that entity.
//!
//! The pass never adds or removes venues, events or routes. It sets `verified`
//! flags, backfills place data and replaces `itinerary.issues`.

use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use marquee_common::config::PlannerConfig;
use marquee_common::human_time::format_duration;
use marquee_common::time::format_wall_clock;
use marquee_common::Coordinates;
use std::collections::HashSet;
use std::sync::Arc;

use super::maps::{Directions, DirectionsService, PlaceCandidate, PlacesService};
use crate::models::{Constraints, Event, Issue, IssueKind, Itinerary, Route, TransportMode, Venue};

/// Name similarity above which a places candidate is taken as the venue
pub const NAME_MATCH_THRESHOLD: f64 = 0.6;

/// Jaro-Winkler score above which two words are the same word
const WORD_MATCH_THRESHOLD: f64 = 0.9;

/// Verification tuning
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    /// Maximum lookups in flight
    pub concurrency: usize,
    /// Slack added to real travel time
    pub min_transfer_minutes: i64,
    pub check_opening_hours: bool,
    /// Places search bias when the request has no location
    pub default_location: Option<Coordinates>,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            min_transfer_minutes: 0,
            check_opening_hours: true,
            default_location: None,
        }
    }
}

impl From<&PlannerConfig> for VerifierSettings {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            concurrency: config.verify_concurrency.max(1),
            min_transfer_minutes: config.min_transfer_minutes.max(0),
            check_opening_hours: config.check_opening_hours,
            default_location: Some(config.default_location).filter(Coordinates::is_valid),
        }
    }
}

pub struct PlanVerifier {
    places: Arc<dyn PlacesService>,
    directions: Arc<dyn DirectionsService>,
    settings: VerifierSettings,
}

impl PlanVerifier {
    pub fn new(
        places: Arc<dyn PlacesService>,
        directions: Arc<dyn DirectionsService>,
        settings: VerifierSettings,
    ) -> Self {
        Self {
            places,
            directions,
            settings,
        }
    }

    /// Run one verification pass
    ///
    /// Returns the issues found, which are also stored on the itinerary.
    pub async fn verify(&self, itinerary: &mut Itinerary, constraints: &Constraints) -> Vec<Issue> {
        let mut issues = Vec::new();

        if itinerary.venues.is_empty() {
            issues.push(Issue::plan_wide(IssueKind::EmptyPlan, "No venues found in plan"));
        }
        if itinerary.events.is_empty() {
            issues.push(Issue::plan_wide(IssueKind::EmptyPlan, "No events found in plan"));
        }

        let bias = constraints.location.or(self.settings.default_location);
        let places = Arc::clone(&self.places);
        let venue_results: Vec<Result<PlaceCandidate, Issue>> = stream::iter(itinerary.venues.clone())
            .map(move |venue| lookup_venue(Arc::clone(&places), venue, bias))
            .buffered(self.settings.concurrency)
            .collect()
            .await;

        for (venue, result) in itinerary.venues.iter_mut().zip(venue_results) {
            match result {
                Ok(candidate) => {
                    backfill(venue, candidate);
                    match check_business_status(venue) {
                        Ok(()) => venue.verified = true,
                        Err(issue) => {
                            venue.verified = false;
                            issues.push(issue);
                        }
                    }
                }
                Err(issue) => {
                    venue.verified = false;
                    issues.push(issue);
                }
            }
        }

        let event_issues: Vec<Vec<Issue>> = itinerary
            .events
            .iter()
            .map(|event| self.check_event(itinerary, event))
            .collect();
        for (event, found) in itinerary.events.iter_mut().zip(event_issues) {
            event.verified = found.is_empty();
            issues.extend(found);
        }

        let legs: Vec<Result<Leg, Issue>> = itinerary
            .routes
            .iter()
            .map(|route| Leg::resolve(itinerary, route))
            .collect();
        let directions = Arc::clone(&self.directions);
        let route_results: Vec<Result<Directions, Issue>> = stream::iter(legs)
            .map(move |leg| fetch_directions(Arc::clone(&directions), leg))
            .buffered(self.settings.concurrency)
            .collect()
            .await;

        let timing: Vec<Result<(), Issue>> = itinerary
            .routes
            .iter()
            .zip(&route_results)
            .map(|(route, directions)| match directions {
                Ok(d) => self.check_timing(itinerary, route, d),
                Err(_) => Ok(()),
            })
            .collect();

        for ((route, result), timing) in itinerary.routes.iter_mut().zip(route_results).zip(timing) {
            match result {
                Ok(directions) => {
                    route.distance_meters = Some(directions.distance_meters);
                    route.duration_seconds = Some(directions.duration_seconds);
                    route.steps = directions.steps;
                    route.verified = timing.is_ok();
                    if let Err(issue) = timing {
                        issues.push(issue);
                    }
                }
                Err(issue) => {
                    route.verified = false;
                    issues.push(issue);
                }
            }
        }

        issues.extend(check_constraints(itinerary, constraints));

        tracing::info!(
            venues = itinerary.venues.len(),
            events = itinerary.events.len(),
            routes = itinerary.routes.len(),
            issues = issues.len(),
            "Verification pass complete"
        );

        itinerary.issues = issues.clone();
        issues
    }

    fn check_event(&self, itinerary: &Itinerary, event: &Event) -> Vec<Issue> {
        let mut found = Vec::new();

        match itinerary.venue_of(event) {
            None => found.push(Issue::new(
                IssueKind::UnknownVenue,
                &event.id,
                format!(
                    "Event '{}' references unknown venue '{}'",
                    event.name, event.venue_id
                ),
            )),
            Some(venue) if !venue.verified => found.push(Issue::new(
                IssueKind::UnverifiedVenue,
                &event.id,
                format!(
                    "Event '{}' is at '{}', which could not be verified",
                    event.name, venue.name
                ),
            )),
            Some(venue) => {
                if self.settings.check_opening_hours {
                    let closed = venue
                        .opening_hours
                        .as_ref()
                        .and_then(|h| h.is_open_at(&event.start_time))
                        == Some(false);
                    if closed {
                        found.push(Issue::new(
                            IssueKind::OutsideOpeningHours,
                            &event.id,
                            format!(
                                "'{}' is closed at {} when '{}' starts",
                                venue.name,
                                format_wall_clock(&event.start_time),
                                event.name
                            ),
                        ));
                    }
                }
            }
        }

        if event.start_time >= event.end_time {
            found.push(Issue::new(
                IssueKind::InvalidTimeRange,
                &event.id,
                format!(
                    "Event '{}' must end after it starts ({} to {})",
                    event.name,
                    format_wall_clock(&event.start_time),
                    format_wall_clock(&event.end_time)
                ),
            ));
        }

        found
    }

    /// Compare real travel time with the scheduled gap
    fn check_timing(&self, itinerary: &Itinerary, route: &Route, directions: &Directions) -> Result<(), Issue> {
        let (origin, destination) = route_endpoints(itinerary, route)?;
        let gap = destination.start_time - origin.end_time;

        if gap < chrono::Duration::zero() {
            return Err(Issue::new(
                IssueKind::EventsOutOfOrder,
                &route.id,
                format!(
                    "'{}' starts at {} before '{}' ends at {}",
                    destination.name,
                    format_wall_clock(&destination.start_time),
                    origin.name,
                    format_wall_clock(&origin.end_time)
                ),
            ));
        }

        let needed = directions.duration_seconds as i64 + self.settings.min_transfer_minutes * 60;
        if needed > gap.num_seconds() {
            return Err(Issue::new(
                IssueKind::InsufficientTravelTime,
                &route.id,
                format!(
                    "Insufficient time to travel from '{}' to '{}': {} by {} but only {} minutes scheduled",
                    origin.name,
                    destination.name,
                    format_duration(directions.duration_seconds),
                    route.travel_mode,
                    gap.num_minutes()
                ),
            ));
        }
        Ok(())
    }
}

async fn lookup_venue(
    places: Arc<dyn PlacesService>,
    venue: Venue,
    bias: Option<Coordinates>,
) -> Result<PlaceCandidate, Issue> {
    let query = if venue.address.trim().is_empty() {
        venue.name.clone()
    } else {
        format!("{}, {}", venue.name, venue.address)
    };
    let near = venue.coordinates.or(bias);

    let candidates = places.search_text(&query, near).await.map_err(|e| {
        tracing::warn!(venue = %venue.name, error = %e, "Venue lookup failed");
        Issue::new(
            IssueKind::VenueLookupFailed,
            &venue.id,
            format!("Could not verify venue '{}': {}", venue.name, e),
        )
    })?;

    choose_candidate(&venue, candidates).ok_or_else(|| {
        Issue::new(
            IssueKind::VenueNotFound,
            &venue.id,
            format!("Venue not found: {}", venue.name),
        )
    })
}

/// One route with its endpoints resolved against the itinerary
struct Leg {
    route_id: String,
    mode: TransportMode,
    origin: String,
    destination: String,
    /// `None` when both events share a venue
    points: Option<(Coordinates, Coordinates)>,
}

impl Leg {
    fn resolve(itinerary: &Itinerary, route: &Route) -> Result<Self, Issue> {
        let (origin, destination) = route_endpoints(itinerary, route)?;
        let origin_venue = itinerary.venue_of(origin);
        let destination_venue = itinerary.venue_of(destination);

        let points = if origin.venue_id == destination.venue_id && origin_venue.is_some() {
            None
        } else {
            match (
                origin_venue.and_then(|v| v.coordinates),
                destination_venue.and_then(|v| v.coordinates),
            ) {
                (Some(from), Some(to)) => Some((from, to)),
                _ => {
                    return Err(Issue::new(
                        IssueKind::MissingCoordinates,
                        &route.id,
                        format!(
                            "Cannot route from '{}' to '{}': venue location unknown",
                            origin.name, destination.name
                        ),
                    ))
                }
            }
        };

        Ok(Self {
            route_id: route.id.clone(),
            mode: route.travel_mode,
            origin: origin.name.clone(),
            destination: destination.name.clone(),
            points,
        })
    }
}

async fn fetch_directions(
    service: Arc<dyn DirectionsService>,
    leg: Result<Leg, Issue>,
) -> Result<Directions, Issue> {
    let leg = leg?;
    let Some((from, to)) = leg.points else {
        return Ok(Directions {
            distance_meters: 0,
            duration_seconds: 0,
            steps: Vec::new(),
        });
    };

    match service.directions(from, to, leg.mode).await {
        Ok(Some(directions)) => Ok(directions),
        Ok(None) => Err(Issue::new(
            IssueKind::NoRouteFound,
            &leg.route_id,
            format!(
                "No {} route found from '{}' to '{}'",
                leg.mode, leg.origin, leg.destination
            ),
        )),
        Err(e) => {
            tracing::warn!(route = %leg.route_id, error = %e, "Route lookup failed");
            Err(Issue::new(
                IssueKind::RouteLookupFailed,
                &leg.route_id,
                format!(
                    "Could not verify route from '{}' to '{}': {}",
                    leg.origin, leg.destination, e
                ),
            ))
        }
    }
}

fn route_endpoints<'a>(itinerary: &'a Itinerary, route: &Route) -> Result<(&'a Event, &'a Event), Issue> {
    let lookup = |id: &str| {
        itinerary.event(id).ok_or_else(|| {
            Issue::new(
                IssueKind::UnknownEvent,
                &route.id,
                format!("Route '{}' references unknown event '{}'", route.id, id),
            )
        })
    };
    Ok((lookup(&route.origin_event_id)?, lookup(&route.destination_event_id)?))
}

/// Similarity of two place names in [0, 1]
///
/// Exact match 1.0, containment 0.8, otherwise the share of shared words.
/// Words count as shared when they are near-identical ("theater"/"theatre").
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }

    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    let shared = words_a
        .iter()
        .filter(|wa| {
            words_b
                .iter()
                .any(|wb| strsim::jaro_winkler(wa, wb) > WORD_MATCH_THRESHOLD)
        })
        .count();
    shared as f64 / words_a.len().max(words_b.len()) as f64
}

/// Pick the places candidate describing a venue
///
/// First candidate above [`NAME_MATCH_THRESHOLD`], else the one closest to the
/// venue's claimed coordinates, else the first.
pub fn choose_candidate(venue: &Venue, candidates: Vec<PlaceCandidate>) -> Option<PlaceCandidate> {
    if let Some(index) = candidates
        .iter()
        .position(|c| name_similarity(&venue.name, &c.name) > NAME_MATCH_THRESHOLD)
    {
        return candidates.into_iter().nth(index);
    }

    if let Some(claimed) = venue.coordinates {
        let closest = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.coordinates.map(|p| (i, claimed.distance_to(&p))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        if let Some(index) = closest {
            return candidates.into_iter().nth(index);
        }
    }

    candidates.into_iter().next()
}

fn backfill(venue: &mut Venue, candidate: PlaceCandidate) {
    venue.place_id = Some(candidate.place_id);
    if candidate.coordinates.is_some() {
        venue.coordinates = candidate.coordinates;
    }
    if !candidate.address.trim().is_empty() {
        venue.address = candidate.address;
    }
    if candidate.phone.is_some() {
        venue.attributes.phone = candidate.phone;
    }
    if candidate.website.is_some() {
        venue.attributes.website = candidate.website;
    }
    if candidate.price_level.is_some() {
        venue.attributes.price_level = candidate.price_level;
    }
    if candidate.rating.is_some() {
        venue.attributes.rating = candidate.rating;
    }
    if candidate.opening_hours.is_some() {
        venue.opening_hours = candidate.opening_hours;
    }
    venue.business_status = candidate.business_status;
}

fn check_business_status(venue: &Venue) -> Result<(), Issue> {
    match venue.business_status.as_deref() {
        Some(status) if status.starts_with("CLOSED") => Err(Issue::new(
            IssueKind::VenueClosed,
            &venue.id,
            format!(
                "Venue '{}' is {}",
                venue.name,
                status.to_lowercase().replace('_', " ")
            ),
        )),
        _ => Ok(()),
    }
}

fn check_constraints(itinerary: &Itinerary, constraints: &Constraints) -> Vec<Issue> {
    let mut issues = Vec::new();

    if let Some(budget) = constraints.budget {
        let total = itinerary.total_cost();
        if total > budget {
            issues.push(Issue::plan_wide(
                IssueKind::OverBudget,
                format!("Total cost ${:.2} exceeds budget ${:.2}", total, budget),
            ));
        }
    }

    for event in &itinerary.events {
        if let Some(after) = constraints.start_after {
            if event.start_time < after {
                issues.push(outside_window(event, "starts", event.start_time, "before", after));
            }
        }
        if let Some(before) = constraints.end_before {
            if event.end_time > before {
                issues.push(outside_window(event, "ends", event.end_time, "after", before));
            }
        }
    }

    issues
}

fn outside_window(
    event: &Event,
    verb: &str,
    at: NaiveDateTime,
    relation: &str,
    limit: NaiveDateTime,
) -> Issue {
    Issue::new(
        IssueKind::OutsideTimeWindow,
        &event.id,
        format!(
            "Event '{}' {} at {}, {} the allowed {}",
            event.name,
            verb,
            format_wall_clock(&at),
            relation,
            format_wall_clock(&limit)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VenueAttributes;

    fn venue(name: &str, coordinates: Option<Coordinates>) -> Venue {
        Venue {
            id: "venue-1".to_string(),
            name: name.to_string(),
            address: String::new(),
            place_id: None,
            coordinates,
            verified: false,
            attributes: VenueAttributes::default(),
            description: None,
            opening_hours: None,
            business_status: None,
        }
    }

    fn candidate(name: &str, lat: f64, lng: f64) -> PlaceCandidate {
        PlaceCandidate {
            place_id: format!("place-{}", name),
            name: name.to_string(),
            coordinates: Some(Coordinates::new(lat, lng)),
            ..Default::default()
        }
    }

    #[test]
    fn test_name_similarity() {
        assert_eq!(name_similarity("Majestic Theatre", "majestic theatre"), 1.0);
        assert_eq!(name_similarity("Majestic", "Majestic Theatre"), 0.8);
        assert_eq!(name_similarity("Joe Allen Restaurant", "Joe Allen Bar"), 2.0 / 3.0);
        assert_eq!(name_similarity("", "anything"), 0.0);
        assert_eq!(name_similarity("Sardi's", "Carmine's"), 0.0);
        assert_eq!(name_similarity("Majestic Theater", "The Majestic Theatre"), 2.0 / 3.0);
    }

    #[test]
    fn test_choose_candidate_by_name() {
        let v = venue("Carmine's Italian", None);
        let chosen = choose_candidate(
            &v,
            vec![candidate("Bubba Gump", 40.0, -73.0), candidate("Carmine's", 40.1, -73.1)],
        )
        .unwrap();
        assert_eq!(chosen.name, "Carmine's");
    }

    #[test]
    fn test_choose_candidate_by_distance() {
        let v = venue("Some Place", Some(Coordinates::new(40.7580, -73.9855)));
        let chosen = choose_candidate(
            &v,
            vec![
                candidate("Far Away", 40.90, -73.80),
                candidate("Nearby", 40.7582, -73.9850),
            ],
        )
        .unwrap();
        assert_eq!(chosen.name, "Nearby");
    }

    #[test]
    fn test_choose_candidate_falls_back_to_first() {
        let v = venue("Some Place", None);
        let chosen = choose_candidate(&v, vec![candidate("A", 1.0, 1.0), candidate("B", 2.0, 2.0)]);
        assert_eq!(chosen.unwrap().name, "A");
        assert!(choose_candidate(&v, vec![]).is_none());
    }

    #[test]
    fn test_business_status() {
        let mut v = venue("Closed Diner", None);
        v.business_status = Some("CLOSED_PERMANENTLY".to_string());
        let issue = check_business_status(&v).unwrap_err();
        assert_eq!(issue.kind, IssueKind::VenueClosed);
        assert_eq!(issue.message, "Venue 'Closed Diner' is closed permanently");

        v.business_status = Some("OPERATIONAL".to_string());
        assert!(check_business_status(&v).is_ok());
    }

    #[test]
    fn test_backfill_keeps_claims_when_candidate_silent() {
        let mut v = venue("Carmine's", Some(Coordinates::new(1.0, 1.0)));
        v.address = "200 W 44th St".to_string();
        v.attributes.phone = Some("555".to_string());
        backfill(
            &mut v,
            PlaceCandidate {
                place_id: "p1".to_string(),
                name: "Carmine's".to_string(),
                rating: Some(4.5),
                ..Default::default()
            },
        );
        assert_eq!(v.place_id.as_deref(), Some("p1"));
        assert_eq!(v.coordinates, Some(Coordinates::new(1.0, 1.0)));
        assert_eq!(v.address, "200 W 44th St");
        assert_eq!(v.attributes.phone.as_deref(), Some("555"));
        assert_eq!(v.attributes.rating, Some(4.5));
    }
}
