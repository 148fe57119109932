//! Draft reconciliation
//!
//! Turns a model draft into an [`Itinerary`] with stable, unique ids.
//!
//! Id resolution, per venue/event/route:
//! 1. a draft id already known to the previous itinerary is kept
//! 2. otherwise the previous entity with the same normalized name (or, for
//!    routes, the same endpoints) donates its id
//! 3. otherwise a draft id unused so far is kept when there is no previous
//!    itinerary
//! 4. otherwise a fresh `venue-`/`event-`/`route-` id is minted
//!
//! Draft ids are then remapped in every reference. References that resolve to
//! nothing are kept verbatim so the verifier reports them.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::itinerary_draft::{DraftEvent, DraftRoute, DraftVenue, ItineraryDraft};
use crate::models::{Event, Itinerary, Route, TransportMode, Venue, VenueAttributes};

/// Mint an id with the given prefix
pub fn fresh_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &uuid[..8])
}

/// Lowercase, alphanumeric words separated by single spaces
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tracks ids assigned in the itinerary being built
struct IdAssigner<'a> {
    prefix: &'static str,
    previous_ids: HashSet<&'a str>,
    previous_by_key: HashMap<String, &'a str>,
    used: HashSet<String>,
    has_previous: bool,
}

impl<'a> IdAssigner<'a> {
    fn new<I>(prefix: &'static str, previous: Option<I>) -> Self
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut previous_ids = HashSet::new();
        let mut previous_by_key = HashMap::new();
        let has_previous = previous.is_some();
        for (id, key) in previous.into_iter().flatten() {
            previous_ids.insert(id);
            previous_by_key.entry(key).or_insert(id);
        }
        Self {
            prefix,
            previous_ids,
            previous_by_key,
            used: HashSet::new(),
            has_previous,
        }
    }

    fn assign(&mut self, draft_id: Option<&str>, key: &str) -> String {
        let known = draft_id.filter(|id| self.previous_ids.contains(id) && !self.used.contains(*id));
        let by_key = || {
            self.previous_by_key
                .get(key)
                .copied()
                .filter(|id| !self.used.contains(*id))
        };
        let kept = draft_id.filter(|id| !self.has_previous && !self.used.contains(*id));

        let id = known
            .or_else(by_key)
            .or(kept)
            .map(str::to_string)
            .unwrap_or_else(|| self.mint());
        self.used.insert(id.clone());
        id
    }

    fn mint(&self) -> String {
        loop {
            let id = fresh_id(self.prefix);
            if !self.used.contains(&id) {
                return id;
            }
        }
    }
}

/// Lookup from draft references to assigned ids
#[derive(Default)]
struct References {
    by_draft_id: HashMap<String, String>,
    by_name: HashMap<String, String>,
    assigned: HashSet<String>,
}

impl References {
    fn record(&mut self, draft_id: Option<&str>, name: &str, assigned: &str) {
        if let Some(draft_id) = draft_id {
            self.by_draft_id
                .entry(draft_id.to_string())
                .or_insert_with(|| assigned.to_string());
        }
        self.by_name
            .entry(normalize_name(name))
            .or_insert_with(|| assigned.to_string());
        self.assigned.insert(assigned.to_string());
    }

    /// Resolve an id-or-name reference; unresolved references come back verbatim
    fn resolve(&self, reference: &str) -> String {
        // Draft ids win over assigned ids: the model may have renumbered
        if let Some(id) = self.by_draft_id.get(reference) {
            return id.clone();
        }
        if self.assigned.contains(reference) {
            return reference.to_string();
        }
        self.by_name
            .get(&normalize_name(reference))
            .cloned()
            .unwrap_or_else(|| reference.to_string())
    }
}

/// Build an itinerary from a draft
///
/// `previous` is the itinerary being refined, if any. The result has no issues
/// and carries the previous iteration count.
pub fn reconcile(
    draft: ItineraryDraft,
    previous: Option<&Itinerary>,
    mode: TransportMode,
) -> Itinerary {
    let mut venue_ids = IdAssigner::new(
        "venue",
        previous.map(|p| p.venues.iter().map(|v| (v.id.as_str(), normalize_name(&v.name)))),
    );
    let mut event_ids = IdAssigner::new(
        "event",
        previous.map(|p| p.events.iter().map(|e| (e.id.as_str(), normalize_name(&e.name)))),
    );
    let mut route_ids = IdAssigner::new(
        "route",
        previous.map(|p| {
            p.routes
                .iter()
                .map(|r| (r.id.as_str(), leg_key(&r.origin_event_id, &r.destination_event_id)))
        }),
    );

    let mut venue_refs = References::default();
    let venues: Vec<Venue> = draft
        .venues
        .into_iter()
        .map(|d| {
            let id = venue_ids.assign(d.id.as_deref(), &normalize_name(&d.name));
            venue_refs.record(d.id.as_deref(), &d.name, &id);
            venue_from_draft(id, d)
        })
        .collect();

    let mut event_refs = References::default();
    let events: Vec<Event> = draft
        .events
        .into_iter()
        .map(|d| {
            let id = event_ids.assign(d.id.as_deref(), &normalize_name(&d.name));
            event_refs.record(d.id.as_deref(), &d.name, &id);
            event_from_draft(id, d, &venue_refs)
        })
        .collect();

    let mut routes: Vec<Route> = draft
        .routes
        .into_iter()
        .map(|d| route_from_draft(d, &event_refs, &mut route_ids, mode))
        .collect();

    if routes.is_empty() && events.len() >= 2 {
        routes = derive_routes(&events, &mut route_ids, mode);
    }

    Itinerary {
        venues,
        events,
        routes,
        issues: Vec::new(),
        iteration_count: previous.map(|p| p.iteration_count).unwrap_or(0),
    }
}

fn leg_key(origin: &str, destination: &str) -> String {
    format!("{}>{}", origin, destination)
}

fn venue_from_draft(id: String, d: DraftVenue) -> Venue {
    let coordinates = d.claimed_coordinates();
    Venue {
        id,
        name: d.name.trim().to_string(),
        address: d.address.unwrap_or_default(),
        place_id: None,
        coordinates,
        verified: false,
        attributes: VenueAttributes {
            phone: d.phone,
            website: d.website,
            price_level: d.price_level,
            rating: None,
        },
        description: d.description,
        opening_hours: None,
        business_status: None,
    }
}

fn event_from_draft(id: String, d: DraftEvent, venues: &References) -> Event {
    let venue_id = d
        .venue_id
        .as_deref()
        .or(d.venue_name.as_deref())
        .map(|r| venues.resolve(r))
        .unwrap_or_default();

    Event {
        id,
        venue_id,
        name: d.name.trim().to_string(),
        start_time: d.start_time,
        end_time: d.end_time,
        price: d.price.filter(|p| p.is_finite() && *p >= 0.0),
        description: d.description,
        verified: false,
    }
}

fn route_from_draft(
    d: DraftRoute,
    events: &References,
    ids: &mut IdAssigner<'_>,
    default_mode: TransportMode,
) -> Route {
    let origin = d.origin_event_id.as_deref().map(|r| events.resolve(r)).unwrap_or_default();
    let destination = d
        .destination_event_id
        .as_deref()
        .map(|r| events.resolve(r))
        .unwrap_or_default();
    let travel_mode = d
        .travel_mode
        .as_deref()
        .and_then(|m| m.parse().ok())
        .unwrap_or(default_mode);

    Route {
        id: ids.assign(d.id.as_deref(), &leg_key(&origin, &destination)),
        origin_event_id: origin,
        destination_event_id: destination,
        travel_mode,
        distance_meters: None,
        duration_seconds: None,
        verified: false,
        steps: Vec::new(),
    }
}

/// Link chronologically consecutive events
fn derive_routes(events: &[Event], ids: &mut IdAssigner<'_>, mode: TransportMode) -> Vec<Route> {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|e| e.start_time);

    ordered
        .windows(2)
        .map(|pair| Route {
            id: ids.assign(None, &leg_key(&pair[0].id, &pair[1].id)),
            origin_event_id: pair[0].id.clone(),
            destination_event_id: pair[1].id.clone(),
            travel_mode: mode,
            distance_meters: None,
            duration_seconds: None,
            verified: false,
            steps: Vec::new(),
        })
        .collect()
}
