//! Itinerary data model
//!
//! An itinerary is created by the plan generator, mutated in place by the
//! verifier (flags, backfilled place data, issues) and replaced wholesale by the
//! refiner. Events reference venues by id and routes reference events by id;
//! the verifier reports dangling references rather than removing them.

use chrono::NaiveDateTime;
use marquee_common::time::wall_clock;
use marquee_common::Coordinates;
use serde::{Deserialize, Serialize};

use super::{Issue, OpeningHours, TransportMode};

/// Contact and pricing details for a venue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// 0 (free) through 4 (very expensive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    /// External place reference from the places service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub attributes: VenueAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
    /// e.g. OPERATIONAL, CLOSED_TEMPORARILY, CLOSED_PERMANENTLY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub venue_id: String,
    pub name: String,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub origin_event_id: String,
    pub destination_event_id: String,
    pub travel_mode: TransportMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub verified: bool,
    /// Turn-by-turn instructions, plain text
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(default)]
    pub venues: Vec<Venue>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Issues from the most recent verification pass
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Refinement passes applied so far
    #[serde(default)]
    pub iteration_count: u32,
}

impl Itinerary {
    pub fn venue(&self, id: &str) -> Option<&Venue> {
        self.venues.iter().find(|v| v.id == id)
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Venue hosting an event, if the reference resolves
    pub fn venue_of(&self, event: &Event) -> Option<&Venue> {
        self.venue(&event.venue_id)
    }

    /// Events ordered by start time (ties keep input order)
    pub fn events_chronological(&self) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().collect();
        events.sort_by_key(|e| e.start_time);
        events
    }

    /// Sum of known event prices
    pub fn total_cost(&self) -> f64 {
        let total = self
            .events
            .iter()
            .filter_map(|e| e.price)
            .fold(0.0, |acc, price| acc + price);
        (total * 100.0).round() / 100.0
    }

    /// Minutes from the earliest event start to the latest event end
    pub fn total_duration_minutes(&self) -> Option<i64> {
        let first_start = self.events.iter().map(|e| e.start_time).min()?;
        let last_end = self.events.iter().map(|e| e.end_time).max()?;
        Some((last_end - first_start).num_minutes().max(0))
    }

    /// Event references that do not resolve within this itinerary
    ///
    /// Returns `(entity id, missing id)` pairs for events pointing at unknown
    /// venues and routes pointing at unknown events.
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        for event in &self.events {
            if self.venue(&event.venue_id).is_none() {
                dangling.push((event.id.clone(), event.venue_id.clone()));
            }
        }
        for route in &self.routes {
            for endpoint in [&route.origin_event_id, &route.destination_event_id] {
                if self.event(endpoint).is_none() {
                    dangling.push((route.id.clone(), endpoint.clone()));
                }
            }
        }
        dangling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn venue(id: &str) -> Venue {
        Venue {
            id: id.to_string(),
            name: format!("Venue {}", id),
            address: String::new(),
            place_id: None,
            coordinates: None,
            verified: false,
            attributes: VenueAttributes::default(),
            description: None,
            opening_hours: None,
            business_status: None,
        }
    }

    fn event(id: &str, venue_id: &str, start: NaiveDateTime, end: NaiveDateTime, price: Option<f64>) -> Event {
        Event {
            id: id.to_string(),
            venue_id: venue_id.to_string(),
            name: format!("Event {}", id),
            start_time: start,
            end_time: end,
            price,
            description: None,
            verified: false,
        }
    }

    fn sample() -> Itinerary {
        Itinerary {
            venues: vec![venue("v1"), venue("v2")],
            events: vec![
                event("e2", "v2", at(20, 0), at(22, 30), Some(129.5)),
                event("e1", "v1", at(18, 0), at(19, 30), Some(60.25)),
            ],
            routes: vec![Route {
                id: "r1".to_string(),
                origin_event_id: "e1".to_string(),
                destination_event_id: "e2".to_string(),
                travel_mode: TransportMode::Walking,
                distance_meters: None,
                duration_seconds: None,
                verified: false,
                steps: vec![],
            }],
            issues: vec![],
            iteration_count: 0,
        }
    }

    #[test]
    fn test_totals() {
        let it = sample();
        assert_eq!(it.total_cost(), 189.75);
        assert_eq!(it.total_duration_minutes(), Some(270));
        assert_eq!(Itinerary::default().total_duration_minutes(), None);
    }

    #[test]
    fn test_total_cost_without_prices_is_positive_zero() {
        let mut it = sample();
        for event in &mut it.events {
            event.price = None;
        }

        let total = it.total_cost();
        assert_eq!(total, 0.0);
        assert!(total.is_sign_positive());
        assert_eq!(format!("${:.2}", total), "$0.00");
        assert_eq!(serde_json::json!({ "total_cost": total }).to_string(), r#"{"total_cost":0.0}"#);
    }

    #[test]
    fn test_events_chronological() {
        let it = sample();
        let ids: Vec<&str> = it.events_chronological().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[test]
    fn test_dangling_references() {
        let mut it = sample();
        assert!(it.dangling_references().is_empty());

        it.events[0].venue_id = "v9".to_string();
        it.routes[0].destination_event_id = "e9".to_string();
        let dangling = it.dangling_references();
        assert_eq!(dangling.len(), 2);
        assert!(dangling.contains(&("e2".to_string(), "v9".to_string())));
        assert!(dangling.contains(&("r1".to_string(), "e9".to_string())));
    }

    #[test]
    fn test_serde_shape() {
        let it = sample();
        let json = serde_json::to_value(&it).unwrap();
        assert_eq!(json["events"][0]["start_time"], "2025-03-02T20:00:00");
        assert_eq!(json["routes"][0]["travel_mode"], "WALKING");
        assert_eq!(json["iteration_count"], 0);

        let back: Itinerary = serde_json::from_value(json).unwrap();
        assert_eq!(back, it);
    }
}
