//! Scripted stand-ins for the language model and maps services

use async_trait::async_trait;
use marquee_common::Coordinates;
use marquee_planner::models::TransportMode;
use marquee_planner::services::{
    CompletionRequest, Directions, DirectionsService, LanguageModel, LlmError, MapsError,
    PlaceCandidate, PlacesService,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Language model replaying a queue of canned replies
///
/// Each reply may be delayed. An exhausted queue answers `EmptyResponse`.
pub struct FakeLanguageModel {
    replies: Mutex<VecDeque<(Duration, Result<String, LlmError>)>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeLanguageModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(&self, text: impl Into<String>) -> &Self {
        self.push(Duration::ZERO, Ok(text.into()))
    }

    pub fn reply_after(&self, delay: Duration, text: impl Into<String>) -> &Self {
        self.push(delay, Ok(text.into()))
    }

    pub fn fail(&self, error: LlmError) -> &Self {
        self.push(Duration::ZERO, Err(error))
    }

    fn push(&self, delay: Duration, reply: Result<String, LlmError>) -> &Self {
        self.replies.lock().unwrap().push_back((delay, reply));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeLanguageModel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some((delay, reply)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                reply
            }
            None => Err(LlmError::EmptyResponse),
        }
    }
}

/// Places search over a fixed set of known venues
///
/// A query matches a venue when it starts with the venue's name, the way the
/// verifier builds "name, address" queries.
pub struct FakePlaces {
    places: Mutex<HashMap<String, PlaceCandidate>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
    /// Delay applied once this many searches have been made
    slow_after: Mutex<Option<(usize, Duration)>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakePlaces {
    pub fn new() -> Self {
        Self {
            places: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            delay: Mutex::new(Duration::ZERO),
            slow_after: Mutex::new(None),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Midtown venues used across the tests
    pub fn broadway() -> Self {
        let places = Self::new();
        places.add("Carmine's", "200 W 44th St, New York, NY 10036", 40.7576, -73.9869);
        places.add("Majestic Theatre", "245 W 44th St, New York, NY 10036", 40.7580, -73.9880);
        places.add("Sardi's", "234 W 44th St, New York, NY 10036", 40.7579, -73.9876);
        places.add("Lincoln Center", "10 Lincoln Center Plaza, New York, NY 10023", 40.7725, -73.9835);
        places.add("Joe Allen", "326 W 46th St, New York, NY 10036", 40.7603, -73.9887);
        places
    }

    pub fn add(&self, name: &str, address: &str, lat: f64, lng: f64) -> &Self {
        self.add_candidate(PlaceCandidate {
            place_id: format!("place-{}", name.to_lowercase().replace(|c: char| !c.is_alphanumeric(), "")),
            name: name.to_string(),
            address: address.to_string(),
            coordinates: Some(Coordinates::new(lat, lng)),
            business_status: Some("OPERATIONAL".to_string()),
            ..Default::default()
        })
    }

    pub fn add_candidate(&self, candidate: PlaceCandidate) -> &Self {
        self.places
            .lock()
            .unwrap()
            .insert(candidate.name.to_lowercase(), candidate);
        self
    }

    /// Change a known venue in place
    pub fn update(&self, name: &str, f: impl FnOnce(&mut PlaceCandidate)) {
        if let Some(candidate) = self.places.lock().unwrap().get_mut(&name.to_lowercase()) {
            f(candidate);
        }
    }

    /// Searches for this venue fail with a network error
    pub fn fail_for(&self, name: &str) -> &Self {
        self.failing.lock().unwrap().insert(name.to_lowercase());
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    /// Searches after the first `calls` take `delay`
    pub fn slow_after(&self, calls: usize, delay: Duration) -> &Self {
        *self.slow_after.lock().unwrap() = Some((calls, delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlacesService for FakePlaces {
    async fn search_text(
        &self,
        query: &str,
        _near: Option<Coordinates>,
    ) -> Result<Vec<PlaceCandidate>, MapsError> {
        let made = self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = match *self.slow_after.lock().unwrap() {
            Some((after, slow)) if made >= after => slow,
            _ => *self.delay.lock().unwrap(),
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let query = query.to_lowercase();
        if self.failing.lock().unwrap().iter().any(|name| query.starts_with(name.as_str())) {
            return Err(MapsError::NetworkError("connection reset".to_string()));
        }

        Ok(self
            .places
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| query.starts_with(name.as_str()))
            .map(|(_, candidate)| candidate.clone())
            .collect())
    }
}

/// Directions from straight-line distance and a per-mode speed
///
/// A fixed duration per mode overrides the computed one.
pub struct FakeDirections {
    durations: Mutex<HashMap<TransportMode, u64>>,
    no_route: Mutex<HashSet<TransportMode>>,
    failing: Mutex<bool>,
    calls: AtomicUsize,
}

impl FakeDirections {
    pub fn new() -> Self {
        Self {
            durations: Mutex::new(HashMap::new()),
            no_route: Mutex::new(HashSet::new()),
            failing: Mutex::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_duration(&self, mode: TransportMode, seconds: u64) -> &Self {
        self.durations.lock().unwrap().insert(mode, seconds);
        self
    }

    pub fn without_route(&self, mode: TransportMode) -> &Self {
        self.no_route.lock().unwrap().insert(mode);
        self
    }

    pub fn failing(&self) -> &Self {
        *self.failing.lock().unwrap() = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn meters_per_second(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Walking => 1.4,
        TransportMode::Bicycling => 4.0,
        TransportMode::Transit => 6.0,
        TransportMode::Driving => 8.0,
    }
}

#[async_trait]
impl DirectionsService for FakeDirections {
    async fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TransportMode,
    ) -> Result<Option<Directions>, MapsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if *self.failing.lock().unwrap() {
            return Err(MapsError::Status("OVER_QUERY_LIMIT".to_string()));
        }
        if self.no_route.lock().unwrap().contains(&mode) {
            return Ok(None);
        }

        let distance = origin.distance_to(&destination);
        let duration = self
            .durations
            .lock()
            .unwrap()
            .get(&mode)
            .copied()
            .unwrap_or_else(|| (distance / meters_per_second(mode)).ceil() as u64);

        Ok(Some(Directions {
            distance_meters: distance.round() as u64,
            duration_seconds: duration,
            steps: vec![format!("Head toward {}", destination)],
        }))
    }
}
