//! Click/hover scenarios against a fake indicator source whose responses are
//! released by the test, so completion order is under our control.

use serde_json::json;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wbi_map::api::parse_dataset;
use wbi_map::coordinator::FAILURE_LOG_CAPACITY;
use wbi_map::models::{CountryCode, CountryDataset, CountryFeature};
use wbi_map::{
    CodeResolver, FailureKind, FetchError, IndicatorCatalog, IndicatorSource,
    InteractionCoordinator, Settled,
};

type Reply = Result<CountryDataset, FetchError>;

const WAIT: Duration = Duration::from_secs(5);
const FLASH: Duration = Duration::from_millis(1000);

struct GatedSource {
    gates: Mutex<HashMap<String, Receiver<Reply>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl IndicatorSource for GatedSource {
    fn fetch(&self, country: &CountryCode) -> Reply {
        self.calls.lock().unwrap().push(country.to_string());
        let gate = self.gates.lock().unwrap().remove(country.as_str());
        match gate {
            Some(rx) => rx
                .recv()
                .unwrap_or_else(|_| Err(FetchError::Transport("gate dropped".into()))),
            None => Err(FetchError::Transport(format!("no gate for {country}"))),
        }
    }
}

struct Harness {
    coord: InteractionCoordinator,
    gates: HashMap<String, Sender<Reply>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    fn new(codes: &[&str]) -> Self {
        let mut receivers = HashMap::new();
        let mut gates = HashMap::new();
        for code in codes {
            let (tx, rx) = mpsc::channel();
            gates.insert(code.to_string(), tx);
            receivers.insert(code.to_string(), rx);
        }
        let calls = Arc::new(Mutex::new(Vec::new()));
        let source = GatedSource {
            gates: Mutex::new(receivers),
            calls: Arc::clone(&calls),
        };
        Self {
            coord: InteractionCoordinator::new(CodeResolver::builtin(), source, FLASH),
            gates,
            calls,
        }
    }

    fn release(&self, code: &str, reply: Reply) {
        self.gates[code].send(reply).unwrap();
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn population(code: &str, value: f64) -> CountryDataset {
    let v = json!([
        {"page": 1, "pages": 1, "per_page": "1000", "total": 1},
        [{"indicator": {"id": "SP.POP.TOTL", "value": "Population, total"}, "date": "2022", "value": value}]
    ]);
    parse_dataset(&CountryCode::new(code), &v, &IndicatorCatalog::builtin()).unwrap()
}

fn feature(name: &str) -> CountryFeature {
    CountryFeature::named(name)
}

#[test]
fn click_france_shows_population() {
    let mut h = Harness::new(&["FR"]);
    let t0 = Instant::now();

    let token = h.coord.click(&feature("France"), t0);
    assert!(token.is_some());
    assert!(h.coord.is_highlighted("France", t0));
    assert!(h.coord.is_loading());

    h.release("FR", Ok(population("FR", 67_000_000.0)));
    let settled = h.coord.wait_for_completion(WAIT);
    assert_eq!(
        settled,
        Some(Settled::Applied {
            country: "France".into()
        })
    );

    assert_eq!(h.calls(), vec!["FR".to_string()]);
    assert!(!h.coord.is_loading());
    let ds = h.coord.dataset().expect("dataset");
    assert_eq!(ds.get("Population"), Some(67_000_000.0));
    assert_eq!(ds.country(), Some(&CountryCode::new("FR")));
    assert_eq!(h.coord.selected_country(), Some("France"));
}

#[test]
fn click_unknown_country_flashes_without_fetching() {
    let mut h = Harness::new(&[]);
    let t0 = Instant::now();

    assert_eq!(h.coord.click(&feature("Atlantis"), t0), None);
    assert!(h.coord.is_highlighted("Atlantis", t0));
    assert!(h.coord.dataset().is_none());
    assert!(!h.coord.is_loading());
    assert_eq!(
        h.coord.last_failure().map(|f| f.kind),
        Some(FailureKind::ResolutionFailure)
    );

    // nothing was ever sent to a worker
    assert_eq!(h.coord.wait_for_completion(Duration::from_millis(50)), None);
    assert!(h.calls().is_empty());

    // the flash still reverts on schedule
    h.coord.poll(t0 + FLASH);
    assert!(!h.coord.is_highlighted("Atlantis", t0 + FLASH));
    assert!(h.coord.highlight().active().is_none());
}

#[test]
fn late_result_of_earlier_click_is_discarded() {
    let mut h = Harness::new(&["DE", "IT"]);
    let t0 = Instant::now();

    let germany = h.coord.click(&feature("Germany"), t0).unwrap();
    let italy = h
        .coord
        .click(&feature("Italy"), t0 + Duration::from_millis(200))
        .unwrap();
    assert!(italy > germany);
    assert_eq!(h.coord.latest_token(), italy);

    h.release("IT", Ok(population("IT", 59_000_000.0)));
    assert_eq!(
        h.coord.wait_for_completion(WAIT),
        Some(Settled::Applied {
            country: "Italy".into()
        })
    );

    h.release("DE", Ok(population("DE", 84_000_000.0)));
    assert_eq!(
        h.coord.wait_for_completion(WAIT),
        Some(Settled::Superseded {
            country: "Germany".into()
        })
    );

    let ds = h.coord.dataset().unwrap();
    assert_eq!(ds.get("Population"), Some(59_000_000.0));
    assert_eq!(ds.country(), Some(&CountryCode::new("IT")));
    assert_eq!(
        h.coord.last_failure().map(|f| f.kind),
        Some(FailureKind::Superseded)
    );

    let at_1000 = t0 + Duration::from_millis(1000);
    h.coord.poll(at_1000);
    assert!(h.coord.is_highlighted("Italy", at_1000));
    assert!(!h.coord.is_highlighted("Germany", at_1000));

    let at_1200 = t0 + Duration::from_millis(1200);
    h.coord.poll(at_1200);
    assert!(!h.coord.is_highlighted("Italy", at_1200));
}

#[test]
fn stale_failure_does_not_clear_newer_dataset() {
    let mut h = Harness::new(&["DE", "IT"]);
    let t0 = Instant::now();
    h.coord.click(&feature("Germany"), t0);
    h.coord.click(&feature("Italy"), t0);

    h.release("IT", Ok(population("IT", 1.0)));
    h.coord.wait_for_completion(WAIT);
    h.release("DE", Err(FetchError::Transport("HTTP 500".into())));
    assert!(matches!(
        h.coord.wait_for_completion(WAIT),
        Some(Settled::Superseded { .. })
    ));
    assert_eq!(h.coord.dataset().and_then(|d| d.get("Population")), Some(1.0));
}

#[test]
fn unresolved_click_supersedes_in_flight_request() {
    let mut h = Harness::new(&["FR"]);
    let t0 = Instant::now();
    h.coord.click(&feature("France"), t0);
    h.coord.click(&feature("Atlantis"), t0);
    assert!(!h.coord.is_loading());

    h.release("FR", Ok(population("FR", 67_000_000.0)));
    assert!(matches!(
        h.coord.wait_for_completion(WAIT),
        Some(Settled::Superseded { .. })
    ));
    assert!(h.coord.dataset().is_none());
}

#[test]
fn transport_failure_clears_dataset_and_keeps_ui_responsive() {
    let mut h = Harness::new(&["FR", "ES"]);
    let t0 = Instant::now();

    h.coord.click(&feature("France"), t0);
    h.release("FR", Ok(population("FR", 67_000_000.0)));
    h.coord.wait_for_completion(WAIT);
    assert!(h.coord.dataset().is_some());

    h.coord.click(&feature("Spain"), t0 + Duration::from_millis(10));
    // hover still works while the request is out
    h.coord.hover(&feature("Portugal"), 3.0, 4.0);
    assert_eq!(h.coord.tooltip().country(), Some("Portugal"));

    h.release("ES", Err(FetchError::Transport("HTTP 500 Internal Server Error".into())));
    assert_eq!(
        h.coord.wait_for_completion(WAIT),
        Some(Settled::Failed {
            country: "Spain".into(),
            kind: FailureKind::FetchTransportFailure
        })
    );
    assert!(h.coord.dataset().is_none());
    assert!(!h.coord.is_loading());
    let failure = h.coord.last_failure().unwrap();
    assert_eq!(failure.kind, FailureKind::FetchTransportFailure);
    assert_eq!(failure.country, "Spain");

    // flash reverts regardless of the fetch outcome
    h.coord.poll(t0 + Duration::from_millis(1010));
    assert!(h.coord.highlight().active().is_none());

    // and the next click still goes out
    assert!(h.coord.click(&feature("France"), t0 + Duration::from_secs(2)).is_some());
}

#[test]
fn malformed_response_is_recorded_as_such() {
    let mut h = Harness::new(&["FR"]);
    h.coord.click(&feature("France"), Instant::now());
    h.release("FR", Err(FetchError::Malformed("not a top-level array".into())));
    assert_eq!(
        h.coord.wait_for_completion(WAIT),
        Some(Settled::Failed {
            country: "France".into(),
            kind: FailureKind::FetchMalformedResponse
        })
    );
    assert!(h.coord.dataset().is_none());
}

#[test]
fn poll_applies_completions_in_arrival_order() {
    let mut h = Harness::new(&["FR"]);
    let t0 = Instant::now();
    h.coord.click(&feature("France"), t0);
    h.release("FR", Ok(population("FR", 2.0)));

    let deadline = Instant::now() + WAIT;
    let mut settled = Vec::new();
    while settled.is_empty() && Instant::now() < deadline {
        settled = h.coord.poll(t0);
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(
        settled,
        vec![Settled::Applied {
            country: "France".into()
        }]
    );
    assert!(h.coord.poll(t0).is_empty());
}

#[test]
fn tooltip_events_are_forwarded() {
    let mut h = Harness::new(&[]);
    h.coord.mouse_move(1.0, 1.0);
    assert!(!h.coord.tooltip().is_visible());
    h.coord.hover(&feature("Chile"), 5.0, 6.0);
    h.coord.mouse_move(7.0, 8.0);
    assert_eq!(h.coord.tooltip().country(), Some("Chile"));
    assert_eq!(h.coord.tooltip().position(), Some((7.0, 8.0)));
    h.coord.mouse_leave();
    assert!(!h.coord.tooltip().is_visible());
}

#[test]
fn next_wakeup_tracks_latest_flash() {
    let mut h = Harness::new(&[]);
    let t0 = Instant::now();
    assert_eq!(h.coord.next_wakeup(t0), None);
    h.coord.click(&feature("Atlantis"), t0);
    h.coord.click(&feature("Lemuria"), t0 + Duration::from_millis(400));
    assert_eq!(
        h.coord.next_wakeup(t0 + Duration::from_millis(500)),
        Some(Duration::from_millis(900))
    );
}

#[test]
fn failure_log_is_bounded() {
    let mut h = Harness::new(&[]);
    let t0 = Instant::now();
    for _ in 0..(FAILURE_LOG_CAPACITY + 10) {
        h.coord.click(&feature("Atlantis"), t0);
    }
    assert_eq!(h.coord.failures().count(), FAILURE_LOG_CAPACITY);
}
