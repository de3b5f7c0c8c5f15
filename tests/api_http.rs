//! `IndicatorClient` against a throwaway local HTTP server.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use wbi_map::models::CountryCode;
use wbi_map::{DateSpec, ExplorerConfig, FetchError, IndicatorCatalog, IndicatorClient};

/// Serve each connection with the next canned `(status line, body)`; the last
/// response repeats. Returns the base URL and the request paths seen.
fn serve(responses: Vec<(&'static str, String)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_srv = Arc::clone(&seen);
    thread::spawn(move || {
        let mut i = 0usize;
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            // drain headers
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
            }
            let path = request_line.split_whitespace().nth(1).unwrap_or("").to_string();
            seen_srv.lock().unwrap().push(path);

            let (status, body) = &responses[i.min(responses.len() - 1)];
            i += 1;
            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(reply.as_bytes());
            let _ = stream.flush();
        }
    });
    (format!("http://{}/v2", addr), seen)
}

fn client(base_url: &str, backoff: Vec<u64>) -> IndicatorClient {
    let config = ExplorerConfig {
        api_base_url: base_url.to_string(),
        reference_date: DateSpec::Year(2022),
        retry_backoff_ms: backoff,
        request_timeout_secs: 5,
        connect_timeout_secs: 5,
        ..ExplorerConfig::default()
    };
    IndicatorClient::new(&config, IndicatorCatalog::builtin()).unwrap()
}

const FRANCE: &str = r#"[{"page":1,"pages":1,"per_page":"1000","total":1},[{"indicator":{"id":"SP.POP.TOTL","value":"Population, total"},"country":{"id":"FR","value":"France"},"countryiso3code":"FRA","date":"2022","value":67000000,"unit":"","obs_status":"","decimal":0}]]"#;

#[test]
fn fetch_success_builds_dataset() {
    let (base, seen) = serve(vec![("200 OK", FRANCE.to_string())]);
    let ds = client(&base, vec![]).fetch(&CountryCode::new("FR")).unwrap();
    assert_eq!(ds.get("Population"), Some(67_000_000.0));

    let paths = seen.lock().unwrap().clone();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].starts_with("/v2/country/FR/indicator/SP.POP.TOTL;"));
    assert!(paths[0].contains("date=2022"));
    assert!(paths[0].ends_with("&page=1"));
}

#[test]
fn http_500_is_a_transport_failure_after_retries() {
    let (base, seen) = serve(vec![("500 Internal Server Error", String::new())]);
    let err = client(&base, vec![1, 1]).fetch(&CountryCode::new("FR")).unwrap_err();
    assert!(matches!(&err, FetchError::Transport(msg) if msg.contains("500")), "{err:?}");
    // first try plus one per backoff step
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[test]
fn server_error_then_success_recovers() {
    let (base, _) = serve(vec![
        ("503 Service Unavailable", String::new()),
        ("200 OK", FRANCE.to_string()),
    ]);
    let ds = client(&base, vec![1]).fetch(&CountryCode::new("FR")).unwrap();
    assert_eq!(ds.len(), 1);
}

#[test]
fn http_404_fails_without_retry() {
    let (base, seen) = serve(vec![("404 Not Found", String::new())]);
    let err = client(&base, vec![1, 1, 1]).fetch(&CountryCode::new("FR")).unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn non_json_body_is_malformed() {
    let (base, _) = serve(vec![("200 OK", "<html>maintenance</html>".to_string())]);
    let err = client(&base, vec![]).fetch(&CountryCode::new("FR")).unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
}

#[test]
fn pages_are_followed() {
    let page1 = r#"[{"page":1,"pages":2,"per_page":"1","total":2},[{"indicator":{"id":"SP.POP.TOTL"},"value":5}]]"#;
    let page2 = r#"[{"page":2,"pages":2,"per_page":"1","total":2},[{"indicator":{"id":"SP.DYN.LE00.IN"},"value":80.5}]]"#;
    let (base, seen) = serve(vec![("200 OK", page1.to_string()), ("200 OK", page2.to_string())]);
    let ds = client(&base, vec![]).fetch(&CountryCode::new("FR")).unwrap();
    assert_eq!(ds.len(), 2);
    let paths = seen.lock().unwrap().clone();
    assert!(paths[1].ends_with("&page=2"));
}

#[test]
fn unreachable_server_is_a_transport_failure() {
    // bind then drop to get a port nobody listens on
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{}/v2", port);
    let err = client(&base, vec![]).fetch(&CountryCode::new("FR")).unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}
