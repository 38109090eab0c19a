// Retry/backoff contract of the fetcher, driven against a local mock server
// with a recording sleeper so no test actually waits.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use grants_radar::scan::fetch::{Fetcher, Sleeper};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            slept: Mutex::new(Vec::new()),
        })
    }

    fn durations(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, d: Duration) {
        self.slept.lock().unwrap().push(d);
    }
}

#[tokio::test]
async fn three_failures_make_three_attempts_with_exponential_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/grants"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let fetcher = Fetcher::new(sleeper.clone());

    let result = fetcher
        .fetch(&format!("{}/grants", server.uri()), Duration::from_secs(5), 3)
        .await;

    // the failure is a signaled error, not a panic
    let err = result.unwrap_err();
    assert!(err.to_string().contains("fetching"), "{err:#}");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3, "exactly 3 attempts");
    assert_eq!(
        sleeper.durations(),
        vec![Duration::from_secs(1), Duration::from_secs(2)],
        "backoff schedule is 2^0, 2^1"
    );
}

#[tokio::test]
async fn recovers_when_a_later_attempt_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let fetcher = Fetcher::new(sleeper.clone());

    let body = fetcher
        .fetch(&format!("{}/flaky", server.uri()), Duration::from_secs(5), 3)
        .await
        .unwrap();

    assert_eq!(body, "<html>ok</html>");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(sleeper.durations().len(), 2);
}

#[tokio::test]
async fn client_errors_fail_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let fetcher = Fetcher::new(sleeper.clone());

    let result = fetcher
        .fetch(&format!("{}/gone", server.uri()), Duration::from_secs(5), 3)
        .await;

    assert!(result.is_err());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert!(sleeper.durations().is_empty());
}

#[tokio::test]
async fn browser_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(RecordingSleeper::new());
    fetcher
        .fetch(&server.uri(), Duration::from_secs(5), 1)
        .await
        .unwrap();

    let req = &server.received_requests().await.unwrap()[0];
    let ua = req.headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(ua.contains("Mozilla/5.0"), "browser-like UA, got {ua}");
    assert!(req.headers.get("accept-language").is_some());
}
