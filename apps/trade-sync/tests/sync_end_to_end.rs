//! End-to-end sync tests: Bitfinex client over HTTP, throttle, retry and
//! the trade stores wired together the way the binary does it.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use trade_sync::application::ports::{Predicate, RangeQuery, ThrottlePort, TradeStorePort};
use trade_sync::infrastructure::{
    BitfinexClient, InMemoryTradeStore, QuotaThrottle, TursoTradeStore, Unthrottled,
};
use trade_sync::retry::RetryPolicy;
use trade_sync::{
    GapPolicy, MarketSelector, RangeCompletion, SingleRecordCaps, SyncTradesUseCase, TimeRange,
    ThrottledFetcher, Trade,
};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

// =============================================================================
// Fake exchange
// =============================================================================

/// Serves `/v2/trades/{symbol}/hist` from a fixed set of timestamps,
/// honouring `start`, `end`, `limit` and ascending sort.
struct TradeHistory {
    mts: Vec<i64>,
    hits: Arc<AtomicUsize>,
    fail_first: usize,
}

impl TradeHistory {
    fn new(mts: impl IntoIterator<Item = i64>) -> Self {
        Self {
            mts: mts.into_iter().collect(),
            hits: Arc::new(AtomicUsize::new(0)),
            fail_first: 0,
        }
    }
}

impl Respond for TradeHistory {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let hit = self.hits.fetch_add(1, Ordering::SeqCst);
        if hit < self.fail_first {
            return ResponseTemplate::new(503).set_body_string(r#"["error",20060,"maintenance"]"#);
        }

        let param = |name: &str| -> i64 {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.parse().unwrap())
                .unwrap()
        };
        let (start, end, limit) = (param("start"), param("end"), param("limit"));

        let rows: Vec<String> = self
            .mts
            .iter()
            .filter(|&&m| m >= start && m <= end)
            .take(limit as usize)
            .map(|m| format!("[{m},{m},0.01,30000.5]"))
            .collect();
        ResponseTemplate::new(200).set_body_string(format!("[{}]", rows.join(",")))
    }
}

// =============================================================================
// Helpers
// =============================================================================

const TOLERANCE: i64 = 1_000;

type HttpSync = SyncTradesUseCase<ThrottledFetcher<BitfinexClient>, InMemoryTradeStore>;

fn btc() -> MarketSelector {
    MarketSelector::new("bitfinex", "tBTCUSD")
}

fn http_sync(
    server: &MockServer,
    store: &Arc<InMemoryTradeStore>,
    throttle: Arc<dyn ThrottlePort>,
    retry: RetryPolicy,
    page_limit: u32,
) -> HttpSync {
    let client = BitfinexClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let fetcher = ThrottledFetcher::new(Arc::new(client), throttle).with_retry(retry);
    let policy = GapPolicy::new(TOLERANCE, SingleRecordCaps::Reference).unwrap();
    SyncTradesUseCase::new(Arc::new(fetcher), Arc::clone(store), policy, page_limit).unwrap()
}

async fn stored_mts(store: &InMemoryTradeStore, selector: &MarketSelector, window: TimeRange) -> Vec<i64> {
    store
        .get_in_range(&Predicate::for_market(selector), RangeQuery::by_mts(window))
        .await
        .unwrap()
        .iter()
        .map(|t: &Trade| t.mts)
        .collect()
}

fn seed(mts: i64) -> Trade {
    Trade {
        id: mts,
        mts,
        amount: rust_decimal::Decimal::ONE,
        price: rust_decimal::Decimal::ONE_HUNDRED,
        exchange: "bitfinex".to_string(),
        symbol: "tBTCUSD".to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn backfills_empty_store_over_http() {
    let server = MockServer::start().await;
    let history = TradeHistory::new((0..=20_000).step_by(100));
    let hits = Arc::clone(&history.hits);
    Mock::given(method("GET")).respond_with(history).mount(&server).await;

    let store = Arc::new(InMemoryTradeStore::new());
    let sync = http_sync(&server, &store, Arc::new(Unthrottled), RetryPolicy::disabled(), 50);

    let report = sync.sync(&btc(), 0, 20_000).await.unwrap();

    // 201 trades in pages of 50.
    assert_eq!(report.total_trades(), 201);
    assert_eq!(report.total_pages(), 5);
    assert_eq!(hits.load(Ordering::SeqCst), 5);
    assert_eq!(report.ranges[0].completion, RangeCompletion::Completed);
    assert_eq!(store.partition_len(&btc()), 201);

    let window = TimeRange::new(0, 20_000).unwrap();
    let expected: Vec<i64> = (0..=20_000).step_by(100).collect();
    assert_eq!(stored_mts(&store, &btc(), window).await, expected);
}

#[tokio::test]
async fn fills_only_the_gaps_and_then_is_idempotent() {
    let server = MockServer::start().await;
    let history = TradeHistory::new((0..=30_000).step_by(250));
    let hits = Arc::clone(&history.hits);
    Mock::given(method("GET")).respond_with(history).mount(&server).await;

    let store = Arc::new(InMemoryTradeStore::new());
    store
        .bulk_insert((10_000..=15_000).step_by(250).map(seed).collect())
        .await
        .unwrap();
    let sync = http_sync(&server, &store, Arc::new(Unthrottled), RetryPolicy::disabled(), 1_000);

    let first = sync.sync(&btc(), 0, 30_000).await.unwrap();
    let gaps: Vec<TimeRange> = first.ranges.iter().map(|r| r.range).collect();
    assert_eq!(
        gaps,
        vec![
            TimeRange::new(0, 9_999).unwrap(),
            TimeRange::new(15_001, 30_000).unwrap()
        ]
    );
    assert_eq!(store.partition_len(&btc()), 121);

    let calls = hits.load(Ordering::SeqCst);
    let second = sync.sync(&btc(), 0, 30_000).await.unwrap();
    assert!(second.is_up_to_date());
    assert_eq!(hits.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn transient_server_errors_are_retried() {
    let server = MockServer::start().await;
    let mut history = TradeHistory::new((0..=5_000).step_by(100));
    history.fail_first = 2;
    let hits = Arc::clone(&history.hits);
    Mock::given(method("GET")).respond_with(history).mount(&server).await;

    let store = Arc::new(InMemoryTradeStore::new());
    let retry = RetryPolicy {
        max_attempts: 3,
        initial_backoff_ms: 5,
        max_backoff_ms: 20,
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
    };
    let sync = http_sync(&server, &store, Arc::new(Unthrottled), retry, 100);

    let report = sync.sync(&btc(), 0, 5_000).await.unwrap();

    assert_eq!(report.total_trades(), 51);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn server_error_without_retry_fails_sync() {
    let server = MockServer::start().await;
    let mut history = TradeHistory::new((0..=5_000).step_by(100));
    history.fail_first = 1;
    Mock::given(method("GET")).respond_with(history).mount(&server).await;

    let store = Arc::new(InMemoryTradeStore::new());
    let sync = http_sync(&server, &store, Arc::new(Unthrottled), RetryPolicy::disabled(), 100);

    let err = sync.sync(&btc(), 0, 5_000).await.unwrap_err();

    assert_eq!(err.code(), trade_sync::ErrorCode::FetchFailed);
    assert!(store.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_markets_share_one_quota() {
    let server = MockServer::start().await;
    let history = TradeHistory::new((0..=4_000).step_by(100));
    let hits = Arc::clone(&history.hits);
    Mock::given(method("GET")).respond_with(history).mount(&server).await;

    // 4 requests per 400ms: one admission every 100ms.
    let throttle: Arc<dyn ThrottlePort> =
        Arc::new(QuotaThrottle::new(4, Duration::from_millis(400)).unwrap());
    let store = Arc::new(InMemoryTradeStore::new());
    let sync = Arc::new(http_sync(&server, &store, throttle, RetryPolicy::disabled(), 10));

    let started = std::time::Instant::now();
    let markets = ["tBTCUSD", "tETHUSD"];
    let handles: Vec<_> = markets
        .iter()
        .map(|symbol| {
            let sync = Arc::clone(&sync);
            let selector = MarketSelector::new("bitfinex", *symbol);
            tokio::spawn(async move { sync.sync(&selector, 0, 4_000).await })
        })
        .collect();
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.total_trades(), 41);
    }

    // 41 trades in pages of 10 is 5 requests per market; 10 admissions
    // spaced 100ms apart need at least 900ms.
    assert_eq!(hits.load(Ordering::SeqCst), 10);
    assert!(started.elapsed() >= Duration::from_millis(850));
    assert_eq!(store.partition_len(&MarketSelector::new("bitfinex", "tETHUSD")), 41);
}

#[tokio::test]
async fn database_file_carries_progress_between_runs() {
    let server = MockServer::start().await;
    let history = TradeHistory::new((0..=20_000).step_by(100));
    let hits = Arc::clone(&history.hits);
    Mock::given(method("GET")).respond_with(history).mount(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trades.db");
    let path = path.to_str().unwrap();
    let policy = GapPolicy::new(TOLERANCE, SingleRecordCaps::Reference).unwrap();
    let run = |store: TursoTradeStore| {
        let client = BitfinexClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let fetcher = ThrottledFetcher::new(Arc::new(client), Arc::new(Unthrottled));
        SyncTradesUseCase::new(Arc::new(fetcher), Arc::new(store), policy, 50).unwrap()
    };

    let first = run(TursoTradeStore::open(path).await.unwrap())
        .sync(&btc(), 0, 10_000)
        .await
        .unwrap();
    assert_eq!(first.total_trades(), 101);
    let calls = hits.load(Ordering::SeqCst);

    // A fresh process only fetches the part of the wider window not yet stored.
    let store = TursoTradeStore::open(path).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 101);
    let second = run(store).sync(&btc(), 0, 20_000).await.unwrap();

    let gaps: Vec<TimeRange> = second.ranges.iter().map(|r| r.range).collect();
    assert_eq!(gaps, vec![TimeRange::new(10_001, 20_000).unwrap()]);
    assert_eq!(second.total_trades(), 100);
    assert_eq!(hits.load(Ordering::SeqCst), calls + 2);

    let reopened = TursoTradeStore::open(path).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 201);
}
