// Prometheus metrics definitions for the Hogfarm backend.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Game actions currently being handled.
    pub static ref INFLIGHT_ACTIONS: IntGauge =
        IntGauge::new("hogfarm_inflight_actions", "Game actions currently being handled").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total game actions handled, by kind (grow, duel, top, ...).
    pub static ref ACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("hogfarm_actions_total", "Total game actions handled"),
        &["kind"],
    )
    .unwrap();

    /// Daily growth outcomes, by result (gained, lost, already).
    pub static ref GROWTH_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("hogfarm_growth_outcomes_total", "Daily growth outcomes"),
        &["outcome"],
    )
    .unwrap();

    /// Resolved duels, by outcome tier (plain, critical, knockout, draw).
    pub static ref DUELS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("hogfarm_duels_total", "Resolved duels"),
        &["tier"],
    )
    .unwrap();

    /// Game errors, by error class.
    pub static ref GAME_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("hogfarm_game_errors_total", "Game errors"),
        &["class"],
    )
    .unwrap();

    /// Leaderboard pages served.
    pub static ref LEADERBOARD_PAGES: IntCounter = IntCounter::new(
        "hogfarm_leaderboard_pages_total",
        "Leaderboard pages served",
    )
    .unwrap();

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("hogfarm_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Store operation duration in seconds.
    pub static ref STORE_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("hogfarm_store_op_duration_seconds", "Store operation duration in seconds")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )
    .unwrap();

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "hogfarm_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["endpoint"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(INFLIGHT_ACTIONS.clone()),
        Box::new(ACTIONS_TOTAL.clone()),
        Box::new(GROWTH_OUTCOMES.clone()),
        Box::new(DUELS_TOTAL.clone()),
        Box::new(GAME_ERRORS_TOTAL.clone()),
        Box::new(LEADERBOARD_PAGES.clone()),
        Box::new(API_REQUESTS_TOTAL.clone()),
        Box::new(STORE_SECONDS.clone()),
        Box::new(API_REQUEST_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        REGISTRY.register(c).expect("failed to register metric");
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Normalize a URL path for metric labels: replace numeric path segments with `:id`
/// to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
