use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// - Order operations by operation and outcome
// - Enrichment latency
// - Gateway failures by gateway
// - Event publication by transition and outcome
//
// All metrics are registered with one Registry, scraped via /metrics.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_total: IntCounterVec,
    pub enrichment_duration: Histogram,
    pub gateway_failures: IntCounterVec,
    pub events_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let orders_total = IntCounterVec::new(
            Opts::new("orders_total", "Order operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(orders_total.clone()))?;

        let enrichment_duration = Histogram::with_opts(
            HistogramOpts::new(
                "order_enrichment_duration_seconds",
                "Time spent validating stock and pricing line items",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(enrichment_duration.clone()))?;

        let gateway_failures = IntCounterVec::new(
            Opts::new("gateway_failures_total", "Failed stock or pricing gateway calls"),
            &["gateway"],
        )?;
        registry.register(Box::new(gateway_failures.clone()))?;

        let events_total = IntCounterVec::new(
            Opts::new("order_events_total", "Order events by transition and outcome"),
            &["transition", "outcome"],
        )?;
        registry.register(Box::new(events_total.clone()))?;

        Ok(Self {
            registry,
            orders_total,
            enrichment_duration,
            gateway_failures,
            events_total,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order(&self, operation: &str, outcome: &str) {
        self.orders_total.with_label_values(&[operation, outcome]).inc();
    }

    pub fn observe_enrichment(&self, duration_secs: f64) {
        self.enrichment_duration.observe(duration_secs);
    }

    pub fn record_gateway_failure(&self, gateway: &str) {
        self.gateway_failures.with_label_values(&[gateway]).inc();
    }

    pub fn record_event(&self, transition: &str, published: bool) {
        let outcome = if published { "published" } else { "failed" };
        self.events_total.with_label_values(&[transition, outcome]).inc();
    }
}
