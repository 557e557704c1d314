use prometheus::{TextEncoder, Registry, IntCounter, IntCounterVec, Opts};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    pub(crate) http_requests_total: IntCounterVec,
    pub(crate) invocations_total: IntCounter,
    pub(crate) invocation_failures_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(Opts::new("http_requests_total", "total http requests processed"), &["status"])?;
        let invocations_total = IntCounter::new("counter_invocations_total", "total counter handler invocations")?;
        let invocation_failures_total = IntCounter::new("counter_invocation_failures_total", "counter handler invocations that returned an error")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(invocations_total.clone()))?;
        registry.register(Box::new(invocation_failures_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            invocations_total,
            invocation_failures_total,
        })
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    pub fn invocations(&self) -> u64 {
        self.invocations_total.get()
    }

    pub fn invocation_failures(&self) -> u64 {
        self.invocation_failures_total.get()
    }
}
