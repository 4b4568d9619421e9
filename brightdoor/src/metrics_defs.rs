use shared::metrics_defs::{MetricDef, MetricType};

pub const SYNC_RESULT: MetricDef = MetricDef {
    name: "sync.result",
    metric_type: MetricType::Counter,
    description: "Finished sync attempts. Tagged with status: success, failed or skipped.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "brightdoor.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time in seconds spent on a BrightDoor API request. Tagged with action.",
};

pub const REQUEST_TRANSPORT_ERROR: MetricDef = MetricDef {
    name: "brightdoor.request.transport_error",
    metric_type: MetricType::Counter,
    description: "BrightDoor requests that got no response at all. Tagged with action.",
};

pub const ALL_METRICS: &[MetricDef] = &[SYNC_RESULT, REQUEST_DURATION, REQUEST_TRANSPORT_ERROR];
