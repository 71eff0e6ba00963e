//! Collector set: the five HTTP instruments and their registration.
//!
//! Each generation of instruments lives in its own private `Registry`. The
//! injected registry only ever sees one stable [`LiveCollectors`] entry that
//! gathers from whichever generation is live, because a `prometheus`
//! registry pins the label names of a metric name for the process lifetime.
//! Hooks take a snapshot of the live generation and never hold the lock
//! while observing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use reqprom_core::buckets::{as_f64, request_size_buckets, response_size_buckets};
use reqprom_core::error::{ReqPromError, Result};

pub const HTTP_REQUESTS: &str = "http_requests";
pub const HTTP_REQUESTS_ERRORS: &str = "http_requests_errors";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const HTTP_REQUEST_SIZE_BYTES: &str = "http_request_size_bytes";
pub const HTTP_RESPONSE_SIZE_BYTES: &str = "http_response_size_bytes";

/// Label names every counter carries before the extra labels.
pub const COUNTER_LABELS: [&str; 3] = ["method", "path", "status"];
/// Label names every histogram carries before the extra labels.
pub const HISTOGRAM_LABELS: [&str; 1] = ["path"];

/// Label values for one observation, keyed by label name.
pub type LabelValues<'a> = HashMap<&'a str, &'a str>;

fn metric_err(e: prometheus::Error) -> ReqPromError {
    ReqPromError::Metric(e.to_string())
}

#[derive(Clone)]
enum Inner {
    Counter(CounterVec),
    Histogram(HistogramVec),
}

/// Kind of a [`MetricInstrument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    Counter,
    Histogram,
}

/// A named, labeled counter or histogram.
#[derive(Clone)]
pub struct MetricInstrument {
    name: &'static str,
    help: &'static str,
    label_names: Vec<String>,
    buckets: Vec<f64>,
    inner: Inner,
}

impl MetricInstrument {
    fn counter(name: &'static str, help: &'static str, label_names: Vec<String>) -> Result<Self> {
        let names: Vec<&str> = label_names.iter().map(String::as_str).collect();
        let vec = CounterVec::new(Opts::new(name, help), &names).map_err(metric_err)?;
        Ok(Self {
            name,
            help,
            label_names,
            buckets: Vec::new(),
            inner: Inner::Counter(vec),
        })
    }

    fn histogram(
        name: &'static str,
        help: &'static str,
        label_names: Vec<String>,
        buckets: Vec<f64>,
    ) -> Result<Self> {
        let names: Vec<&str> = label_names.iter().map(String::as_str).collect();
        let opts = HistogramOpts::new(name, help).buckets(buckets.clone());
        let vec = HistogramVec::new(opts, &names).map_err(metric_err)?;
        Ok(Self {
            name,
            help,
            label_names,
            buckets,
            inner: Inner::Histogram(vec),
        })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn help(&self) -> &str {
        self.help
    }

    /// Ordered label names: fixed names first, then the extra names.
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Bucket upper bounds; empty for counters.
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    pub fn kind(&self) -> InstrumentKind {
        match self.inner {
            Inner::Counter(_) => InstrumentKind::Counter,
            Inner::Histogram(_) => InstrumentKind::Histogram,
        }
    }

    /// Increment a counter series by one.
    pub fn inc(&self, labels: &LabelValues<'_>) -> Result<()> {
        match &self.inner {
            Inner::Counter(vec) => {
                vec.get_metric_with(labels).map_err(metric_err)?.inc();
                Ok(())
            }
            Inner::Histogram(_) => Err(ReqPromError::Metric(format!(
                "{} is a histogram, not a counter",
                self.name
            ))),
        }
    }

    /// Record one observation on a histogram series.
    pub fn observe(&self, labels: &LabelValues<'_>, value: f64) -> Result<()> {
        match &self.inner {
            Inner::Histogram(vec) => {
                vec.get_metric_with(labels).map_err(metric_err)?.observe(value);
                Ok(())
            }
            Inner::Counter(_) => Err(ReqPromError::Metric(format!(
                "{} is a counter, not a histogram",
                self.name
            ))),
        }
    }

    fn collector(&self) -> Box<dyn Collector> {
        match &self.inner {
            Inner::Counter(vec) => Box::new(vec.clone()),
            Inner::Histogram(vec) => Box::new(vec.clone()),
        }
    }

    fn descs(&self) -> Vec<Desc> {
        match &self.inner {
            Inner::Counter(vec) => vec.desc().into_iter().cloned().collect(),
            Inner::Histogram(vec) => vec.desc().into_iter().cloned().collect(),
        }
    }
}

/// One generation of instruments, all sharing the same extra label names.
pub struct Collectors {
    instruments: HashMap<&'static str, MetricInstrument>,
    extra_label_names: Vec<String>,
    registry: Registry,
}

impl Collectors {
    /// Look up an instrument by metric name.
    pub fn get(&self, name: &str) -> Result<&MetricInstrument> {
        self.instruments
            .get(name)
            .ok_or_else(|| ReqPromError::UnknownMetric(name.to_string()))
    }

    pub fn extra_label_names(&self) -> &[String] {
        &self.extra_label_names
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricInstrument> {
        self.instruments.values()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

fn with_extra(fixed: &[&str], extra: &[String]) -> Vec<String> {
    fixed
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().cloned())
        .collect()
}

/// Build the five instruments for the given extra label names and register
/// them into a fresh private registry.
pub fn build_collectors(extra: &[String], duration_buckets: &[f64]) -> Result<Collectors> {
    let counter_labels = with_extra(&COUNTER_LABELS, extra);
    let histogram_labels = with_extra(&HISTOGRAM_LABELS, extra);

    let list = [
        MetricInstrument::counter(
            HTTP_REQUESTS,
            "Total number of requests",
            counter_labels.clone(),
        )?,
        MetricInstrument::counter(
            HTTP_REQUESTS_ERRORS,
            "Total number of error requests",
            counter_labels,
        )?,
        MetricInstrument::histogram(
            HTTP_REQUEST_DURATION_SECONDS,
            "The amount of time spent handling requests",
            histogram_labels.clone(),
            duration_buckets.to_vec(),
        )?,
        MetricInstrument::histogram(
            HTTP_REQUEST_SIZE_BYTES,
            "The size of requests in bytes",
            histogram_labels.clone(),
            as_f64(&request_size_buckets()),
        )?,
        MetricInstrument::histogram(
            HTTP_RESPONSE_SIZE_BYTES,
            "The size of responses in bytes",
            histogram_labels,
            as_f64(&response_size_buckets()),
        )?,
    ];

    let registry = Registry::new();
    for m in &list {
        registry
            .register(m.collector())
            .map_err(|e| ReqPromError::Metric(format!("register {} failed: {e}", m.name)))?;
    }

    Ok(Collectors {
        instruments: list.into_iter().map(|m| (m.name, m)).collect(),
        extra_label_names: extra.to_vec(),
        registry,
    })
}

type LiveSlot = Arc<RwLock<Arc<Collectors>>>;

fn read_live(live: &LiveSlot) -> Arc<Collectors> {
    // A poisoned lock still holds a complete generation.
    match live.read() {
        Ok(g) => Arc::clone(&g),
        Err(p) => Arc::clone(&p.into_inner()),
    }
}

/// The single entry the injected registry holds for the HTTP instruments.
///
/// Descriptors are those of the first generation; registration is keyed on
/// them once. `collect` always reads the live generation.
struct LiveCollectors {
    descs: Vec<Desc>,
    live: LiveSlot,
}

impl Collector for LiveCollectors {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        read_live(&self.live).registry.gather()
    }
}

/// Owner of the live [`Collectors`] generation.
pub struct CollectorSet {
    registry: Registry,
    duration_buckets: Vec<f64>,
    live: LiveSlot,
}

impl CollectorSet {
    /// Build the initial generation and expose it through `registry`.
    pub fn new(registry: Registry, duration_buckets: Vec<f64>, extra: &[String]) -> Result<Self> {
        let set = build_collectors(extra, &duration_buckets)?;
        let descs = set.iter().flat_map(MetricInstrument::descs).collect();
        let live: LiveSlot = Arc::new(RwLock::new(Arc::new(set)));

        registry
            .register(Box::new(LiveCollectors {
                descs,
                live: Arc::clone(&live),
            }))
            .map_err(|e| ReqPromError::Metric(format!("register http collectors failed: {e}")))?;

        Ok(Self {
            registry,
            duration_buckets,
            live,
        })
    }

    /// Current generation. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<Collectors> {
        read_live(&self.live)
    }

    /// Look up an instrument of the current generation.
    pub fn get(&self, name: &str) -> Result<MetricInstrument> {
        self.snapshot().get(name).cloned()
    }

    /// Replace every instrument with a fresh one carrying `extra` labels.
    ///
    /// The retired generation and its private registry are dropped, so its
    /// series disappear from exposition. On failure the previous generation
    /// stays live.
    pub fn rebuild(&self, extra: &[String]) -> Result<()> {
        let next = build_collectors(extra, &self.duration_buckets)?;

        let mut live = match self.live.write() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        };
        *live = Arc::new(next);
        tracing::debug!(extra = ?extra, "collectors rebuilt");
        Ok(())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn duration_buckets(&self) -> &[f64] {
        &self.duration_buckets
    }
}
