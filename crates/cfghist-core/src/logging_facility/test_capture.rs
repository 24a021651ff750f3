//! In-memory event capture for tests
//!
//! Installs a global subscriber that keeps every event's fields as strings,
//! at every level, so tests can check what a cycle logged. All tests in one
//! binary share the buffer; select events by a unique `op` or id field.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One recorded event.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn op(&self) -> Option<&str> {
        self.field("op")
    }

    /// `start`, `end` or `end_error` for lifecycle events.
    pub fn event(&self) -> Option<&str> {
        self.field("event")
    }
}

type Buffer = Arc<Mutex<Vec<CapturedEvent>>>;

struct Fields<'a>(&'a mut BTreeMap<String, String>);

impl Visit for Fields<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

struct CaptureLayer(Buffer);

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        event.record(&mut Fields(&mut fields));
        let captured = CapturedEvent {
            level: *event.metadata().level(),
            fields,
        };
        if let Ok(mut events) = self.0.lock() {
            events.push(captured);
        }
    }
}

/// Shared view of the captured events.
#[derive(Clone)]
pub struct TestCapture(Buffer);

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events logged under `op`, in emission order.
    pub fn for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.matching(|e| e.op() == Some(op))
    }

    /// Events carrying `name = value`, in emission order.
    pub fn with_field(&self, name: &str, value: &str) -> Vec<CapturedEvent> {
        self.matching(|e| e.field(name) == Some(value))
    }

    fn matching(&self, keep: impl Fn(&CapturedEvent) -> bool) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| keep(e)).collect()
    }
}

static CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture subscriber (once per process) and return its handle.
///
/// ```
/// use cfghist_core::logging_facility::test_capture::init_test_capture;
/// use cfghist_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_capture_op");
/// assert_eq!(capture.for_op("doc_capture_op")[0].event(), Some("start"));
/// ```
pub fn init_test_capture() -> TestCapture {
    CAPTURE
        .get_or_init(|| {
            let buffer = Buffer::default();
            tracing_subscriber::registry()
                .with(CaptureLayer(buffer.clone()))
                .init();
            TestCapture(buffer)
        })
        .clone()
}
