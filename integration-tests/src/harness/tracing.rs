use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Mutex, Once};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

const ACCESS_TARGET: &str = "prism::access";

/// One access log event with its fields rendered as text.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

static ACCESS_LOG: Mutex<Vec<CapturedEvent>> = Mutex::new(Vec::new());

/// Records every access log event into a process-wide buffer.
struct AccessLogLayer;

impl<S: Subscriber> Layer<S> for AccessLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != ACCESS_TARGET {
            return;
        }

        let mut fields = FieldText(BTreeMap::new());
        event.record(&mut fields);
        ACCESS_LOG.lock().unwrap().push(CapturedEvent { fields: fields.0 });
    }
}

/// Install the capturing subscriber once per test binary.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::registry().with(AccessLogLayer);
        tracing::subscriber::set_global_default(subscriber)
            .expect("failed to set global tracing subscriber");
    });
}

/// Access log events recorded so far for `path`.
///
/// Tests run in parallel against one global subscriber, so filter by a path unique to the test.
pub fn access_events(path: &str) -> Vec<CapturedEvent> {
    ACCESS_LOG
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.field("path") == Some(path))
        .cloned()
        .collect()
}

struct FieldText(BTreeMap<String, String>);

impl FieldText {
    fn put(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldText {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.put(field, format!("{value:?}"));
    }
}
