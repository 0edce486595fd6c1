//! Structured diagnostics emitted by the gate.
//!
//! The gate reports each request outcome as one [`DiagnosticEvent`] to a
//! [`DiagnosticSink`]. Which sink is used is decided per request by a
//! [`SinkResolver`]; when the resolver yields nothing, the enforcer's
//! default sink receives the event. The default sink is [`TracingSink`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::context::RequestContext;

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// The request was rejected.
    Error,
    /// The request was let through.
    Debug,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Debug => write!(f, "debug"),
        }
    }
}

/// Value of a structured field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A single string.
    Str(String),
    /// An ordered list of strings.
    List(Vec<String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// A structured key/value record describing one request outcome.
///
/// # Examples
///
/// ```
/// use scheme_gate::diagnostics::{DiagnosticEvent, Level};
///
/// let event = DiagnosticEvent::new(Level::Error, "req-1", "no authentication found")
///     .with_field("authorization", "Basic");
///
/// assert_eq!(event.level(), Level::Error);
/// assert_eq!(event.field("authorization").unwrap().to_string(), "Basic");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    level: Level,
    request_id: String,
    message: String,
    fields: Vec<(String, FieldValue)>,
}

impl DiagnosticEvent {
    /// Creates an event with no extra fields.
    pub fn new(level: Level, request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            request_id: request_id.into(),
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Returns the severity.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns all fields in insertion order.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Returns the first field named `key`.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Renders fields as `key=value` pairs separated by spaces.
    pub fn render_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output channel for diagnostic events.
///
/// Sinks are shared across threads and must not block for long; the gate
/// calls `log` inline while handling the request.
pub trait DiagnosticSink: Send + Sync {
    /// Records one event.
    fn log(&self, event: &DiagnosticEvent);
}

/// Picks the sink for a request. `None` means "use the enforcer's default".
pub type SinkResolver = Arc<dyn Fn(&RequestContext) -> Option<Arc<dyn DiagnosticSink>> + Send + Sync>;

/// Returns the resolver that uses the sink attached to the request context.
pub fn context_sink_resolver() -> SinkResolver {
    Arc::new(|ctx: &RequestContext| ctx.sink())
}

/// Forwards events to `tracing`.
///
/// Error events go to `tracing::error!`, debug events to `tracing::debug!`.
/// Every record carries `request_id`; extra fields are flattened into a
/// single `fields` value.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log(&self, event: &DiagnosticEvent) {
        let fields = event.render_fields();
        match event.level() {
            Level::Error => tracing::error!(
                request_id = %event.request_id(),
                fields = %fields,
                "{}",
                event.message()
            ),
            Level::Debug => tracing::debug!(
                request_id = %event.request_id(),
                fields = %fields,
                "{}",
                event.message()
            ),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn log(&self, _event: &DiagnosticEvent) {}
}

/// Keeps every event in memory.
///
/// Useful for asserting on what the gate reported.
///
/// # Examples
///
/// ```
/// use scheme_gate::diagnostics::{DiagnosticEvent, DiagnosticSink, Level, MemorySink};
///
/// let sink = MemorySink::new();
/// sink.log(&DiagnosticEvent::new(Level::Debug, "req-1", "ok"));
///
/// assert_eq!(sink.len(), 1);
/// assert_eq!(sink.events()[0].message(), "ok");
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every recorded event.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn log(&self, event: &DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
