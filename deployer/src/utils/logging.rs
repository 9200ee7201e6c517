//! Log output of the deployer.
//!
//! `LOG_FORMAT=json` selects one JSON object per event, anything else a colored table. Deployment
//! steps run in spans carrying a `step` field, shown in its own column.

use chrono::Utc;
use color_eyre::eyre::WrapErr;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter, Layer, Registry};

const STEP_FIELD: &str = "step";
const MESSAGE_FIELD: &str = "message";
const DEFAULT_FILTER: &str = "subnet_deployer=info,deployer_utils=info,deployer_network_runner_client=info";

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[90m";
const TIMESTAMP: &str = "\x1b[96m";
const STEP: &str = "\x1b[92m";
const MESSAGE: &str = "\x1b[97m";

/// Fields recorded on a span, kept in the span extensions.
#[derive(Debug, Clone, Default)]
pub struct SpanFields(pub BTreeMap<String, Value>);

/// Collects the fields of an event or span, the message apart.
#[derive(Default)]
struct FieldMap {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldMap {
    fn insert(&mut self, field: &Field, value: Value) {
        match value {
            Value::String(message) if field.name() == MESSAGE_FIELD => self.message = Some(message),
            value => {
                self.fields.insert(field.name().to_string(), value);
            }
        }
    }
}

impl Visit for FieldMap {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.insert(field, Value::String(format!("{:?}", value).trim_matches('"').to_string()));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }
}

/// Records span fields into the span extensions, so the formatters can read them back.
pub struct SpanFieldsLayer;

impl<S> Layer<S> for SpanFieldsLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldMap::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.fields.into_iter().collect()));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldMap::default();
        values.record(&mut visitor);

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(existing) => existing.0.extend(visitor.fields),
            None => extensions.insert(SpanFields(visitor.fields.into_iter().collect())),
        }
    }
}

/// Innermost `step` of the spans enclosing the event.
fn current_step<S, N>(ctx: &FmtContext<'_, S, N>) -> Option<String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    for span in ctx.event_scope()? {
        let extensions = span.extensions();
        if let Some(step) = extensions.get::<SpanFields>().and_then(|fields| fields.0.get(STEP_FIELD)) {
            return Some(display_value(step));
        }
    }
    None
}

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "\x1b[90m",
        Level::DEBUG => "\x1b[34m",
        Level::INFO => "\x1b[32m",
        Level::WARN => "\x1b[33m",
        Level::ERROR => "\x1b[31m",
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Console table: timestamp | level | step | service | message (fields).
pub struct PrettyFormatter;

impl<S, N> FormatEvent<S, N> for PrettyFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();
        let mut visitor = FieldMap::default();
        event.record(&mut visitor);

        let step = current_step(ctx).unwrap_or_else(|| "-".to_string()).to_uppercase();
        let separator = format!("{DIM}|{RESET}");

        write!(writer, "{TIMESTAMP}{}{RESET} {separator} ", Utc::now().format("%y-%m-%d %H:%M:%S"))?;
        write!(writer, "{}{:<5}{RESET} {separator} ", level_color(meta.level()), meta.level())?;
        write!(writer, "{STEP}{:<12}{RESET} {separator} ", step)?;
        write!(writer, "{STEP}{:<8}{RESET} {separator} ", service_name(meta.target()))?;
        write!(writer, "{MESSAGE}{}{RESET}", visitor.message.unwrap_or_default())?;

        if !visitor.fields.is_empty() {
            let fields: Vec<String> = visitor
                .fields
                .iter()
                .map(|(name, value)| format!("{DIM}{name}={}{RESET}", display_value(value)))
                .collect();
            write!(writer, " ({})", fields.join(", "))?;
        }
        writeln!(writer)
    }
}

/// One JSON object per line, with the step and the fields of the current span.
pub struct JsonEventFormatter;

impl<S, N> FormatEvent<S, N> for JsonEventFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();
        let mut visitor = FieldMap::default();
        event.record(&mut visitor);

        let mut root = Map::new();
        root.insert("timestamp".into(), Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true).into());
        root.insert("level".into(), meta.level().to_string().into());
        root.insert("target".into(), meta.target().into());
        root.insert("service".into(), service_name(meta.target()).into());
        if let Some(step) = current_step(ctx) {
            root.insert(STEP_FIELD.into(), step.into());
        }
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            root.insert("location".into(), format!("{file}:{line}").into());
        }
        if let Some(message) = visitor.message {
            root.insert(MESSAGE_FIELD.into(), message.into());
        }

        let mut fields = visitor.fields;
        if let Some(span) = ctx.lookup_current() {
            fields.insert("span".into(), span.metadata().name().into());
            if let Some(span_fields) = span.extensions().get::<SpanFields>() {
                for (name, value) in &span_fields.0 {
                    fields.entry(name.clone()).or_insert_with(|| value.clone());
                }
            }
        }
        if !fields.is_empty() {
            root.insert("fields".into(), Value::Object(fields));
        }

        let line = serde_json::to_string(&root).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

/// Installs color-eyre and the global subscriber.
///
/// `RUST_LOG` overrides the default filter, `LOG_FORMAT=json` switches to JSON output.
pub fn init_logging() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::builder()
            .with_default_directive(Level::INFO.into())
            .parse(DEFAULT_FILTER)
            .wrap_err("Invalid default log filter")?,
    };

    let fmt_layer = tracing_fmt::layer();
    let fmt_layer = match deployer_utils::env_utils::get_env_var_or_default("LOG_FORMAT", "pretty").as_str() {
        "json" => fmt_layer.event_format(JsonEventFormatter).boxed(),
        _ => fmt_layer.event_format(PrettyFormatter).boxed(),
    };

    let subscriber =
        Registry::default().with(env_filter).with(SpanFieldsLayer).with(fmt_layer).with(ErrorLayer::default());
    tracing::subscriber::set_global_default(subscriber).wrap_err("Failed to set global default subscriber")?;
    Ok(())
}

/// Short name of the crate emitting an event.
fn service_name(target: &str) -> &'static str {
    const SERVICES: [(&str, &str); 4] = [
        ("deployer_network_runner_client", "RUNNER"),
        ("deployer_network_client_interface", "CLIENT"),
        ("deployer_utils", "UTILS"),
        ("subnet_deployer", "-"),
    ];
    SERVICES.iter().find(|(prefix, _)| target.starts_with(prefix)).map_or("EXTERNAL", |(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("deployer_network_runner_client", "RUNNER")]
    #[case("deployer_utils::download", "UTILS")]
    #[case("subnet_deployer::deploy", "-")]
    #[case("hyper::client", "EXTERNAL")]
    fn service_names(#[case] target: &str, #[case] expected: &str) {
        assert_eq!(service_name(target), expected);
    }

    #[rstest]
    #[case(Value::String("boot".to_string()), "boot")]
    #[case(Value::from(3u64), "3")]
    #[case(Value::from(true), "true")]
    fn values_display_without_quotes(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(display_value(&value), expected);
    }
}
