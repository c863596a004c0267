//! Logging Infrastructure
//!
//! Structured logging setup for apps embedding the client:
//! - Console output, pretty or JSON
//! - Optional daily rotating application logs
//! - Optional daily rotating order logs (events emitted through [`order_audit!`])

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, prelude::*};

/// Tracing target used for order lifecycle audit events
pub const ORDER_TARGET: &str = "orders";

/// Initialize the logging system with optional daily rotating files
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug", "warn"); `RUST_LOG` wins when set
/// * `json_format` - Whether to use JSON format on the console
/// * `log_dir` - Optional directory for file logging; `app/` and `orders/` are created below it
///
/// # Examples
/// ```no_run
/// // Development setup (console only)
/// dish_client::logger::init_logger_with_file("debug", false, None)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let file_layers = match log_dir {
        Some(dir) => Some(file_layers(dir)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layers)
        .try_init()?;

    Ok(())
}

/// Build the rotating file layers below `log_dir`
fn file_layers<S>(log_dir: &Path) -> anyhow::Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let (app_log_dir, order_log_dir) = create_log_dirs(log_dir)?;

    // Application logs: everything except the order audit target
    let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
    let app_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(app_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() != ORDER_TARGET
        }));

    // Order logs: placement and status transitions only
    let order_log = RollingFileAppender::new(Rotation::DAILY, order_log_dir, "orders");
    let order_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .with_writer(std::sync::Mutex::new(order_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() == ORDER_TARGET
        }));

    Ok(app_layer.and_then(order_layer).boxed())
}

/// Create `app/` and `orders/` below `log_dir`
fn create_log_dirs(log_dir: &Path) -> anyhow::Result<(std::path::PathBuf, std::path::PathBuf)> {
    fs::create_dir_all(log_dir)?;
    let app_log_dir = log_dir.join("app");
    let order_log_dir = log_dir.join(ORDER_TARGET);
    fs::create_dir_all(&app_log_dir)?;
    fs::create_dir_all(&order_log_dir)?;
    Ok((app_log_dir, order_log_dir))
}

/// Initialize the logging system (console only)
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

/// Order audit helper - records order placement and status transitions
///
/// # Examples
/// ```no_run
/// dish_client::order_audit!("order-123", "placed");
/// dish_client::order_audit!("order-123", "transition", "pending -> accepted");
/// ```
#[macro_export]
macro_rules! order_audit {
    ($order_id:expr, $action:expr) => {
        tracing::info!(
            target: "orders",
            order_id = %$order_id,
            action = $action,
            "ORDER"
        );
    };
    ($order_id:expr, $action:expr, $details:expr) => {
        tracing::info!(
            target: "orders",
            order_id = %$order_id,
            action = $action,
            details = %$details,
            "ORDER"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_log_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("logs");
        let (app, orders) = create_log_dirs(&root).unwrap();
        assert!(app.is_dir());
        assert!(orders.is_dir());
        assert_eq!(orders, root.join("orders"));
    }
}
