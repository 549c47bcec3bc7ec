//! Logging setup and the warning sink used by the generator.
//!
//! Everything logs through `tracing`. The generator additionally reports
//! user-facing warnings through the `Logger` trait so tests can observe them.

use std::cell::RefCell;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs the global subscriber. `directive` is an `EnvFilter` string,
/// `verbosity` is the number of `-v` flags and raises the default level.
pub fn init(directive: Option<&str>, verbosity: u64) {
  INIT.call_once(|| {
    let fallback = match verbosity {
      0 => "warn",
      1 => "info",
      2 => "debug",
      _ => "trace"
    };

    let filter = match directive.map(parse) {
      Some(Ok(f))  => Some(f),
      Some(Err(e)) => {
        eprintln!("{}", e);
        None
      },
      None         => None
    };
    let filter = filter
      .or_else(|| EnvFilter::try_from_default_env().ok())
      .unwrap_or_else(|| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_target(false)
      .with_writer(std::io::stderr)
      .try_init();
  });
}

fn parse(directive: &str) -> Result<EnvFilter, String> {
  EnvFilter::try_new(directive)
    .map_err(|e| format!("Ignoring invalid log filter \"{}\": {}", directive, e))
}

pub trait Logger {
  fn warning(&self, message: &str);
}

pub struct TracingLogger;

impl Logger for TracingLogger {
  fn warning(&self, message: &str) {
    tracing::warn!("{}", message);
  }
}

/// Records warnings instead of emitting them.
#[derive(Default)]
pub struct StubLogger {
  pub warnings: RefCell<Vec<String>>
}

impl Logger for StubLogger {
  fn warning(&self, message: &str) {
    self.warnings.borrow_mut().push(message.to_string());
  }
}
