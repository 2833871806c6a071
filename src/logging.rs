use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Install the global tracing subscriber. `RUST_LOG` wins over the defaults.
pub fn init_logger(format: LogFormat, verbose: bool) {
  let default_filter = if verbose {
    "trainer_zones=debug,trainer_zones_lib=debug,info"
  } else {
    "trainer_zones=info,trainer_zones_lib=info,warn"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  let registry = tracing_subscriber::registry().with(filter);

  match format {
    LogFormat::Compact => registry
      .with(
        tracing_subscriber::fmt::layer()
          .with_target(false)
          .with_thread_ids(false)
          .compact(),
      )
      .init(),
    LogFormat::Json => registry
      .with(tracing_subscriber::fmt::layer().with_target(true).json())
      .init(),
  }
}
