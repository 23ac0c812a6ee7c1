#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod config;
mod constants;
mod error;
mod trace;

use crate::{
  config::{parse_opts, AppConfig, ConfigReloader, ConfigSource},
  constants::CONFIG_WATCH_DELAY_SECS,
  trace::*,
};
use hot_reload::{ReloaderReceiver, ReloaderService};
use ics_relay_lib::{entrypoint, ServiceConfig};

fn main() {
  let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
  runtime_builder.enable_all();
  runtime_builder.thread_name("ics-relay");
  let runtime = match runtime_builder.build() {
    Ok(runtime) => runtime,
    Err(e) => {
      eprintln!("Failed to build tokio runtime: {e}");
      std::process::exit(1);
    }
  };

  runtime.block_on(async {
    // Initially load options
    let Ok(parsed_opts) = parse_opts() else {
      eprintln!("Invalid options");
      std::process::exit(1);
    };

    init_tracing_subscriber();

    if !parsed_opts.watch {
      let app_config = match AppConfig::new(parsed_opts.config_file_path.as_deref(), &parsed_opts.overrides) {
        Ok(v) => v,
        Err(e) => {
          error!("Invalid config file: {e}");
          std::process::exit(1);
        }
      };
      if let Err(e) = relay_service_without_watcher(&app_config, runtime.handle().clone()).await {
        error!("Calendar relay service exited: {e}");
        std::process::exit(1);
      }
    } else {
      // watch requires the config file, which is enforced by the option parser
      let Some(config_path) = parsed_opts.config_file_path.clone() else {
        error!("Config file is required to watch");
        std::process::exit(1);
      };
      let source = ConfigSource {
        config_path,
        overrides: parsed_opts.overrides.clone(),
      };
      let (config_service, config_rx) =
        match ReloaderService::<ConfigReloader, AppConfig>::new(&source, CONFIG_WATCH_DELAY_SECS, false).await {
          Ok(v) => v,
          Err(e) => {
            error!("Failed to start config reloader: {e}");
            std::process::exit(1);
          }
        };

      tokio::select! {
        Err(e) = config_service.start() => {
          error!("config reloader service exited: {e}");
          std::process::exit(1);
        }
        Err(e) = relay_service_with_watcher(config_rx, runtime.handle().clone()) => {
          error!("Calendar relay service exited: {e}");
          std::process::exit(1);
        }
      }
    }
  });
}

async fn relay_service_without_watcher(
  app_config: &AppConfig,
  runtime_handle: tokio::runtime::Handle,
) -> Result<(), anyhow::Error> {
  info!("Start calendar relay service");
  // fail fast: never accept traffic without a complete configuration
  let service_conf = match app_config.try_into() as Result<ServiceConfig, anyhow::Error> {
    Ok(v) => v,
    Err(e) => {
      error!("Invalid configuration: {e}");
      return Err(anyhow::anyhow!(e));
    }
  };

  entrypoint(&service_conf, &runtime_handle, None)
    .await
    .map_err(|e| anyhow::anyhow!(e))
}

async fn relay_service_with_watcher(
  mut config_rx: ReloaderReceiver<AppConfig>,
  runtime_handle: tokio::runtime::Handle,
) -> Result<(), anyhow::Error> {
  info!("Start calendar relay service with dynamic config reloader");
  // Initial loading
  config_rx.changed().await?;
  let Some(reloaded) = config_rx.borrow().clone() else {
    return Err(anyhow::anyhow!("Failed to load initial config"));
  };
  let mut service_conf = match (&reloaded).try_into() as Result<ServiceConfig, anyhow::Error> {
    Ok(v) => v,
    Err(e) => {
      error!("Invalid configuration: {e}");
      return Err(anyhow::anyhow!(e));
    }
  };

  // Notifier for relay service termination
  let term_notify = std::sync::Arc::new(tokio::sync::Notify::new());

  // Continuous monitoring
  loop {
    tokio::select! {
      res = entrypoint(&service_conf, &runtime_handle, Some(term_notify.clone())) => {
        if let Err(e) = res {
          error!("Calendar relay service exited: {e}")
        } else {
          error!("Calendar relay service entrypoint exited");
        }
        break;
      }
      _ = config_rx.changed() => {
        let Some(app_config) = config_rx.borrow().clone() else {
          error!("Something wrong in config reloader receiver");
          break;
        };
        match (&app_config).try_into() as Result<ServiceConfig, anyhow::Error> {
          Ok(p) => {
            service_conf = p
          },
          Err(e) => {
            error!("Invalid configuration. Configuration does not updated: {e}");
            continue;
          }
        };
        info!("Configuration updated. Terminate the running service and re-bind the TCP socket");
        term_notify.notify_waiters();
      }
      else => break
    }
  }

  Err(anyhow::anyhow!(
    "http routing service or continuous monitoring service exited"
  ))
}
