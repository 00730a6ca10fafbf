use clap::Parser;
use config::Config;
use monitor::{LinePrinter, MonitorEngine};
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod signals;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // NOTE: The verbosity flag takes precedence over the environment
    // variable for log control. For example, `PROCSPY_LOG=warn procspy -vvv`
    // will still log at the trace level. The environment variable
    // (`PROCSPY_LOG`) can only set the log level per crate, not override
    // the verbosity flag.
    let env_filter = EnvFilter::builder()
        .with_env_var("PROCSPY_LOG")
        .from_env()?
        .add_directive(cli.verbosity.log_level_filter().as_str().parse()?);

    // Logs go to stderr; stdout carries only observation lines.
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();

    // Operator-facing header; observation lines follow below it.
    writeln!(
        std::io::stdout(),
        "procspy {}: minimal process activity monitor",
        env!("CARGO_PKG_VERSION")
    )?;

    // load config
    let mut config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        _ => {
            let mut candidates = glob::glob("/etc/procspy/config.d/*.toml")?
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            candidates.insert(0, "/etc/procspy/config.toml".into());
            trace!(?candidates, "config file candidates");
            Config::load_multiple(candidates)?
        }
    };
    cli.apply_overrides(&mut config);
    debug!(?config, ?cli);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = signals::shutdown_signal().await {
                error!("error happened while waiting for signals: {err}");
            }
            cancel.cancel();
        });
    }

    // Start-up failures (unreadable pid_max, no notification channel)
    // abort with a non-zero status before the loop exists.
    let sink = LinePrinter::new(std::io::stdout(), config.output.colour, config.output.ppid);
    let mut engine = MonitorEngine::new(&config, Box::new(sink))?;

    let result = tokio::task::spawn_blocking(move || engine.run(&cancel)).await?;
    if let Err(err) = result {
        error!("error happened in the trigger loop: {err}");
    }

    // Completion marker; reached on both graceful and loop-failure paths.
    writeln!(std::io::stdout(), "\ndone")?;
    Ok(())
}
