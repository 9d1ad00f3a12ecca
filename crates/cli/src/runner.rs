// runner.rs
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::info;
use loginswarm_common::{ProbeTimeouts, Prober, RunConfig};
use loginswarm_orchestrator::{validate_num_logins, Orchestrator};
use loginswarm_prober::{HttpLoginProber, SimulatedProber};
use crate::args::ProbeArgs;
use crate::output::{print_event, OutputFormat};

/// Map CLI flags onto a prober and run configuration.
pub fn build_orchestrator(args: &ProbeArgs) -> Result<Orchestrator> {
    let timeouts = ProbeTimeouts {
        page_load: Duration::from_secs(args.page_load_timeout),
        explicit_wait: Duration::from_secs(args.explicit_wait),
        implicit_wait: Duration::from_secs(args.implicit_wait),
    };
    let config = RunConfig::default()
        .with_worker_cap(args.worker_cap)
        .with_timeouts(timeouts);

    let prober: Arc<dyn Prober> = if args.simulate {
        Arc::new(SimulatedProber::new().with_failure_rate(args.failure_rate))
    } else {
        Arc::new(
            HttpLoginProber::new()
                .with_login_url(&args.login_url)?
                .with_credentials(&args.username, &args.password),
        )
    };

    info!("Prober: {}", prober.name());
    info!("Worker cap: {}", config.worker_cap);
    info!(
        "Timeouts: page load {}s, explicit wait {}s, implicit wait {}s",
        args.page_load_timeout, args.explicit_wait, args.implicit_wait
    );

    Ok(Orchestrator::new(prober, config))
}

pub async fn run_logins(num_logins: i64, output_format: &str, args: &ProbeArgs) -> Result<()> {
    let num_logins = validate_num_logins(&serde_json::json!(num_logins))?;
    let format: OutputFormat = output_format.parse()?;

    let orchestrator = build_orchestrator(args)?;
    let mut stream = orchestrator
        .start_run(num_logins)
        .context("Failed to start run")?;

    while let Some(event) = stream.next().await {
        print_event(&event, format)?;
    }
    Ok(())
}
