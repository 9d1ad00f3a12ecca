use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "loginswarm")]
#[command(version = "0.1.0")]
#[command(about = "Concurrent login probe runner with live progress", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the streaming endpoint (POST /execute)
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: String,

        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Run once in-process and print events as they arrive
    Run {
        /// Number of login attempts
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        num_logins: i64,

        /// Output format: text or jsonl
        #[arg(short, long, default_value = "text", value_parser = ["text", "jsonl"])]
        output_format: String,

        #[command(flatten)]
        probe: ProbeArgs,
    },
}

#[derive(Args, Clone)]
pub struct ProbeArgs {
    /// Max concurrent probes
    #[arg(short = 'c', long, default_value = "10")]
    pub worker_cap: usize,

    /// Page load timeout in seconds
    #[arg(long, default_value = "15")]
    pub page_load_timeout: u64,

    /// Explicit wait timeout in seconds
    #[arg(long, default_value = "8")]
    pub explicit_wait: u64,

    /// Implicit wait (connect) timeout in seconds
    #[arg(long, default_value = "5")]
    pub implicit_wait: u64,

    /// Login page URL
    #[arg(long, default_value = "https://the-internet.herokuapp.com/login")]
    pub login_url: String,

    #[arg(long, default_value = "tomsmith")]
    pub username: String,

    #[arg(long, default_value = "SuperSecretPassword!")]
    pub password: String,

    /// Use the simulated prober instead of real logins
    #[arg(long)]
    pub simulate: bool,

    /// Simulated failure rate in [0, 1]
    #[arg(long, default_value = "0.1")]
    pub failure_rate: f64,
}
