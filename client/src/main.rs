//! `academy` entry-point: loads gateway settings, wires the Supabase adapters
//! and runs one shell command.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

use academy_client::GatewaySettings;
use academy_client::inbound::cli::{self, Cli, Gateways, TerminalNotifier};
use academy_client::outbound::supabase::Connection;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = Cli::parse();
    let settings = GatewaySettings::load_from_iter([OsString::from("academy")])
        .wrap_err("failed to load gateway settings")?;
    let connection = Connection::new(
        settings.endpoint()?,
        settings.anon_key()?,
        settings.request_timeout(),
    )
    .wrap_err("failed to build HTTP client")?;
    let (auth, data) = connection.gateways();
    let gateways = Gateways {
        auth: Arc::new(auth),
        data: Arc::new(data),
        notifier: Arc::new(TerminalNotifier),
        clock: Arc::new(DefaultClock),
    };

    let password = match args.password.clone() {
        Some(password) => Zeroizing::new(password),
        None => cli::read_secret(io::stdin().lock()).wrap_err("failed to read password")?,
    };

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    let outcome = runtime.block_on(cli::run(
        &args.command,
        &args.email,
        &password,
        &gateways,
        &mut io::stdout().lock(),
    ));
    Ok(match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("academy: {err}");
            ExitCode::from(err.exit_code())
        }
    })
}
