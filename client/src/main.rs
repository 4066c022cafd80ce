//! `beautycut` entry-point: loads settings, wires the backend adapters and
//! runs one command.

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use beautycut::BackendSettings;
use beautycut::inbound::cli::{AppOptions, Backend, Cli, CliApp, TerminalNotifier};
use beautycut::outbound::supabase::{
    SupabaseAuthGateway, SupabaseAvatarStorage, SupabaseBookingRepository, SupabaseConnection,
    SupabaseFavoriteRepository, SupabaseProfileRepository, SupabaseSalonRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    // Settings come from the environment and config files only; the command
    // line belongs to `Cli`.
    let settings = BackendSettings::load_from_iter([OsString::from("beautycut")])
        .wrap_err("load backend settings")?;
    let endpoint = settings.endpoint().wrap_err("resolve backend endpoint")?;
    let connection = SupabaseConnection::new(endpoint, settings.request_timeout())
        .wrap_err("build HTTP client")?;

    let clock = Arc::new(DefaultClock);
    let backend = Backend {
        auth: Arc::new(SupabaseAuthGateway::new(connection.clone(), clock.clone())),
        profiles: Arc::new(SupabaseProfileRepository::new(connection.clone(), clock.clone())),
        salons: Arc::new(SupabaseSalonRepository::new(connection.clone())),
        bookings: Arc::new(SupabaseBookingRepository::new(connection.clone(), clock.clone())),
        favorites: Arc::new(SupabaseFavoriteRepository::new(connection.clone())),
        avatars: Arc::new(SupabaseAvatarStorage::new(
            connection,
            settings.avatar_bucket(),
        )),
    };
    let app = CliApp::new(
        backend,
        Arc::new(TerminalNotifier::stderr()),
        clock,
        AppOptions {
            signup_cooldown: settings.signup_cooldown(),
            featured_limit: settings.featured_limit,
        },
    );

    let mut stdout = io::stdout();
    app.run(cli.command, &mut stdout)
        .await
        .map_err(|err| eyre!("{} ({:?})", err.message(), err.code()))
}
