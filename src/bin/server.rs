use std::{env, error::Error, fs::OpenOptions, net::SocketAddr, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use grex_finances::{
    AppState, PaginationConfig, build_router, get_local_offset, graceful_shutdown,
    logging_middleware,
};

/// The REST API server for Grex Finances.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// How long bearer tokens are valid for, in minutes.
    #[arg(long, default_value_t = 60)]
    token_duration_minutes: i64,

    /// The canonical timezone used for "today", e.g. "Pacific/Auckland".
    ///
    /// Defaults to the `TZ` environment variable, or UTC if it is not set.
    #[arg(long)]
    timezone: Option<String>,

    /// The default number of records per page.
    #[arg(long, default_value_t = 20)]
    page_size: u64,

    /// The maximum number of records a client may request per page.
    #[arg(long, default_value_t = 100)]
    max_page_size: u64,

    /// Log request and response bodies.
    #[arg(long)]
    log_body: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging()?;

    let args = Args::parse();

    let Ok(secret) = env::var("SECRET") else {
        tracing::error!("The environment variable 'SECRET' must be set");
        exit(1);
    };

    let timezone = args
        .timezone
        .or_else(|| env::var("TZ").ok())
        .unwrap_or_else(|| "Etc/UTC".to_owned());
    if get_local_offset(&timezone).is_none() {
        tracing::error!("\"{timezone}\" is not a valid, canonical timezone name");
        exit(1);
    }

    if args.page_size == 0 || args.page_size > args.max_page_size {
        tracing::error!(
            "The page size {} must be between 1 and the maximum page size {}",
            args.page_size,
            args.max_page_size
        );
        exit(1);
    }
    let pagination_config = PaginationConfig {
        default_page_size: args.page_size,
        max_page_size: args.max_page_size,
        ..Default::default()
    };

    let connection = Connection::open(&args.db_path)?;
    let state = AppState::new(connection, &secret, &timezone, pagination_config)?
        .with_token_duration(Duration::minutes(args.token_duration_minutes));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let mut router = build_router(state);
    if args.log_body {
        router = router.layer(middleware::from_fn(logging_middleware));
    }
    let router = add_tracing_layer(router);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("HTTP server listening on {addr} with timezone {timezone}");
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging() -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
