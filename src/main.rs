use game_client::render::DrawSurface;
use game_client::{ClientConfig, GameClient, WsConnector};
use tracing::{info, trace};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Diagnostic surface: the concrete drawing backend is out of scope for this
/// crate, so the shipped binary logs draw operations at trace level.
#[derive(Debug, Default)]
struct TraceSurface;

impl DrawSurface for TraceSurface {
    fn clear(&mut self) {
        trace!("clear");
    }
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str) {
        trace!(x, y, w, h, color, "fill_rect");
    }
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: &str) {
        trace!(x, y, radius, color, "fill_circle");
    }
    fn stroke_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: &str) {
        trace!(x1, y1, x2, y2, width, color, "stroke_line");
    }
    fn text(&mut self, x: f64, y: f64, text: &str, font: &str, color: &str) {
        trace!(x, y, text, font, color, "text");
    }
}

#[tokio::main]
async fn main() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ClientConfig::from_env();
    info!(
        server_id = %config.server_id,
        player_id = %config.player_id,
        base_url = %config.base_url,
        "starting client"
    );

    let client = match GameClient::connect(config, Box::new(WsConnector)) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = ?e, "invalid endpoint configuration");
            return;
        }
    };

    // Surface status transitions and the live player count to the log.
    let mut status_rx = client.transport().status_watch();
    let store = client.store().clone();
    tokio::spawn(async move {
        loop {
            let status = *status_rx.borrow_and_update();
            info!(status = status.label(), players = store.player_count(), "status");
            if status_rx.changed().await.is_err() {
                return;
            }
        }
    });

    let mut surface = TraceSurface;
    client.run(&mut surface).await;
    info!("client stopped");
}
