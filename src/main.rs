mod chat;
mod config;
mod error;
mod event;
mod theme;
mod view;

use chat::transport::HttpTransport;
use chat::ChatSession;
use config::Config;
use eframe::egui;
use tracing_subscriber::EnvFilter;
use view::clipboard::SystemClipboard;
use view::ChatView;

const WINDOW_TITLE: &str = "Genie - Your Personal AI Assistant";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("genie=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load()?;
    tracing::info!(url = %config.chat_url(), "starting chat window");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("genie-runtime")
        .build()?;

    let transport = HttpTransport::new(&config, runtime.handle().clone());
    let session = ChatSession::new(Box::new(transport));
    let app = ChatView::new(session, Box::new(SystemClipboard::default()), &config);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([720.0, 820.0])
            .with_min_inner_size([320.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
