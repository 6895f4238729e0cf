mod cli;
mod config;
mod handlers;
mod models;
mod services;
mod web; // Camera capture page + JSON API

#[cfg(feature = "web-server")]
use web::server::create_router;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;

use cli::Cli;
use config::Config;
use handlers::MenuScanner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables (RUST_LOG may come from .env)
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    let args = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    log::debug!("Loaded configuration: {:?}", config);

    let client = services::build_inference_client(&config);
    let scanner = MenuScanner::new(client);
    log::info!("✅ {} client initialized with model: {}", config.provider, scanner.model());

    if let Some(image_path) = args.image.as_deref() {
        let export = cli::scan_file(&scanner, image_path, args.format.into()).await?;
        print!("{}", String::from_utf8_lossy(&export.bytes));

        if let Some(out) = args.out.as_deref() {
            cli::write_export(&export, out).await?;
        }
        return Ok(());
    }

    serve(scanner, &config).await
}

#[cfg(feature = "web-server")]
async fn serve(scanner: MenuScanner, config: &Config) -> Result<()> {
    let app = create_router(scanner, config.max_image_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    log::info!("🌐 Menu scanner listening on http://{}", config.bind_addr);

    println!("\n📷 Smart Menu Scanner is running!");
    println!("🌐 Open http://{} on a phone or laptop with a camera", config.bind_addr);
    println!("\n🛑 Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("🛑 Shutting down...");
        })
        .await?;

    Ok(())
}

#[cfg(not(feature = "web-server"))]
async fn serve(_scanner: MenuScanner, _config: &Config) -> Result<()> {
    anyhow::bail!("built without the web-server feature; pass an image path to scan it once")
}
