//! Carbonweb main entry point

use carbonweb_api::start_server;
use carbonweb_config::Config;
use carbonweb_core::Registry;
use carbonweb_store::{JsonFileStore, StoreBackend, StoreRef};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::RwLock;

#[derive(Parser, Debug)]
#[command(name = "carbonweb")]
#[command(author = "Carbonweb Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A lightweight carbon-footprint survey web service", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let rt = Runtime::new()?;

    rt.block_on(async {
        let config = Config::load(args.config.clone())
            .expect("Failed to load configuration");

        eprintln!("[INFO] Config loaded: data path={}, data_file={}",
            config.data.path.to_string_lossy(), config.data.data_file);

        let store: StoreRef = Arc::new(JsonFileStore::new(config.data_file_path()));
        let mut registry = Registry::new(config.clone(), store.clone());

        eprintln!("[INFO] Looking for registry file: {}", store.location());

        if store.exists().await {
            eprintln!("[INFO] Registry file found, loading...");
            match registry.load().await {
                Ok(_) => eprintln!("[INFO] Registry loaded successfully"),
                Err(e) => eprintln!("[ERROR] Failed to load registry: {:?}", e),
            }
        } else {
            eprintln!("[WARN] Registry file not found, starting empty: {}", store.location());
        }

        let registry = Arc::new(RwLock::new(registry));
        start_server(config, registry).await
    });

    Ok(())
}
