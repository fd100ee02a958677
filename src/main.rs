use anyhow::Result;
use testforge::{cli, logger};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logger::init() {
        eprintln!("Warning: Failed to initialize logging: {e}");
    }

    match cli::main().await {
        Ok(()) => Ok(()),
        Err(e) => {
            testforge::ui::print_error(&format!("Error: {e:#}"));
            std::process::exit(1);
        }
    }
}
