// src/main.rs

use procrunner::{cli, config, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("procrunner error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    let settings = config::load_settings(args.config.as_deref())?;
    logging::init_logging(args.log_level, settings.log_level)?;
    run(args, &settings).await
}
