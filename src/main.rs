// src/main.rs

use fixture_cache::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("fixture-cache error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        eprintln!("fixture-cache error: {err}");
        // 2: session-level failure, 1: this scenario's data failed.
        let code = if err.is_fatal() { 2 } else { 1 };
        std::process::exit(code);
    }
}
