// src/main.rs

use backstop::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("failed to initialise logging: {err:?}");
        std::process::exit(2);
    }

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("backstop error: {err}");
            std::process::exit(2);
        }
    }
}
