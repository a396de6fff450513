// src/main.rs

use projmk::errors::PipelineError;
use projmk::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        // Name the failing target first, make-style, then the full chain.
        if let Some(target) = err.downcast_ref::<PipelineError>().and_then(|e| e.target()) {
            eprintln!("projmk: *** [{target}] failed");
        }
        eprintln!("projmk error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
