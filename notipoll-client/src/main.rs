use clap::Parser;
use notipoll_client::{AppError, Cli, platform, run};

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    // Touches the environment, so it has to happen while the process is single-threaded.
    platform::initialize_process();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
