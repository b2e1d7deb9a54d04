mod cli;

use iptmon_core::error::StartupError;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {e:#}"); // pretty anyhow chain
        if matches!(
            e.downcast_ref::<StartupError>(),
            Some(StartupError::InvalidPosition { .. })
        ) {
            eprintln!("Run `iptmon --list` to see the numbered rules.");
        }
        std::process::exit(1);
    }
}
