use tracing_subscriber::{fmt, EnvFilter};

/// Sets up stderr logging. `RUST_LOG` wins over `verbose` when it is set,
/// e.g. `RUST_LOG=grader_cli::rename_folders=debug`.
pub fn init(verbose: bool) {
    let default = if verbose { "grader_cli=debug" } else { "grader_cli=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}
