use lancet_runtime::LancetRuntime;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lancet_core=info,lancet_runtime=info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match LancetRuntime::from_args().run().await {
        Ok(summary) => {
            if !summary.accepted() {
                warn!("Run finished with {} warnings", summary.verdicts.len());
            }
            Ok(())
        }
        Err(err) if err.is_fatal() => {
            error!("Fatal error, aborting: {err}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
