use dotenvy::dotenv;
use tracing::error;

use cm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing_subscriber("cm-api");
    install_tracing_panic_hook("cm-api");

    if let Err(err) = cm_api::run().await {
        error!(error = %err, "cm-api failed to start");
        std::process::exit(1);
    }
}
