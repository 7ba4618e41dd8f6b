use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

#[rocket::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = gazette::rocket().launch().await {
        tracing::error!("the server failed to launch: {:?}", err);
    }
}
