use tutora_api::setup;
use tutora_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router, background) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router, background).await?;

    Ok(())
}
