use anyhow::Context;
use dfort::kernel::config::load_config;
use dfort::domain::config::ApiConfig;
use dfort_logger::Logger;
use dfort_server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig =
        load_config(None::<&str>).context("Critical: Configuration is malformed")?;

    let _log = Logger::from_config(env!("CARGO_PKG_NAME"), &cfg.logging)?;

    Server::builder().config(cfg).build().await?.run().await
}
