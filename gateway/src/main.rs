use args::Args;
use clap::Parser;
use gateway_core::ServeConfig;

mod args;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(&args);

    gateway_core::serve(serve_config()?).await
}

fn serve_config() -> anyhow::Result<ServeConfig> {
    Ok(ServeConfig {
        server: config::load_server()?,
        auth: config::load_auth()?,
        auth_config_path: config::auth_config_path(),
        acl: config::load_acl()?,
        rate_limits: config::load_rate_limits()?,
        quota: config::load_quota()?,
        tls: config::load_tls()?,
    })
}
