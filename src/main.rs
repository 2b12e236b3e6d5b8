mod catalog;
mod config;
mod menu;
mod runtime;
mod session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let code = runtime::run().await?;
    std::process::exit(code);
}
