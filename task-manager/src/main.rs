#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = task_manager::config::Config::from_env()?;
    task_manager::logging::init(&config)?;
    task_manager::web::start_web_server(config).await
}
