use ais_tracker::{settings::Settings, startup::App};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = Settings::new().unwrap();
    let app = App::build(settings);

    app.run().await;
}
