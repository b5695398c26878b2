use anyhow::Context;
use settings::Settings;

use crate::adapter::esp_window::EspWindow;
use crate::frontends::homekit::{HomekitRegistry, WindowCovering};

mod adapter;
mod core;
mod frontends;
mod settings;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    settings.monitoring.init().expect("Error initializing monitoring");

    if let Err(e) = run(settings).await {
        tracing::error!("Exiting: {:?}", e);
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let windows = settings
        .windows
        .iter()
        .map(|config| {
            EspWindow::new(config, &settings.http_client)
                .map(WindowCovering::new)
                .with_context(|| format!("Error configuring window {}", config.name))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    tracing::info!("Configured {} window(s)", windows.len());

    let mut mqtt_client = settings.mqtt.new_client();

    let homebridge_runner = settings
        .homebridge
        .new_runner(&mut mqtt_client, HomekitRegistry::new(windows))
        .await
        .context("Error subscribing to Homebridge topics")?;

    tracing::info!("Starting main loop");

    tokio::select!(
        _ = mqtt_client.process() => {},
        _ = homebridge_runner.run() => {},
    );

    anyhow::bail!("Main loop terminated")
}
