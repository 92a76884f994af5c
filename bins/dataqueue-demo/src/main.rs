use std::sync::Arc;
use std::time::Duration;

use dataqueue_config::EngineConfig;
use dataqueue_core::{AccessMode, AccessType, Engine, Flags};
use dataqueue_fs::StdFileSystem;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_QUEUE: &str = "demo";

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dataqueue.toml".to_string());
    let config = EngineConfig::load(&config_path).unwrap_or_else(|_| EngineConfig::default());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    std::fs::create_dir_all(&config.base_dir)?;
    let engine = Engine::new(Arc::new(StdFileSystem), &config.base_dir, config.h_max);

    info!(
        base_dir = %config.base_dir,
        h_max = config.h_max,
        "DATAQUEUE-DEMO: starting against {queue}",
        queue = DEMO_QUEUE
    );

    match engine.create(DEMO_QUEUE, 8, 256, Flags::RANDOM_ACCESS) {
        Ok(()) => info!("created demo queue"),
        Err(dataqueue_core::DataQError::QueueExists) => info!("demo queue already present, reusing it"),
        Err(e) => return Err(e.into()),
    }

    let handle = engine.open(DEMO_QUEUE, AccessType::ReadWrite, AccessMode::Unpacked)?;

    for i in 0u64.. {
        let payload = format!("tick-{i}");
        engine.enqueue(handle, payload.as_bytes())?;
        info!(payload = %payload, length = engine.get_length(handle)?, "enqueued");

        if i % 3 == 2 {
            let mut buf = [0u8; 256];
            let n = engine.dequeue(handle, &mut buf)?;
            info!(payload = %String::from_utf8_lossy(&buf[..n]), "dequeued");
        }

        std::thread::sleep(Duration::from_secs(1));
    }

    Ok(())
}
