pub mod config;

pub mod codec;
pub mod error;
pub mod factory;
pub mod manager;
pub mod parser;
pub mod render;
pub mod sensor;
pub mod transport;

pub use error::{ErrorKind, Severity, TwinError};
pub use factory::SensorFactory;
pub use manager::SensorManager;
pub use parser::SensorMetadata;
pub use render::{NullRenderer, Renderer};
pub use sensor::{ParamKind, Parameter, Sensor, Status};
pub use transport::{ConsoleTransport, Transport};

use crate::config::AppConfig;
use log::info;

/// Runs one full twin lifecycle over the console transport: initialize the
/// collection, push configs and pull values for every sensor, redraw, dump
/// state, tear down. Responses are read from stdin, so this doubles as a
/// manual protocol console.
pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    info!("Starting sensor twin");

    let mut manager = SensorManager::new(ConsoleTransport::new(), NullRenderer);

    manager.initialize(config.link.discovery);
    manager.print_all();

    manager.reconstruct_all();
    manager.resync_all();
    manager.redraw_all();

    manager.print_all();
    manager.erase_all();

    info!("Done");
    Ok(())
}
