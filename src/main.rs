use clap::Parser;
use cinelog::configuration::{CliArgs, Config};
use cinelog::controller::Controller;
use log::{error, info};

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    info!("Importing configuration");
    let args = CliArgs::parse();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration imported successfully");

    // Built outside the server runtime: the SQLite backend owns its own.
    let controller = match Controller::new(config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to create a controller instance: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Unable to start the async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(controller.run()) {
        error!("Error occurred in the controller process: {}, exiting...", e);
        std::process::exit(1);
    }
}
