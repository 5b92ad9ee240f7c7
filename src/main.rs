use std::process;

use smartguard::{
    config::Config,
    core::{logging_hooks, run_until_stopped, Executor, MqttSession, SimulatorError},
    logger::LoggerManager,
    print_error,
};
use smartguard_mqtt_v4::{MqttInstance, MqttManager};
use tracing::{debug, error, info};

fn start_transport(cfg: &Config) -> Result<MqttInstance, SimulatorError> {
    let instance = MqttManager::from_config(cfg.transport.clone())?
        .with_hooks(logging_hooks())
        .subscribe_on_connect(cfg.simulator.topic.clone(), cfg.simulator.qos)?
        .start()?;
    Ok(instance)
}

#[tokio::main]
async fn main() {
    let cfg = Config::new().unwrap_or_else(|e| {
        print_error!("{}", e);
        process::exit(1);
    });
    let mut logger_manager = LoggerManager::new(cfg.logger.clone()).unwrap_or_else(|e| {
        print_error!("Failed to setup Log Manager: {}", e);
        process::exit(1);
    });
    logger_manager.init().unwrap_or_else(|e| {
        print_error!("Failed to init Log Manager: {}", e);
        process::exit(1);
    });
    info!("Starting smartguard version {}...", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", cfg.logger.level);
    debug!("{:#?}", cfg.transport);
    debug!("{:#?}", cfg.simulator);

    let instance = match start_transport(&cfg) {
        Ok(instance) => instance,
        Err(e) => {
            error!("Error: {}", e);
            return;
        }
    };
    let mut session = MqttSession::new(instance, &cfg.simulator);
    let executor = Executor::from_config(&cfg.simulator);

    let outcome = run_until_stopped(&mut session, &executor, tokio::signal::ctrl_c()).await;

    debug!("Simulator finished: {:?}", outcome);
    info!("Shutdown complete");
    process::exit(outcome.exit_code());
}
