use screencolor_rust::capture;
use screencolor_rust::cli::{CommandLine, USAGE};
use screencolor_rust::config::Configuration;
use screencolor_rust::coordinator::CoordinatorBuilder;
use screencolor_rust::error::AppError;
use screencolor_rust::logging::init_logging;
use screencolor_rust::pipeline::services::publish::MqttPublisher;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let command_line = CommandLine::parse(std::env::args().skip(1)).inspect_err(|e| {
        eprintln!("{}\n\n{}", e, USAGE);
    })?;
    if command_line.show_help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut configuration = Configuration::load(command_line.config_path.as_deref())?;
    command_line.apply(&mut configuration);
    init_logging(&configuration.logging)?;

    if let Err(e) = configuration.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e);
    }

    let cancel_token = CancellationToken::new();
    let (publisher, connection) =
        MqttPublisher::connect(&configuration.broker, CancellationToken::new());
    let source = capture::from_configuration(&configuration.capture)?;
    tracing::info!(
        "Sampling {} and publishing to {}:{}/{}",
        source.name(),
        configuration.broker.host,
        configuration.broker.port,
        configuration.broker.topic
    );

    let coordinator = CoordinatorBuilder::new(configuration)
        .frame_source(source)
        .publisher(publisher)
        .cancel_token(cancel_token.clone())
        .build()?;

    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Application stopped by user"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        ctrl_c_token.cancel();
    });

    cancel_token.cancelled().await;
    if let Some(stats) = coordinator.shutdown().await {
        tracing::info!(
            "Published {} frames for {} color changes",
            stats.frames_published,
            stats.changes_accepted
        );
    }
    connection.shutdown().await;
    Ok(())
}
