use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

mod boot;
mod config;
mod errors;
mod models;
mod services;

use crate::config::{AppConfig, LoggingConfig};
use services::{
    ConsoleSink, ConsumptionLoop, KafkaMessageSource, MessageSource, ReadingSink, SchemaDecoder,
};

#[tokio::main]
async fn main() -> Result<()> {
    boot::print_banner();

    // Load configuration
    let config = match AppConfig::load() {
        Ok(config) => {
            config.validate()?;
            config
        }
        Err(e) => {
            eprintln!("❌ Error cargando configuración: {}", e);
            eprintln!("🔄 Usando configuración por defecto de desarrollo");
            AppConfig::default_dev()
        }
    };

    // El guard mantiene vivo el writer no bloqueante hasta el final del proceso
    let _guard = init_logging(&config.logging);

    info!(
        "🚀 Iniciando Sensor Consumer Rust v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("✅ Configuración cargada y validada");
    info!("📋 Config: {:#?}", config.display_safe());

    // Setup graceful shutdown
    let shutdown_token = setup_shutdown_handler();

    // Initialize services
    let services = match initialize_services(&config) {
        Ok(services) => services,
        Err(e) => {
            error!("❌ Error inicializando servicios: {}", e);
            return Err(e);
        }
    };

    info!("✅ Todos los servicios inicializados correctamente");

    // Start the main consumption loop
    let consumption_result = start_consumption(services, shutdown_token).await;

    match consumption_result {
        Ok(_) => info!("✅ Aplicación terminada correctamente"),
        Err(e) => {
            error!("❌ Error en loop principal: {}", e);
            info!("🛑 Sensor Consumer terminado");
            return Err(e);
        }
    }

    info!("🛑 Sensor Consumer terminado");
    Ok(())
}

/// Inicializa el logging según la configuración; devuelve el guard del writer
/// de archivo cuando está habilitado
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    match &config.file_path {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "sensor-consumer.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            if config.json_format {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_writer(non_blocking)
                    .json()
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_writer(non_blocking)
                    .init();
            }
            Some(guard)
        }
        None => {
            if config.json_format {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .json()
                    .init();
            } else {
                tracing_subscriber::fmt().with_env_filter(env_filter).init();
            }
            None
        }
    }
}

/// Estructura que contiene todos los servicios inicializados
struct Services {
    consumer_loop: Arc<ConsumptionLoop>,
}

/// Inicializa todos los servicios necesarios
fn initialize_services(config: &AppConfig) -> Result<Services> {
    info!("🔧 Inicializando servicios...");

    // El vínculo tópico ↔ familia se resuelve una sola vez al arrancar
    let binding = config.topic_binding()?;
    info!(
        "📡 Tópico {} vinculado a la familia de sensores {:?}",
        binding.topic, binding.shape
    );

    let source: Box<dyn MessageSource> =
        Box::new(KafkaMessageSource::new(&config.broker, &config.consumer)?);
    let decoder = SchemaDecoder::new(binding.shape);
    let sink: Box<dyn ReadingSink> = Box::new(ConsoleSink::new());

    let consumer_loop = Arc::new(ConsumptionLoop::new(
        source,
        decoder,
        sink,
        config.consumer.commit_policy(),
    ));

    Ok(Services { consumer_loop })
}

/// Ejecuta el ciclo de consumo junto con la tarea de estadísticas
async fn start_consumption(services: Services, shutdown_token: CancellationToken) -> Result<()> {
    info!("🚀 Iniciando loop principal de consumo...");

    // Statistics task
    let stats_loop = Arc::clone(&services.consumer_loop);
    let stats_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;

            let stats = stats_loop.get_statistics();
            info!(
                "📊 Estadísticas - Procesados: {}, Descartados: {}, Política: {:?}",
                stats.processed, stats.dropped, stats.commit_policy
            );
        }
    });

    let result = services.consumer_loop.run(shutdown_token).await;

    stats_task.abort();
    result?;

    info!("✅ Shutdown completado");
    Ok(())
}

/// Configura el handler para señales de shutdown graceful
fn setup_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let handler_token = token.clone();

    tokio::spawn(async move {
        // Handle Ctrl+C
        if let Ok(()) = signal::ctrl_c().await {
            info!("🔔 Ctrl+C recibido");
            handler_token.cancel();
        }
    });

    token
}
