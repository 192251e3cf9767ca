use anyhow::Result;
use async_trait::async_trait;

use crate::models::SensorReading;

/// Trait para abstraer el destino descendente de las lecturas decodificadas
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingSink: Send + Sync {
    /// Entrega una lectura tipada al consumidor final
    async fn publish(&self, reading: &SensorReading) -> Result<()>;
}

/// Sink que imprime cada lectura en la salida estándar
#[derive(Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

/// Arma el bloque de texto que se imprime por cada lectura recibida
pub fn render_measure(reading: &SensorReading) -> String {
    format!(
        "[\n\tNew measure: \n\tuuid: {}\n\tdevice: {}\n\tloading_datetime: {}\n",
        reading.uuid(),
        reading.device(),
        reading.loading_datetime()
    )
}

#[async_trait]
impl ReadingSink for ConsoleSink {
    async fn publish(&self, reading: &SensorReading) -> Result<()> {
        println!("{}", render_measure(reading));
        Ok(())
    }
}
