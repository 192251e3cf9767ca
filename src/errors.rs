use thiserror::Error;

/// Errores al convertir el payload de un mensaje en una lectura tipada.
///
/// Todos son terminales para ese mensaje: se registra el error, se descarta
/// el mensaje y el loop continúa con el siguiente.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Campo requerido ausente en el payload: {0}")]
    MissingField(&'static str),
    #[error("Payload con JSON inválido: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("El payload no es un objeto JSON")]
    NotAnObject,
    #[error("Campo con tipo inesperado: {0}")]
    UnexpectedType(&'static str),
}

/// Errores fatales del ciclo de consumo.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// Falla al suscribirse al tópico. Ocurre una sola vez al inicio y no se
    /// reintenta.
    #[error("Error al suscribirse al tópico: {0}")]
    Subscribe(rdkafka::error::KafkaError),
    /// Falla de transporte o protocolo contra el broker (distinta de fin de
    /// partición). Termina el ciclo tras liberar la suscripción.
    #[error("Error de Kafka: {0}")]
    Broker(#[from] rdkafka::error::KafkaError),
}
