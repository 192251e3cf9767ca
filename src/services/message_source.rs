use async_trait::async_trait;

use crate::errors::ConsumerError;

/// Mensaje crudo entregado por el transporte, con los metadatos necesarios
/// para registrar descartes y confirmar el offset.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Option<Vec<u8>>,
}

impl InboundMessage {
    pub fn payload_bytes(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}

/// Resultado de una espera acotada sobre el transporte
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Llegó un mensaje dentro de la ventana de espera
    Message(InboundMessage),
    /// La ventana expiró sin mensajes nuevos
    Idle,
    /// El broker marcó el fin de una partición; informativo, no es un error
    Drained {
        topic: String,
        partition: i32,
        offset: i64,
    },
}

/// Trait para abstraer el transporte de mensajes detrás del ciclo de consumo
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Suscribe al tópico configurado. Se invoca una sola vez al inicio.
    fn subscribe(&self) -> Result<(), ConsumerError>;

    /// Espera acotada por el siguiente mensaje
    async fn poll_next(&self) -> Result<PollOutcome, ConsumerError>;

    /// Confirma de forma síncrona el offset del mensaje recibido
    fn commit(&self, message: &InboundMessage) -> Result<(), ConsumerError>;

    /// Libera la suscripción. Idempotente; se invoca en toda salida del ciclo.
    fn release(&self);
}
