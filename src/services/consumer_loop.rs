use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::CommitPolicy;
use crate::errors::ConsumerError;
use crate::services::decoder::SchemaDecoder;
use crate::services::{InboundMessage, MessageSource, PollOutcome, ReadingSink};

/// Ciclo principal de consumo: suscribe, espera, decodifica, publica y
/// confirma offsets según la política configurada.
///
/// Un solo trabajador lógico: los mensajes se procesan de a uno y en orden,
/// sin retención ni paralelismo interno.
pub struct ConsumptionLoop {
    source: Box<dyn MessageSource>,
    decoder: SchemaDecoder,
    sink: Box<dyn ReadingSink>,
    commit_policy: CommitPolicy,
    processed: AtomicU64,
    dropped: AtomicU64,
}

/// Libera la suscripción exactamente una vez en toda salida del ciclo,
/// incluyendo errores fatales y panics.
struct SourceReleaseGuard<'a> {
    source: &'a dyn MessageSource,
}

impl Drop for SourceReleaseGuard<'_> {
    fn drop(&mut self) {
        self.source.release();
    }
}

impl ConsumptionLoop {
    pub fn new(
        source: Box<dyn MessageSource>,
        decoder: SchemaDecoder,
        sink: Box<dyn ReadingSink>,
        commit_policy: CommitPolicy,
    ) -> Self {
        Self {
            source,
            decoder,
            sink,
            commit_policy,
            processed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Ejecuta el ciclo hasta la cancelación o un error fatal.
    ///
    /// La cancelación se evalúa una vez por iteración, al inicio; un mensaje
    /// en vuelo nunca se interrumpe a mitad de decodificación, publicación o
    /// commit.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ConsumerError> {
        // La guardia se instala antes de suscribir: la liberación corre
        // también cuando la suscripción misma falla.
        let _release = SourceReleaseGuard {
            source: self.source.as_ref(),
        };

        self.source.subscribe()?;
        info!(
            "🚀 Ciclo de consumo iniciado (política de commit: {:?})",
            self.commit_policy
        );

        loop {
            if cancel.is_cancelled() {
                info!("🛑 Cancelación solicitada, cerrando el ciclo de consumo");
                return Ok(());
            }

            match self.source.poll_next().await? {
                PollOutcome::Idle => continue,
                PollOutcome::Drained {
                    topic,
                    partition,
                    offset,
                } => {
                    info!("{}", end_of_partition_notice(&topic, partition, offset));
                }
                PollOutcome::Message(message) => {
                    self.dispatch(&message).await;
                    if self.commit_policy == CommitPolicy::Sync {
                        self.source.commit(&message)?;
                    }
                }
            }
        }
    }

    /// Decodifica y publica un mensaje. Las fallas de decodificación o del
    /// sink descartan el mensaje y nunca detienen el ciclo ni impiden que el
    /// offset avance.
    async fn dispatch(&self, message: &InboundMessage) {
        match self.decoder.decode(message.payload_bytes()) {
            Ok(Some(reading)) => {
                debug!(
                    "✅ Lectura decodificada | familia: {:?} | device: {} | uuid: {}",
                    reading.get_shape(),
                    reading.device(),
                    reading.uuid()
                );
                match self.sink.publish(&reading).await {
                    Ok(()) => {
                        self.processed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        error!(
                            "❌ Error publicando lectura | {} [{}] offset {}: {}",
                            message.topic, message.partition, message.offset, e
                        );
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            Ok(None) => {
                debug!(
                    "Tombstone recibido en {} [{}] offset {} | key: {:?}",
                    message.topic, message.partition, message.offset, message.key
                );
            }
            Err(e) => {
                error!(
                    "❌ Mensaje descartado | {} [{}] offset {}: {}",
                    message.topic, message.partition, message.offset, e
                );
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Obtiene estadísticas del ciclo
    pub fn get_statistics(&self) -> ConsumerStatistics {
        ConsumerStatistics {
            processed: self.processed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            commit_policy: self.commit_policy,
        }
    }
}

/// Aviso informativo de fin de partición con la posición alcanzada
pub fn end_of_partition_notice(topic: &str, partition: i32, offset: i64) -> String {
    format!("%% {topic} [{partition}] alcanzó el fin de la partición en offset {offset}")
}

#[derive(Debug, Clone)]
pub struct ConsumerStatistics {
    pub processed: u64,
    pub dropped: u64,
    pub commit_policy: CommitPolicy,
}
