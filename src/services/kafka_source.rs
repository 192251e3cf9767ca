use anyhow::Result;
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::{Message, Offset, TopicPartitionList};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

use crate::config::{BrokerConfig, CommitPolicy, ConsumerConfig};
use crate::errors::ConsumerError;
use crate::services::{InboundMessage, MessageSource, PollOutcome};

/// Transporte Kafka detrás del ciclo de consumo
pub struct KafkaMessageSource {
    consumer: StreamConsumer,
    topic: String,
    poll_timeout: Duration,
    /// Siguiente offset esperado por partición, para reportar la posición
    /// alcanzada cuando el broker marca el fin de una partición
    positions: Mutex<HashMap<i32, i64>>,
}

impl KafkaMessageSource {
    /// Crea el consumidor Kafka con la configuración del broker y la política
    /// de commit
    pub fn new(broker: &BrokerConfig, consumer_config: &ConsumerConfig) -> Result<Self> {
        // Crear configuración base con binding para evitar problemas de lifetime
        let mut binding = ClientConfig::new();
        let base_config = binding
            .set("bootstrap.servers", broker.brokers.join(","))
            .set("group.id", &broker.group_id)
            .set("auto.offset.reset", &broker.auto_offset_reset)
            .set("session.timeout.ms", broker.session_timeout_ms.to_string())
            .set("enable.partition.eof", "true");

        let base_config = match consumer_config.commit_policy() {
            CommitPolicy::Sync => base_config.set("enable.auto.commit", "false"),
            CommitPolicy::Auto => base_config.set("enable.auto.commit", "true").set(
                "auto.commit.interval.ms",
                consumer_config.auto_commit_interval_ms.to_string(),
            ),
        };

        // Configurar SASL authentication si las variables de entorno están presentes
        let client_config = if let Ok(security_protocol) = std::env::var("KAFKA_SECURITY_PROTOCOL") {
            info!("🔐 Configurando security.protocol: {}", security_protocol);
            base_config.set("security.protocol", security_protocol)
        } else {
            base_config
        };

        let client_config = if let Ok(sasl_mechanism) = std::env::var("KAFKA_SASL_MECHANISM") {
            info!("🔐 Configurando sasl.mechanism: {}", sasl_mechanism);
            client_config.set("sasl.mechanism", sasl_mechanism)
        } else {
            client_config
        };

        let client_config = if let Ok(username) = std::env::var("KAFKA_USERNAME") {
            info!("🔐 Configurando sasl.username: {}", username);
            client_config.set("sasl.username", username)
        } else {
            client_config
        };

        let client_config = if let Ok(password) = std::env::var("KAFKA_PASSWORD") {
            info!("🔐 Configurando sasl.password: [PROTECTED]");
            client_config.set("sasl.password", password)
        } else {
            client_config
        };

        let consumer: StreamConsumer = client_config.create()?;

        info!(
            "✅ Kafka Consumer configurado para brokers: {}",
            broker.brokers.join(",")
        );

        Ok(Self {
            consumer,
            topic: broker.topic.clone(),
            poll_timeout: Duration::from_millis(consumer_config.poll_timeout_ms),
            positions: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl MessageSource for KafkaMessageSource {
    fn subscribe(&self) -> Result<(), ConsumerError> {
        self.consumer
            .subscribe(&[&self.topic])
            .map_err(ConsumerError::Subscribe)?;
        info!("🔌 Suscrito al tópico Kafka: {}", self.topic);
        Ok(())
    }

    async fn poll_next(&self) -> Result<PollOutcome, ConsumerError> {
        let received = match timeout(self.poll_timeout, self.consumer.recv()).await {
            Ok(received) => received,
            // Ventana de espera agotada sin mensajes
            Err(_) => return Ok(PollOutcome::Idle),
        };

        match received {
            Ok(message) => {
                let inbound = InboundMessage {
                    topic: message.topic().to_string(),
                    partition: message.partition(),
                    offset: message.offset(),
                    key: message
                        .key()
                        .map(|key| String::from_utf8_lossy(key).to_string()),
                    payload: message.payload().map(|payload| payload.to_vec()),
                };
                self.positions
                    .lock()
                    .unwrap()
                    .insert(inbound.partition, inbound.offset + 1);
                Ok(PollOutcome::Message(inbound))
            }
            Err(KafkaError::PartitionEOF(partition)) => {
                let offset = self
                    .positions
                    .lock()
                    .unwrap()
                    .get(&partition)
                    .copied()
                    .unwrap_or(0);
                Ok(PollOutcome::Drained {
                    topic: self.topic.clone(),
                    partition,
                    offset,
                })
            }
            Err(e) => Err(ConsumerError::Broker(e)),
        }
    }

    fn commit(&self, message: &InboundMessage) -> Result<(), ConsumerError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &message.topic,
            message.partition,
            Offset::Offset(message.offset + 1),
        )?;
        self.consumer.commit(&tpl, CommitMode::Sync)?;
        Ok(())
    }

    fn release(&self) {
        self.consumer.unsubscribe();
        info!("🔌 Suscripción a Kafka liberada");
    }
}

// Nota: Los tests de integración con Kafka requieren un broker real corriendo.
// Para probar SASL authentication manualmente:
//
//    export KAFKA_SECURITY_PROTOCOL=SASL_SSL
//    export KAFKA_SASL_MECHANISM=PLAIN
//    export KAFKA_USERNAME=tu-usuario
//    export KAFKA_PASSWORD=tu-password
//    cargo run --bin sensor-consumer
//
// y verificar los logs "🔐 Configurando ..." al arrancar.
