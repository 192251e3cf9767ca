use anyhow::Result;
use config::ConfigError;
use serde::{Deserialize, Serialize};

use crate::models::SensorShape;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    pub consumer: ConsumerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub group_id: String,
    pub auto_offset_reset: String,
    pub session_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Familia de sensores del tópico: "desktop"/"pc" o "board"/"raspberry"
    pub schema: String,
    /// Política de commit de offsets: "sync" o "auto"
    pub commit_mode: String,
    pub poll_timeout_ms: u64,
    pub auto_commit_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub json_format: bool,
}

/// Política de avance de offsets del consumidor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommitPolicy {
    /// Commit síncrono por mensaje: entrega al-menos-una-vez con ventana de
    /// re-entrega mínima
    Sync,
    /// Commit automático periódico del cliente: garantía más débil, los
    /// mensajes consumidos pero aún no confirmados pueden perderse ante un
    /// crash
    Auto,
}

/// Vínculo tópico ↔ familia de sensores, resuelto una sola vez al arrancar
#[derive(Debug, Clone)]
pub struct TopicBinding {
    pub topic: String,
    pub shape: SensorShape,
}

impl AppConfig {
    /// Carga la configuración solo desde variables de entorno
    pub fn load() -> Result<Self, ConfigError> {
        // Leer variables de entorno directamente sin prefijo
        use std::env;

        // Kafka Configuration
        let kafka_brokers = env::var("KAFKA_BROKERS")
            .unwrap_or_else(|_| "localhost:9092".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect::<Vec<String>>();
        let topic = env::var("TOPIC_NAME")
            .or_else(|_| env::var("KAFKA_TOPIC"))
            .unwrap_or_else(|_| "PC".to_string());
        let group_id =
            env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| "sensor-consumer-group".to_string());
        let auto_offset_reset =
            env::var("KAFKA_AUTO_OFFSET_RESET").unwrap_or_else(|_| "earliest".to_string());
        let session_timeout_ms = env::var("KAFKA_SESSION_TIMEOUT_MS")
            .unwrap_or_else(|_| "6000".to_string())
            .parse::<u64>()
            .unwrap_or(6000);

        // Consumer Configuration
        let schema = env::var("SENSOR_SCHEMA").unwrap_or_else(|_| "desktop".to_string());
        let commit_mode = env::var("KAFKA_COMMIT_MODE").unwrap_or_else(|_| "sync".to_string());
        let poll_timeout_ms = env::var("KAFKA_POLL_TIMEOUT_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse::<u64>()
            .unwrap_or(1000);
        let auto_commit_interval_ms = env::var("KAFKA_AUTO_COMMIT_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse::<u64>()
            .unwrap_or(1000);

        // Logging Configuration
        let logging_level = env::var("RUST_LOG")
            .or_else(|_| env::var("LOGGING_LEVEL"))
            .unwrap_or_else(|_| "info".to_string());
        let logging_file_path = env::var("LOGGING_FILE_PATH").ok();
        let logging_json_format = env::var("LOGGING_JSON_FORMAT")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        // Log de debug para verificar la configuración (sin mostrar contraseña)
        eprintln!("🔍 Debug Kafka Config:");
        eprintln!("  - KAFKA_BROKERS: {}", kafka_brokers.join(","));
        eprintln!("  - TOPIC_NAME: {}", topic);
        eprintln!("  - KAFKA_GROUP_ID: {}", group_id);
        eprintln!("  - SENSOR_SCHEMA: {}", schema);
        eprintln!("  - KAFKA_COMMIT_MODE: {}", commit_mode);
        eprintln!(
            "  - KAFKA_USERNAME: {}",
            env::var("KAFKA_USERNAME")
                .map(|_| "[SET]")
                .unwrap_or("[NOT SET]")
        );
        eprintln!(
            "  - KAFKA_PASSWORD: {}",
            env::var("KAFKA_PASSWORD")
                .map(|_| "[SET]")
                .unwrap_or("[NOT SET]")
        );

        Ok(Self {
            broker: BrokerConfig {
                brokers: kafka_brokers,
                topic,
                group_id,
                auto_offset_reset,
                session_timeout_ms,
            },
            consumer: ConsumerConfig {
                schema,
                commit_mode,
                poll_timeout_ms,
                auto_commit_interval_ms,
            },
            logging: LoggingConfig {
                level: logging_level,
                file_path: logging_file_path,
                json_format: logging_json_format,
            },
        })
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<()> {
        if self.broker.brokers.is_empty() {
            return Err(anyhow::anyhow!("Kafka brokers no puede estar vacío"));
        }

        if self.broker.topic.is_empty() {
            return Err(anyhow::anyhow!("Kafka topic no puede estar vacío"));
        }

        if self.broker.group_id.is_empty() {
            return Err(anyhow::anyhow!("Kafka group id no puede estar vacío"));
        }

        // El esquema debe resolver a una familia conocida
        self.consumer.sensor_shape()?;

        match self.consumer.commit_mode.to_lowercase().as_str() {
            "sync" | "auto" => {}
            other => {
                return Err(anyhow::anyhow!(
                    "Modo de commit desconocido: {} (se espera sync o auto)",
                    other
                ));
            }
        }

        if self.consumer.poll_timeout_ms == 0 {
            return Err(anyhow::anyhow!("Poll timeout debe ser mayor a 0"));
        }

        Ok(())
    }

    /// Configuración por defecto para desarrollo
    pub fn default_dev() -> Self {
        Self {
            broker: BrokerConfig {
                brokers: vec!["localhost:9092".to_string()],
                topic: "PC".to_string(),
                group_id: "sensor-consumer-group-dev".to_string(),
                auto_offset_reset: "earliest".to_string(),
                session_timeout_ms: 6000,
            },
            consumer: ConsumerConfig {
                schema: "desktop".to_string(),
                commit_mode: "sync".to_string(),
                poll_timeout_ms: 1000,
                auto_commit_interval_ms: 1000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                json_format: true,
            },
        }
    }

    /// Resuelve el vínculo tópico ↔ familia una sola vez; no se reevalúa por
    /// mensaje
    pub fn topic_binding(&self) -> Result<TopicBinding> {
        Ok(TopicBinding {
            topic: self.broker.topic.clone(),
            shape: self.consumer.sensor_shape()?,
        })
    }

    /// Muestra la configuración (ocultando información sensible)
    pub fn display_safe(&self) -> AppConfigSafe {
        AppConfigSafe {
            broker: BrokerConfigSafe {
                brokers: self.broker.brokers.clone(),
                topic: self.broker.topic.clone(),
                group_id: self.broker.group_id.clone(),
                auto_offset_reset: self.broker.auto_offset_reset.clone(),
                has_sasl: std::env::var("KAFKA_USERNAME").is_ok()
                    && std::env::var("KAFKA_PASSWORD").is_ok(),
            },
            consumer: self.consumer.clone(),
            logging: self.logging.clone(),
        }
    }
}

impl ConsumerConfig {
    /// Resuelve la familia de sensores declarada en la configuración
    pub fn sensor_shape(&self) -> Result<SensorShape> {
        match self.schema.to_lowercase().as_str() {
            "desktop" | "pc" => Ok(SensorShape::Desktop),
            "board" | "raspberry" => Ok(SensorShape::Board),
            other => Err(anyhow::anyhow!("Esquema de sensor desconocido: {}", other)),
        }
    }

    pub fn commit_policy(&self) -> CommitPolicy {
        match self.commit_mode.to_lowercase().as_str() {
            "auto" => CommitPolicy::Auto,
            _ => CommitPolicy::Sync,
        }
    }
}

/// Versión segura de la configuración para mostrar en logs
#[derive(Debug, Serialize)]
pub struct AppConfigSafe {
    pub broker: BrokerConfigSafe,
    pub consumer: ConsumerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize)]
pub struct BrokerConfigSafe {
    pub brokers: Vec<String>,
    pub topic: String,
    pub group_id: String,
    pub auto_offset_reset: String,
    pub has_sasl: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dev_config_is_valid() {
        let config = AppConfig::default_dev();
        assert!(config.validate().is_ok());
        assert_eq!(config.consumer.commit_policy(), CommitPolicy::Sync);
    }

    #[test]
    fn topic_binding_resolves_schema_aliases() {
        let mut config = AppConfig::default_dev();

        for schema in ["desktop", "pc", "Desktop", "PC"] {
            config.consumer.schema = schema.to_string();
            assert_eq!(
                config.topic_binding().unwrap().shape,
                SensorShape::Desktop,
                "esquema {schema}"
            );
        }

        for schema in ["board", "raspberry", "Board", "RASPBERRY"] {
            config.consumer.schema = schema.to_string();
            assert_eq!(
                config.topic_binding().unwrap().shape,
                SensorShape::Board,
                "esquema {schema}"
            );
        }

        config.consumer.schema = "arduino".to_string();
        assert!(config.topic_binding().is_err());
    }

    #[test]
    fn topic_binding_carries_the_configured_topic() {
        let mut config = AppConfig::default_dev();
        config.broker.topic = "sensores-placa".to_string();
        config.consumer.schema = "board".to_string();

        let binding = config.topic_binding().unwrap();
        assert_eq!(binding.topic, "sensores-placa");
        assert_eq!(binding.shape, SensorShape::Board);
    }

    #[test]
    fn commit_policy_parses_both_modes() {
        let mut config = AppConfig::default_dev();

        config.consumer.commit_mode = "auto".to_string();
        assert_eq!(config.consumer.commit_policy(), CommitPolicy::Auto);

        config.consumer.commit_mode = "AUTO".to_string();
        assert_eq!(config.consumer.commit_policy(), CommitPolicy::Auto);

        config.consumer.commit_mode = "sync".to_string();
        assert_eq!(config.consumer.commit_policy(), CommitPolicy::Sync);
    }

    #[test]
    fn validate_rejects_broken_configs() {
        let mut config = AppConfig::default_dev();
        config.broker.brokers.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default_dev();
        config.broker.topic = String::new();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default_dev();
        config.consumer.commit_mode = "cada-tanto".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default_dev();
        config.consumer.poll_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn display_safe_exposes_topic_without_credentials() {
        let config = AppConfig::default_dev();
        let safe = config.display_safe();

        assert_eq!(safe.broker.topic, "PC");
        assert_eq!(safe.broker.group_id, "sensor-consumer-group-dev");
    }
}
