use chrono::Utc;
use clap::{Parser, ValueEnum};
use futures::future::join_all;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

/// Publica lecturas de prueba al tópico de sensores
#[derive(Parser, Debug)]
#[command(name = "test_publish")]
struct Args {
    #[arg(long, default_value = "localhost:9092")]
    brokers: String,

    #[arg(long, default_value = "PC")]
    topic: String,

    /// Familia de sensores de los payloads generados
    #[arg(long, value_enum, default_value = "desktop")]
    schema: Schema,

    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Omite el par de campos de GPU (sub-formato básico de escritorio)
    #[arg(long)]
    without_gpu: bool,

    /// Envía además un mensaje malformado para probar el descarte
    #[arg(long)]
    malformed: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Schema {
    Desktop,
    Board,
}

fn desktop_payload(with_gpu: bool) -> serde_json::Value {
    let mut payload = json!({
        "uuid": Uuid::new_v4().to_string(),
        "device": "workstation-demo",
        "loading_datetime": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "ClockCPUCoreOne": 4200.5,
        "TemperatureCPUPackage": 63.0,
        "LoadCPUTotal": 27.3,
        "PowerCPUPackage": 45.8
    });
    if with_gpu {
        payload["TemperatureGPUCore"] = json!(71.2);
        payload["LoadGPUCore"] = json!(88.0);
    }
    payload
}

fn board_payload() -> serde_json::Value {
    json!({
        "uuid": Uuid::new_v4().to_string(),
        "device": "raspberry-demo",
        "loading_datetime": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "gpu_temp_celsius": 48.9,
        "cpu_temp_celsius": 52.1,
        "frequency_arm_hz": 1_500_000_000u64,
        "frequency_core_hz": 500_000_000u64,
        "frequency_pwm_hz": 107_143_000u64,
        "voltage_core_v": 0.8563,
        "voltage_sdram_c_v": 1.2,
        "voltage_sdram_i_v": 1.2,
        "voltage_sdram_p_v": 1.225,
        "memory_arm_bytes": 948_000_000u64,
        "memory_gpu_bytes": 76_000_000u64,
        "throttled": "0x0"
    })
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Configuración del producer igual al que funciona
    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &args.brokers)
        .set("acks", "1")
        .set("linger.ms", "5")
        .set("batch.size", "65536")
        .set("queue.buffering.max.kbytes", "10240")
        .set("compression.type", "lz4")
        .set("message.timeout.ms", "20000")
        .set("request.timeout.ms", "2000")
        .set("retries", "3")
        .set("retry.backoff.ms", "300")
        .set("enable.idempotence", "false")
        .set("delivery.timeout.ms", "5000")
        .create()
        .expect("Producer creation error");

    let mut messages: Vec<(String, String)> = (0..args.count)
        .map(|i| {
            let payload = match args.schema {
                Schema::Desktop => desktop_payload(!args.without_gpu),
                Schema::Board => board_payload(),
            };
            (payload.to_string(), format!("sensor-{i}"))
        })
        .collect();

    if args.malformed {
        messages.push(("{ lectura truncada".to_string(), "sensor-roto".to_string()));
    }

    let sends = messages.iter().map(|(payload, key)| {
        producer.send(
            FutureRecord::to(&args.topic).payload(payload).key(key),
            Duration::from_secs(0),
        )
    });

    for delivery_status in join_all(sends).await {
        match delivery_status {
            Ok((partition, offset)) => {
                println!(
                    "✅ Mensaje enviado exitosamente a partición {} con offset {}",
                    partition, offset
                );
            }
            Err((e, _)) => {
                eprintln!("❌ Error enviando mensaje: {}", e);
            }
        }
    }
}
