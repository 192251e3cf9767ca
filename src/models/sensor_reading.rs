use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DecodeError;

/// Enum que representa las familias de sensores soportadas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SensorShape {
    Desktop,
    Board,
}

/// Lectura tipada producida a partir de un mensaje del tópico
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SensorReading {
    Desktop(DesktopReading),
    Board(BoardReading),
}

impl SensorReading {
    /// Determina la familia del sensor basándose en la variante decodificada
    pub fn get_shape(&self) -> SensorShape {
        match self {
            SensorReading::Desktop(_) => SensorShape::Desktop,
            SensorReading::Board(_) => SensorShape::Board,
        }
    }

    pub fn uuid(&self) -> &str {
        match self {
            SensorReading::Desktop(reading) => &reading.uuid,
            SensorReading::Board(reading) => &reading.uuid,
        }
    }

    pub fn device(&self) -> &str {
        match self {
            SensorReading::Desktop(reading) => &reading.device,
            SensorReading::Board(reading) => &reading.device,
        }
    }

    pub fn loading_datetime(&self) -> &str {
        match self {
            SensorReading::Desktop(reading) => &reading.loading_datetime,
            SensorReading::Board(reading) => &reading.loading_datetime,
        }
    }
}

/// Telemetría de una máquina de escritorio.
///
/// El sub-formato extendido agrega el par de campos de GPU; `gpu: None`
/// corresponde al sub-formato básico de equipos sin GPU dedicada.
#[derive(Debug, Clone, Serialize)]
pub struct DesktopReading {
    pub uuid: String,
    pub device: String,
    pub loading_datetime: String,
    #[serde(rename = "ClockCPUCoreOne")]
    pub clock_cpu_core_one: f64,
    #[serde(rename = "TemperatureCPUPackage")]
    pub temperature_cpu_package: f64,
    #[serde(rename = "LoadCPUTotal")]
    pub load_cpu_total: f64,
    #[serde(rename = "PowerCPUPackage")]
    pub power_cpu_package: f64,
    #[serde(flatten)]
    pub gpu: Option<GpuReading>,
}

/// Par de campos de GPU presente solo en el sub-formato extendido
#[derive(Debug, Clone, Serialize)]
pub struct GpuReading {
    #[serde(rename = "TemperatureGPUCore")]
    pub temperature_gpu_core: f64,
    #[serde(rename = "LoadGPUCore")]
    pub load_gpu_core: f64,
}

/// Telemetría de una placa de cómputo embebida.
///
/// Todos los campos son obligatorios; la ausencia de cualquiera invalida el
/// mensaje completo.
#[derive(Debug, Clone, Serialize)]
pub struct BoardReading {
    pub uuid: String,
    pub device: String,
    pub loading_datetime: String,
    pub gpu_temp_celsius: f64,
    pub cpu_temp_celsius: f64,
    pub frequency_arm_hz: u64,
    pub frequency_core_hz: u64,
    pub frequency_pwm_hz: u64,
    pub voltage_core_v: f64,
    pub voltage_sdram_c_v: f64,
    pub voltage_sdram_i_v: f64,
    pub voltage_sdram_p_v: f64,
    pub memory_arm_bytes: u64,
    pub memory_gpu_bytes: u64,
    /// Máscara de throttling tal como la reporta la placa (ej. "0x50005")
    pub throttled: String,
}

impl DesktopReading {
    /// Mapea campo por campo el sub-formato básico (sin GPU)
    pub fn basic_from_object(obj: &Map<String, Value>) -> Result<Self, DecodeError> {
        Ok(Self {
            uuid: required_str(obj, "uuid")?,
            device: required_str(obj, "device")?,
            loading_datetime: required_str(obj, "loading_datetime")?,
            clock_cpu_core_one: required_f64(obj, "ClockCPUCoreOne")?,
            temperature_cpu_package: required_f64(obj, "TemperatureCPUPackage")?,
            load_cpu_total: required_f64(obj, "LoadCPUTotal")?,
            power_cpu_package: required_f64(obj, "PowerCPUPackage")?,
            gpu: None,
        })
    }

    /// Mapea campo por campo el sub-formato extendido (con par de GPU)
    pub fn extended_from_object(obj: &Map<String, Value>) -> Result<Self, DecodeError> {
        let mut reading = Self::basic_from_object(obj)?;
        reading.gpu = Some(GpuReading {
            temperature_gpu_core: required_f64(obj, "TemperatureGPUCore")?,
            load_gpu_core: required_f64(obj, "LoadGPUCore")?,
        });
        Ok(reading)
    }
}

impl BoardReading {
    /// Mapea campo por campo el formato de placa; los quince campos son
    /// obligatorios
    pub fn from_object(obj: &Map<String, Value>) -> Result<Self, DecodeError> {
        Ok(Self {
            uuid: required_str(obj, "uuid")?,
            device: required_str(obj, "device")?,
            loading_datetime: required_str(obj, "loading_datetime")?,
            gpu_temp_celsius: required_f64(obj, "gpu_temp_celsius")?,
            cpu_temp_celsius: required_f64(obj, "cpu_temp_celsius")?,
            frequency_arm_hz: required_u64(obj, "frequency_arm_hz")?,
            frequency_core_hz: required_u64(obj, "frequency_core_hz")?,
            frequency_pwm_hz: required_u64(obj, "frequency_pwm_hz")?,
            voltage_core_v: required_f64(obj, "voltage_core_v")?,
            voltage_sdram_c_v: required_f64(obj, "voltage_sdram_c_v")?,
            voltage_sdram_i_v: required_f64(obj, "voltage_sdram_i_v")?,
            voltage_sdram_p_v: required_f64(obj, "voltage_sdram_p_v")?,
            memory_arm_bytes: required_u64(obj, "memory_arm_bytes")?,
            memory_gpu_bytes: required_u64(obj, "memory_gpu_bytes")?,
            throttled: required_str(obj, "throttled")?,
        })
    }
}

fn required_str(obj: &Map<String, Value>, field: &'static str) -> Result<String, DecodeError> {
    match obj.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(DecodeError::UnexpectedType(field)),
        None => Err(DecodeError::MissingField(field)),
    }
}

fn required_f64(obj: &Map<String, Value>, field: &'static str) -> Result<f64, DecodeError> {
    match obj.get(field) {
        Some(value) => value.as_f64().ok_or(DecodeError::UnexpectedType(field)),
        None => Err(DecodeError::MissingField(field)),
    }
}

fn required_u64(obj: &Map<String, Value>, field: &'static str) -> Result<u64, DecodeError> {
    match obj.get(field) {
        Some(value) => value.as_u64().ok_or(DecodeError::UnexpectedType(field)),
        None => Err(DecodeError::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn desktop_object() -> Map<String, Value> {
        json!({
            "uuid": "0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9",
            "device": "workstation-01",
            "loading_datetime": "2024-05-11 10:30:00",
            "ClockCPUCoreOne": 4200.5,
            "TemperatureCPUPackage": 63.0,
            "LoadCPUTotal": 27.3,
            "PowerCPUPackage": 45.8
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn board_object() -> Map<String, Value> {
        json!({
            "uuid": "f9e8d7c6-b5a4-9382-7160-5f4e3d2c1b0a",
            "device": "raspberry-02",
            "loading_datetime": "2024-05-11 10:30:05",
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
            "throttled": "0x50005"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn basic_from_object_maps_every_field() {
        let reading = DesktopReading::basic_from_object(&desktop_object()).unwrap();

        assert_eq!(reading.uuid, "0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9");
        assert_eq!(reading.device, "workstation-01");
        assert_eq!(reading.loading_datetime, "2024-05-11 10:30:00");
        assert_eq!(reading.clock_cpu_core_one, 4200.5);
        assert_eq!(reading.temperature_cpu_package, 63.0);
        assert_eq!(reading.load_cpu_total, 27.3);
        assert_eq!(reading.power_cpu_package, 45.8);
        assert!(reading.gpu.is_none());
    }

    #[test]
    fn extended_from_object_maps_gpu_pair() {
        let mut obj = desktop_object();
        obj.insert("TemperatureGPUCore".into(), json!(71.2));
        obj.insert("LoadGPUCore".into(), json!(88.0));

        let reading = DesktopReading::extended_from_object(&obj).unwrap();
        let gpu = reading.gpu.unwrap();
        assert_eq!(gpu.temperature_gpu_core, 71.2);
        assert_eq!(gpu.load_gpu_core, 88.0);
    }

    #[test]
    fn desktop_missing_field_names_the_exact_key() {
        let required = [
            "uuid",
            "device",
            "loading_datetime",
            "ClockCPUCoreOne",
            "TemperatureCPUPackage",
            "LoadCPUTotal",
            "PowerCPUPackage",
        ];

        for field in required {
            let mut obj = desktop_object();
            obj.remove(field);
            match DesktopReading::basic_from_object(&obj) {
                Err(DecodeError::MissingField(name)) => assert_eq!(name, field),
                other => panic!("se esperaba MissingField({field}), fue {other:?}"),
            }
        }
    }

    #[test]
    fn board_from_object_maps_every_field() {
        let reading = BoardReading::from_object(&board_object()).unwrap();

        assert_eq!(reading.uuid, "f9e8d7c6-b5a4-9382-7160-5f4e3d2c1b0a");
        assert_eq!(reading.device, "raspberry-02");
        assert_eq!(reading.gpu_temp_celsius, 48.9);
        assert_eq!(reading.cpu_temp_celsius, 52.1);
        assert_eq!(reading.frequency_arm_hz, 1_500_000_000);
        assert_eq!(reading.frequency_core_hz, 500_000_000);
        assert_eq!(reading.frequency_pwm_hz, 107_143_000);
        assert_eq!(reading.voltage_core_v, 0.8563);
        assert_eq!(reading.voltage_sdram_c_v, 1.2);
        assert_eq!(reading.voltage_sdram_i_v, 1.2);
        assert_eq!(reading.voltage_sdram_p_v, 1.225);
        assert_eq!(reading.memory_arm_bytes, 948_000_000);
        assert_eq!(reading.memory_gpu_bytes, 76_000_000);
        assert_eq!(reading.throttled, "0x50005");
    }

    #[test]
    fn board_missing_field_names_the_exact_key() {
        let required = [
            "uuid",
            "device",
            "loading_datetime",
            "gpu_temp_celsius",
            "cpu_temp_celsius",
            "frequency_arm_hz",
            "frequency_core_hz",
            "frequency_pwm_hz",
            "voltage_core_v",
            "voltage_sdram_c_v",
            "voltage_sdram_i_v",
            "voltage_sdram_p_v",
            "memory_arm_bytes",
            "memory_gpu_bytes",
            "throttled",
        ];
        assert_eq!(required.len(), 15);

        for field in required {
            let mut obj = board_object();
            obj.remove(field);
            match BoardReading::from_object(&obj) {
                Err(DecodeError::MissingField(name)) => assert_eq!(name, field),
                other => panic!("se esperaba MissingField({field}), fue {other:?}"),
            }
        }
    }

    #[test]
    fn present_key_with_wrong_type_is_unexpected_type() {
        let mut obj = desktop_object();
        obj.insert("uuid".into(), json!(42));
        assert!(matches!(
            DesktopReading::basic_from_object(&obj),
            Err(DecodeError::UnexpectedType("uuid"))
        ));

        let mut obj = board_object();
        obj.insert("frequency_arm_hz".into(), json!("rápido"));
        assert!(matches!(
            BoardReading::from_object(&obj),
            Err(DecodeError::UnexpectedType("frequency_arm_hz"))
        ));
    }

    #[test]
    fn integer_values_are_accepted_for_float_fields() {
        let mut obj = desktop_object();
        obj.insert("TemperatureCPUPackage".into(), json!(63));
        let reading = DesktopReading::basic_from_object(&obj).unwrap();
        assert_eq!(reading.temperature_cpu_package, 63.0);
    }

    #[test]
    fn extra_keys_are_ignored() {
        let mut obj = board_object();
        obj.insert("firmware".into(), json!("2024.05"));
        assert!(BoardReading::from_object(&obj).is_ok());
    }

    #[test]
    fn serialized_extended_reading_carries_gpu_wire_keys() {
        let mut obj = desktop_object();
        obj.insert("TemperatureGPUCore".into(), json!(71.2));
        obj.insert("LoadGPUCore".into(), json!(88.0));
        let reading = DesktopReading::extended_from_object(&obj).unwrap();

        let value = serde_json::to_value(&reading).unwrap();
        assert_eq!(value["TemperatureGPUCore"], json!(71.2));
        assert_eq!(value["LoadGPUCore"], json!(88.0));
        assert_eq!(value["ClockCPUCoreOne"], json!(4200.5));
    }

    #[test]
    fn serialized_basic_reading_omits_gpu_wire_keys() {
        let reading = DesktopReading::basic_from_object(&desktop_object()).unwrap();
        let value = serde_json::to_value(&reading).unwrap();

        assert!(value.get("TemperatureGPUCore").is_none());
        assert!(value.get("LoadGPUCore").is_none());
    }

    #[test]
    fn accessors_dispatch_over_both_variants() {
        let desktop =
            SensorReading::Desktop(DesktopReading::basic_from_object(&desktop_object()).unwrap());
        let board = SensorReading::Board(BoardReading::from_object(&board_object()).unwrap());

        assert_eq!(desktop.get_shape(), SensorShape::Desktop);
        assert_eq!(board.get_shape(), SensorShape::Board);
        assert_eq!(desktop.device(), "workstation-01");
        assert_eq!(board.device(), "raspberry-02");
        assert_eq!(desktop.uuid(), "0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9");
        assert_eq!(board.loading_datetime(), "2024-05-11 10:30:05");
    }
}
