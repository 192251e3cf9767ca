use serde_json::{Map, Value};

use crate::errors::DecodeError;
use crate::models::{BoardReading, DesktopReading, SensorReading, SensorShape};

/// Decodificador ligado a una familia de sensores fija por construcción.
///
/// La familia se decide una vez por tópico al arrancar; el contenido de cada
/// payload solo discrimina entre los sub-formatos de esa familia.
pub struct SchemaDecoder {
    shape: SensorShape,
}

impl SchemaDecoder {
    pub fn new(shape: SensorShape) -> Self {
        Self { shape }
    }

    /// Convierte el payload crudo de un mensaje en una lectura tipada.
    ///
    /// Un payload ausente o vacío es un tombstone y produce `Ok(None)`, no un
    /// error.
    pub fn decode(&self, payload: Option<&[u8]>) -> Result<Option<SensorReading>, DecodeError> {
        let bytes = match payload {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Ok(None),
        };

        let value: Value = serde_json::from_slice(bytes)?;
        let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;

        let reading = match self.shape {
            SensorShape::Desktop => {
                if has_gpu_pair(obj) {
                    SensorReading::Desktop(DesktopReading::extended_from_object(obj)?)
                } else {
                    SensorReading::Desktop(DesktopReading::basic_from_object(obj)?)
                }
            }
            SensorShape::Board => SensorReading::Board(BoardReading::from_object(obj)?),
        };

        Ok(Some(reading))
    }
}

/// Predicado puro que detecta el par completo de campos de GPU.
///
/// Ambos campos deben estar presentes; uno solo no selecciona el sub-formato
/// extendido.
pub fn has_gpu_pair(obj: &Map<String, Value>) -> bool {
    obj.contains_key("TemperatureGPUCore") && obj.contains_key("LoadGPUCore")
}
