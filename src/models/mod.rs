pub mod sensor_reading;

pub use sensor_reading::{BoardReading, DesktopReading, GpuReading, SensorReading, SensorShape};
