pub mod consumer_loop;
pub mod decoder;
pub mod kafka_source;
pub mod message_source;
pub mod sink;

pub use consumer_loop::{ConsumerStatistics, ConsumptionLoop};
pub use decoder::SchemaDecoder;
pub use kafka_source::KafkaMessageSource;
pub use message_source::{InboundMessage, MessageSource, PollOutcome};
pub use sink::{ConsoleSink, ReadingSink};
