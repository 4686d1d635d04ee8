mod encoder;
mod sink;

pub use encoder::{build_payload, encode_table, Cell, ExportPayload, TabularRecord, EXPORT_FILENAME};
pub use sink::{ExportSink, HttpExportSink, SinkAcknowledgement, DEFAULT_REJECTION_MESSAGE};
