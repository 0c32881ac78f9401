mod tailer;
mod writer;

pub use tailer::{LogSnapshot, LogTailer, SnapshotSink, read_log};
pub use writer::StreamSink;
