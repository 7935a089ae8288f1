// Pipeline monitoring module
// Progress tracing for generation batches

pub mod trace;

pub use trace::{
    read_trace_file, GenerationTrace, TraceEntry, TraceError, TraceStage, TraceStatus,
    TRACE_FILE_NAME,
};
