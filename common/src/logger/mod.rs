mod init;
mod spans;
mod trace_id;

pub use init::{init_logger, is_production};
pub use spans::{cell_span, root_span, warn_if_slow};
pub use trace_id::TraceId;
