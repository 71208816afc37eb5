pub mod config;
pub mod facial;
pub mod feedback;
pub mod frame;
pub mod ingest;
pub mod narrative;
pub mod pipeline;
pub mod posture;
pub mod report;
pub mod speech;
pub mod store;
pub mod util;
