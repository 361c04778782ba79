pub mod processor;
pub mod report;

pub use processor::IntersectionProcessor;
pub use report::IntersectionReport;
