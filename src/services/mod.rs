pub mod option_normalizer;
pub mod report_writer;
pub mod session_store;

pub use option_normalizer::OptionNormalizer;
pub use report_writer::ReportWriter;
pub use session_store::SessionStore;
