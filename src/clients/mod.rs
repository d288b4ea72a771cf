pub mod grading_client;
pub mod test_loader;

pub use grading_client::{GradingGateway, HttpGradingClient};
pub use test_loader::{FileTestLoader, HttpTestLoader, LoadRequest, TestLoader};
