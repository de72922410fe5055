// Infrastructure module - HTTP, pacing and task plumbing
pub mod http;
pub mod task_manager;
pub mod timer;

pub use http::{HttpPageFetcher, PageFetcher, PageResponse};
pub use task_manager::TaskManager;
pub use timer::Pacer;
