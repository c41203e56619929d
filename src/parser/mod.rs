pub mod cache;
pub mod course;
pub mod curriculum;
pub mod errors;
pub mod models;
pub mod stream_selector;
