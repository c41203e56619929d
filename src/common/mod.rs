pub mod client {
    pub mod client;
    pub mod error;
}

pub mod models;
pub mod utils;
