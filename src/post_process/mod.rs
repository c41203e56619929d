pub mod assets;
pub mod captions;
pub mod merger;
