pub mod text_service;

pub use text_service::{TextService, TextSettings};
