pub mod factory;
pub mod http_client_factory;
pub mod mock;
pub mod persistence;
pub mod providers;

pub use factory::EngineFactory;
