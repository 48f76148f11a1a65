// Adapters layer: concrete record stores behind the DataAccess port.

pub mod fixture_store;
pub mod http_store;
