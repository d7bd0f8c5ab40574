pub mod catalog;
pub mod gateway;

pub use catalog::{CatalogError, CatalogStats, PlantCatalog};
pub use gateway::{AiGateway, GatewayError, PlantValidation};
