//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod product;
pub mod request;

// Re-export specific types to avoid conflicts
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use request::{
    Column as RequestColumn, Entity as Request, Model as RequestModel, RequestAction,
    RequestStatus,
};
