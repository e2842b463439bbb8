//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod customer;
pub mod order;
pub mod product;

pub use customer::{
    CreateCustomerInput, CustomerError, CustomerFilter, CustomerRepository, UpdateCustomerInput,
};
pub use order::{
    CreateOrderInput, OrderError, OrderFilter, OrderRepository, SortOrder, UpdateOrderInput,
};
pub use product::{
    CreateProductInput, ProductError, ProductFilter, ProductRepository, UpdateProductInput,
    to_snapshot,
};
