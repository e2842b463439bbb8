//! `SeaORM` entity definitions.

pub mod customers;
pub mod orders;
pub mod products;

pub mod prelude {
    //! Entity aliases.

    pub use super::customers::Entity as Customers;
    pub use super::orders::Entity as Orders;
    pub use super::products::Entity as Products;
}
