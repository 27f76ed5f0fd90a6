//! Domain models for the Marketstall API.
//!
//! These are validated domain objects, separate from the database row
//! types in [`crate::db`] and the wire payloads in [`crate::resources`].

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem, CartWithItems};
pub use order::{NewOrderItem, Order, OrderItem, OrderWithItems};
pub use product::{NewProduct, Product, ProductChanges};
pub use user::{CurrentUser, User, UserChanges};
