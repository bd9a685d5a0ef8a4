//! Domain models for the shop.
//!
//! Row types derive `sqlx::FromRow` and are read back with `query_as`. Each
//! entity has a `New*` insert payload; updatable entities have a `*Patch`
//! whose `None` fields are left untouched.

pub mod cart;
pub mod customer;
pub mod flash;
pub mod inquiry;
pub mod order;
pub mod product;
pub mod session;

pub use cart::{Cart, CartError, CartLine};
pub use customer::{Customer, CustomerPatch, NewCustomer};
pub use flash::{Flash, FlashLevel};
pub use inquiry::{Inquiry, NewInquiry};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderItemDetail, OrderPatch, OrderSummary};
pub use product::{NewProduct, Product, ProductPatch};
pub use session::{CurrentAdmin, keys as session_keys};
