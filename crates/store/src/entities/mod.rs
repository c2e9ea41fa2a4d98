//! Entity definitions and their entity-specific queries.
//!
//! Each module defines the business fields of one entity, the internal row
//! type used to decode it from `PostgreSQL`, its [`Entity`](crate::Entity)
//! hooks, and any queries beyond the generic lifecycle operations as an
//! inherent `impl EntityStore<X>`.

mod cart;
mod category;
mod merchant;
mod order;
mod order_item;
mod product;
mod review;
mod role;
mod shipping_address;
mod slider;
mod transaction;
mod user;
mod user_role;

pub use cart::Cart;
pub use category::Category;
pub use merchant::Merchant;
pub use order::Order;
pub use order_item::OrderItem;
pub use product::Product;
pub use review::Review;
pub use role::Role;
pub use shipping_address::ShippingAddress;
pub use slider::Slider;
pub use transaction::Transaction;
pub use user::User;
pub use user_role::UserRole;
