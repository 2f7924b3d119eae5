//! Domain models for the Verdura API.
//!
//! These are validated domain objects hydrated from database rows. JSON-facing
//! view types (`UserProfile`, `CartView`, `OrderView`) live next to the rows
//! they project so the camelCase wire shape stays in one place.

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartLine, CartView};
pub use category::Category;
pub use order::{
    CheckoutItem, NewOrder, NewOrderLine, Order, OrderItem, OrderItemView, OrderView,
    ShippingAddress,
};
pub use product::{
    CreateProductInput, PriceAlert, Product, ProductFilter, ProductReview, UpdateProductInput,
};
pub use user::{User, UserProfile};
