mod category;
mod order;
mod payment_method;
mod product;
mod reset_token;
mod supplier;
mod user;

pub use category::Category;
pub use order::{LineItem, Order, OrderStatus};
pub use payment_method::PaymentMethod;
pub use product::Product;
pub use reset_token::PasswordResetToken;
pub use supplier::Supplier;
pub use user::User;
