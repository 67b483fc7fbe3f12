pub mod models;
pub mod money;
pub mod pii;

pub use money::{Money, MoneyError, DEFAULT_CURRENCY};
pub use pii::Masked;
