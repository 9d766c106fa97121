pub mod entities;

pub use entities::account::AccountKind;
