pub mod accounts;
pub mod calculations;
pub mod health;
pub mod overrides;
pub mod statements;
pub mod values;
