pub mod check_formulas;
pub mod initdb;
pub mod purge_period;
pub mod recalculate;
pub mod serve;

pub use check_formulas::check_formulas;
pub use initdb::init_database;
pub use purge_period::purge_period;
pub use recalculate::recalculate;
pub use serve::serve;
