pub mod appointment;
pub mod diagnosis;
pub mod enums;
pub mod notification;
pub mod principal;
pub mod slot_ledger;
pub mod ward;

pub use appointment::*;
pub use diagnosis::*;
pub use notification::*;
pub use principal::*;
pub use slot_ledger::*;
pub use ward::*;
