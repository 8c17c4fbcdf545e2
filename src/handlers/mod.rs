pub mod decision;
pub mod receipt;

pub use decision::configure as configure_decision;
pub use receipt::configure as configure_receipts;
