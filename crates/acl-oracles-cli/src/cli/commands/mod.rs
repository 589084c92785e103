pub mod check;
pub mod dispatch;
pub mod param;

pub use dispatch::dispatch;
