pub mod centre;
pub mod session;
