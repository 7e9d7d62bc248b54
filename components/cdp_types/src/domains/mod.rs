// Domain payload definitions

pub mod console;
pub mod network;
