pub mod states;
pub mod transfer;
