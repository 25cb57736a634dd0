pub mod board;
pub mod outline_ops;
