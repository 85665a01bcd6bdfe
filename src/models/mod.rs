pub mod category;
pub mod flow;
pub mod service;
pub mod user;
