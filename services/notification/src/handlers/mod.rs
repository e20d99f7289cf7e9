pub mod notification;
pub mod stream;
