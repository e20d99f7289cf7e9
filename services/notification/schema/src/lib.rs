//! sea-orm entities for tables owned by the notification service.

pub mod notifications;
pub mod processed_messages;
