//! sea-orm entities for tables owned by the report service.

pub mod outbox_messages;
pub mod reports;
