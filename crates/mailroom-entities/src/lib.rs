pub mod email_events;
pub mod emails;
pub mod tenants;

pub mod prelude;
