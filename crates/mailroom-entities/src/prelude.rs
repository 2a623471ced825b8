pub use super::email_events::Entity as EmailEvents;
pub use super::emails::Entity as Emails;
pub use super::tenants::Entity as Tenants;
