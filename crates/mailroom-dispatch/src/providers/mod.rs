//! Email provider adapters

pub mod mock;
pub mod postmark;
pub mod registry;
pub mod traits;

pub use mock::MockProvider;
pub use postmark::PostmarkProvider;
pub use traits::{
    Attachment, DeliveryEvent, DeliveryEventType, EmailProvider, Personalization,
    ProviderMetadata, SendEmailRequest, SendEmailResult,
};
