// --- File: crates/bookwise_common/src/lib.rs ---

pub mod error; // Error handling
pub mod logging; // Logging utilities
pub mod phone; // Phone number normalization
pub mod services; // Collaborator abstractions

// Re-export error types and utilities for easier access
pub use error::{BookwiseError, HttpStatusCode};

pub use logging::{init, init_with_level};

pub use phone::normalize_phone;

pub use services::{
    BoxFuture, BoxedError, BoxedMessagingService, DeliveryReceipt, DeliveryStatus,
    MessagingService,
};
