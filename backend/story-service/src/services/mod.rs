/// Business logic layer
pub mod media;
pub mod stories;

pub use media::{DestroyOutcome, ImageStore, S3ImageStore, StoredImage};
pub use stories::{OwnerGate, StoryService};
