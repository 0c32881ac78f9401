mod store;

pub use store::{ArtifactKind, ArtifactStore, MODELS, UploadReceipt};
