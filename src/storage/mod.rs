mod loro_store;

pub use loro_store::{find_project_root, DocumentStore, MIN_ID_PREFIX_LENGTH, VELLUM_DIR};
