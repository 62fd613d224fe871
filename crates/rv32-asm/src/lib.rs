pub mod model;

// Re-export commonly used helpers for the CLIs
pub use model::{read_program, read_source, write_assembly, write_labels_json, write_program, LabelKV};
