pub mod batch;
pub mod input;
pub mod options;
pub mod output;

pub use batch::{BatchItemResult, BatchResult, BatchSettings, ErrorHandling};
pub use input::ImageInput;
pub use options::{
    AspectRatio, ConflictStrategy, EditKind, NamingStrategy, OrganizeBy, OutputFormat, Quality,
};
pub use output::{FileOutputRequest, ImageMetadata, ResponseEnvelope, SavedImage};
