pub mod dataset;
pub mod mask;
pub mod stack;
pub mod stack_writer;
pub mod table;

pub use dataset::{DatasetOpener, FrameSource, MemoryDataset, StackFile};
pub use table::{load_csv, save_table};
