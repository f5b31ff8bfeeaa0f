mod file;

pub use file::Storage;
