mod archive;

pub use archive::MemoryArchive;
