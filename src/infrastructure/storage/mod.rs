pub mod scratch;

pub use scratch::ScratchFile;
