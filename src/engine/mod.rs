pub mod error;
pub mod node;
pub mod frequency;
pub mod huffman;
pub mod code_table;
pub mod header;
pub mod compressor;
pub mod decompressor;

pub use compressor::*;
pub use decompressor::*;
pub use error::CodecError;
