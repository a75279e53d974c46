//! Entropy coding for short string transport
//!
//! A static Huffman coder over byte symbols, with codes derived from a
//! frequency table frozen into the binary. Both peers rebuild the identical
//! table locally, so no table data ever crosses the wire.

pub mod huffman;

pub use huffman::HuffmanTable;
