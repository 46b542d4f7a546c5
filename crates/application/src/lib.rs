//! Application layer - Use cases and business workflows

pub mod acquisition;
pub mod csv_io;
pub mod decoders;
pub mod events;

pub use decoders::DecoderRegistry;
