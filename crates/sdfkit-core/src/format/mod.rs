//! SDF wire format decoding.
//!
//! The format layer follows the same split for every part of a ping:
//! - `layout`: field tables, markers and sizes (source of truth)
//! - `reader`: little-endian reads with offset tracking and length checks
//! - `version`: page version enumeration and the per-version dispatch table
//! - `header`, `channels`, `extension`: domain decoding on top of the reader
//! - `error`: explicit, offset-carrying errors
//!
//! Decoders take any `std::io::Read`, never seek and never print; the ping
//! stream loop lives in `crate::decoder`.

pub mod channels;
pub mod error;
pub mod extension;
pub mod header;
pub mod layout;
pub mod reader;
pub mod version;

#[cfg(test)]
pub(crate) mod fixtures;
