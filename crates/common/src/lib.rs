//! Cross-cutting helpers shared by the binary and the service crates.

pub mod utils;
