//! Write-ahead log: durability policy, the append path, and replay.

pub mod config;
pub mod durability;
pub mod reader;
pub mod writer;

pub use config::WalConfig;
pub use durability::DurabilityMode;
pub use writer::WalWriter;
