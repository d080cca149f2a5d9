//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, hex encoding)
//! - Password digests matching the storage contract
//! - Signed bearer tokens (HS256 JWT)

pub mod crypto;
pub mod password;
pub mod token;
