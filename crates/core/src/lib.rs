//! Domain logic shared by the SoundVault API and database crates.
//!
//! Everything here is either pure (sanitization, validation, URL rewriting)
//! or touches only the local asset directory.

pub mod assets;
pub mod error;
pub mod music;
pub mod roles;
pub mod sanitize;
pub mod text;
pub mod types;
pub mod url_migration;
