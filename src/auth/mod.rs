//! Authentication module for Filebox.
//!
//! Access to mutating endpoints is guarded by a single shared password,
//! verified on the server against an Argon2 hash.

mod password;

pub use password::{
    hash_password, is_valid_hash, validate_password, verify_password, PasswordError,
    MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH,
};
