//! Inventory API client, shared by every CLI command that talks to the backend.
//!
//! This crate is the single source of truth for the REST wire contract:
//! recipe listing, per-recipe depletion, product lookup, replenishment,
//! product and recipe maintenance, and the account behind `/me`.
//!
//! Blocking, sequential, no retries.

mod account;
mod auth;
mod client;

pub use account::{Account, AccountBody, AccountUpdate};
pub use auth::{
    auth_file_path, delete_auth, delete_auth_at, load_auth, load_auth_from, resolve_token,
    save_auth, save_auth_to, AuthCredentials, TOKEN_ENV,
};
pub use client::{parse_base_url, ApiClient, ClientError};
