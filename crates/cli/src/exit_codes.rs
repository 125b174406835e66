//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `galley` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Success                                                      |
//! | 1    | General error (unspecified)                                  |
//! | 2    | CLI usage error (bad args, declined confirmation input)      |
//! | 3    | Sales CSV unreadable or unparseable                          |
//! | 4    | Staging rejected before any API call                         |
//! | 5    | API rejected a call; earlier calls in the batch stay applied |
//! | 6    | Not authenticated (API answered 401)                         |
//! | 7    | API unreachable or answered with something undecodable       |
//! | 8    | Invalid settings (config.toml or environment)                |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use galley_client::ClientError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed `--set`, nothing to do.
pub const EXIT_USAGE: u8 = 2;

/// The sales CSV could not be read or parsed.
pub const EXIT_CSV: u8 = 3;

/// Validation failed (no selection, bad quantity, unknown id).
/// Guaranteed: no API call was made.
pub const EXIT_VALIDATION: u8 = 4;

/// The API rejected a mutation. With batches, everything before the
/// failed line was applied and is listed in the output.
pub const EXIT_BACKEND: u8 = 5;

/// The API answered 401.
pub const EXIT_NOT_AUTH: u8 = 6;

/// Network error, timeout, or undecodable response.
pub const EXIT_NETWORK: u8 = 7;

/// Invalid config.toml or environment override.
pub const EXIT_CONFIG: u8 = 8;

/// Exit code for a client error outside a submission batch.
pub fn client_exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::NotAuthenticated => EXIT_NOT_AUTH,
        ClientError::Http { .. } => EXIT_BACKEND,
        ClientError::Network(_) | ClientError::Parse(_) => EXIT_NETWORK,
        ClientError::InvalidUrl { .. } => EXIT_CONFIG,
        ClientError::Io(_) => EXIT_ERROR,
    }
}
