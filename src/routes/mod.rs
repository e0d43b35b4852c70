/// Router Module Index
///
/// Organizes the application's routing into security-segregated modules,
/// so access control is applied explicitly at the module level (via Axum
/// layers) instead of being re-derived per handler.
///
/// Admin-only operations (category mutation) have no URL prefix of their
/// own; their role check lives inside the handler, after the request has
/// passed the authentication layer.

/// Routes accessible without a session: health probe, login, logout.
pub mod public;

/// Routes protected by the `AuthUser` cookie extractor middleware.
/// Requires a valid, unexpired session token.
pub mod authenticated;
