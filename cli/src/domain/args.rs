//! Inspection of the forwarded argument list.
//!
//! The bootstrap never interprets installer flags; it only looks for the
//! help flags it intercepts and the user-scope flag behind the advisory.

/// Flags understood by the installer (listed in the usage text only).
pub const INSTALLER_FLAGS: &[(&str, &str)] = &[
    ("--install", "Install Kiro (default)"),
    ("--update", "Update an existing installation"),
    ("--uninstall", "Remove Kiro"),
    ("--user", "Install for the current user only (no root required)"),
    ("--force", "Reinstall even if already present"),
    ("--clean", "Remove leftover files during uninstall"),
    ("--help, -h", "Show this help and exit"),
];

/// `true` when `--help` or `-h` appears anywhere in `args`.
#[must_use]
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

/// `true` when the installer was asked for a user-scoped install.
#[must_use]
pub fn has_user_scope(args: &[String]) -> bool {
    args.iter().any(|a| a == "--user")
}

/// Piped runs without `--user` fall back to a system-wide install, which
/// needs root; warn the operator up front.
#[must_use]
pub fn needs_privilege_notice(args: &[String], stdin_is_tty: bool) -> bool {
    !stdin_is_tty && !has_user_scope(args)
}
