// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role names used as granted authorities.
//!
//! Roles are free-form strings copied verbatim into token claims and granted
//! as authorities without any prefix (`ADMIN`, not `ROLE_ADMIN`).

/// Role given to self-registered accounts that supply none.
pub const DEFAULT_ROLE: &str = "OPERADOR";

/// Role required for administrator-only endpoints.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Exact, case-sensitive authority check.
pub fn has_authority(authorities: &[String], required: &str) -> bool {
    authorities.iter().any(|granted| granted == required)
}
