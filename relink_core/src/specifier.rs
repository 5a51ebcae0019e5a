// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Specifier normalization.
//!
//! A [Specifier] is a canonical absolute URL; two specifiers compare equal
//! iff their canonical string forms are equal. Normalization happens exactly
//! once, at the public API boundary. Everything below the [Loader] façade
//! requires already-canonical input.
//!
//! [Loader]: crate::Loader

use url::Url;

/// Canonical absolute identifier of a module.
pub type Specifier = Url;

/// Specifier schemes internal to the host. They are never enumerated by
/// `specifiers()`/`entries()`, and a referrer under one of these schemes is
/// ignored during resolution.
pub const RESERVED_SCHEMES: &[&str] = &["ext", "node", "checkin"];

/// Whether the specifier falls under a reserved internal scheme.
pub fn is_reserved(specifier: &Specifier) -> bool {
    RESERVED_SCHEMES.contains(&specifier.scheme())
}

/// A specifier is only treated as a relative reference when it carries one of
/// the explicit relative prefixes. Anything else without a scheme is a bare
/// specifier, which this layer does not resolve.
fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('/') || specifier.starts_with("./") || specifier.starts_with("../")
}

/// Canonicalize a raw specifier, optionally against a referrer.
///
/// * An input that parses as an absolute URL is canonical as-is.
/// * A relative reference is joined against the referrer per RFC 3986,
///   unless the referrer is absent or reserved.
/// * Bare specifiers and malformed absolute forms do not resolve.
///
/// Returns [None] on any failure; callers use this for speculative lookups,
/// so an unresolvable input is not a fault.
pub fn resolve_specifier(specifier: &str, referrer: Option<&Specifier>) -> Option<Specifier> {
    match Url::parse(specifier) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) if is_relative(specifier) => {
            let referrer = referrer.filter(|referrer| !is_reserved(referrer))?;
            referrer.join(specifier).ok()
        }
        Err(_) => None,
    }
}
