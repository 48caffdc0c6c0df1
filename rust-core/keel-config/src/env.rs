// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Environment overrides. A variable that is unset or blank leaves the YAML
// value in place; anything else overwrites it.

use std::str::FromStr;

use tracing::debug;

use crate::error::ConfigError;

/// Overwrite `target` with the variable `name`, if present.
pub(crate) fn override_string<F>(lookup: &F, name: &str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = present(lookup, name) {
        debug!(variable = name, "configuration overridden from environment");
        *target = value;
    }
}

/// Overwrite `target` with the parsed variable `name`, if present.
///
/// An unparsable value is a configuration error against `parameter`.
pub(crate) fn override_parsed<F, T>(
    lookup: &F,
    name: &str,
    parameter: &str,
    target: &mut T,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = present(lookup, name) {
        *target = value.trim().parse().map_err(|_| {
            ConfigError::invalid(
                parameter,
                format!("environment variable {name} is not a valid number: {value:?}"),
            )
        })?;
        debug!(variable = name, "configuration overridden from environment");
    }
    Ok(())
}

fn present<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}
