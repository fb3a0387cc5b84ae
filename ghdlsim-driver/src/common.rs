// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;

/// Reads a `true`/`false` flag added via `add_bool_arg`, falling back to
/// `default` when it was not given.
pub fn parse_bool_flag_or(matches: &ArgMatches, name: &str, default: bool) -> bool {
    matches
        .get_one::<String>(name)
        .map(|s| s == "true")
        .unwrap_or(default)
}
