use log::debug;
use std::env;

/// Read an environment variable with fallback to a default value
///
/// Variables exposed to the browser build carry a `NEXT_PUBLIC_` prefix, so
/// both spellings are accepted.
///
/// Arguments:
/// * `key` - The environment variable name without any prefix
/// * `default` - The default value to use if the variable is not found
/// * `prefer_unprefixed` - Whether to prefer the unprefixed version over the prefixed one
pub fn read_env(key: &str, default: &str, prefer_unprefixed: bool) -> String {
    let prefixed = format!("NEXT_PUBLIC_{}", key);
    let env_var = if prefer_unprefixed {
        env::var(key).or_else(|_| env::var(&prefixed))
    } else {
        env::var(&prefixed).or_else(|_| env::var(key))
    };

    let value = env_var.unwrap_or_else(|_| default.to_string());

    debug!("Environment variable {} resolved to: {}", key, value);
    value
}

/// Read an optional environment variable, ignoring empty values
pub fn read_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read an environment variable as an unsigned integer, falling back on parse failure
pub fn read_env_u64(key: &str, default: u64, prefer_unprefixed: bool) -> u64 {
    let value = read_env(key, &default.to_string(), prefer_unprefixed);
    value.trim().parse::<u64>().unwrap_or(default)
}
