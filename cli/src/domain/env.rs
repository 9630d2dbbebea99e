//! Child-process environment layering.

use std::collections::BTreeMap;

/// Ordered environment map handed to a child process.
pub type EnvMap = BTreeMap<String, String>;

/// Parse `KEY=VALUE` lines of a defaults file.
///
/// Blank lines and `#` comments are ignored, lines are split on the first
/// `=`, and both sides are trimmed. Lines without `=` or with an empty key
/// are dropped.
#[must_use]
pub fn parse_env_file(content: &str) -> EnvMap {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Build a child environment.
///
/// `inherited` is overlaid with `overrides`; `defaults` only fill keys that
/// neither earlier layer set.
#[must_use]
pub fn layer_environment(
    inherited: impl IntoIterator<Item = (String, String)>,
    overrides: &EnvMap,
    defaults: &EnvMap,
) -> EnvMap {
    let mut env: EnvMap = inherited.into_iter().collect();
    env.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    for (key, value) in defaults {
        env.entry(key.clone()).or_insert_with(|| value.clone());
    }
    env
}
