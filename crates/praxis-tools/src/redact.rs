const SECRET_MARKERS: &[&str] = &["key", "token", "secret", "password", "credential"];

/// Masks the value of any `env`/`mounts` entry whose key looks
/// secret-bearing, so engine specs can be logged without leaking
/// credentials passed through to containers or remote MCP servers.
pub fn redact_env(env: &std::collections::BTreeMap<String, String>) -> std::collections::BTreeMap<String, String> {
    env.iter()
        .map(|(k, v)| {
            let lower = k.to_ascii_lowercase();
            let value = if SECRET_MARKERS.iter().any(|marker| lower.contains(marker)) {
                "***redacted***".to_string()
            } else {
                v.clone()
            };
            (k.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_keys_matching_secret_markers() {
        let mut env = std::collections::BTreeMap::new();
        env.insert("API_KEY".to_string(), "sk-live-abc".to_string());
        env.insert("PLAIN".to_string(), "value".to_string());
        let redacted = redact_env(&env);
        assert_eq!(redacted["API_KEY"], "***redacted***");
        assert_eq!(redacted["PLAIN"], "value");
    }
}
