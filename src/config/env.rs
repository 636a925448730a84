use std::fs;
use std::path::Path;

/// Keys without which startup fails; warned about early so the operator sees every gap at once.
const REQUIRED_KEYS: [&str; 3] = ["PRIVATE_KEY", "EXECUTOR_ADDRESS", "NETWORKS"];

/// Parses `KEY=value` lines. Comments, blank lines and surrounding quotes are tolerated.
pub fn parse_dot_env(content: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let value = value.trim();
        let unquoted = if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            &value[1..value.len() - 1]
        } else {
            value.split(" #").next().unwrap_or("").trim()
        };
        out.push((key.to_string(), unquoted.to_string()));
    }
    out
}

/// Loads `path` into the process environment. Variables already set are left untouched.
/// Returns the number of keys applied.
pub fn load_dot_env(path: &Path) -> usize {
    if !path.exists() {
        return 0;
    }
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("[ENV] Failed to read {}: {}", path.display(), e);
            return 0;
        }
    };

    let mut applied = 0;
    for (key, value) in parse_dot_env(&content) {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        std::env::set_var(&key, value);
        applied += 1;
    }
    applied
}

pub fn warn_missing_required() {
    for key in REQUIRED_KEYS {
        if std::env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true) {
            tracing::warn!("[ENV] {} is not set", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_dot_env;

    #[test]
    fn test_parse_dot_env_handles_quotes_comments_and_export() {
        let parsed = parse_dot_env(
            "# comment\n\nNETWORKS=\"base,arbitrum\"\nexport GAS_LIMIT=250000 # tuned\nBASE_SYMBOL='USDT'\nnot a pair\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("NETWORKS".to_string(), "base,arbitrum".to_string()),
                ("GAS_LIMIT".to_string(), "250000".to_string()),
                ("BASE_SYMBOL".to_string(), "USDT".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_dot_env_keeps_hash_inside_urls() {
        let parsed = parse_dot_env("SIGNAL_URL=http://host/feed#frag\n");
        assert_eq!(parsed[0].1, "http://host/feed#frag");
    }
}
