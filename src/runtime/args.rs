#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeArgs {
    pub explain_config: bool,
    /// Overrides `NETWORKS` when present.
    pub networks: Option<Vec<String>>,
}

fn parse_network_list(raw: &str) -> anyhow::Result<Vec<String>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>();
    if ids.is_empty() {
        return Err(anyhow::anyhow!(
            "--networks needs a comma-separated list of network ids (e.g. --networks base,arbitrum)"
        ));
    }
    Ok(ids)
}

pub fn parse_runtime_args_from_iter<I, S>(args: I) -> anyhow::Result<RuntimeArgs>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = RuntimeArgs::default();
    let mut iter = args.into_iter().map(|arg| arg.as_ref().to_string());
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--explain-config" => parsed.explain_config = true,
            "--networks" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--networks requires a value"))?;
                parsed.networks = Some(parse_network_list(&value)?);
            }
            other => {
                if let Some(value) = other.strip_prefix("--networks=") {
                    parsed.networks = Some(parse_network_list(value)?);
                } else {
                    return Err(anyhow::anyhow!(
                        "unknown argument '{}'. Supported: --explain-config, --networks <a,b>. Everything else is configured via .env",
                        other
                    ));
                }
            }
        }
    }
    Ok(parsed)
}

pub fn parse_runtime_args() -> anyhow::Result<RuntimeArgs> {
    parse_runtime_args_from_iter(std::env::args().skip(1))
}

#[cfg(test)]
mod tests {
    use super::parse_runtime_args_from_iter;

    #[test]
    fn runtime_args_default_to_env_driven_run() {
        let parsed =
            parse_runtime_args_from_iter(Vec::<&str>::new()).expect("parse should succeed");
        assert!(!parsed.explain_config);
        assert!(parsed.networks.is_none());
    }

    #[test]
    fn runtime_args_parse_explain_and_networks() {
        let parsed = parse_runtime_args_from_iter(["--explain-config", "--networks", "Base, arbitrum"])
            .expect("parse should succeed");
        assert!(parsed.explain_config);
        assert_eq!(
            parsed.networks,
            Some(vec!["base".to_string(), "arbitrum".to_string()])
        );

        let parsed = parse_runtime_args_from_iter(["--networks=optimism"])
            .expect("parse should succeed");
        assert_eq!(parsed.networks, Some(vec!["optimism".to_string()]));
    }

    #[test]
    fn runtime_args_reject_empty_network_list() {
        let err = parse_runtime_args_from_iter(["--networks", " , "]).expect_err("parse should fail");
        assert!(err.to_string().contains("comma-separated"), "{err}");
        assert!(parse_runtime_args_from_iter(["--networks"]).is_err());
    }

    #[test]
    fn runtime_args_reject_unknown_flags() {
        let err =
            parse_runtime_args_from_iter(["--profile", "deep"]).expect_err("parse should fail");
        assert!(
            err.to_string().contains("unknown argument '--profile'"),
            "unexpected error message: {}",
            err
        );
    }
}
