use std::path::PathBuf;

pub const DEFAULT_SERVER_ADDR: &str = "https://gomote.golang.org:443";
pub const DEFAULT_COORDINATOR_URL: &str = "https://farmer.golang.org";
pub const DEFAULT_BUILDERS_URL: &str = "https://farmer.golang.org/builders?mode=json";

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GomoteConfig {
    /// gRPC endpoint of the provisioning service
    pub server_addr: String,
    /// Base URL of the coordinator used by the legacy create path
    pub coordinator_url: String,
    /// Builder catalog endpoint, used only for usage text
    pub builders_url: String,
    /// Group applied to every invocation, from `GOMOTE_GROUP`
    pub active_group: Option<String>,
    /// Directory holding `<name>.json` group files
    pub group_dir: PathBuf,
    /// Executable providing the `push` and `run` commands used by setup
    pub gomote_bin: PathBuf,
    /// Source tree pushed during setup; `go env GOROOT` is asked when unset
    pub goroot: Option<PathBuf>,
}

impl GomoteConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let group_dir = non_empty("GOMOTE_GROUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                user_config_dir(&non_empty)
                    .join("gomote")
                    .join("groups")
            });

        Self {
            server_addr: non_empty("GOMOTE_SERVER_ADDR")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
            coordinator_url: non_empty("GOMOTE_COORDINATOR_URL")
                .unwrap_or_else(|| DEFAULT_COORDINATOR_URL.to_string()),
            builders_url: non_empty("GOMOTE_BUILDERS_URL")
                .unwrap_or_else(|| DEFAULT_BUILDERS_URL.to_string()),
            active_group: non_empty("GOMOTE_GROUP"),
            group_dir,
            gomote_bin: non_empty("GOMOTE_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("gomote")),
            goroot: non_empty("GOROOT").map(PathBuf::from),
        }
    }
}

fn user_config_dir(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup("XDG_CONFIG_HOME") {
        return PathBuf::from(dir);
    }
    match lookup("HOME") {
        Some(home) => PathBuf::from(home).join(".config"),
        None => std::env::temp_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> GomoteConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GomoteConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[("HOME", "/home/gopher")]);
        assert_eq!(config.server_addr, DEFAULT_SERVER_ADDR);
        assert_eq!(config.coordinator_url, DEFAULT_COORDINATOR_URL);
        assert_eq!(config.builders_url, DEFAULT_BUILDERS_URL);
        assert!(config.active_group.is_none());
        assert_eq!(
            config.group_dir,
            PathBuf::from("/home/gopher/.config/gomote/groups")
        );
        assert_eq!(config.gomote_bin, PathBuf::from("gomote"));
        assert!(config.goroot.is_none());
    }

    #[test]
    fn test_xdg_config_home_wins_over_home() {
        let config = config_from(&[("HOME", "/home/gopher"), ("XDG_CONFIG_HOME", "/xdg")]);
        assert_eq!(config.group_dir, PathBuf::from("/xdg/gomote/groups"));
    }

    #[test]
    fn test_explicit_overrides() {
        let config = config_from(&[
            ("GOMOTE_SERVER_ADDR", "http://127.0.0.1:8080"),
            ("GOMOTE_GROUP", "fleet"),
            ("GOMOTE_GROUP_DIR", "/tmp/groups"),
            ("GOMOTE_BIN", "/usr/local/bin/gomote"),
            ("GOROOT", "/opt/go"),
        ]);
        assert_eq!(config.server_addr, "http://127.0.0.1:8080");
        assert_eq!(config.active_group.as_deref(), Some("fleet"));
        assert_eq!(config.group_dir, PathBuf::from("/tmp/groups"));
        assert_eq!(config.gomote_bin, PathBuf::from("/usr/local/bin/gomote"));
        assert_eq!(config.goroot, Some(PathBuf::from("/opt/go")));
    }

    #[test]
    fn test_blank_active_group_is_ignored() {
        let config = config_from(&[("HOME", "/h"), ("GOMOTE_GROUP", "  ")]);
        assert!(config.active_group.is_none());
    }

    #[test]
    fn test_blank_goroot_is_ignored() {
        let config = config_from(&[("HOME", "/h"), ("GOROOT", "")]);
        assert!(config.goroot.is_none());
    }
}
