//! API endpoint descriptors of the form `<token>:<multiaddr>`.

use crate::error::{MigrationError, Result};
use std::fmt;
use std::fs;
use std::path::Path;

/// Environment variable holding the chain node's API info
pub const FULLNODE_API_INFO_ENV: &str = "FULLNODE_API_INFO";

/// An authenticated API endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiInfo {
    pub token: String,
    /// Multiaddr such as `/ip4/127.0.0.1/tcp/1234/http`
    pub addr: String,
}

impl fmt::Debug for ApiInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiInfo")
            .field("token", &"<redacted>")
            .field("addr", &self.addr)
            .finish()
    }
}

impl ApiInfo {
    /// Parse `"<token>:<multiaddr>"`
    pub fn parse(s: &str) -> Result<Self> {
        let (token, addr) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| MigrationError::api_info("api info", "expected <token>:<multiaddr>"))?;
        if token.is_empty() {
            return Err(MigrationError::api_info("api info", "missing token"));
        }
        if !addr.starts_with('/') {
            return Err(MigrationError::api_info(
                "api info",
                format!("not a multiaddr: {}", addr),
            ));
        }
        Ok(Self {
            token: token.to_string(),
            addr: addr.to_string(),
        })
    }

    /// Read the `token` and `api` files a running node leaves in its repo
    pub fn from_repo(repo: &Path) -> Result<Self> {
        let read = |name: &str| {
            fs::read_to_string(repo.join(name)).map_err(|e| {
                MigrationError::api_info(
                    repo.display().to_string(),
                    format!("reading {}: {} (is the node running?)", name, e),
                )
            })
        };
        let token = read("token")?.trim().to_string();
        let addr = read("api")?.trim().to_string();
        Self::parse(&format!("{}:{}", token, addr))
    }

    /// Value for an `Authorization` header
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// HTTP JSON-RPC endpoint for the given API version.
    ///
    /// Supports `/ip4`, `/ip6` and `/dns*` hosts over `/tcp/<port>/http`.
    pub fn http_url(&self, version: &str) -> Result<String> {
        let parts: Vec<&str> = self.addr.trim_start_matches('/').split('/').collect();
        let bad = || MigrationError::api_info("api info", format!("unsupported multiaddr {}", self.addr));
        match parts.as_slice() {
            [proto, host, "tcp", port, rest @ ..]
                if rest.is_empty() || rest == ["http"] || rest == ["ws"] =>
            {
                let host = match *proto {
                    "ip4" | "dns" | "dns4" | "dns6" => host.to_string(),
                    "ip6" => format!("[{}]", host),
                    _ => return Err(bad()),
                };
                port.parse::<u16>().map_err(|_| bad())?;
                Ok(format!("http://{}:{}/rpc/{}", host, port, version))
            }
            _ => Err(bad()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_env_form() {
        let info = ApiInfo::parse("eyJhbGc.tok:/ip4/127.0.0.1/tcp/1234/http").unwrap();
        assert_eq!(info.token, "eyJhbGc.tok");
        assert_eq!(info.auth_header(), "Bearer eyJhbGc.tok");
        assert_eq!(info.http_url("v0").unwrap(), "http://127.0.0.1:1234/rpc/v0");
    }

    #[test]
    fn ip6_and_dns_hosts() {
        let v6 = ApiInfo::parse("t:/ip6/::1/tcp/2345/http").unwrap();
        assert_eq!(v6.http_url("v0").unwrap(), "http://[::1]:2345/rpc/v0");
        let dns = ApiInfo::parse("t:/dns/lotus.local/tcp/1234").unwrap();
        assert_eq!(dns.http_url("v1").unwrap(), "http://lotus.local:1234/rpc/v1");
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(ApiInfo::parse("no-separator").is_err());
        assert!(ApiInfo::parse(":/ip4/1.2.3.4/tcp/1").is_err());
        assert!(ApiInfo::parse("tok:http://x").is_err());
        let udp = ApiInfo::parse("t:/ip4/1.2.3.4/udp/1234").unwrap();
        assert!(udp.http_url("v0").is_err());
    }

    #[test]
    fn reads_repo_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("token"), "secrettoken\n").unwrap();
        fs::write(dir.path().join("api"), "/ip4/127.0.0.1/tcp/2345/http\n").unwrap();
        let info = ApiInfo::from_repo(dir.path()).unwrap();
        assert_eq!(info.token, "secrettoken");
        assert_eq!(info.http_url("v0").unwrap(), "http://127.0.0.1:2345/rpc/v0");
    }

    #[test]
    fn missing_repo_files_name_the_repo() {
        let dir = tempdir().unwrap();
        let err = ApiInfo::from_repo(dir.path()).unwrap_err();
        assert!(matches!(err, MigrationError::ApiInfo { .. }));
    }

    #[test]
    fn debug_hides_token() {
        let info = ApiInfo::parse("supersecret:/ip4/1.1.1.1/tcp/1").unwrap();
        assert!(!format!("{:?}", info).contains("supersecret"));
    }
}
