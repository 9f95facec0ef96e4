use crate::config::OracleConfig;
use crate::error::configuration::ConfigurationError;
use crate::error::reqwest::WrappedReqwestError;
use crate::error::who_is::WhoIsError;
use crate::identity::PeerIdentity;
use crate::oracle::IdentityOracle;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

const WHOIS_PATH: &str = "localapi/v0/whois";

/// Asks the mesh daemon's local API who owns a connection.
pub struct LocalApiOracle {
    client: Client,
    base: Url,
    password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WhoIsResponse {
    node: Option<WireNode>,
    user_profile: Option<WireUserProfile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireNode {
    computed_name: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct WireUserProfile {
    #[serde(default)]
    login_name: String,
    #[serde(default)]
    display_name: String,
}

impl LocalApiOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.lookup_timeout)
            .build()
            .map_err(|e| ConfigurationError::BuildOracleClientFailed(WrappedReqwestError(e)))?;
        Ok(Self {
            client,
            base: config.local_api_url.clone(),
            password: config.password.clone(),
        })
    }

    fn who_is_url(&self, address: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!(
            "{}/{}",
            self.base.path().trim_end_matches('/'),
            WHOIS_PATH
        ));
        url.query_pairs_mut().clear().append_pair("addr", address);
        url
    }
}

#[async_trait::async_trait]
impl IdentityOracle for LocalApiOracle {
    async fn who_is(&self, address: &str) -> Result<PeerIdentity, WhoIsError> {
        let mut request = self
            .client
            .get(self.who_is_url(address))
            .header("Sec-Tailscale", "localapi");
        if let Some(password) = &self.password {
            request = request.basic_auth("", Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| WhoIsError::Transport(WrappedReqwestError(e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(WhoIsError::UnknownPeer(address.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(WhoIsError::Unauthenticated(address.to_string()))
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(WhoIsError::UnexpectedStatus {
                    address: address.to_string(),
                    status: status.as_u16(),
                    body: body.trim().to_string(),
                });
            }
            _ => {}
        }

        let who: WhoIsResponse = response
            .json()
            .await
            .map_err(|e| WhoIsError::InvalidResponse(WrappedReqwestError(e)))?;
        let node = who
            .node
            .ok_or_else(|| WhoIsError::MissingNode(address.to_string()))?;
        let computed_name = node
            .computed_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| WhoIsError::MissingComputedName(address.to_string()))?;
        let profile = who.user_profile.unwrap_or_default();

        Ok(PeerIdentity {
            tags: node.tags.unwrap_or_default(),
            login_name: profile.login_name,
            display_name: profile.display_name,
            computed_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, Matcher};
    use std::time::Duration;

    fn oracle_for(url: &str) -> LocalApiOracle {
        LocalApiOracle::new(&OracleConfig {
            local_api_url: Url::parse(url).unwrap(),
            password: None,
            lookup_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn whois_mock(address: &str) -> mockito::Mock {
        mock("GET", "/localapi/v0/whois")
            .match_query(Matcher::UrlEncoded("addr".into(), address.into()))
            .match_header("sec-tailscale", "localapi")
    }

    #[tokio::test]
    async fn maps_tagged_node() {
        let m = whois_mock("100.64.0.1:41641")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"Node": {"ComputedName": "node1", "Tags": ["tag:web", "tag:prod"]},
                    "UserProfile": {"LoginName": "tagged-devices", "DisplayName": "Tagged Devices"}}"#,
            )
            .create();

        let identity = oracle_for(&mockito::server_url())
            .who_is("100.64.0.1:41641")
            .await
            .unwrap();
        m.assert();

        assert_eq!(identity.tags, vec!["tag:web", "tag:prod"]);
        assert_eq!(identity.computed_name, "node1");
    }

    #[tokio::test]
    async fn maps_user_profile() {
        let m = whois_mock("100.64.0.2:41641")
            .with_status(200)
            .with_body(
                r#"{"Node": {"ComputedName": "alices-laptop", "Tags": null},
                    "UserProfile": {"LoginName": "alice@example.com", "DisplayName": "Alice"}}"#,
            )
            .create();

        let identity = oracle_for(&mockito::server_url())
            .who_is("100.64.0.2:41641")
            .await
            .unwrap();
        m.assert();

        assert_eq!(
            identity,
            PeerIdentity::user("alice@example.com", "Alice", "alices-laptop")
        );
    }

    #[tokio::test]
    async fn sends_password_as_basic_auth() {
        let m = whois_mock("100.64.0.3:41641")
            // base64 of ":secret"
            .match_header("authorization", "Basic OnNlY3JldA==")
            .with_status(200)
            .with_body(r#"{"Node": {"ComputedName": "n3"}}"#)
            .create();

        let oracle = LocalApiOracle::new(&OracleConfig {
            local_api_url: Url::parse(&mockito::server_url()).unwrap(),
            password: Some("secret".to_string()),
            lookup_timeout: Duration::from_secs(5),
        })
        .unwrap();
        let identity = oracle.who_is("100.64.0.3:41641").await.unwrap();
        m.assert();

        assert_eq!(identity.computed_name, "n3");
        assert!(identity.tags.is_empty());
    }

    #[tokio::test]
    async fn not_found_is_unknown_peer() {
        let m = whois_mock("100.64.0.4:41641")
            .with_status(404)
            .with_body("no match for IP:port")
            .create();

        let result = oracle_for(&mockito::server_url())
            .who_is("100.64.0.4:41641")
            .await;
        m.assert();

        assert!(matches!(result, Err(WhoIsError::UnknownPeer(_))));
    }

    #[tokio::test]
    async fn forbidden_is_unauthenticated() {
        let m = whois_mock("100.64.0.5:41641").with_status(403).create();

        let result = oracle_for(&mockito::server_url())
            .who_is("100.64.0.5:41641")
            .await;
        m.assert();

        assert!(matches!(result, Err(WhoIsError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let m = whois_mock("100.64.0.6:41641")
            .with_status(500)
            .with_body("daemon not running\n")
            .create();

        let result = oracle_for(&mockito::server_url())
            .who_is("100.64.0.6:41641")
            .await;
        m.assert();

        match result {
            Err(WhoIsError::UnexpectedStatus { status, body, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "daemon not running");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_node_is_rejected() {
        let m = whois_mock("100.64.0.7:41641")
            .with_status(200)
            .with_body(r#"{"UserProfile": {"LoginName": "alice@example.com"}}"#)
            .create();

        let result = oracle_for(&mockito::server_url())
            .who_is("100.64.0.7:41641")
            .await;
        m.assert();

        assert!(matches!(result, Err(WhoIsError::MissingNode(_))));
    }

    #[tokio::test]
    async fn node_without_computed_name_is_rejected() {
        for (address, body) in [
            ("100.64.0.10:41641", r#"{"Node": {"Tags": ["tag:web"]}}"#),
            (
                "100.64.0.11:41641",
                r#"{"Node": {"ComputedName": "", "Tags": ["tag:web"]}}"#,
            ),
        ] {
            let m = whois_mock(address).with_status(200).with_body(body).create();

            let result = oracle_for(&mockito::server_url()).who_is(address).await;
            m.assert();

            assert!(
                matches!(result, Err(WhoIsError::MissingComputedName(_))),
                "{body} should be rejected"
            );
        }
    }

    #[test]
    fn unix_socket_url_is_rejected_at_construction() {
        let result = LocalApiOracle::new(&OracleConfig {
            local_api_url: Url::parse("unix:/var/run/tailscale/tailscaled.sock").unwrap(),
            password: None,
            lookup_timeout: Duration::from_secs(5),
        });
        assert!(matches!(
            result,
            Err(ConfigurationError::UnsupportedLocalApiUrl(_))
        ));
    }

    #[tokio::test]
    async fn garbage_body_is_invalid_response() {
        let m = whois_mock("100.64.0.8:41641")
            .with_status(200)
            .with_body("<html>")
            .create();

        let result = oracle_for(&mockito::server_url())
            .who_is("100.64.0.8:41641")
            .await;
        m.assert();

        assert!(matches!(result, Err(WhoIsError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn unreachable_daemon_is_transport_failure() {
        let result = oracle_for("http://127.0.0.1:1").who_is("100.64.0.9:41641").await;
        assert!(matches!(result, Err(WhoIsError::Transport(_))));
    }

    #[test]
    fn url_keeps_base_path_and_encodes_address() {
        let oracle = oracle_for("http://localhost:8080/proxy/");
        assert_eq!(
            oracle.who_is_url("[fd7a::1]:443").as_str(),
            "http://localhost:8080/proxy/localapi/v0/whois?addr=%5Bfd7a%3A%3A1%5D%3A443"
        );
    }
}
