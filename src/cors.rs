//! Cross-origin policy and its conversion into a `tower_http` CORS layer.

use crate::error::ConfigError;
use axum::http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Either every value (`"*"`), or an explicit list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowList {
    Any,
    List(Vec<String>),
}

impl Serialize for AllowList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AllowList::Any => serializer.serialize_str("*"),
            AllowList::List(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for AllowList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) if s == "*" => Ok(AllowList::Any),
            serde_json::Value::String(s) => Ok(AllowList::List(vec![s])),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => Ok(s),
                    other => Err(serde::de::Error::custom(format!("expected a string, got {}", other))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(AllowList::List),
            other => Err(serde::de::Error::custom(format!(
                "expected \"*\" or a list of strings, got {}",
                other
            ))),
        }
    }
}

impl AllowList {
    pub fn is_any(&self) -> bool {
        match self {
            AllowList::Any => true,
            AllowList::List(v) => v.iter().any(|s| s == "*"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsPolicy {
    pub allowed_origins: AllowList,
    pub allow_credentials: bool,
    pub allowed_methods: AllowList,
    pub allowed_headers: AllowList,
}

impl CorsPolicy {
    /// Every origin, method and header, with credentials.
    pub fn permissive() -> Self {
        Self {
            allowed_origins: AllowList::Any,
            allow_credentials: true,
            allowed_methods: AllowList::Any,
            allowed_headers: AllowList::Any,
        }
    }

    /// Browsers refuse `*` when credentials are allowed, so wildcards are answered by echoing the request.
    pub fn layer(&self) -> Result<CorsLayer, ConfigError> {
        let mirror = self.allow_credentials;
        if mirror && self.allowed_origins.is_any() {
            warn!("cross-origin policy allows every origin together with credentials");
        }

        let origin = match &self.allowed_origins {
            a if a.is_any() && mirror => AllowOrigin::mirror_request(),
            a if a.is_any() => AllowOrigin::from(Any),
            AllowList::List(origins) => {
                let values = origins
                    .iter()
                    .map(|o| HeaderValue::from_str(o).map_err(|_| ConfigError::InvalidOrigin(o.clone())))
                    .collect::<Result<Vec<_>, _>>()?;
                AllowOrigin::list(values)
            }
            AllowList::Any => AllowOrigin::from(Any),
        };

        let methods = match &self.allowed_methods {
            a if a.is_any() && mirror => AllowMethods::mirror_request(),
            a if a.is_any() => AllowMethods::from(Any),
            AllowList::List(methods) => {
                let values = methods
                    .iter()
                    .map(|m| {
                        Method::from_str(&m.to_uppercase()).map_err(|_| ConfigError::InvalidValue {
                            key: "allowed_methods",
                            value: m.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                AllowMethods::list(values)
            }
            AllowList::Any => AllowMethods::from(Any),
        };

        let headers = match &self.allowed_headers {
            a if a.is_any() && mirror => AllowHeaders::mirror_request(),
            a if a.is_any() => AllowHeaders::from(Any),
            AllowList::List(headers) => {
                let values = headers
                    .iter()
                    .map(|h| {
                        HeaderName::from_str(h).map_err(|_| ConfigError::InvalidValue {
                            key: "allowed_headers",
                            value: h.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                AllowHeaders::list(values)
            }
            AllowList::Any => AllowHeaders::from(Any),
        };

        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(self.allow_credentials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_in_list_counts_as_any() {
        assert!(AllowList::List(vec!["*".into()]).is_any());
        assert!(!AllowList::List(vec!["https://a.example".into()]).is_any());
    }

    #[test]
    fn bad_origin_is_rejected() {
        let policy = CorsPolicy {
            allowed_origins: AllowList::List(vec!["bad\norigin".into()]),
            ..CorsPolicy::permissive()
        };
        assert!(matches!(policy.layer(), Err(ConfigError::InvalidOrigin(_))));
    }

    #[test]
    fn bad_method_is_rejected() {
        let policy = CorsPolicy {
            allowed_methods: AllowList::List(vec!["GE T".into()]),
            ..CorsPolicy::permissive()
        };
        assert!(policy.layer().is_err());
    }

    #[test]
    fn policy_from_json() {
        let policy: CorsPolicy = serde_json::from_str(
            r#"{"allowed_origins": ["*"], "allow_credentials": true,
                "allowed_methods": "*", "allowed_headers": ["x-token"]}"#,
        )
        .unwrap();
        assert!(policy.allowed_origins.is_any());
        assert_eq!(policy.allowed_methods, AllowList::Any);
        assert_eq!(policy.allowed_headers, AllowList::List(vec!["x-token".into()]));
        assert!(policy.layer().is_ok());
        assert!(serde_json::from_str::<AllowList>("3").is_err());
    }
}
