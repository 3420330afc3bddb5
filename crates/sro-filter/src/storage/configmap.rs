//! ConfigMap tracking store
//!
//! All entries of a tracking record live in the `data` map of a single
//! ConfigMap, keyed by the decimal fingerprint.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Client;
use kube::api::{Api, PostParams};
use std::collections::BTreeMap;

use super::{TrackingIdentity, TrackingStore, tracking_labels};
use crate::error::{FilterError, Result};
use crate::fingerprint::Fingerprint;

/// Tracking store backed by a Kubernetes ConfigMap
#[derive(Clone)]
pub struct ConfigMapStore {
    client: Client,
}

impl ConfigMapStore {
    /// Create a store using the default kubeconfig / in-cluster config
    pub async fn new() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Create with an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn configmaps_api(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Fetch the tracking ConfigMap, `None` if it does not exist yet
    async fn fetch(&self, identity: &TrackingIdentity) -> Result<Option<ConfigMap>> {
        match self.configmaps_api(&identity.namespace).get(&identity.name).await {
            Ok(cm) => Ok(Some(cm)),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn build_configmap(identity: &TrackingIdentity, data: BTreeMap<String, String>) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(identity.name.clone()),
                namespace: Some(identity.namespace.clone()),
                labels: Some(tracking_labels()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TrackingStore for ConfigMapStore {
    async fn get_entry(&self, key: Fingerprint, identity: &TrackingIdentity) -> Result<String> {
        let not_found = || FilterError::EntryNotFound {
            key: key.to_string(),
            namespace: identity.namespace.clone(),
            name: identity.name.clone(),
        };

        let cm = self.fetch(identity).await?.ok_or_else(not_found)?;
        cm.data
            .as_ref()
            .and_then(|data| data.get(&key.to_string()))
            .cloned()
            .ok_or_else(not_found)
    }

    async fn put_entry(
        &self,
        key: Fingerprint,
        value: &str,
        identity: &TrackingIdentity,
    ) -> Result<()> {
        let api = self.configmaps_api(&identity.namespace);

        match self.fetch(identity).await? {
            Some(mut cm) => {
                cm.data
                    .get_or_insert_with(BTreeMap::new)
                    .insert(key.to_string(), value.to_string());
                api.replace(&identity.name, &PostParams::default(), &cm)
                    .await?;
            }
            None => {
                let data = BTreeMap::from([(key.to_string(), value.to_string())]);
                let cm = Self::build_configmap(identity, data);
                api.create(&PostParams::default(), &cm).await?;
            }
        }
        Ok(())
    }

    async fn delete_entry(&self, key: Fingerprint, identity: &TrackingIdentity) -> Result<()> {
        let Some(mut cm) = self.fetch(identity).await? else {
            return Ok(());
        };

        let removed = cm
            .data
            .as_mut()
            .and_then(|data| data.remove(&key.to_string()))
            .is_some();

        if removed {
            self.configmaps_api(&identity.namespace)
                .replace(&identity.name, &PostParams::default(), &cm)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock_client;
    use http::Method;
    use serde_json::json;

    const PATH: &str = "/api/v1/namespaces/sro/configmaps/special-resource-lifecycle";

    fn identity() -> TrackingIdentity {
        TrackingIdentity::new("sro", "special-resource-lifecycle")
    }

    fn tracking_configmap(entries: &[(&str, &str)]) -> ConfigMap {
        let data = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigMapStore::build_configmap(&identity(), data)
    }

    #[test]
    fn test_build_configmap() {
        let identity = TrackingIdentity::new("sro", "special-resource-lifecycle");
        let data = BTreeMap::from([("42".to_string(), "Pod".to_string())]);

        let cm = ConfigMapStore::build_configmap(&identity, data);

        assert_eq!(cm.metadata.name.as_deref(), Some("special-resource-lifecycle"));
        assert_eq!(cm.metadata.namespace.as_deref(), Some("sro"));
        assert_eq!(
            cm.metadata
                .labels
                .as_ref()
                .and_then(|l| l.get("app.kubernetes.io/component"))
                .map(String::as_str),
            Some("lifecycle")
        );
        assert_eq!(
            cm.data.as_ref().and_then(|d| d.get("42")).map(String::as_str),
            Some("Pod")
        );
    }

    #[tokio::test]
    async fn test_delete_entry_without_configmap() {
        let (client, mut server) = mock_client();
        let store = ConfigMapStore::with_client(client);
        let identity = identity();
        let key = Fingerprint::of("ns", "foo");

        let (result, get) = tokio::join!(
            store.delete_entry(key, &identity),
            server.respond_not_found("special-resource-lifecycle")
        );

        result.unwrap();
        assert_eq!(get.method, Method::GET);
        assert_eq!(get.path, PATH);
        server.assert_idle().await;
    }

    #[tokio::test]
    async fn test_delete_entry_absent_key_skips_replace() {
        let (client, mut server) = mock_client();
        let store = ConfigMapStore::with_client(client);
        let identity = identity();
        let other = Fingerprint::of("ns", "other").to_string();
        let cm = tracking_configmap(&[(other.as_str(), "Pod")]);

        let (result, get) = tokio::join!(
            store.delete_entry(Fingerprint::of("ns", "foo"), &identity),
            server.respond_ok(&cm)
        );

        result.unwrap();
        assert_eq!(get.method, Method::GET);
        server.assert_idle().await;
    }

    #[tokio::test]
    async fn test_delete_entry_replaces_without_key() {
        let (client, mut server) = mock_client();
        let store = ConfigMapStore::with_client(client);
        let identity = identity();
        let key = Fingerprint::of("ns", "foo");
        let other = Fingerprint::of("ns", "other").to_string();
        let cm = tracking_configmap(&[(key.to_string().as_str(), "Pod"), (other.as_str(), "Pod")]);
        let remaining = tracking_configmap(&[(other.as_str(), "Pod")]);

        let (result, (get, put)) = tokio::join!(store.delete_entry(key, &identity), async {
            let get = server.respond_ok(&cm).await;
            let put = server.respond_ok(&remaining).await;
            (get, put)
        });

        result.unwrap();
        assert_eq!(get.method, Method::GET);
        assert_eq!(put.method, Method::PUT);
        assert_eq!(put.path, PATH);
        assert_eq!(put.body["data"], json!({ other: "Pod" }));
    }

    #[tokio::test]
    async fn test_put_entry_creates_configmap() {
        let (client, mut server) = mock_client();
        let store = ConfigMapStore::with_client(client);
        let identity = identity();
        let key = Fingerprint::of("sro", "driver-abc");
        let created = tracking_configmap(&[(key.to_string().as_str(), "Pod")]);

        let (result, (get, post)) = tokio::join!(store.put_entry(key, "Pod", &identity), async {
            let get = server.respond_not_found("special-resource-lifecycle").await;
            let post = server.respond_ok(&created).await;
            (get, post)
        });

        result.unwrap();
        assert_eq!(get.method, Method::GET);
        assert_eq!(post.method, Method::POST);
        assert_eq!(post.path, "/api/v1/namespaces/sro/configmaps");
        assert_eq!(post.body["metadata"]["name"], "special-resource-lifecycle");
        assert_eq!(
            post.body["metadata"]["labels"]["app.kubernetes.io/component"],
            "lifecycle"
        );
        assert_eq!(post.body["data"], json!({ key.to_string(): "Pod" }));
    }

    #[tokio::test]
    async fn test_put_entry_replaces_existing() {
        let (client, mut server) = mock_client();
        let store = ConfigMapStore::with_client(client);
        let identity = identity();
        let key = Fingerprint::of("sro", "driver-abc");
        let other = Fingerprint::of("sro", "driver-xyz").to_string();
        let existing = tracking_configmap(&[(other.as_str(), "Pod")]);

        let (result, (get, put)) = tokio::join!(store.put_entry(key, "Pod", &identity), async {
            let get = server.respond_ok(&existing).await;
            let put = server.respond_ok(&existing).await;
            (get, put)
        });

        result.unwrap();
        assert_eq!(get.method, Method::GET);
        assert_eq!(put.method, Method::PUT);
        assert_eq!(put.path, PATH);
        assert_eq!(
            put.body["data"],
            json!({ other: "Pod", key.to_string(): "Pod" })
        );
        server.assert_idle().await;
    }

    #[tokio::test]
    async fn test_get_entry_missing_key() {
        let (client, mut server) = mock_client();
        let store = ConfigMapStore::with_client(client);
        let identity = identity();
        let cm = tracking_configmap(&[]);

        let (result, _) = tokio::join!(
            store.get_entry(Fingerprint::of("ns", "foo"), &identity),
            server.respond_ok(&cm)
        );

        assert!(matches!(result, Err(FilterError::EntryNotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_entry_propagates_server_errors() {
        let (client, mut server) = mock_client();
        let store = ConfigMapStore::with_client(client);
        let identity = identity();
        let status = json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": "forbidden",
            "reason": "Forbidden",
            "code": 403
        });

        let (result, _) = tokio::join!(
            store.get_entry(Fingerprint::of("ns", "foo"), &identity),
            server.respond(http::StatusCode::FORBIDDEN, &status)
        );

        let err = result.unwrap_err();
        assert!(matches!(err, FilterError::Api(_)));
        assert!(!err.is_not_found());
    }
}
