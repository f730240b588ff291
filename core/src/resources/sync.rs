use serde_json::{json, Value};

use crate::client::FarmOpsXClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, Transport};
use crate::response::Response;
use crate::Options;

const RESOURCE: &str = "sync";

/// Data ingestion and webhook synchronisation.
pub struct SyncResource<'a, T> {
    client: &'a FarmOpsXClient<T>,
}

impl<'a, T: Transport> SyncResource<'a, T> {
    pub(crate) fn new(client: &'a FarmOpsXClient<T>) -> Self {
        Self { client }
    }

    /// Forward a report received from SaferMe.
    pub fn external_report(&self, data: Value) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("data".to_string(), data);
        self.client
            .request(RESOURCE, HttpMethod::Post, "external/saferme/report", options)
    }

    /// Push a packet of records of type `model` into the system.
    pub fn ingest(&self, model: &str, data: Value) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("model".to_string(), json!(model));
        options.insert("data".to_string(), data);
        self.client.request(RESOURCE, HttpMethod::Post, "ingest", options)
    }

    pub fn webhooks(&self) -> Result<Response, ApiError> {
        self.client
            .request(RESOURCE, HttpMethod::Get, "webhooks", Options::new())
    }

    /// Register a new webhook of `kind` delivering to `endpoint`.
    pub fn generate(&self, kind: &str, endpoint: &str) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("type".to_string(), json!(kind));
        options.insert("endpoint".to_string(), json!(endpoint));
        self.client.request(RESOURCE, HttpMethod::Post, "webhooks", options)
    }

    pub fn fetch(&self, id: &str) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("id".to_string(), json!(id));
        self.client.request(RESOURCE, HttpMethod::Get, "webhooks/:id", options)
    }

    pub fn sync(
        &self,
        id: &str,
        kind: &str,
        endpoint: &str,
        enabled: bool,
        metadata: &Options,
    ) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("id".to_string(), json!(id));
        options.insert("type".to_string(), json!(kind));
        options.insert("endpoint".to_string(), json!(endpoint));
        options.insert("enabled".to_string(), json!(enabled));
        options.insert("metadata".to_string(), Value::Object(metadata.clone()));
        self.client.request(RESOURCE, HttpMethod::Put, "webhooks/:id", options)
    }

    pub fn delete(&self, id: &str) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("id".to_string(), json!(id));
        self.client
            .request(RESOURCE, HttpMethod::Delete, "webhooks/:id", options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::resources::testing::Recorder;

    fn client() -> FarmOpsXClient<Recorder> {
        FarmOpsXClient::new(
            Recorder::default(),
            ClientConfig::new("http://api.test/").with_token("t0k"),
        )
    }

    #[test]
    fn external_report_wraps_data() {
        let c = client();
        c.sync().external_report(json!({"reportId": 77})).unwrap();
        let req = c.transport().last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://api.test/sync/external/saferme/report");
        assert_eq!(req.header("authorization"), Some("Bearer t0k"));
        assert_eq!(c.transport().last_body(), json!({"data": {"reportId": 77}}));
    }

    #[test]
    fn ingest_sends_model_and_data() {
        let c = client();
        c.sync().ingest("harvest", json!([{"bags": 12}])).unwrap();
        assert_eq!(c.transport().last().url, "http://api.test/sync/ingest");
        assert_eq!(
            c.transport().last_body(),
            json!({"model": "harvest", "data": [{"bags": 12}]})
        );
    }

    #[test]
    fn webhook_listing_and_creation() {
        let c = client();
        c.sync().webhooks().unwrap();
        let req = c.transport().last();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://api.test/sync/webhooks");

        c.sync().generate("report", "https://hooks.example/in").unwrap();
        assert_eq!(
            c.transport().last_body(),
            json!({"type": "report", "endpoint": "https://hooks.example/in"})
        );
    }

    #[test]
    fn webhook_by_id_operations() {
        let c = client();
        c.sync().fetch("wh-1").unwrap();
        assert_eq!(c.transport().last().url, "http://api.test/sync/webhooks/wh-1");

        c.sync()
            .sync("wh-1", "report", "https://hooks.example/in", false, &Options::new())
            .unwrap();
        let req = c.transport().last();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://api.test/sync/webhooks/wh-1");
        assert_eq!(
            c.transport().last_body(),
            json!({
                "type": "report",
                "endpoint": "https://hooks.example/in",
                "enabled": false,
                "metadata": {}
            })
        );

        c.sync().delete("wh-1").unwrap();
        let req = c.transport().last();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://api.test/sync/webhooks/wh-1");
        assert!(req.body.is_none());
    }

    #[test]
    fn empty_webhook_id_fails_before_sending() {
        let c = client();
        let err = c.sync().delete("").unwrap_err();
        assert!(matches!(err, ApiError::InvalidPathValue { ref name } if name == "id"));
        let err = c.sync().fetch("..").unwrap_err();
        assert!(matches!(err, ApiError::InvalidPathValue { .. }));
        assert!(c.transport().requests.borrow().is_empty());
    }
}
