//! [`ListGateway`] over the Home Assistant REST API.
//!
//! Lists are read from the lists sensor (`GET /api/states/<entity>`); every
//! mutation is a service call (`POST /api/services/<domain>/<service>`).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use shared::{
    domain::{Item, ItemId, ListId, ListSummary, ListType},
    error::{ErrorCode, GatewayException, HostStateError},
    protocol::{EntityState, HostState, MarkStatus, ServiceCall},
};
use tracing::debug;
use url::Url;

use crate::{snapshot::fetch_items, ListGateway, Settings};

pub struct HassGateway {
    http: Client,
    base_url: Url,
    token: Option<String>,
    sensor_entity: String,
    service_domain: String,
}

impl HassGateway {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .with_context(|| format!("invalid Home Assistant url '{base_url}'"))?;

        Ok(Self {
            http: Client::new(),
            base_url,
            token: token.filter(|token| !token.is_empty()),
            sensor_entity: shared::protocol::DEFAULT_LISTS_SENSOR.to_string(),
            service_domain: shared::protocol::DEFAULT_SERVICE_DOMAIN.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut gateway = Self::new(&settings.base_url, settings.token.clone())?;
        gateway.sensor_entity = settings.sensor_entity.clone();
        gateway.service_domain = settings.service_domain.clone();
        Ok(gateway)
    }

    pub fn sensor_entity(&self) -> &str {
        &self.sensor_entity
    }

    async fn call_service(&self, call: ServiceCall) -> Result<()> {
        let service = call.service();
        let url = self
            .base_url
            .join(&format!("api/services/{}/{service}", self.service_domain))?;
        debug!(service, "calling list service");

        let res = self
            .authorized(self.http.post(url))
            .json(&call)
            .send()
            .await
            .with_context(|| format!("failed to call service {service}"))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GatewayException::new(
                service,
                ErrorCode::from_status(status.as_u16()),
                format!("{status}: {body}"),
            )
            .into());
        }
        Ok(())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ListGateway for HassGateway {
    async fn host_state(&self) -> Result<Option<HostState>> {
        let url = self
            .base_url
            .join(&format!("api/states/{}", self.sensor_entity))?;
        let res = self
            .authorized(self.http.get(url))
            .send()
            .await
            .with_context(|| format!("failed to read entity {}", self.sensor_entity))?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(GatewayException::new(
                "states",
                ErrorCode::from_status(status.as_u16()),
                format!("{status} reading {}", self.sensor_entity),
            )
            .into());
        }

        let body = res
            .bytes()
            .await
            .with_context(|| format!("failed to read state body of {}", self.sensor_entity))?;
        let entity: EntityState =
            serde_json::from_slice(&body).map_err(HostStateError::MalformedEntity)?;
        Ok(Some(HostState::new().with_entity(entity)))
    }

    async fn fetch(&self, list: &ListSummary) -> Result<IndexMap<ItemId, Item>> {
        let host = self
            .host_state()
            .await?
            .ok_or_else(|| anyhow!("lists sensor {} is unavailable", self.sensor_entity))?;
        let lists = match host.entity(&self.sensor_entity) {
            Some(entity) => entity.lists()?,
            None => Vec::new(),
        };
        let found = lists
            .into_iter()
            .find(|candidate| candidate.list_id == list.list_id)
            .ok_or_else(|| anyhow!("list {} is no longer published", list.list_id))?;
        Ok(fetch_items(found.items))
    }

    async fn add(&self, list_id: &ListId, text: &str, position: i64) -> Result<()> {
        self.call_service(ServiceCall::AddItem {
            list_id: list_id.clone(),
            item_text: text.to_string(),
            item_pos: position,
        })
        .await
    }

    async fn edit(&self, list_id: &ListId, item_id: &ItemId, text: &str) -> Result<()> {
        self.call_service(ServiceCall::EditItem {
            list_id: list_id.clone(),
            item_id: item_id.clone(),
            item_text: text.to_string(),
        })
        .await
    }

    async fn mark(&self, list_id: &ListId, item_id: &ItemId, status: MarkStatus) -> Result<()> {
        self.call_service(ServiceCall::MarkItem {
            list_id: list_id.clone(),
            item_id: item_id.clone(),
            status,
        })
        .await
    }

    async fn clear(&self, list_id: &ListId, item_ids: &[ItemId]) -> Result<()> {
        self.call_service(ServiceCall::RemoveItems {
            list_id: list_id.clone(),
            item_ids: item_ids.to_vec(),
        })
        .await
    }

    async fn reorder(
        &self,
        list_id: &ListId,
        list_title: &str,
        serialized_items: &[String],
        list_type: ListType,
    ) -> Result<()> {
        self.call_service(ServiceCall::ReorderItems {
            list_id: list_id.clone(),
            list_title: list_title.to_string(),
            items_list: serialized_items.to_vec(),
            list_type,
        })
        .await
    }

    async fn create_list(&self, title: &str, list_type: ListType) -> Result<()> {
        self.call_service(ServiceCall::AddList {
            list_title: title.to_string(),
            list_type,
        })
        .await
    }

    async fn refresh_all(&self) -> Result<()> {
        self.call_service(ServiceCall::Refresh {}).await
    }
}

#[cfg(test)]
#[path = "tests/hass_tests.rs"]
mod tests;
