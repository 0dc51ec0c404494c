//! PowerStore REST Gateway
//!
//! Authenticated HTTP adapter for the PowerStore management API. The client
//! object owns the whole session: basic credentials plus the DELL-EMC-TOKEN
//! captured at login ride on every call, so no state lives outside it.
//!
//! Retry policy: idempotent GETs retry with exponential backoff on transport
//! errors and 5xx responses. Creates are issued exactly once; if the response
//! never arrives the gateway probes for the resource by name, so a create
//! that landed on the array is returned instead of duplicated.

use crate::config::ArrayConfig;
use crate::domain::ports::{
    ArrayGateway, CreateResource, HostInfo, PoolInfo, ResourceInfo, ResourceKind,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Header carrying the session token issued at login
const SESSION_TOKEN_HEADER: &str = "DELL-EMC-TOKEN";

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct PoolRow {
    id: String,
    name: String,
    #[serde(default)]
    size_total: Option<u64>,
    #[serde(default)]
    size_free: Option<u64>,
    #[serde(default)]
    appliance_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NasServerRow {
    id: String,
    name: String,
    #[serde(default)]
    ip_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostRow {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct VolumeRow {
    id: String,
    name: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    wwn: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileSystemRow {
    id: String,
    name: String,
    #[serde(default)]
    size_total: u64,
}

#[derive(Debug, Deserialize)]
struct CreatedRow {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateVolumeBody<'a> {
    name: &'a str,
    size: u64,
    pool_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thin_provisioned: Option<bool>,
}

/// File-system creation keeps the legacy PascalCase keys of the
/// /api/v1/filesystems endpoint.
#[derive(Debug, Serialize)]
struct CreateFileSystemBody<'a> {
    #[serde(rename = "NAS_Name")]
    nas_name: &'a str,
    #[serde(rename = "NAS_IP", skip_serializing_if = "Option::is_none")]
    nas_ip: Option<&'a str>,
    #[serde(rename = "FileSystemName")]
    file_system_name: &'a str,
    #[serde(rename = "Size")]
    size: u64,
    #[serde(rename = "Protocol", skip_serializing_if = "Option::is_none")]
    protocol: Option<&'a str>,
    #[serde(rename = "Quota", skip_serializing_if = "Option::is_none")]
    quota: Option<u64>,
    #[serde(rename = "AccessPolicy", skip_serializing_if = "Option::is_none")]
    access_policy: Option<&'a str>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct AttachBody<'a> {
    host_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    messages: Vec<ApiErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorMessage {
    #[serde(default)]
    message_l10n: Option<String>,
}

impl ApiErrorBody {
    fn joined(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter_map(|m| m.message_l10n.as_deref())
            .filter(|m| !m.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Gateway to one PowerStore array
pub struct PowerStoreGateway {
    config: ArrayConfig,
    http: reqwest::Client,
    base: String,
    session_token: RwLock<Option<String>>,
}

impl PowerStoreGateway {
    /// Build the HTTP client and open a session with the array.
    pub async fn connect(config: ArrayConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());

        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|e| Error::GatewayConnect {
            endpoint: config.endpoint.clone(),
            reason: e.to_string(),
        })?;

        let gateway = Self {
            base: config.base_url(),
            config,
            http,
            session_token: RwLock::new(None),
        };

        gateway.login().await?;
        Ok(gateway)
    }

    /// Open a session; the array answers with a DELL-EMC-TOKEN header that
    /// must accompany every mutating call.
    async fn login(&self) -> Result<()> {
        let url = format!("{}/api/v1/login_session", self.base);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| Error::GatewayConnect {
                endpoint: self.config.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::GatewayAuth {
                endpoint: self.config.endpoint.clone(),
                username: self.config.username.clone(),
            });
        }
        if !status.is_success() {
            return Err(Error::GatewayConnect {
                endpoint: self.config.endpoint.clone(),
                reason: format!("login returned HTTP {}", status.as_u16()),
            });
        }

        if let Some(token) = response
            .headers()
            .get(SESSION_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.session_token.write() = Some(token.to_string());
        }

        debug!("Opened session with {}", self.base);
        Ok(())
    }

    // =========================================================================
    // Request Plumbing
    // =========================================================================

    /// GET with retry on transient failures (transport errors, 5xx).
    async fn get_json<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base, path);

        match self.config.retry_max_elapsed() {
            Some(max_elapsed) => {
                let policy = ExponentialBackoff {
                    max_elapsed_time: Some(max_elapsed),
                    ..Default::default()
                };
                backoff::future::retry(policy, || async {
                    self.get_json_once(operation, &url).await.map_err(|e| {
                        if e.is_transient() {
                            debug!("Retrying {}: {}", operation, e);
                            backoff::Error::transient(e)
                        } else {
                            backoff::Error::permanent(e)
                        }
                    })
                })
                .await
            }
            None => self.get_json_once(operation, &url).await,
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, operation: &str, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| Error::GatewayTransport {
                operation: operation.to_string(),
                source: e,
            })?;
        self.decode(operation, response).await
    }

    /// POST with the session token; never retried.
    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.post_raw(operation, path, body).await?;
        self.decode(operation, response).await
    }

    /// POST where success carries no useful body (attach calls answer 204).
    async fn post_no_content<B: Serialize>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> Result<()> {
        let response = self.post_raw(operation, path, body).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.api_error(operation, response).await)
        }
    }

    async fn post_raw<B: Serialize>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base, path);
        let token = self.session_token.read().clone();

        let mut request = self
            .http
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(body);
        if let Some(token) = token {
            request = request.header(SESSION_TOKEN_HEADER, token);
        }

        request.send().await.map_err(|e| Error::GatewayTransport {
            operation: operation.to_string(),
            source: e,
        })
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| Error::GatewayResponse {
                    operation: operation.to_string(),
                    reason: e.to_string(),
                })
        } else {
            Err(self.api_error(operation, response).await)
        }
    }

    /// Pull the human-readable reason out of an error body, falling back to
    /// the bare status line.
    async fn api_error(&self, operation: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        let reason = match response.json::<ApiErrorBody>().await {
            Ok(body) => body
                .joined()
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            Err(_) => format!("HTTP {}", status.as_u16()),
        };
        Error::GatewayApi {
            operation: operation.to_string(),
            status: Some(status.as_u16()),
            reason,
        }
    }

    /// Look a resource up by exact name.
    async fn find_by_name(&self, kind: ResourceKind, name: &str) -> Result<Option<ResourceInfo>> {
        let encoded = urlencoding::encode(name);
        match kind {
            ResourceKind::Block => {
                let rows: Vec<VolumeRow> = self
                    .get_json("find volume", &format!("/api/v1/volumes?name=eq.{}", encoded))
                    .await?;
                Ok(rows
                    .into_iter()
                    .find(|row| row.name == name)
                    .map(volume_info))
            }
            ResourceKind::File => {
                let rows: Vec<FileSystemRow> = self
                    .get_json(
                        "find filesystem",
                        &format!("/api/v1/filesystems?name=eq.{}", encoded),
                    )
                    .await?;
                Ok(rows
                    .into_iter()
                    .find(|row| row.name == name)
                    .map(filesystem_info))
            }
        }
    }
}

fn volume_info(row: VolumeRow) -> ResourceInfo {
    ResourceInfo {
        id: row.id,
        name: row.name,
        kind: ResourceKind::Block,
        size_bytes: row.size,
        wwn: row.wwn,
    }
}

fn filesystem_info(row: FileSystemRow) -> ResourceInfo {
    ResourceInfo {
        id: row.id,
        name: row.name,
        kind: ResourceKind::File,
        size_bytes: row.size_total,
        wwn: None,
    }
}

#[async_trait]
impl ArrayGateway for PowerStoreGateway {
    async fn list_pools(&self) -> Result<Vec<PoolInfo>> {
        let pools: Vec<PoolRow> = self.get_json("list pools", "/api/v1/pools").await?;
        let nas: Vec<NasServerRow> = self
            .get_json("list NAS servers", "/api/v1/nas_servers")
            .await?;

        let mut out: Vec<PoolInfo> = pools
            .into_iter()
            .map(|row| PoolInfo {
                id: row.id,
                name: row.name,
                kind: ResourceKind::Block,
                total_bytes: row.size_total,
                free_bytes: row.size_free,
                appliance_id: row.appliance_id,
                address: None,
            })
            .collect();

        out.extend(nas.into_iter().map(|row| PoolInfo {
            id: row.id,
            name: row.name,
            kind: ResourceKind::File,
            total_bytes: None,
            free_bytes: None,
            appliance_id: None,
            address: row.ip_address,
        }));

        debug!("Listed {} allocation domains", out.len());
        Ok(out)
    }

    async fn list_hosts(&self) -> Result<Vec<HostInfo>> {
        let rows: Vec<HostRow> = self.get_json("list hosts", "/api/v1/hosts").await?;
        Ok(rows
            .into_iter()
            .map(|row| HostInfo {
                id: row.id,
                name: row.name,
            })
            .collect())
    }

    async fn list_resources(&self) -> Result<Vec<ResourceInfo>> {
        let volumes: Vec<VolumeRow> = self.get_json("list volumes", "/api/v1/volumes").await?;
        let filesystems: Vec<FileSystemRow> = self
            .get_json("list filesystems", "/api/v1/filesystems")
            .await?;

        let mut out: Vec<ResourceInfo> = volumes.into_iter().map(volume_info).collect();
        out.extend(filesystems.into_iter().map(filesystem_info));
        Ok(out)
    }

    async fn create_resource(&self, payload: &CreateResource) -> Result<String> {
        let operation = format!("create {} '{}'", payload.kind, payload.name);

        let result: Result<CreatedRow> = match payload.kind {
            ResourceKind::Block => {
                let body = CreateVolumeBody {
                    name: &payload.name,
                    size: payload.size_bytes,
                    pool_id: &payload.pool.id,
                    description: payload.description.as_deref(),
                    thin_provisioned: payload.thin,
                };
                self.post_json(&operation, "/api/v1/volumes", &body).await
            }
            ResourceKind::File => {
                let body = CreateFileSystemBody {
                    nas_name: &payload.pool.name,
                    nas_ip: payload.pool.address.as_deref(),
                    file_system_name: &payload.name,
                    size: payload.size_bytes,
                    protocol: payload.protocol.as_deref(),
                    quota: payload.quota_bytes,
                    access_policy: payload.access_policy.as_deref(),
                    description: payload.description.as_deref(),
                };
                self.post_json(&operation, "/api/v1/filesystems", &body).await
            }
        };

        match result {
            Ok(row) => {
                info!("Created {} '{}' -> {}", payload.kind, payload.name, row.id);
                Ok(row.id)
            }
            Err(e @ Error::GatewayTransport { .. }) => {
                // The response never arrived; the create may still have landed.
                warn!(
                    "Transport failure during {}; probing the array by name",
                    operation
                );
                match self.find_by_name(payload.kind, &payload.name).await {
                    Ok(Some(existing)) => {
                        info!(
                            "Create of '{}' had landed as {}; reusing it",
                            payload.name, existing.id
                        );
                        Ok(existing.id)
                    }
                    _ => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn attach_consumer(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        consumer_id: &str,
    ) -> Result<()> {
        let operation = format!("attach {} to {}", consumer_id, resource_id);
        let body = AttachBody {
            host_id: consumer_id,
        };
        let path = match kind {
            ResourceKind::Block => format!("/api/v1/volumes/{}/attach", resource_id),
            ResourceKind::File => format!("/api/v1/filesystems/{}/export_clients", resource_id),
        };
        self.post_no_content(&operation, &path, &body).await
    }

    async fn resource_details(
        &self,
        kind: ResourceKind,
        resource_id: &str,
    ) -> Result<ResourceInfo> {
        match kind {
            ResourceKind::Block => {
                let row: VolumeRow = self
                    .get_json("get volume", &format!("/api/v1/volumes/{}", resource_id))
                    .await?;
                Ok(volume_info(row))
            }
            ResourceKind::File => {
                let row: FileSystemRow = self
                    .get_json(
                        "get filesystem",
                        &format!("/api/v1/filesystems/{}", resource_id),
                    )
                    .await?;
                Ok(filesystem_info(row))
            }
        }
    }
}
