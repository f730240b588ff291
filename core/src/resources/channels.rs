use serde_json::{json, Value};

use super::{channel_metadata, import_schedule};
use crate::client::FarmOpsXClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, Transport};
use crate::response::Response;
use crate::Options;

const RESOURCE: &str = "channels";

/// Classification fields shared by channel writes. Empty strings are sent
/// for fields the caller leaves unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDetails {
    pub channel_type: String,
    pub saleable_type: String,
    pub crop_type: String,
}

impl ChannelDetails {
    pub fn new(
        channel_type: impl Into<String>,
        saleable_type: impl Into<String>,
        crop_type: impl Into<String>,
    ) -> Self {
        Self {
            channel_type: channel_type.into(),
            saleable_type: saleable_type.into(),
            crop_type: crop_type.into(),
        }
    }
}

/// Reporting channels: registration, import scheduling and lifecycle.
pub struct Channels<'a, T> {
    client: &'a FarmOpsXClient<T>,
}

impl<'a, T: Transport> Channels<'a, T> {
    pub(crate) fn new(client: &'a FarmOpsXClient<T>) -> Self {
        Self { client }
    }

    /// Add a channel to the reporting database.
    ///
    /// `schedule` overrides the `{notifier: false, scheduled: false}` import
    /// defaults; `extra` is merged into the metadata document.
    pub fn add(
        &self,
        team_id: i64,
        channel_id: i64,
        details: &ChannelDetails,
        schedule: &Options,
        extra: &Options,
    ) -> Result<Response, ApiError> {
        let options = registration(team_id, channel_id, details, schedule, extra)?;
        self.client.request(RESOURCE, HttpMethod::Post, "", options)
    }

    /// Same as `add`, but queued server-side; the response describes the task.
    pub fn add_by_queue(
        &self,
        team_id: i64,
        channel_id: i64,
        details: &ChannelDetails,
        schedule: &Options,
        extra: &Options,
    ) -> Result<Response, ApiError> {
        let options = registration(team_id, channel_id, details, schedule, extra)?;
        self.client.request(RESOURCE, HttpMethod::Post, "queue", options)
    }

    pub fn get(&self, channel_id: i64) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("channelId".to_string(), json!(channel_id));
        self.client.request(RESOURCE, HttpMethod::Get, ":channelId", options)
    }

    pub fn edit(
        &self,
        channel_id: i64,
        channel_name: &str,
        details: &ChannelDetails,
        schedule: &Options,
        extra: &Options,
    ) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("channelId".to_string(), json!(channel_id));
        options.insert("channelName".to_string(), json!(channel_name));
        insert_details(&mut options, details);
        options.insert("metadata".to_string(), metadata(schedule, extra)?);
        self.client.request(RESOURCE, HttpMethod::Put, ":channelId", options)
    }

    /// Put a channel on the import list with the given report schedule.
    pub fn import(&self, channel_id: i64, reports: &Options) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("channelId".to_string(), json!(channel_id));
        options.insert("reports".to_string(), Value::Object(import_schedule(reports)));
        self.client.request(RESOURCE, HttpMethod::Put, ":channelId/import", options)
    }

    /// Scheduled import tasks, optionally limited to one team.
    pub fn scheduled(&self, team_id: Option<i64>) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("teamId".to_string(), json!(team_id));
        self.client.request(RESOURCE, HttpMethod::Get, "scheduled", options)
    }

    pub fn manage(
        &self,
        channel_id: i64,
        is_deleted: bool,
        is_archived: bool,
    ) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("channelId".to_string(), json!(channel_id));
        options.insert("isDeleted".to_string(), json!(is_deleted));
        options.insert("isArchived".to_string(), json!(is_archived));
        self.client.request(RESOURCE, HttpMethod::Put, ":channelId/manage", options)
    }

    pub fn team(&self, team_id: i64) -> Result<Response, ApiError> {
        let mut options = Options::new();
        options.insert("teamId".to_string(), json!(team_id));
        self.client.request(RESOURCE, HttpMethod::Get, "team/:teamId", options)
    }
}

fn registration(
    team_id: i64,
    channel_id: i64,
    details: &ChannelDetails,
    schedule: &Options,
    extra: &Options,
) -> Result<Options, ApiError> {
    let mut options = Options::new();
    options.insert("teamId".to_string(), json!(team_id));
    options.insert("channelId".to_string(), json!(channel_id));
    insert_details(&mut options, details);
    options.insert("metadata".to_string(), metadata(schedule, extra)?);
    Ok(options)
}

fn insert_details(options: &mut Options, details: &ChannelDetails) {
    options.insert("channelType".to_string(), json!(details.channel_type));
    options.insert("saleableType".to_string(), json!(details.saleable_type));
    options.insert("cropType".to_string(), json!(details.crop_type));
}

// The API stores metadata as an opaque JSON string.
fn metadata(schedule: &Options, extra: &Options) -> Result<Value, ApiError> {
    serde_json::to_string(&channel_metadata(schedule, extra))
        .map(Value::String)
        .map_err(|e| ApiError::SerializationError(e.to_string()))
}
