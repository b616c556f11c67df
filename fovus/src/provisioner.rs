use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{InstanceType, ResourceType, Tag, TagSpecification};
use miette::Diagnostic;
use thiserror::Error;

use crate::{instance_tags, string_fields, FunctionResponse, StreamEvent};

/// Instances launched per stream notification.
pub const INSTANCE_COUNT: i32 = 1;

#[derive(Error, Diagnostic, Debug)]
pub enum ProvisionError {
    #[error("stream notification carried no records")]
    EmptyBatch,
    #[error("first stream record ({event_name}) has no new image")]
    MissingNewImage { event_name: String },
    #[error("instance launch failed: {0}")]
    Launch(String),
}

/// Fixed launch parameters. Only the tags vary between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub region: String,
    pub image_id: String,
    pub instance_type: String,
    pub key_name: String,
    pub security_group_ids: Vec<String>,
}

impl Default for LaunchSpec {
    fn default() -> Self {
        Self {
            region: "us-west-1".to_owned(),
            image_id: "fovus-ec2".to_owned(),
            instance_type: "t2.micro".to_owned(),
            key_name: "fovus-keypair".to_owned(),
            security_group_ids: vec!["sg-0d02b7de0dc53f14f".to_owned()],
        }
    }
}

impl LaunchSpec {
    /// Defaults, each overridable through a `FOVUS_*` variable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: String| std::env::var(name).unwrap_or(default);

        Self {
            region: var("FOVUS_REGION", defaults.region),
            image_id: var("FOVUS_IMAGE_ID", defaults.image_id),
            instance_type: var("FOVUS_INSTANCE_TYPE", defaults.instance_type),
            key_name: var("FOVUS_KEY_NAME", defaults.key_name),
            security_group_ids: match std::env::var("FOVUS_SECURITY_GROUPS") {
                Ok(groups) => parse_security_groups(&groups, defaults.security_group_ids),
                Err(_) => defaults.security_group_ids,
            },
        }
    }
}

/// Comma separated group ids. A list with no ids keeps `defaults`.
fn parse_security_groups(raw: &str, defaults: Vec<String>) -> Vec<String> {
    let groups: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_owned)
        .collect();

    if groups.is_empty() {
        tracing::warn!("FOVUS_SECURITY_GROUPS names no groups, using the defaults");
        return defaults;
    }

    groups
}

#[async_trait]
pub trait InstanceLauncher: Send + Sync {
    /// Launch `INSTANCE_COUNT` instances tagged with `tags`, returning their ids.
    async fn launch(
        &self,
        spec: &LaunchSpec,
        tags: &BTreeMap<String, String>,
    ) -> Result<Vec<String>, ProvisionError>;
}

pub struct Ec2Launcher {
    client: aws_sdk_ec2::Client,
}

impl Ec2Launcher {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InstanceLauncher for Ec2Launcher {
    async fn launch(
        &self,
        spec: &LaunchSpec,
        tags: &BTreeMap<String, String>,
    ) -> Result<Vec<String>, ProvisionError> {
        let mut request = self
            .client
            .run_instances()
            .image_id(&spec.image_id)
            .instance_type(InstanceType::from(spec.instance_type.as_str()))
            .key_name(&spec.key_name)
            .set_security_group_ids(Some(spec.security_group_ids.clone()))
            .min_count(INSTANCE_COUNT)
            .max_count(INSTANCE_COUNT);

        if !tags.is_empty() {
            let tags = tags
                .iter()
                .map(|(key, value)| Tag::builder().key(key).value(value).build())
                .collect();

            request = request.tag_specifications(
                TagSpecification::builder()
                    .resource_type(ResourceType::Instance)
                    .set_tags(Some(tags))
                    .build(),
            );
        }

        let output = request
            .send()
            .await
            .map_err(|err| ProvisionError::Launch(DisplayErrorContext(&err).to_string()))?;

        Ok(output
            .instances()
            .unwrap_or_default()
            .iter()
            .filter_map(|instance| instance.instance_id().map(str::to_owned))
            .collect())
    }
}

/// Launch one instance for the first record of a stream batch.
///
/// Later records in the same batch are not provisioned.
pub async fn provision_from_event<L>(
    launcher: &L,
    spec: &LaunchSpec,
    event: &StreamEvent,
) -> Result<FunctionResponse, ProvisionError>
where
    L: InstanceLauncher + ?Sized,
{
    let (record, rest) = event
        .records
        .split_first()
        .ok_or(ProvisionError::EmptyBatch)?;

    if !rest.is_empty() {
        tracing::warn!(ignored = rest.len(), "only the first stream record is provisioned");
    }

    let image = record
        .new_image()
        .ok_or_else(|| ProvisionError::MissingNewImage {
            event_name: record
                .event_name
                .clone()
                .unwrap_or_else(|| "unknown event".to_owned()),
        })?;

    let fields = string_fields(image);
    let field_count = fields.len();
    let tags = instance_tags(fields);
    if tags.len() < field_count {
        tracing::warn!(dropped = field_count - tags.len(), "fields left off the instance tags");
    }
    tracing::info!(?tags, image_id = %spec.image_id, "launching instance for new record");

    let instance_ids = launcher.launch(spec, &tags).await?;
    tracing::info!(?instance_ids, "instance launch requested");

    Ok(FunctionResponse::ok("Processing completed"))
}
