use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub use crate::provisioner::{
    provision_from_event, Ec2Launcher, InstanceLauncher, LaunchSpec, ProvisionError,
};
pub use crate::stream::{
    instance_tags, string_fields, Image, StreamChange, StreamEvent, StreamRecord,
};
pub use crate::submit::{
    check_reply, validate, FovusRecord, SubmitConfig, SubmitError, Submitter,
};
pub use crate::table_writer::{
    json_to_attribute, json_to_item, write_event, DynamoStore, Item, ItemStore, StoreError,
};

mod provisioner;
mod stream;
mod submit;
mod table_writer;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

pub const DEFAULT_TABLE: &str = "fovus_ddb";

/// The `{statusCode, body}` shape both functions reply with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FunctionResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl FunctionResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }

    pub fn error(body: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: body.into(),
        }
    }
}

/// Plain, timestamp-free output; the function log stream stamps each line.
pub fn init_lambda_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();
}
