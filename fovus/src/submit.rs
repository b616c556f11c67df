use std::path::Path;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use miette::{Context, Diagnostic, IntoDiagnostic};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{FunctionResponse, APP_USER_AGENT};

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "png", "jpg", "jpeg", "gif", "mp4"];

pub const DEFAULT_API_URL: &str = "https://lilarvf1sf.execute-api.us-west-1.amazonaws.com/prod";

#[derive(Error, Diagnostic, Debug)]
pub enum SubmitError {
    #[error("Please enter your name.")]
    BlankName,
    #[error("Please choose a file.")]
    MissingFile,
    #[error("File must be a PDF, image, or MP4.")]
    UnsupportedFile,
    #[error("could not read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("no object URL can be built for bucket {bucket:?}")]
    InvalidBucket { bucket: String },
    #[error("upload to s3://{bucket}/{key} failed: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("record insert request failed")]
    Api(#[from] reqwest::Error),
    #[error("Failed to insert record: {0:?}")]
    Rejected(FunctionResponse),
}

/// The record the table writer stores for each submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FovusRecord {
    pub id: String,
    pub input_text: String,
    pub input_file_path: String,
}

impl FovusRecord {
    pub fn new(input_text: impl Into<String>, input_file_path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            input_text: input_text.into(),
            input_file_path: input_file_path.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub bucket: String,
    pub api_url: String,
    pub region: String,
}

impl SubmitConfig {
    pub fn from_env(sdk_config: &aws_config::SdkConfig) -> miette::Result<Self> {
        let bucket = std::env::var("FOVUS_BUCKET")
            .into_diagnostic()
            .wrap_err("Could not find FOVUS_BUCKET env var")?;
        let api_url = std::env::var("FOVUS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| miette::miette!("No AWS region configured, set AWS_REGION"))?;

        Ok(Self {
            bucket,
            api_url,
            region,
        })
    }
}

/// Check the form inputs, returning the file and the name to upload it under.
pub fn validate<'a>(
    name: &str,
    file: Option<&'a Path>,
) -> Result<(&'a Path, &'a str), SubmitError> {
    if name.trim().is_empty() {
        return Err(SubmitError::BlankName);
    }

    let file = file.ok_or(SubmitError::MissingFile)?;
    if !file.is_file() {
        return Err(SubmitError::MissingFile);
    }

    let extension = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .ok_or(SubmitError::UnsupportedFile)?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(SubmitError::UnsupportedFile);
    }

    let key = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(SubmitError::UnsupportedFile)?;

    Ok((file, key))
}

/// The table writer reports failures in the body, not the HTTP status.
pub fn check_reply(reply: FunctionResponse) -> Result<FunctionResponse, SubmitError> {
    if reply.status_code != 200 {
        return Err(SubmitError::Rejected(reply));
    }

    Ok(reply)
}

/// Virtual-hosted style URL of an uploaded object.
pub fn object_url(bucket: &str, region: &str, key: &str) -> Result<String, SubmitError> {
    let invalid = || SubmitError::InvalidBucket {
        bucket: bucket.to_owned(),
    };

    let mut url =
        Url::parse(&format!("https://{bucket}.s3.{region}.amazonaws.com/")).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .push(key);

    Ok(url.to_string())
}

pub struct Submitter {
    s3: aws_sdk_s3::Client,
    http: reqwest::Client,
    config: SubmitConfig,
}

impl Submitter {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: SubmitConfig) -> miette::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .into_diagnostic()
            .wrap_err("Could not build reqwest client")?;

        Ok(Self {
            s3: aws_sdk_s3::Client::new(sdk_config),
            http,
            config,
        })
    }

    /// Upload the file, then insert a record pointing at it.
    pub async fn submit(&self, name: &str, file: Option<&Path>) -> Result<FovusRecord, SubmitError> {
        let (path, key) = validate(name, file)?;

        let location = self.upload(path, key).await?;
        tracing::info!(%location, "file uploaded");

        let record = FovusRecord::new(name, location);
        self.insert(&record).await?;

        Ok(record)
    }

    async fn upload(&self, path: &Path, key: &str) -> Result<String, SubmitError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|err| SubmitError::Read {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;

        self.s3
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| SubmitError::Upload {
                bucket: self.config.bucket.clone(),
                key: key.to_owned(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        object_url(&self.config.bucket, &self.config.region, key)
    }

    async fn insert(&self, record: &FovusRecord) -> Result<(), SubmitError> {
        tracing::debug!(?record, url = %self.config.api_url, "inserting record");

        let reply = self
            .http
            .post(&self.config.api_url)
            .json(record)
            .send()
            .await?
            .error_for_status()?
            .json::<FunctionResponse>()
            .await?;

        let reply = check_reply(reply)?;

        tracing::info!(body = %reply.body, "record inserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;

    #[test]
    fn blank_name_is_rejected_first() {
        let err = validate("   ", None).unwrap_err();

        assert_eq!(err.to_string(), "Please enter your name.");
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(validate("Ada", None), Err(SubmitError::MissingFile)));
        assert!(matches!(
            validate("Ada", Some(dir.path().join("nope.pdf").as_path())),
            Err(SubmitError::MissingFile)
        ));
    }

    #[test]
    fn extension_is_checked_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("Holiday.JPG");
        let notes = dir.path().join("notes.txt");
        File::create(&photo).unwrap();
        File::create(&notes).unwrap();

        let (path, key) = validate("Ada", Some(photo.as_path())).unwrap();
        assert_eq!(path, photo.as_path());
        assert_eq!(key, "Holiday.JPG");
        assert_eq!(
            validate("Ada", Some(notes.as_path())).unwrap_err().to_string(),
            "File must be a PDF, image, or MP4."
        );
    }

    #[test]
    fn reply_with_status_200_is_accepted() {
        let reply = FunctionResponse::ok("Event added to DynamoDB successfully");

        assert_eq!(check_reply(reply.clone()).unwrap(), reply);
    }

    #[test]
    fn reply_with_other_status_is_rejected() {
        let reply: FunctionResponse = serde_json::from_str(
            r#"{"statusCode":500,"body":"Error adding event to DynamoDB: AccessDeniedException"}"#,
        )
        .unwrap();

        match check_reply(reply) {
            Err(SubmitError::Rejected(reply)) => {
                assert_eq!(reply.status_code, 500);
                assert!(reply.body.contains("AccessDeniedException"));
            }
            other => panic!("expected a rejected reply, got {other:?}"),
        }
    }

    #[test]
    fn object_url_escapes_key() {
        assert_eq!(
            object_url("fovus-bucket", "us-west-1", "my report.pdf").unwrap(),
            "https://fovus-bucket.s3.us-west-1.amazonaws.com/my%20report.pdf"
        );
    }

    #[test]
    fn record_serializes_with_table_field_names() {
        let record = FovusRecord::new("Ada", "https://example.com/a.pdf");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["input_text"], "Ada");
        assert_eq!(value["input_file_path"], "https://example.com/a.pdf");
        assert_eq!(record.id.len(), 36);
    }
}
