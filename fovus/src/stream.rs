use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

/// Field name to a single-entry map of type tag (`S`, `N`, `M`, ...) to value.
pub type Image = HashMap<String, HashMap<String, Value>>;

/// A batch of table change notifications.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct StreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StreamRecord>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StreamRecord {
    #[serde(rename = "eventName")]
    pub event_name: Option<String>,
    pub dynamodb: Option<StreamChange>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StreamChange {
    #[serde(rename = "NewImage")]
    pub new_image: Option<Image>,
}

impl StreamRecord {
    pub fn new_image(&self) -> Option<&Image> {
        self.dynamodb.as_ref()?.new_image.as_ref()
    }
}

/// Keep the string-tagged fields of an image, dropping every other type.
pub fn string_fields(image: &Image) -> BTreeMap<String, String> {
    image
        .iter()
        .filter_map(|(name, typed)| {
            let value = typed.get("S")?.as_str()?;
            Some((name.clone(), value.to_owned()))
        })
        .collect()
}

/// Most tags EC2 accepts on one resource.
pub const MAX_TAGS: usize = 50;
pub const MAX_TAG_KEY_CHARS: usize = 128;
pub const MAX_TAG_VALUE_CHARS: usize = 256;

/// Fit fields to EC2 tag limits: keys that are reserved (`aws:`) or too long
/// are dropped, values are cut to length, and only the first `MAX_TAGS` remain.
pub fn instance_tags(fields: BTreeMap<String, String>) -> BTreeMap<String, String> {
    fields
        .into_iter()
        .filter(|(key, _)| {
            !key.is_empty()
                && key.chars().count() <= MAX_TAG_KEY_CHARS
                && !key.to_ascii_lowercase().starts_with("aws:")
        })
        .map(|(key, value)| {
            let value = value.chars().take(MAX_TAG_VALUE_CHARS).collect();
            (key, value)
        })
        .take(MAX_TAGS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSERT: &str = r#"{
      "Records": [
        {
          "eventID": "c4ca4238a0b923820dcc509a6f75849b",
          "eventName": "INSERT",
          "eventSource": "aws:dynamodb",
          "dynamodb": {
            "Keys": {"id": {"S": "V1StGXR8_Z5jdHi6B-myT"}},
            "NewImage": {
              "id": {"S": "V1StGXR8_Z5jdHi6B-myT"},
              "input_text": {"S": "Ada"},
              "input_file_path": {"S": "https://fovus-bucket.s3.us-west-1.amazonaws.com/report.pdf"},
              "size": {"N": "42"},
              "flags": {"L": [{"BOOL": true}]}
            },
            "StreamViewType": "NEW_AND_OLD_IMAGES"
          }
        }
      ]
    }"#;

    #[test]
    fn reads_only_string_fields() {
        let event: StreamEvent = serde_json::from_str(INSERT).unwrap();
        let image = event.records[0].new_image().unwrap();

        let fields = string_fields(image);

        assert_eq!(
            fields.keys().collect::<Vec<_>>(),
            vec!["id", "input_file_path", "input_text"]
        );
        assert_eq!(fields["input_text"], "Ada");
    }

    #[test]
    fn tags_fit_ec2_limits() {
        let long_path = format!(
            "https://fovus-bucket.s3.us-west-1.amazonaws.com/{}.pdf",
            "a".repeat(300)
        );
        let fields = BTreeMap::from([
            ("input_file_path".to_owned(), long_path.clone()),
            ("aws:reserved".to_owned(), "x".to_owned()),
            ("AWS:Upper".to_owned(), "x".to_owned()),
            ("k".repeat(129), "x".to_owned()),
            ("id".to_owned(), "abc".to_owned()),
        ]);

        let tags = instance_tags(fields);

        assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["id", "input_file_path"]);
        assert_eq!(tags["input_file_path"].chars().count(), MAX_TAG_VALUE_CHARS);
        assert!(long_path.starts_with(&tags["input_file_path"]));
        assert_eq!(tags["id"], "abc");
    }

    #[test]
    fn tags_are_capped_at_fifty() {
        let fields = (0..60)
            .map(|i| (format!("field{i:02}"), i.to_string()))
            .collect();

        let tags = instance_tags(fields);

        assert_eq!(tags.len(), MAX_TAGS);
        assert!(tags.contains_key("field00"));
        assert!(!tags.contains_key("field50"));
    }

    #[test]
    fn missing_records_is_an_empty_batch() {
        let event: StreamEvent = serde_json::from_str("{}").unwrap();

        assert!(event.records.is_empty());
    }

    #[test]
    fn remove_events_have_no_new_image() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"Records":[{"eventName":"REMOVE","dynamodb":{"Keys":{"id":{"S":"1"}}}}]}"#,
        )
        .unwrap();

        assert!(event.records[0].new_image().is_none());
        assert_eq!(event.records[0].event_name.as_deref(), Some("REMOVE"));
    }
}
