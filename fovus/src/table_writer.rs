use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::FunctionResponse;

pub type Item = HashMap<String, AttributeValue>;

#[derive(Error, Diagnostic, Debug)]
pub enum StoreError {
    #[error("event must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("{0}")]
    Service(String),
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn put_item(&self, item: Item) -> Result<(), StoreError>;
}

pub struct DynamoStore {
    client: aws_sdk_dynamodb::Client,
    table: String,
}

impl DynamoStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl ItemStore for DynamoStore {
    async fn put_item(&self, item: Item) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| StoreError::Service(DisplayErrorContext(&err).to_string()))?;

        Ok(())
    }
}

pub fn json_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => {
            AttributeValue::L(items.into_iter().map(json_to_attribute).collect())
        }
        Value::Object(fields) => AttributeValue::M(
            fields
                .into_iter()
                .map(|(k, v)| (k, json_to_attribute(v)))
                .collect(),
        ),
    }
}

/// An item is a top-level map, so only JSON objects can be stored.
pub fn json_to_item(event: Value) -> Result<Item, StoreError> {
    match event {
        Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(k, v)| (k, json_to_attribute(v)))
            .collect()),
        Value::Null => Err(StoreError::NotAnObject("null")),
        Value::Bool(_) => Err(StoreError::NotAnObject("a boolean")),
        Value::Number(_) => Err(StoreError::NotAnObject("a number")),
        Value::String(_) => Err(StoreError::NotAnObject("a string")),
        Value::Array(_) => Err(StoreError::NotAnObject("an array")),
    }
}

/// Store the event verbatim. Every failure is folded into a 500 reply.
pub async fn write_event<S>(store: &S, event: Value) -> FunctionResponse
where
    S: ItemStore + ?Sized,
{
    let result = match json_to_item(event) {
        Ok(item) => {
            tracing::debug!(attributes = item.len(), "writing event");
            store.put_item(item).await
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => {
            tracing::info!("event stored");
            FunctionResponse::ok("Event added to DynamoDB successfully")
        }
        Err(err) => {
            tracing::error!(error = %err, "could not store event");
            FunctionResponse::error(format!("Error adding event to DynamoDB: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        items: Mutex<Vec<Item>>,
    }

    #[async_trait]
    impl ItemStore for MemoryStore {
        async fn put_item(&self, item: Item) -> Result<(), StoreError> {
            self.items.lock().unwrap().push(item);
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl ItemStore for BrokenStore {
        async fn put_item(&self, _item: Item) -> Result<(), StoreError> {
            Err(StoreError::Service(
                "ResourceNotFoundException: Requested resource not found".to_owned(),
            ))
        }
    }

    #[test]
    fn converts_nested_json() {
        let item = json_to_item(json!({
            "id": "V1StGXR8_Z5jdHi6B-myT",
            "size": 42,
            "ratio": 0.5,
            "public": false,
            "note": null,
            "tags": ["a", 1],
            "owner": {"name": "Ada"}
        }))
        .unwrap();

        assert_eq!(item["id"], AttributeValue::S("V1StGXR8_Z5jdHi6B-myT".to_owned()));
        assert_eq!(item["size"], AttributeValue::N("42".to_owned()));
        assert_eq!(item["ratio"], AttributeValue::N("0.5".to_owned()));
        assert_eq!(item["public"], AttributeValue::Bool(false));
        assert_eq!(item["note"], AttributeValue::Null(true));
        assert_eq!(
            item["tags"],
            AttributeValue::L(vec![
                AttributeValue::S("a".to_owned()),
                AttributeValue::N("1".to_owned())
            ])
        );
        assert_eq!(
            item["owner"],
            AttributeValue::M(HashMap::from([(
                "name".to_owned(),
                AttributeValue::S("Ada".to_owned())
            )]))
        );
    }

    #[tokio::test]
    async fn stored_event_replies_200() {
        let store = MemoryStore::default();

        let response = write_event(&store, json!({"id": "1", "input_text": "hi"})).await;

        assert_eq!(
            response,
            FunctionResponse::ok("Event added to DynamoDB successfully")
        );
        assert_eq!(store.items.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_event_twice_is_written_twice() {
        let store = MemoryStore::default();
        let event = json!({"id": "dup"});

        write_event(&store, event.clone()).await;
        write_event(&store, event).await;

        assert_eq!(store.items.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn storage_failure_replies_500_with_error_text() {
        let response = write_event(&BrokenStore, json!({"id": "1"})).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body,
            "Error adding event to DynamoDB: ResourceNotFoundException: Requested resource not found"
        );
    }

    #[tokio::test]
    async fn non_object_event_replies_500() {
        let store = MemoryStore::default();

        let response = write_event(&store, json!(["not", "a", "map"])).await;

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("must be a JSON object, got an array"));
        assert!(store.items.lock().unwrap().is_empty());
    }
}
