use fovus::{init_lambda_tracing, write_event, DynamoStore, FunctionResponse, DEFAULT_TABLE};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_tracing();

    let table = std::env::var("FOVUS_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_owned());
    let sdk_config = aws_config::load_from_env().await;
    let store = DynamoStore::new(aws_sdk_dynamodb::Client::new(&sdk_config), table);
    let store = &store;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<FunctionResponse, Error>(write_event(store, event.payload).await)
    }))
    .await
}
