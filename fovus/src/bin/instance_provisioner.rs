use aws_sdk_ec2::config::Region;
use fovus::{init_lambda_tracing, provision_from_event, Ec2Launcher, LaunchSpec, StreamEvent};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_tracing();

    let spec = LaunchSpec::from_env();
    let sdk_config = aws_config::from_env()
        .region(Region::new(spec.region.clone()))
        .load()
        .await;
    let launcher = Ec2Launcher::new(aws_sdk_ec2::Client::new(&sdk_config));

    let (launcher, spec) = (&launcher, &spec);

    run(service_fn(move |event: LambdaEvent<StreamEvent>| async move {
        tracing::debug!(
            request_id = %event.context.request_id,
            records = event.payload.records.len(),
            "stream notification"
        );
        provision_from_event(launcher, spec, &event.payload).await
    }))
    .await
}
