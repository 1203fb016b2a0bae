use kiqueue::{Client, ClientConfig, JobConfig, Worker};

struct EmailSender;

impl Worker for EmailSender {
    fn name() -> &'static str {
        "EmailSender"
    }
    fn queue_name() -> &'static str {
        "mailers"
    }
    fn max_retries() -> u32 {
        3
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to see library tracing output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiqueue=debug".into()),
        )
        .init();

    let config = ClientConfig::default()
        .with_server(std::env::var("REDIS_SERVER").unwrap_or_else(|_| "localhost:6379".into()))
        .with_namespace("demo");
    let client = Client::new(config).install()?;

    client.register_worker::<EmailSender>().await;
    println!("[enqueue] Registered EmailSender on queue 'mailers'");

    client.connect().await?;
    println!("[enqueue] Connected; known queues: {:?}", client.known_queues());

    let id = client
        .enqueue(&EmailSender, ("user@example.com", "welcome"))
        .await?;
    println!("[enqueue] Enqueued EmailSender job id={}", id);

    let cleanup = JobConfig::new("MailboxCleanup", "maintenance", 0);
    let id = client
        .enqueue_with_config("MailboxCleanup", &cleanup, ())
        .await?;
    println!("[enqueue] Enqueued MailboxCleanup job id={} on 'maintenance'", id);

    Ok(())
}
