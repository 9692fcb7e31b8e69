//! InsureLLM KB Ingestion Worker
//!
//! Processes storage-change notifications from SQS:
//! 1. Receives S3 event notifications from the queue
//! 2. Fetches, normalizes, and chunks each document
//! 3. Embeds chunks that have no vector record yet
//! 4. Writes vector records and a per-document manifest

mod chunker;
mod errors;
mod events;
mod identity;
mod manifest;
mod normalize;
mod processor;

use crate::events::S3EventEnvelope;
use crate::processor::IngestionProcessor;
use insurellm_common::{
    config::AppConfig,
    embeddings::{BedrockModel, EmbeddingClient, RetryPolicy},
    storage::{ObjectStore, S3ObjectStore},
    vectors::VectorStore,
    VERSION,
};
use std::sync::Arc;
use tracing::{error, info, warn, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting InsureLLM KB Ingestion Worker v{}", VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    // Shared AWS clients, created once for the process lifetime and
    // injected into every consumer
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let s3 = aws_sdk_s3::Client::new(&aws_config);
    let bedrock = aws_sdk_bedrockruntime::Client::new(&aws_config);
    let sqs = aws_sdk_sqs::Client::new(&aws_config);

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(s3));
    let vectors = VectorStore::new(
        store.clone(),
        config.storage.processed_bucket.clone(),
        &config.vectors,
    );
    let embedder = EmbeddingClient::new(
        Arc::new(BedrockModel::new(bedrock, config.embedding.model_id.clone())),
        RetryPolicy::from_config(&config.embedding),
    );

    info!(
        model = %config.embedding.model_id,
        index = %config.vectors.index,
        namespace = %config.vectors.namespace,
        "Embedding pipeline initialized"
    );

    let processor = IngestionProcessor::new(store, vectors, embedder, config.clone());

    let Some(queue_url) = config.queue.url.clone() else {
        warn!("queue.url not set, waiting for shutdown signal...");
        tokio::signal::ctrl_c().await?;
        info!("Ingestion worker shutting down");
        return Ok(());
    };

    info!(url = %queue_url, "Ingestion worker ready, starting queue polling...");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            result = sqs
                .receive_message()
                .queue_url(&queue_url)
                .max_number_of_messages(config.queue.max_messages)
                .wait_time_seconds(config.queue.wait_time_seconds)
                .send() => {
                match result {
                    Ok(output) => {
                        for message in output.messages.unwrap_or_default() {
                            handle_message(&processor, &sqs, &queue_url, message).await;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to receive messages from queue");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }

    info!("Ingestion worker shutting down");
    Ok(())
}

/// Process one SQS message: parse the notification envelope and run every
/// record through the pipeline in order.
///
/// The message is deleted only when every record succeeded; otherwise it is
/// left for the queue's redelivery/dead-letter policy.
async fn handle_message(
    processor: &IngestionProcessor,
    sqs: &aws_sdk_sqs::Client,
    queue_url: &str,
    message: aws_sdk_sqs::types::Message,
) {
    let message_id = message.message_id.clone().unwrap_or_default();
    let body = message.body.as_deref().unwrap_or("{}");

    let envelope: S3EventEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!(%message_id, error = %e, "Failed to parse notification body");
            return;
        }
    };

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for record in &envelope.records {
        match processor.process_event(record).await {
            Ok(outcome) => {
                succeeded += 1;
                info!(
                    doc_id = %outcome.doc_id,
                    chunks = outcome.chunk_count,
                    embedded = outcome.embedded,
                    skipped = outcome.skipped,
                    "Document ingested"
                );
            }
            Err(e) => {
                failed += 1;
                error!(%message_id, error = %e, "Failed to process record");
            }
        }
    }

    info!(%message_id, succeeded, failed, "Notification batch processed");

    if failed == 0 {
        let receipt = message.receipt_handle.as_deref().unwrap_or_default();
        if let Err(e) = sqs
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt)
            .send()
            .await
        {
            error!(%message_id, error = %e, "Failed to delete message");
        }
    }
}
