use std::convert::Infallible;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use shared::calculators::{CalculatorError, CalculatorKind, calculate_value};
use shared::config::{AssistantClientConfig, ConfigError};
use shared::llm::{
    AiAssistant, AssistantReply, CalculatorTopic, ChatEndpointClient, CompletionGateway,
    Operation, OperationError, PromptContext, build_prompt,
};
use thiserror::Error;
use tokio::signal;
use tracing::{info, warn};

use crate::cli::Command;
use crate::offline::OfflineGateway;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Calculator(#[from] CalculatorError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

pub async fn run(command: Command) -> Result<(), CommandError> {
    match command {
        Command::Calc { kind, fields } => {
            let kind = CalculatorKind::from_key(&kind)?;
            let results = calculate_value(kind, &Value::Object(fields))?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Prompt { kind, fields } => {
            let (topic, inputs, results) = calculator_context(&kind, fields)?;
            println!(
                "{}",
                build_prompt(&PromptContext::CalculatorInsight {
                    topic,
                    inputs,
                    results,
                })
            );
        }
        Command::Explain {
            kind,
            fields,
            offline,
        } => {
            let (topic, inputs, results) = calculator_context(&kind, fields)?;
            let assistant = assistant_for(offline)?;
            let reply = explain_with_cancellation(&assistant, topic, inputs, results).await?;

            info!(source = ?reply.source, "explanation ready");
            println!("{}", reply.text);
        }
        Command::Recommend {
            page,
            interests,
            offline,
        } => {
            let assistant = assistant_for(offline)?;
            let set = assistant.recommend(&page, None, interests).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "source": set.source,
                    "recommendations": set.items,
                }))?
            );
        }
    }

    Ok(())
}

fn assistant_for(
    offline: bool,
) -> Result<AiAssistant<Arc<dyn CompletionGateway>>, CommandError> {
    if offline {
        let gateway: Arc<dyn CompletionGateway> = Arc::new(OfflineGateway);
        return Ok(AiAssistant::new(gateway));
    }

    let config = AssistantClientConfig::from_env()?;
    let client = ChatEndpointClient::new(&config)?;
    info!(endpoint = client.endpoint_url(), model = %config.model, "using completion endpoint");

    let gateway: Arc<dyn CompletionGateway> = Arc::new(client);
    Ok(AiAssistant::new(gateway)
        .with_model(config.model)
        .with_history_turns(config.history_turns))
}

/// Known calculators get computed results; other keys keep the raw fields as
/// inputs and an empty result set.
fn calculator_context(
    kind: &str,
    fields: Map<String, Value>,
) -> Result<(CalculatorTopic, Value, Value), CommandError> {
    let topic = CalculatorTopic::from_key(kind);
    let inputs = Value::Object(fields);
    let results = match &topic {
        CalculatorTopic::Known(kind) => calculate_value(*kind, &inputs)?,
        CalculatorTopic::Unrecognized(key) => {
            warn!(calculator = %key, "unrecognized calculator, skipping results");
            Value::Object(Map::new())
        }
    };

    Ok((topic, inputs, results))
}

async fn explain_with_cancellation<G>(
    assistant: &AiAssistant<G>,
    topic: CalculatorTopic,
    inputs: Value,
    results: Value,
) -> Result<AssistantReply, CommandError>
where
    G: CompletionGateway,
{
    let operation = Operation::<AssistantReply, Infallible>::new();
    let scope = operation.mount();

    let canceller = operation.clone();
    let interrupt = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling request");
            canceller.cancel();
        }
    });

    let outcome = scope
        .operation()
        .run(async { Ok(assistant.explain_calculation(topic, inputs, results).await) })
        .await;
    interrupt.abort();

    match outcome? {
        Ok(reply) => Ok(reply),
        Err(never) => match never {},
    }
}
