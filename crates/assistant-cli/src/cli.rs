use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Calc {
        kind: String,
        fields: Map<String, Value>,
    },
    Prompt {
        kind: String,
        fields: Map<String, Value>,
    },
    Explain {
        kind: String,
        fields: Map<String, Value>,
        offline: bool,
    },
    Recommend {
        page: String,
        interests: Vec<String>,
        offline: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("missing value for argument: {0}")]
    MissingValue(String),
    #[error("expected key=value, got: {0}")]
    InvalidField(String),
    #[error("help requested")]
    HelpRequested,
}

impl Command {
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut iter = args.into_iter();
        let command = match iter.next() {
            Some(command) => command,
            None => return Err(CliError::MissingCommand),
        };

        match command.as_str() {
            "--help" | "-h" | "help" => Err(CliError::HelpRequested),
            "calc" | "prompt" | "explain" => {
                let kind = iter
                    .next()
                    .filter(|kind| !kind.starts_with("--"))
                    .ok_or_else(|| CliError::MissingValue(command.clone()))?;
                let mut fields = Map::new();
                let mut offline = false;

                for arg in iter {
                    match arg.as_str() {
                        "--help" | "-h" => return Err(CliError::HelpRequested),
                        "--offline" if command == "explain" => offline = true,
                        flag if flag.starts_with("--") => {
                            return Err(CliError::UnknownArgument(arg));
                        }
                        _ => {
                            let (key, value) = parse_field(&arg)?;
                            fields.insert(key, value);
                        }
                    }
                }

                Ok(match command.as_str() {
                    "calc" => Self::Calc { kind, fields },
                    "prompt" => Self::Prompt { kind, fields },
                    _ => Self::Explain {
                        kind,
                        fields,
                        offline,
                    },
                })
            }
            "recommend" => {
                let mut page = None;
                let mut interests = Vec::new();
                let mut offline = false;

                while let Some(arg) = iter.next() {
                    match arg.as_str() {
                        "--help" | "-h" => return Err(CliError::HelpRequested),
                        "--page" => {
                            page = Some(iter.next().ok_or(CliError::MissingValue(arg.clone()))?);
                        }
                        "--interest" => {
                            interests.push(iter.next().ok_or(CliError::MissingValue(arg.clone()))?);
                        }
                        "--offline" => offline = true,
                        unknown => return Err(CliError::UnknownArgument(unknown.to_string())),
                    }
                }

                Ok(Self::Recommend {
                    page: page.ok_or_else(|| CliError::MissingValue("--page".to_string()))?,
                    interests,
                    offline,
                })
            }
            unknown => Err(CliError::UnknownCommand(unknown.to_string())),
        }
    }
}

/// `key=value`; integers and finite decimals become JSON numbers.
fn parse_field(raw: &str) -> Result<(String, Value), CliError> {
    let (key, value) = raw
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| CliError::InvalidField(raw.to_string()))?;
    let value = value.trim();

    let parsed = if let Ok(integer) = value.parse::<i64>() {
        Value::from(integer)
    } else if let Some(number) = value.parse::<f64>().ok().and_then(Number::from_f64) {
        Value::Number(number)
    } else {
        Value::String(value.to_string())
    };

    Ok((key.trim().to_string(), parsed))
}
