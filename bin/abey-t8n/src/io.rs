use std::{fs, io::Read, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::{Result, StdinInput, T8nError, TransitionInputs};

/// Loads a JSON document from `path`.
pub fn load_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| T8nError::InputLoad { file: path.to_string(), source: e })?;

    serde_json::from_str(&content)
        .map_err(|e| T8nError::JsonParse { file: path.to_string(), source: e })
}

/// Loads every input from stdin in the combined JSON format.
pub fn load_from_stdin() -> Result<TransitionInputs> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| T8nError::InputLoad { file: "stdin".to_string(), source: e })?;

    let input: StdinInput = serde_json::from_str(&buffer)
        .map_err(|e| T8nError::JsonParse { file: "stdin".to_string(), source: e })?;

    Ok(TransitionInputs {
        alloc: input.alloc,
        env: input.env,
        txs: input.txs,
        config: input.config,
    })
}

/// Writes `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| T8nError::JsonParse { file: path.display().to_string(), source: e })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| T8nError::OutputWrite { file: parent.display().to_string(), source: e })?;
    }

    fs::write(path, json)
        .map_err(|e| T8nError::OutputWrite { file: path.display().to_string(), source: e })
}
