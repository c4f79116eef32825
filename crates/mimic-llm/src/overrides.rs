//! Per-model parameter overrides
//!
//! A [`ModelConfig`] carries a fixed temperature plus string-valued extra
//! parameters. Each extra parameter either lands on a typed request field,
//! becomes an opaque top-level body key, or is merged into `extra_body`.

use mimic_config::ModelConfig;
use serde_json::{Map, Value};

use crate::types::ChatRequest;

/// Opaque keys spliced into the top level of the outbound body
pub type ExtraParameters = Map<String, Value>;

/// Apply `config` to `request`
///
/// Returns the modified request and the opaque top-level parameters, which
/// are `None` when there are none. Without a config the request passes
/// through unchanged.
pub fn apply_model_config(mut request: ChatRequest, config: Option<&ModelConfig>) -> (ChatRequest, Option<ExtraParameters>) {
    let Some(config) = config else {
        return (request, None);
    };

    if let Some(temperature) = config.temperature {
        tracing::debug!(model = %config.name, temperature, "overriding temperature");
        request.temperature = Some(temperature);
    }

    let mut opaque = Map::new();

    for (key, raw) in config.extra_parameters.iter().flatten() {
        apply_parameter(&mut request, &mut opaque, &config.name, key, raw);
    }

    if let Some(extra_body) = config.extra_body.as_ref().filter(|body| !body.is_empty()) {
        let mut body = match request.extra_body.take() {
            Some(Value::Object(existing)) => existing,
            Some(other) => {
                tracing::warn!(model = %config.name, existing = %other, "replacing non-object extra_body");
                Map::new()
            }
            None => Map::new(),
        };

        for (key, raw) in extra_body {
            body.insert(key.clone(), coerce_value(raw));
        }

        request.extra_body = Some(Value::Object(body));
    }

    let opaque = (!opaque.is_empty()).then_some(opaque);
    (request, opaque)
}

fn apply_parameter(request: &mut ChatRequest, opaque: &mut ExtraParameters, model: &str, key: &str, raw: &str) {
    match key {
        "temperature" => {
            tracing::warn!(model, value = raw, "ignoring temperature in extra_parameters, use the temperature field");
        }
        "max_tokens" => set_typed(&mut request.max_tokens, model, key, raw, "a non-negative integer", |v| {
            v.as_u64().and_then(|n| u32::try_from(n).ok())
        }),
        "n" => set_typed(&mut request.n, model, key, raw, "a non-negative integer", |v| {
            v.as_u64().and_then(|n| u32::try_from(n).ok())
        }),
        "seed" => set_typed(&mut request.seed, model, key, raw, "an integer", Value::as_i64),
        "top_p" => set_typed(&mut request.top_p, model, key, raw, "a number in [0, 1]", Value::as_f64),
        "frequency_penalty" => {
            set_typed(&mut request.frequency_penalty, model, key, raw, "a number in [-2, 2]", Value::as_f64);
        }
        "presence_penalty" => {
            set_typed(&mut request.presence_penalty, model, key, raw, "a number in [-2, 2]", Value::as_f64);
        }
        "stop" => {
            request.stop = Some(parse_stop(model, raw));
            tracing::debug!(model, value = raw, "overriding stop");
        }
        _ => {
            tracing::debug!(model, key, value = raw, "adding opaque parameter");
            opaque.insert(key.to_owned(), coerce_value(raw));
        }
    }
}

fn set_typed<T>(
    field: &mut Option<T>,
    model: &str,
    key: &str,
    raw: &str,
    expected: &str,
    extract: impl FnOnce(&Value) -> Option<T>,
) {
    match extract(&coerce_value(raw)) {
        Some(value) => {
            tracing::debug!(model, key, value = raw, "overriding parameter");
            *field = Some(value);
        }
        None => {
            tracing::warn!(model, key, value = raw, expected, "ignoring invalid parameter override");
        }
    }
}

fn parse_stop(model: &str, raw: &str) -> Vec<String> {
    let trimmed = raw.trim();

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(list) => return list,
            Err(e) => {
                tracing::warn!(model, value = raw, error = %e, "stop is not a string array, using it as a single sequence");
            }
        }
    }

    vec![raw.to_owned()]
}

/// Best-effort typing of a configured string value
///
/// Tries, in order: a JSON object or array, an integer, a finite float, a
/// case-insensitive boolean. Anything else stays a string.
pub fn coerce_value(raw: &str) -> Value {
    let trimmed = raw.trim();

    let bracketed = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));

    if bracketed && let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return value;
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }

    if let Ok(float) = trimmed.parse::<f64>()
        && float.is_finite()
    {
        return Value::from(float);
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }

    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::String(raw.to_owned())
}
