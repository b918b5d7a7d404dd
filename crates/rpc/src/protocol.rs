//! JSON-RPC envelope encoding and reply decoding.

use serde_json::{json, Value};

use crate::error::RpcError;

/// A structured application-level error returned by the remote system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFault {
    pub code: Option<i64>,
    /// Top-level message (often a generic "Odoo Server Error").
    pub message: String,
    /// Exception type, e.g. `odoo.exceptions.AccessError`.
    pub name: Option<String>,
    /// Specific message carried under `data.message`.
    pub detail: Option<String>,
}

impl RemoteFault {
    /// The most specific human message available.
    pub fn best_message(&self) -> &str {
        self.detail
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.message)
    }

    /// Exception class name without its module path, e.g. `AccessError`.
    pub fn short_name(&self) -> Option<&str> {
        self.name.as_deref().map(|n| n.rsplit('.').next().unwrap_or(n))
    }
}

/// Decoded reply body.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    Result(Value),
    Fault(RemoteFault),
}

pub fn envelope(id: u64, service: &str, method: &str, args: &[Value]) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": {
            "service": service,
            "method": method,
            "args": args,
        },
        "id": id,
    })
}

/// Accept both the `result` and the `error` reply shapes.
pub fn parse_reply(body: Value) -> Result<RpcReply, RpcError> {
    let Value::Object(mut map) = body else {
        return Err(RpcError::Malformed("reply body is not a JSON object".to_string()));
    };

    if let Some(err) = map.remove("error") {
        if !err.is_null() {
            return Ok(RpcReply::Fault(parse_fault(err)));
        }
    }

    match map.remove("result") {
        Some(result) => Ok(RpcReply::Result(result)),
        None => Err(RpcError::Malformed(
            "reply carries neither `result` nor `error`".to_string(),
        )),
    }
}

fn parse_fault(err: Value) -> RemoteFault {
    match err {
        Value::String(message) => RemoteFault {
            code: None,
            message,
            name: None,
            detail: None,
        },
        Value::Object(map) => {
            let data = map.get("data");
            RemoteFault {
                code: map.get("code").and_then(Value::as_i64),
                message: map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("remote error")
                    .to_string(),
                name: data
                    .and_then(|d| d.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                detail: data
                    .and_then(|d| d.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }
        }
        other => RemoteFault {
            code: None,
            message: other.to_string(),
            name: None,
            detail: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let body = envelope(7, "common", "login", &[json!("db"), json!("u"), json!("p")]);
        assert_eq!(body["params"]["service"], "common");
        assert_eq!(body["params"]["args"][0], "db");
        assert_eq!(body["id"], 7);
        assert_eq!(body["method"], "call");
    }

    #[test]
    fn result_reply_may_be_false() {
        let reply = parse_reply(json!({"jsonrpc": "2.0", "id": 1, "result": false})).unwrap();
        assert_eq!(reply, RpcReply::Result(Value::Bool(false)));
    }

    #[test]
    fn structured_error_reply() {
        let reply = parse_reply(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": "odoo.exceptions.AccessError", "message": "You are not allowed to access 'Journal Entry'"}
            }
        }))
        .unwrap();
        let RpcReply::Fault(f) = reply else { panic!("expected fault") };
        assert_eq!(f.short_name(), Some("AccessError"));
        assert_eq!(f.best_message(), "You are not allowed to access 'Journal Entry'");
        assert_eq!(f.code, Some(200));
    }

    #[test]
    fn bare_string_error_reply() {
        let reply = parse_reply(json!({"error": "boom"})).unwrap();
        let RpcReply::Fault(f) = reply else { panic!("expected fault") };
        assert_eq!(f.best_message(), "boom");
        assert_eq!(f.name, None);
    }

    #[test]
    fn neither_shape_is_malformed() {
        assert!(parse_reply(json!({"jsonrpc": "2.0"})).is_err());
        assert!(parse_reply(json!([1, 2])).is_err());
    }
}
