/*
 * ==========================================================================
 * VaultScript — Sandboxed Embedded Scripting Runtime
 * ==========================================================================
 *
 * This file is part of the VaultScript runtime.
 *
 * VaultScript is dual-licensed under the terms of:
 *   - The MIT License
 *   - The Apache License, Version 2.0
 *
 * You may choose either license to govern your use of this software.
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under these licenses is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * ==========================================================================
 */

//! The `JobQueue` capability specialization: `enqueue`/`retry` with the
//! argument validation spec.md §4.4 requires before anything reaches the
//! host implementation.

use std::collections::HashMap;
use std::sync::Arc;

use super::{CapabilityAdapter, CapabilityBinding};
use crate::error::{ScriptError, ScriptResult};
use crate::value::{Builtin, BuiltinCall, DurationValue, Value};

pub struct EnqueueRequest {
    pub name: String,
    pub payload: HashMap<String, Value>,
    pub delay: Option<DurationValue>,
    pub key: Option<String>,
    pub extra: HashMap<String, Value>,
}

pub struct RetryRequest {
    pub id: Value,
    pub opts: HashMap<String, Value>,
}

type EnqueueHandler = Arc<dyn Fn(&CapabilityBinding, EnqueueRequest) -> ScriptResult<Value> + Send + Sync>;
type RetryHandler = Arc<dyn Fn(&CapabilityBinding, RetryRequest) -> ScriptResult<Value> + Send + Sync>;

pub struct JobQueueCapability {
    pub global_name: String,
    pub enqueue: EnqueueHandler,
    pub retry: Option<RetryHandler>,
}

impl JobQueueCapability {
    pub fn new(global_name: impl Into<String>, enqueue: EnqueueHandler) -> Self {
        Self {
            global_name: global_name.into(),
            enqueue,
            retry: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryHandler) -> Self {
        self.retry = Some(retry);
        self
    }
}

fn parse_delay(value: Option<&Value>, span: crate::span::Span) -> ScriptResult<Option<DurationValue>> {
    match value {
        None => Ok(None),
        Some(Value::Duration(d)) if d.seconds >= 0 => Ok(Some(*d)),
        Some(Value::Int(n)) if *n >= 0 => Ok(Some(DurationValue::new(*n))),
        Some(Value::Float(f)) if *f >= 0.0 => Ok(Some(DurationValue::new(*f as i64))),
        Some(_) => Err(ScriptError::type_error(
            "delay must be a non-negative duration or numeric seconds",
            span,
        )),
    }
}

fn parse_key(value: Option<&Value>, span: crate::span::Span) -> ScriptResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(Value::Str(s)) if !s.is_empty() => Ok(Some(s.to_string())),
        Some(_) => Err(ScriptError::type_error("key must be a non-empty string", span)),
    }
}

impl CapabilityAdapter for JobQueueCapability {
    fn bind(&self, binding: &CapabilityBinding) -> ScriptResult<HashMap<String, Value>> {
        let mut fields = HashMap::new();

        let enqueue_handler = Arc::clone(&self.enqueue);
        let enqueue_binding = binding.clone();
        let enqueue_builtin = Builtin::new(
            "enqueue",
            Arc::new(move |call: BuiltinCall| {
                let span = call.span;
                let name = match call.args.first() {
                    Some(Value::Str(s)) => s.to_string(),
                    Some(other) => {
                        return Err(ScriptError::type_error(
                            format!("argument 1 expected string, got {}", other.type_name()),
                            span,
                        ))
                    }
                    None => return Err(ScriptError::arity("missing argument name for enqueue", span)),
                };
                let payload = match call.args.get(1) {
                    Some(Value::Hash(h)) | Some(Value::Object(h)) => h.lock().unwrap().clone(),
                    Some(other) => {
                        return Err(ScriptError::type_error(
                            format!("argument 2 expected hash, got {}", other.type_name()),
                            span,
                        ))
                    }
                    None => return Err(ScriptError::arity("missing argument payload for enqueue", span)),
                };
                let delay = parse_delay(call.kwargs.get("delay"), span)?;
                let key = parse_key(call.kwargs.get("key"), span)?;
                let mut extra = call.kwargs.clone();
                extra.remove("delay");
                extra.remove("key");
                let req = EnqueueRequest {
                    name,
                    payload,
                    delay,
                    key,
                    extra,
                };
                (enqueue_handler)(&enqueue_binding, req)
            }),
        );
        fields.insert("enqueue".to_string(), Value::Builtin(Arc::new(enqueue_builtin)));

        if let Some(retry) = &self.retry {
            let retry_handler = Arc::clone(retry);
            let retry_binding = binding.clone();
            let retry_builtin = Builtin::new(
                "retry",
                Arc::new(move |call: BuiltinCall| {
                    let span = call.span;
                    let id = match call.args.first() {
                        Some(v) => v.clone(),
                        None => return Err(ScriptError::arity("missing argument id for retry", span)),
                    };
                    let opts = call.kwargs.clone();
                    (retry_handler)(&retry_binding, RetryRequest { id, opts })
                }),
            );
            fields.insert("retry".to_string(), Value::Builtin(Arc::new(retry_builtin)));
        }

        let mut out = HashMap::new();
        out.insert(self.global_name.clone(), Value::object(fields));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::CancellationHandle;
    use std::sync::Mutex;

    #[test]
    fn enqueue_validates_payload_and_delay() {
        let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let seen2 = Arc::clone(&seen);
        let cap = JobQueueCapability::new(
            "jobs",
            Arc::new(move |_binding, req| {
                *seen2.lock().unwrap() = Some(req.name.clone());
                Ok(Value::Bool(true))
            }),
        );
        let binding = CapabilityBinding {
            cancel: CancellationHandle::new(),
        };
        let globals = cap.bind(&binding).unwrap();
        let jobs = globals.get("jobs").unwrap();
        let enqueue = match jobs {
            Value::Object(fields) => fields.lock().unwrap().get("enqueue").unwrap().clone(),
            _ => panic!("expected object"),
        };
        let builtin = match enqueue {
            Value::Builtin(b) => b,
            _ => panic!("expected builtin"),
        };

        let host = crate::interpreter::calls::NullHost;
        let mut kwargs = HashMap::new();
        kwargs.insert("delay".to_string(), Value::Int(-1));
        let call = BuiltinCall {
            receiver: None,
            args: vec![Value::string("send_email"), Value::hash(HashMap::new())],
            kwargs,
            block: None,
            span: crate::span::Span::UNKNOWN,
            host: &host,
        };
        assert!((builtin.func)(call).is_err());
    }
}
