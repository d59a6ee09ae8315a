//! `execute_code`: run Python source in the host's persistent namespace.

use super::parse_params;
use crate::error::BrokerError;
use crate::registry::{CommandDescriptor, CommandKind};
use crate::scheduler::MainLoopJob;
use bld_remote_protocol::{commands, defaults, encoding};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Deserialize)]
struct ExecuteCodeParams {
    code: Option<String>,

    /// `code` is base64-encoded UTF-8 source.
    #[serde(default)]
    code_is_base64: bool,

    /// Base64-encode the stdout echo in the `result` field.
    #[serde(default)]
    return_as_base64: bool,

    /// Older alias for `return_as_base64`, still honored.
    #[serde(default)]
    send_as_base64: bool,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: commands::EXECUTE_CODE,
        kind: CommandKind::MainLoop(Arc::new(build_job)),
        default_deadline: defaults::EXECUTE_CODE_DEADLINE,
    }
}

fn build_job(params: Value) -> Result<MainLoopJob, BrokerError> {
    let params: ExecuteCodeParams = parse_params(params)?;

    let source = params
        .code
        .ok_or_else(|| BrokerError::bad_params("missing required parameter: code"))?;

    // Conflicting flags are refused before scheduling: a base64 flag on a
    // body that does not decode is a client bug, not user-code failure.
    let source = if params.code_is_base64 {
        encoding::decode_text(&source).map_err(|e| {
            BrokerError::bad_params(format!("code_is_base64 is set but code does not decode: {e}"))
        })?
    } else {
        source
    };

    let want_base64 = params.return_as_base64 || params.send_as_base64;

    Ok(Box::new(move |host| {
        let started = Instant::now();
        let outcome = host.exec_python(&source);
        let duration = started.elapsed().as_secs_f64();

        match outcome {
            Ok(output) => {
                // The stdout echo travels base64 when asked to, and also
                // whenever the script printed bytes JSON text cannot carry.
                let force_base64 = want_base64 || encoding::needs_base64(&output.stdout);
                let result_field = if force_base64 {
                    encoding::encode(output.stdout.as_bytes())
                } else {
                    output.stdout.clone()
                };

                Ok(json!({
                    "executed": true,
                    "result": result_field,
                    "output": {
                        "stdout": output.stdout,
                        "stderr": output.stderr,
                    },
                    "duration": duration,
                    "result_is_base64": force_base64,
                }))
            }
            Err(failure) => Err(BrokerError::ExecFailed {
                message: failure.message,
                traceback: failure.traceback,
            }),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        CapturedOutput, Host, HostError, ImageFormat, ObjectDetail, PythonFailure, SceneSnapshot,
    };
    use crate::persist::PersistStore;

    /// Echoes the source back on stdout, or fails when the source says so.
    struct EchoHost;

    impl Host for EchoHost {
        fn exec_python(&mut self, source: &str) -> Result<CapturedOutput, PythonFailure> {
            if let Some(message) = source.strip_prefix("fail:") {
                return Err(PythonFailure {
                    message: message.to_string(),
                    traceback: Some(format!("Traceback (most recent call last):\n{message}")),
                });
            }
            Ok(CapturedOutput {
                stdout: format!("{source}\n"),
                stderr: String::new(),
            })
        }
        fn bind_persist(&mut self, _store: PersistStore) {}
        fn scene_snapshot(&mut self) -> Result<SceneSnapshot, HostError> {
            unreachable!()
        }
        fn object_detail(&mut self, _name: &str) -> Result<Option<ObjectDetail>, HostError> {
            unreachable!()
        }
        fn capture_viewport(
            &mut self,
            _path: &std::path::Path,
            _max_size: u32,
            _format: ImageFormat,
        ) -> Result<(u32, u32), HostError> {
            unreachable!()
        }
    }

    fn run(params: Value) -> Result<Value, BrokerError> {
        let job = build_job(params)?;
        job(&mut EchoHost)
    }

    #[test]
    fn test_plain_execution_shape() {
        let result = run(json!({"code": "2+2"})).unwrap();
        assert_eq!(result["executed"], true);
        assert_eq!(result["result"], "2+2\n");
        assert_eq!(result["output"]["stdout"], "2+2\n");
        assert_eq!(result["output"]["stderr"], "");
        assert_eq!(result["result_is_base64"], false);
        assert!(result["duration"].as_f64().unwrap() >= 0.0);
    }

    #[test]
    fn test_code_missing_is_bad_params() {
        let err = run(json!({})).unwrap_err();
        assert!(matches!(err, BrokerError::BadParams(_)));
    }

    #[test]
    fn test_base64_source_is_decoded() {
        let encoded = encoding::encode(b"print('ok')");
        let result = run(json!({"code": encoded, "code_is_base64": true})).unwrap();
        assert_eq!(result["result"], "print('ok')\n");
    }

    #[test]
    fn test_base64_flag_with_plain_body_is_bad_params() {
        let err = run(json!({"code": "print('not base64!')", "code_is_base64": true})).unwrap_err();
        assert!(matches!(err, BrokerError::BadParams(_)));
    }

    #[test]
    fn test_return_as_base64() {
        let result = run(json!({"code": "x", "return_as_base64": true})).unwrap();
        assert_eq!(result["result_is_base64"], true);
        let decoded = encoding::decode(result["result"].as_str().unwrap()).unwrap();
        assert_eq!(decoded, b"x\n");
        // The raw capture stays readable alongside the encoded echo.
        assert_eq!(result["output"]["stdout"], "x\n");
    }

    #[test]
    fn test_send_as_base64_alias() {
        let result = run(json!({"code": "x", "send_as_base64": true})).unwrap();
        assert_eq!(result["result_is_base64"], true);
    }

    #[test]
    fn test_control_bytes_force_base64_fallback() {
        let result = run(json!({"code": "\u{7}bell"})).unwrap();
        assert_eq!(result["result_is_base64"], true);
        let decoded = encoding::decode(result["result"].as_str().unwrap()).unwrap();
        assert_eq!(decoded, "\u{7}bell\n".as_bytes());
    }

    #[test]
    fn test_exec_failure_carries_traceback() {
        let err = run(json!({"code": "fail:division by zero"})).unwrap_err();
        match err {
            BrokerError::ExecFailed { message, traceback } => {
                assert_eq!(message, "division by zero");
                assert!(traceback.unwrap().starts_with("Traceback"));
            }
            other => panic!("expected ExecFailed, got {other:?}"),
        }
    }
}
