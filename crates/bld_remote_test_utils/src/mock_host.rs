//! Scripted stand-in for the host 3D application.
//!
//! The mock's "interpreter" is a deliberately tiny line language - it does
//! not emulate Python syntax, only the properties the broker cares about:
//! a namespace that persists across calls, captured stdout/stderr, wall
//! time spent on the main loop, persistence-facade access, and failures
//! with tracebacks.
//!
//! # Script directives
//!
//! ```text
//! set NAME INT        bind NAME to a value
//! add NAME INT        increment NAME (binds at 0 first)
//! emit NAME           print NAME's value
//! say TEXT...         print literal text
//! warn TEXT...        write literal text to stderr
//! calc A OP B         print A OP B for OP in {+, -, *}
//! sleep MILLIS        block the main loop
//! put KEY NAME        store NAME's value through the persistence facade
//! put_now KEY         store the current unix time in milliseconds
//! get KEY NAME        load a stored integer back into NAME
//! bell                print a raw control byte (BEL)
//! fail TEXT...        raise with the given message
//! ```

use bld_remote_broker::host::{
    Bounds, CapturedOutput, GeometryStats, Host, HostError, ImageFormat, ObjectDetail,
    PythonFailure, SceneObject, SceneSnapshot,
};
use bld_remote_broker::persist::PersistStore;
use bld_remote_protocol::encoding;
use serde_json::json;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A tiny real PNG (1x1), written by the mock's viewport capture.
const PNG_1X1_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// Interval during which one script executed on the main loop.
#[derive(Debug, Clone, Copy)]
pub struct ExecSpan {
    pub started: Instant,
    pub finished: Instant,
}

impl ExecSpan {
    pub fn overlaps(&self, other: &ExecSpan) -> bool {
        self.started < other.finished && other.started < self.finished
    }
}

/// Scripted host with a default scene of Cube, Light, and Camera.
pub struct MockHost {
    namespace: HashMap<String, i64>,
    persist: Option<PersistStore>,
    headless: bool,
    scene_name: String,
    exec_spans: Arc<Mutex<Vec<ExecSpan>>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            namespace: HashMap::new(),
            persist: None,
            headless: false,
            scene_name: "Scene".to_string(),
            exec_spans: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A host with no GUI viewport (background session).
    pub fn headless() -> Self {
        let mut host = Self::new();
        host.headless = true;
        host
    }

    /// Handle for inspecting recorded execution intervals after the fact.
    pub fn exec_spans(&self) -> Arc<Mutex<Vec<ExecSpan>>> {
        Arc::clone(&self.exec_spans)
    }

    fn run_script(&mut self, source: &str) -> Result<CapturedOutput, PythonFailure> {
        let mut out = CapturedOutput::default();

        for (index, raw_line) in source.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.run_line(line, &mut out)
                .map_err(|message| failure_at(index + 1, line, message))?;
        }

        Ok(out)
    }

    fn run_line(&mut self, line: &str, out: &mut CapturedOutput) -> Result<(), String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["set", name, value] => {
                let value = parse_int(value)?;
                self.namespace.insert((*name).to_string(), value);
            }
            ["add", name, delta] => {
                let delta = parse_int(delta)?;
                *self.namespace.entry((*name).to_string()).or_insert(0) += delta;
            }
            ["emit", name] => {
                let value = self
                    .namespace
                    .get(*name)
                    .ok_or_else(|| format!("name '{name}' is not defined"))?;
                let _ = writeln!(out.stdout, "{value}");
            }
            ["say", rest @ ..] if !rest.is_empty() => {
                let _ = writeln!(out.stdout, "{}", rest.join(" "));
            }
            ["warn", rest @ ..] if !rest.is_empty() => {
                let _ = writeln!(out.stderr, "{}", rest.join(" "));
            }
            ["calc", a, op, b] => {
                let a = parse_int(a)?;
                let b = parse_int(b)?;
                let value = match *op {
                    "+" => a + b,
                    "-" => a - b,
                    "*" => a * b,
                    other => return Err(format!("unsupported operator: {other}")),
                };
                let _ = writeln!(out.stdout, "{value}");
            }
            ["sleep", millis] => {
                let millis: u64 = millis
                    .parse()
                    .map_err(|_| format!("invalid sleep duration: {millis}"))?;
                std::thread::sleep(Duration::from_millis(millis));
            }
            ["put", key, name] => {
                let value = *self
                    .namespace
                    .get(*name)
                    .ok_or_else(|| format!("name '{name}' is not defined"))?;
                self.persist()?.put(*key, json!(value));
            }
            ["put_now", key] => {
                let now_ms = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as i64;
                self.persist()?.put(*key, json!(now_ms));
            }
            ["get", key, name] => {
                let value = self
                    .persist()?
                    .get(key)
                    .and_then(|v| v.as_i64())
                    .ok_or_else(|| format!("no stored integer under key '{key}'"))?;
                self.namespace.insert((*name).to_string(), value);
            }
            ["bell"] => {
                out.stdout.push('\u{7}');
                out.stdout.push('\n');
            }
            ["fail", rest @ ..] if !rest.is_empty() => {
                return Err(rest.join(" "));
            }
            [directive, ..] => {
                return Err(format!("unknown directive: {directive}"));
            }
            [] => unreachable!("blank lines are filtered"),
        }
        Ok(())
    }

    fn persist(&self) -> Result<&PersistStore, String> {
        self.persist
            .as_ref()
            .ok_or_else(|| "persistence facade is not bound".to_string())
    }

    fn default_objects() -> Vec<SceneObject> {
        vec![
            SceneObject {
                name: "Cube".to_string(),
                object_type: "MESH".to_string(),
                location: [0.0, 0.0, 0.0],
                rotation: [0.0, 0.0, 0.0],
                scale: [1.0, 1.0, 1.0],
                visible: true,
                parent: None,
            },
            SceneObject {
                name: "Light".to_string(),
                object_type: "LIGHT".to_string(),
                location: [4.08, 1.01, 5.9],
                rotation: [0.65, 0.055, 1.87],
                scale: [1.0, 1.0, 1.0],
                visible: true,
                parent: None,
            },
            SceneObject {
                name: "Camera".to_string(),
                object_type: "CAMERA".to_string(),
                location: [7.36, -6.93, 4.96],
                rotation: [1.11, 0.0, 0.815],
                scale: [1.0, 1.0, 1.0],
                visible: true,
                parent: None,
            },
        ]
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MockHost {
    fn exec_python(&mut self, source: &str) -> Result<CapturedOutput, PythonFailure> {
        let started = Instant::now();
        let outcome = self.run_script(source);
        self.exec_spans.lock().unwrap().push(ExecSpan {
            started,
            finished: Instant::now(),
        });
        outcome
    }

    fn bind_persist(&mut self, store: PersistStore) {
        self.persist = Some(store);
    }

    fn scene_snapshot(&mut self) -> Result<SceneSnapshot, HostError> {
        Ok(SceneSnapshot {
            name: self.scene_name.clone(),
            objects: Self::default_objects(),
        })
    }

    fn object_detail(&mut self, name: &str) -> Result<Option<ObjectDetail>, HostError> {
        let Some(object) = Self::default_objects().into_iter().find(|o| o.name == name) else {
            return Ok(None);
        };
        let geometry = (object.object_type == "MESH").then(|| GeometryStats {
            vertex_count: 8,
            face_count: 6,
            edge_count: 12,
            material_count: 1,
            bounds: Bounds {
                min: [-1.0, -1.0, -1.0],
                max: [1.0, 1.0, 1.0],
            },
        });
        Ok(Some(ObjectDetail { object, geometry }))
    }

    fn capture_viewport(
        &mut self,
        path: &Path,
        max_size: u32,
        _format: ImageFormat,
    ) -> Result<(u32, u32), HostError> {
        if self.headless {
            return Err(HostError::Headless);
        }

        let bytes = encoding::decode(PNG_1X1_BASE64)
            .map_err(|e| HostError::Api(format!("corrupt capture stub: {e}")))?;
        std::fs::write(path, bytes)
            .map_err(|e| HostError::Api(format!("failed to write capture: {e}")))?;

        // The mock viewport is 16:9; the longest side lands on max_size.
        Ok((max_size, (max_size * 9 / 16).max(1)))
    }
}

fn failure_at(line_number: usize, line: &str, message: String) -> PythonFailure {
    PythonFailure {
        traceback: Some(format!(
            "Traceback (most recent call last):\n  line {line_number}: {line}\n{message}"
        )),
        message,
    }
}

fn parse_int(token: &str) -> Result<i64, String> {
    token
        .parse::<i64>()
        .map_err(|_| format!("invalid integer: {token}"))
}
