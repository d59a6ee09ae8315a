//! Scene inspection and viewport capture handlers.

use super::parse_params;
use crate::error::BrokerError;
use crate::host::ImageFormat;
use crate::registry::{CommandDescriptor, CommandKind};
use crate::scheduler::MainLoopJob;
use bld_remote_protocol::{commands, defaults};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub fn scene_info_descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: commands::GET_SCENE_INFO,
        kind: CommandKind::MainLoop(Arc::new(build_scene_info_job)),
        default_deadline: defaults::SCENE_READ_DEADLINE,
    }
}

pub fn object_info_descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: commands::GET_OBJECT_INFO,
        kind: CommandKind::MainLoop(Arc::new(build_object_info_job)),
        default_deadline: defaults::SCENE_READ_DEADLINE,
    }
}

pub fn screenshot_descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: commands::GET_VIEWPORT_SCREENSHOT,
        kind: CommandKind::MainLoop(Arc::new(build_screenshot_job)),
        default_deadline: defaults::SCREENSHOT_DEADLINE,
    }
}

fn build_scene_info_job(_params: Value) -> Result<MainLoopJob, BrokerError> {
    Ok(Box::new(|host| {
        let snapshot = host.scene_snapshot()?;
        Ok(json!({
            "name": snapshot.name,
            "object_count": snapshot.objects.len(),
            "objects": snapshot.objects,
        }))
    }))
}

#[derive(Debug, Deserialize)]
struct ObjectInfoParams {
    /// Object name; `object_name` is accepted as the gateway-facing alias.
    #[serde(alias = "object_name")]
    name: String,
}

fn build_object_info_job(params: Value) -> Result<MainLoopJob, BrokerError> {
    let params: ObjectInfoParams = parse_params(params)?;

    Ok(Box::new(move |host| {
        match host.object_detail(&params.name)? {
            Some(detail) => Ok(serde_json::to_value(detail)
                .map_err(|e| BrokerError::Internal(format!("unencodable object detail: {e}")))?),
            None => Err(BrokerError::Host(format!(
                "object not found: {}",
                params.name
            ))),
        }
    }))
}

#[derive(Debug, Deserialize)]
struct ScreenshotParams {
    filepath: Option<String>,
    max_size: Option<u32>,
    format: Option<String>,
}

fn build_screenshot_job(params: Value) -> Result<MainLoopJob, BrokerError> {
    let params: ScreenshotParams = parse_params(params)?;

    let max_size = match params.max_size {
        None => defaults::DEFAULT_VIEWPORT_MAX_SIZE,
        Some(0) => return Err(BrokerError::bad_params("max_size must be at least 1")),
        // Values above the ceiling are clamped down, not rejected.
        Some(size) => size.min(defaults::VIEWPORT_MAX_SIZE_CEILING),
    };

    let format = match params.format.as_deref() {
        None => ImageFormat::Png,
        Some(raw) => raw.parse::<ImageFormat>().map_err(|_| {
            BrokerError::bad_params(format!("unsupported format: {raw} (expected png or jpg)"))
        })?,
    };

    let filepath = match params.filepath {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => synthesized_capture_path(format),
    };

    Ok(Box::new(move |host| {
        let (width, height) = host.capture_viewport(&filepath, max_size, format)?;
        Ok(json!({
            "filepath": filepath.to_string_lossy(),
            "width": width,
            "height": height,
            "format": format.as_str(),
        }))
    }))
}

/// Unique capture path under the system temp directory, used when the
/// caller does not name one.
fn synthesized_capture_path(format: ImageFormat) -> PathBuf {
    std::env::temp_dir().join(format!(
        "bld_remote_viewport_{}.{}",
        Uuid::new_v4().simple(),
        format.extension()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        Bounds, CapturedOutput, GeometryStats, Host, HostError, ObjectDetail, PythonFailure,
        SceneObject, SceneSnapshot,
    };
    use crate::persist::PersistStore;
    use std::path::Path;

    struct StubHost {
        headless: bool,
        last_capture: Option<(PathBuf, u32, ImageFormat)>,
    }

    impl StubHost {
        fn new() -> Self {
            Self {
                headless: false,
                last_capture: None,
            }
        }
    }

    impl Host for StubHost {
        fn exec_python(&mut self, _source: &str) -> Result<CapturedOutput, PythonFailure> {
            unreachable!()
        }
        fn bind_persist(&mut self, _store: PersistStore) {}
        fn scene_snapshot(&mut self) -> Result<SceneSnapshot, HostError> {
            Ok(SceneSnapshot {
                name: "Scene".to_string(),
                objects: vec![SceneObject {
                    name: "Cube".to_string(),
                    object_type: "MESH".to_string(),
                    location: [0.0; 3],
                    rotation: [0.0; 3],
                    scale: [1.0; 3],
                    visible: true,
                    parent: None,
                }],
            })
        }
        fn object_detail(&mut self, name: &str) -> Result<Option<ObjectDetail>, HostError> {
            if name != "Cube" {
                return Ok(None);
            }
            Ok(Some(ObjectDetail {
                object: SceneObject {
                    name: "Cube".to_string(),
                    object_type: "MESH".to_string(),
                    location: [0.0; 3],
                    rotation: [0.0; 3],
                    scale: [1.0; 3],
                    visible: true,
                    parent: None,
                },
                geometry: Some(GeometryStats {
                    vertex_count: 8,
                    face_count: 6,
                    edge_count: 12,
                    material_count: 0,
                    bounds: Bounds {
                        min: [-1.0; 3],
                        max: [1.0; 3],
                    },
                }),
            }))
        }
        fn capture_viewport(
            &mut self,
            path: &Path,
            max_size: u32,
            format: ImageFormat,
        ) -> Result<(u32, u32), HostError> {
            if self.headless {
                return Err(HostError::Headless);
            }
            self.last_capture = Some((path.to_path_buf(), max_size, format));
            Ok((max_size, max_size * 9 / 16))
        }
    }

    #[test]
    fn test_scene_info_shape() {
        let job = build_scene_info_job(json!({})).unwrap();
        let result = job(&mut StubHost::new()).unwrap();
        assert_eq!(result["name"], "Scene");
        assert_eq!(result["object_count"], 1);
        assert_eq!(result["objects"][0]["name"], "Cube");
    }

    #[test]
    fn test_object_info_accepts_both_param_names() {
        for key in ["name", "object_name"] {
            let job = build_object_info_job(json!({ key: "Cube" })).unwrap();
            let result = job(&mut StubHost::new()).unwrap();
            assert_eq!(result["vertex_count"], 8);
        }
    }

    #[test]
    fn test_object_info_missing_object() {
        let job = build_object_info_job(json!({"name": "Missing"})).unwrap();
        let err = job(&mut StubHost::new()).unwrap_err();
        assert!(matches!(err, BrokerError::Host(_)));
    }

    #[test]
    fn test_object_info_requires_name() {
        let err = build_object_info_job(json!({})).err().unwrap();
        assert!(matches!(err, BrokerError::BadParams(_)));
    }

    #[test]
    fn test_screenshot_defaults() {
        let job = build_screenshot_job(json!({})).unwrap();
        let mut host = StubHost::new();
        let result = job(&mut host).unwrap();

        let (path, max_size, format) = host.last_capture.unwrap();
        assert_eq!(max_size, defaults::DEFAULT_VIEWPORT_MAX_SIZE);
        assert_eq!(format, ImageFormat::Png);
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("bld_remote_viewport_"));
        assert_eq!(result["format"], "png");
        assert_eq!(result["width"], 800);
    }

    #[test]
    fn test_screenshot_max_size_is_clamped() {
        let job = build_screenshot_job(json!({"max_size": 4097})).unwrap();
        let mut host = StubHost::new();
        job(&mut host).unwrap();
        assert_eq!(host.last_capture.unwrap().1, 4096);

        let job = build_screenshot_job(json!({"max_size": 4096})).unwrap();
        let mut host = StubHost::new();
        job(&mut host).unwrap();
        assert_eq!(host.last_capture.unwrap().1, 4096);
    }

    #[test]
    fn test_screenshot_zero_max_size_rejected() {
        let err = build_screenshot_job(json!({"max_size": 0})).err().unwrap();
        assert!(matches!(err, BrokerError::BadParams(_)));
    }

    #[test]
    fn test_screenshot_bad_format_rejected() {
        let err = build_screenshot_job(json!({"format": "webp"})).err().unwrap();
        assert!(matches!(err, BrokerError::BadParams(_)));
    }

    #[test]
    fn test_screenshot_headless() {
        let job = build_screenshot_job(json!({"filepath": "/tmp/x.png"})).unwrap();
        let mut host = StubHost::new();
        host.headless = true;
        let err = job(&mut host).unwrap_err();
        assert!(matches!(err, BrokerError::Headless));
    }

    #[test]
    fn test_screenshot_caller_path_is_respected() {
        let job = build_screenshot_job(json!({"filepath": "/tmp/shot.jpg", "format": "jpg"}))
            .unwrap();
        let mut host = StubHost::new();
        let result = job(&mut host).unwrap();
        assert_eq!(result["filepath"], "/tmp/shot.jpg");
        assert_eq!(result["format"], "jpg");
    }
}
