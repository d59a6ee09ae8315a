//! Capability surface the broker consumes from the host 3D application.
//!
//! The host's scene graph, viewport, and embedded Python interpreter are
//! external collaborators. The broker reaches them through exactly one
//! object-safe trait so that handlers stay testable against a scripted
//! stand-in, and so a host integration only has to implement this narrow
//! set: execute Python source, walk scene objects, render the viewport.
//!
//! Everything here runs on the host's designated main-loop thread; the
//! trait is `Send` only so the mock can live on a harness thread.

use crate::persist::PersistStore;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Captured standard streams for one Python execution.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// An exception raised by user code inside the embedded interpreter.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct PythonFailure {
    /// `str(exc)` form of the exception.
    pub message: String,
    /// Formatted traceback, when the interpreter can produce one.
    pub traceback: Option<String>,
}

/// Host-API failures outside user code.
#[derive(Debug, Error, Clone)]
pub enum HostError {
    /// No GUI viewport is available (background / headless session).
    #[error("Viewport capture unavailable in background mode")]
    Headless,

    #[error("{0}")]
    Api(String),
}

/// One object as reported by `get_scene_info`.
#[derive(Debug, Clone, Serialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub location: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// The full object listing for the active scene.
#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub name: String,
    pub objects: Vec<SceneObject>,
}

/// Axis-aligned bounds in world space.
#[derive(Debug, Clone, Serialize)]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

/// Mesh-specific counts for `get_object_info`.
#[derive(Debug, Clone, Serialize)]
pub struct GeometryStats {
    pub vertex_count: u64,
    pub face_count: u64,
    pub edge_count: u64,
    pub material_count: u32,
    pub bounds: Bounds,
}

/// Detailed dump for one named object.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectDetail {
    #[serde(flatten)]
    pub object: SceneObject,
    #[serde(flatten)]
    pub geometry: Option<GeometryStats>,
}

/// Output format for viewport captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpg => "image/jpeg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            _ => Err(()),
        }
    }
}

/// The host application, as seen from the broker.
///
/// # Namespace contract
///
/// `exec_python` runs source in a single persistent namespace the host
/// runtime owns for its whole lifetime, passed as both globals and locals
/// on every call, so imports and definitions made by one request are
/// visible to the next. The namespace is never rolled back after a
/// failure; partial mutations remain visible.
pub trait Host: Send {
    /// Execute Python source, capturing stdout/stderr for the call.
    fn exec_python(&mut self, source: &str) -> Result<CapturedOutput, PythonFailure>;

    /// Called once at broker startup. The host exposes the store to user
    /// code by binding a facade object into the execution namespace under
    /// a well-known name; no import-table patching.
    fn bind_persist(&mut self, store: PersistStore);

    /// Enumerate scene objects.
    fn scene_snapshot(&mut self) -> Result<SceneSnapshot, HostError>;

    /// Detailed dump for one object; `None` when no object has that name.
    fn object_detail(&mut self, name: &str) -> Result<Option<ObjectDetail>, HostError>;

    /// Render the active viewport to `path`, constraining the longest side
    /// to `max_size`. Returns the written image's (width, height).
    fn capture_viewport(
        &mut self,
        path: &Path,
        max_size: u32,
        format: ImageFormat,
    ) -> Result<(u32, u32), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_parse() {
        assert_eq!("png".parse::<ImageFormat>(), Ok(ImageFormat::Png));
        assert_eq!("JPG".parse::<ImageFormat>(), Ok(ImageFormat::Jpg));
        assert_eq!("jpeg".parse::<ImageFormat>(), Ok(ImageFormat::Jpg));
        assert!("webp".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_scene_object_wire_shape() {
        let obj = SceneObject {
            name: "Cube".to_string(),
            object_type: "MESH".to_string(),
            location: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
            visible: true,
            parent: None,
        };
        let wire = serde_json::to_value(&obj).unwrap();
        assert_eq!(wire["type"], "MESH");
        assert_eq!(wire["location"], serde_json::json!([0.0, 0.0, 0.0]));
        assert!(wire.get("parent").is_none());
    }

    #[test]
    fn test_object_detail_flattens_geometry() {
        let detail = ObjectDetail {
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
                material_count: 1,
                bounds: Bounds {
                    min: [-1.0; 3],
                    max: [1.0; 3],
                },
            }),
        };
        let wire = serde_json::to_value(&detail).unwrap();
        assert_eq!(wire["name"], "Cube");
        assert_eq!(wire["vertex_count"], 8);
        assert_eq!(wire["bounds"]["max"], serde_json::json!([1.0, 1.0, 1.0]));
    }
}
