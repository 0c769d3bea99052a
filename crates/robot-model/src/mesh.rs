//! Uploaded mesh files and name-based reference resolution

use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Mesh formats the loader accepts
pub const MESH_EXTENSIONS: [&str; 7] = [".dae", ".stl", ".obj", ".ply", ".fbx", ".gltf", ".glb"];

/// Whether a file name carries an accepted mesh extension
pub fn is_mesh_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    MESH_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Last path component of a URL or path (handles `/` and `\`)
pub fn file_name(reference: &str) -> &str {
    let after_slash = reference.rsplit('/').next().unwrap_or(reference);
    after_slash.rsplit('\\').next().unwrap_or(after_slash)
}

fn base_name(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Uploaded mesh files keyed by their original file name
#[derive(Debug, Clone, Default)]
pub struct MeshFileMap {
    files: BTreeMap<String, Vec<u8>>,
}

impl MeshFileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from uploads, skipping files without a mesh extension.
    /// Returns the map and the number of skipped files.
    pub fn from_uploads<I, S>(uploads: I) -> (Self, usize)
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let mut map = Self::new();
        let mut skipped = 0;
        for (name, data) in uploads {
            if !map.insert(name, data) {
                skipped += 1;
            }
        }
        (map, skipped)
    }

    /// Add a file; rejected (false) when the extension is not a mesh format
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) -> bool {
        let name = name.into();
        if !is_mesh_file(&name) {
            debug!("Skipping non-mesh upload '{}'", name);
            return false;
        }
        self.files.insert(name, data);
        true
    }

    /// Resolve a URDF mesh reference to an uploaded file name.
    ///
    /// Tried in order: exact file name, case-insensitive file name, then a
    /// file sharing the base name (text before the first `.`).
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        let name = file_name(reference);

        if let Some((key, _)) = self.files.get_key_value(name) {
            return Some(key.as_str());
        }

        let lower = name.to_lowercase();
        if let Some(key) = self.files.keys().find(|k| k.to_lowercase() == lower) {
            return Some(key.as_str());
        }

        let base = base_name(name).to_lowercase();
        if base.is_empty() {
            return None;
        }
        let found = self
            .files
            .keys()
            .find(|k| base_name(k).to_lowercase() == base)
            .map(String::as_str);
        if found.is_none() {
            warn!("No uploaded mesh matches '{}'", reference);
        }
        found
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total bytes held
    pub fn total_bytes(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploads() -> MeshFileMap {
        let (map, skipped) = MeshFileMap::from_uploads(vec![
            ("Base.STL", vec![1, 2]),
            ("upper_arm.dae", vec![3]),
            ("readme.txt", vec![4]),
        ]);
        assert_eq!(skipped, 1);
        map
    }

    #[test]
    fn test_extension_filter() {
        assert!(is_mesh_file("wheel.GLB"));
        assert!(is_mesh_file("a.b.obj"));
        assert!(!is_mesh_file("robot.urdf"));
        assert!(!is_mesh_file("stl"));
    }

    #[test]
    fn test_file_name_strips_paths() {
        assert_eq!(file_name("package://bot/meshes/a.dae"), "a.dae");
        assert_eq!(file_name("C:\\models\\b.stl"), "b.stl");
        assert_eq!(file_name("c.obj"), "c.obj");
    }

    #[test]
    fn test_resolve_exact_then_case_insensitive() {
        let map = uploads();
        assert_eq!(map.resolve("package://bot/meshes/Base.STL"), Some("Base.STL"));
        assert_eq!(map.resolve("meshes/base.stl"), Some("Base.STL"));
    }

    #[test]
    fn test_resolve_by_base_name() {
        let map = uploads();
        assert_eq!(map.resolve("meshes/upper_arm.stl"), Some("upper_arm.dae"));
        assert_eq!(map.resolve("meshes/forearm.dae"), None);
    }

    #[test]
    fn test_clear() {
        let mut map = uploads();
        assert_eq!(map.len(), 2);
        assert_eq!(map.total_bytes(), 3);
        map.clear();
        assert!(map.is_empty());
    }
}
