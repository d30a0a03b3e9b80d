use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Xref;

/// Durable path-per-ID record store. Record existence is the sole
/// resumption checkpoint, so primary writes go through a temp file and a
/// rename: a crash mid-write never leaves a record that reads as done.
pub struct ItemStore {
    root: PathBuf,
}

impl ItemStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, id: u64, suffix: &str) -> PathBuf {
        self.root.join(format!("{:06}{}", id, suffix))
    }

    pub fn primary_exists(&self, id: u64) -> bool {
        self.path(id, "-main.json").is_file()
    }

    pub fn timeline_exists(&self, id: u64) -> bool {
        self.path(id, "-timeline.json").is_file()
    }

    pub fn xrefs_exists(&self, id: u64) -> bool {
        self.path(id, "-xrefs.json").is_file()
    }

    pub fn marked_not_found(&self, id: u64) -> bool {
        self.path(id, ".404").is_file()
    }

    pub fn marked_skipped(&self, id: u64) -> bool {
        self.path(id, ".skip").is_file()
    }

    pub fn mark_not_found(&self, id: u64) -> Result<()> {
        fs::write(self.path(id, ".404"), "")?;
        Ok(())
    }

    pub fn mark_skipped(&self, id: u64) -> Result<()> {
        fs::write(self.path(id, ".skip"), "")?;
        Ok(())
    }

    pub fn write_primary(&self, id: u64, payload: &Value) -> Result<()> {
        self.write_json(self.path(id, "-main.json"), payload)?;
        // A stale failure diagnostic from an earlier run is obsolete now.
        let _ = fs::remove_file(self.path(id, "-main.failed"));
        Ok(())
    }

    pub fn write_comments(&self, id: u64, comments: &[Value]) -> Result<()> {
        self.write_json(self.path(id, "-comments.json"), comments)
    }

    pub fn write_timeline(&self, id: u64, timeline: &[Value]) -> Result<()> {
        self.write_json(self.path(id, "-timeline.json"), timeline)
    }

    pub fn write_xrefs(&self, id: u64, xrefs: &[Xref]) -> Result<()> {
        self.write_json(self.path(id, "-xrefs.json"), xrefs)
    }

    /// Leave a diagnostic next to where the record would have gone.
    pub fn record_failure(&self, id: u64, component: &str, message: &str) -> Result<()> {
        let diagnostic = json!({
            "error": message,
            "component": component,
            "timestamp": Utc::now().to_rfc3339(),
        });
        self.write_json(self.path(id, &format!("-{}.failed", component)), &diagnostic)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: PathBuf, value: &T) -> Result<()> {
        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');

        let mut tmp_name = path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, &content)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            e
        })?;
        Ok(())
    }
}
