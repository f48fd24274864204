use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::errors::Result;
use crate::file_utils::write_file_ensuring_parent_dir;

/// How the rendering engine should animate from the previous layout to the
/// next one.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionConfig {
    pub delay_ms: u64,
    pub duration_ms: u64,
    pub ease: String,
    /// Precision of the path tweening between old and new edge geometry.
    pub tween_precision: String,
    pub fit: bool,
    pub zoom: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        TransitionConfig {
            delay_ms: 50,
            duration_ms: 1000,
            ease: "linear".to_string(),
            tween_precision: "90%".to_string(),
            fit: true,
            zoom: true,
            width: None,
            height: None,
        }
    }
}

pub const RESET_ZOOM_DURATION_MS: u64 = 800;

/// The engine that turns DOT text into pixels.  The graph state only ever
/// talks to it through this trait.
pub trait GraphRenderer {
    /// Announce an image reference that node statements will use, together
    /// with the size it should be drawn at.
    fn add_image(&mut self, uri: &str, width: &str, height: &str);
    fn render_dot(&mut self, dot: &str, transition: &TransitionConfig) -> Result<()>;
    fn reset_zoom(&mut self, duration_ms: u64);
    /// Tear down whatever the renderer attached to its surface.
    fn destroy(&mut self);
}

/// Writes every rendering to a file, replacing the previous one.
pub struct DotFileRenderer {
    path: String,
    images: Vec<String>,
    renders: usize,
}

impl DotFileRenderer {
    pub fn new(path: &str) -> Self {
        DotFileRenderer {
            path: path.to_string(),
            images: vec![],
            renders: 0,
        }
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }
}

impl GraphRenderer for DotFileRenderer {
    fn add_image(&mut self, uri: &str, _width: &str, _height: &str) {
        self.images.push(uri.to_string());
    }

    fn render_dot(&mut self, dot: &str, _transition: &TransitionConfig) -> Result<()> {
        write_file_ensuring_parent_dir(&self.path, dot)?;
        self.renders += 1;
        debug!(path = %self.path, bytes = dot.len(), "wrote DOT rendering");
        Ok(())
    }

    fn reset_zoom(&mut self, _duration_ms: u64) {}

    fn destroy(&mut self) {
        trace!(images = self.images.len(), "dropping registered images");
        self.images.clear();
    }
}

/// Everything a `RecordingRenderer` was asked to do.
#[derive(Debug, Default)]
pub struct RenderLog {
    pub renders: Vec<String>,
    /// (uri, width, height) in registration order.
    pub images: Vec<(String, String, String)>,
    pub zoom_resets: Vec<u64>,
    pub destroyed: usize,
}

impl RenderLog {
    pub fn last_render(&self) -> Option<&str> {
        self.renders.last().map(|s| s.as_str())
    }
}

/// Renderer that keeps everything in memory.  The log is shared so that it
/// can still be inspected after the renderer was handed to a session.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    log: Rc<RefCell<RenderLog>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        RecordingRenderer::default()
    }

    pub fn log(&self) -> Rc<RefCell<RenderLog>> {
        self.log.clone()
    }
}

impl GraphRenderer for RecordingRenderer {
    fn add_image(&mut self, uri: &str, width: &str, height: &str) {
        self.log
            .borrow_mut()
            .images
            .push((uri.to_string(), width.to_string(), height.to_string()));
    }

    fn render_dot(&mut self, dot: &str, _transition: &TransitionConfig) -> Result<()> {
        self.log.borrow_mut().renders.push(dot.to_string());
        Ok(())
    }

    fn reset_zoom(&mut self, duration_ms: u64) {
        self.log.borrow_mut().zoom_resets.push(duration_ms);
    }

    fn destroy(&mut self) {
        self.log.borrow_mut().destroyed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::temp_dir::TempDir;

    #[test]
    fn file_renderer_replaces_previous_output() {
        let dir = TempDir::new("scenario-graph-file-renderer");
        let path = dir.join("out/graph.dot");
        let path = path.to_str().unwrap();

        let mut renderer = DotFileRenderer::new(path);
        renderer.render_dot("digraph G {\n}\n", &TransitionConfig::default()).unwrap();
        renderer.render_dot("digraph G {\na\n}\n", &TransitionConfig::default()).unwrap();

        assert_eq!(renderer.render_count(), 2);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "digraph G {\na\n}\n");
    }

    #[test]
    fn recording_renderer_shares_its_log() {
        let recorder = RecordingRenderer::new();
        let log = recorder.log();
        let mut boxed: Box<dyn GraphRenderer> = Box::new(recorder);
        boxed.add_image("data:x", "250px", "200px");
        boxed.render_dot("digraph G {\n}\n", &TransitionConfig::default()).unwrap();
        boxed.reset_zoom(RESET_ZOOM_DURATION_MS);
        boxed.destroy();

        let log = log.borrow();
        assert_eq!(log.images.len(), 1);
        assert_eq!(log.last_render(), Some("digraph G {\n}\n"));
        assert_eq!(log.zoom_resets, vec![800]);
        assert_eq!(log.destroyed, 1);
    }
}
