//! Shared fixtures: a backend and a host that record every call into one log.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::{Vec3, Vec4};

use vitrine::app::{EventSource, FrameRequest, Host, Subscription};
use vitrine::controls::OrientationController;
use vitrine::errors::LoadError;
use vitrine::renderer::{FrameView, RenderBackend, Viewport};
use vitrine::resources::{Geometry, Mesh, PbrMaterial, Primitive};
use vitrine::scene::{Camera, EnvironmentTexture, Light, LightKind, Node, NodeKind, SceneGraph};
use vitrine::RenderLoop;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    // backend
    Resize(u32, u32),
    SetEnvironment(Option<String>),
    Draw { nodes: usize },
    Release,
    // host
    Subscribe(EventSource),
    Unsubscribe(EventSource),
    RequestFrame(u64),
    CancelFrame(u64),
    Mount,
    Unmount,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn count(log: &CallLog, pred: impl Fn(&Call) -> bool) -> usize {
    log.borrow().iter().filter(|c| pred(c)).count()
}

pub fn position(log: &CallLog, pred: impl Fn(&Call) -> bool) -> Option<usize> {
    log.borrow().iter().position(pred)
}

pub struct RecordingBackend {
    log: CallLog,
    texture_limit: u32,
}

impl RecordingBackend {
    pub fn new(log: &CallLog) -> Self {
        Self::with_texture_limit(log, u32::MAX)
    }

    /// Refuses environment textures wider or taller than `texture_limit`.
    pub fn with_texture_limit(log: &CallLog, texture_limit: u32) -> Self {
        Self {
            log: Rc::clone(log),
            texture_limit,
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn resize(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().push(Call::Resize(width, height));
    }

    fn set_environment(&mut self, texture: Option<&EnvironmentTexture>) -> Result<(), LoadError> {
        self.log
            .borrow_mut()
            .push(Call::SetEnvironment(texture.map(|t| t.label.clone())));
        match texture {
            Some(t) if t.width() > self.texture_limit || t.height() > self.texture_limit => {
                Err(LoadError::Unsupported {
                    uri: t.label.clone(),
                    reason: format!("exceeds texture limit {}", self.texture_limit),
                })
            }
            _ => Ok(()),
        }
    }

    fn draw(&mut self, frame: FrameView<'_>) {
        for (_, node) in frame.scene.iter_mut() {
            if let NodeKind::Mesh(mesh) = &mut node.kind {
                for primitive in &mut mesh.primitives {
                    primitive.material.needs_update = false;
                }
            }
        }
        self.log.borrow_mut().push(Call::Draw {
            nodes: frame.scene.node_count(),
        });
    }

    fn release(&mut self) {
        self.log.borrow_mut().push(Call::Release);
    }
}

pub struct ScriptedHost {
    log: CallLog,
    pub size: (u32, u32),
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl ScriptedHost {
    pub fn new(log: &CallLog, width: u32, height: u32) -> Self {
        Self {
            log: Rc::clone(log),
            size: (width, height),
            next_id: 0,
            subscriptions: Vec::new(),
        }
    }

    pub fn active_sources(&self) -> Vec<EventSource> {
        self.subscriptions.iter().map(|s| s.source).collect()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Host for ScriptedHost {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn subscribe(&mut self, source: EventSource) -> Subscription {
        let subscription = Subscription {
            source,
            id: self.next_id(),
        };
        self.subscriptions.push(subscription);
        self.log.borrow_mut().push(Call::Subscribe(source));
        subscription
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.subscriptions.retain(|s| s.id != subscription.id);
        self.log
            .borrow_mut()
            .push(Call::Unsubscribe(subscription.source));
    }

    fn request_frame(&mut self) -> FrameRequest {
        let id = self.next_id();
        self.log.borrow_mut().push(Call::RequestFrame(id));
        FrameRequest(id)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.log.borrow_mut().push(Call::CancelFrame(request.0));
    }

    fn mount_surface(&mut self) {
        self.log.borrow_mut().push(Call::Mount);
    }

    fn unmount_surface(&mut self) {
        self.log.borrow_mut().push(Call::Unmount);
    }
}

pub fn triangle_geometry() -> Arc<Geometry> {
    Arc::new(Geometry::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        None,
        None,
    ))
}

/// Root group with a two-primitive mesh child and a light child.
pub fn sample_scene() -> SceneGraph {
    let mut graph = SceneGraph::new();
    let root = graph.add_node(Node::group().with_name("root"));

    let geometry = triangle_geometry();
    let mesh = Mesh::new(vec![
        Primitive::new(Arc::clone(&geometry), PbrMaterial::new(Vec4::new(1.0, 0.0, 0.0, 1.0))),
        Primitive::new(geometry, PbrMaterial::default()),
    ]);
    graph.add_child(root, Node::new(NodeKind::Mesh(mesh)).with_name("body"));

    let light = Light {
        kind: LightKind::Point { range: None },
        color: Vec3::ONE,
        intensity: 3.0,
    };
    graph.add_child(root, Node::new(NodeKind::Light(light)).with_name("lamp"));
    graph
}

pub fn environment(label: &str) -> EnvironmentTexture {
    EnvironmentTexture::new(label, 2, 1, vec![0; 16]).expect("valid texel data")
}

/// A `width` x 1 texture, for exercising backend size limits.
pub fn wide_environment(label: &str, width: u32) -> EnvironmentTexture {
    EnvironmentTexture::new(label, width, 1, vec![0; width as usize * 8])
        .expect("valid texel data")
}

pub fn viewport(log: &CallLog) -> Viewport<RecordingBackend> {
    Viewport::new(RecordingBackend::new(log), Camera::default())
}

pub fn render_loop(log: &CallLog) -> RenderLoop<RecordingBackend> {
    RenderLoop::new(viewport(log), OrientationController::new())
}

pub fn limited_render_loop(log: &CallLog, texture_limit: u32) -> RenderLoop<RecordingBackend> {
    let viewport = Viewport::new(
        RecordingBackend::with_texture_limit(log, texture_limit),
        Camera::default(),
    );
    RenderLoop::new(viewport, OrientationController::new())
}
