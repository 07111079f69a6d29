//! Rendering-scene abstraction
//!
//! The world never touches a renderer directly. It owns a [`VisualProxy`] per
//! entity and reports every change to a [`RenderScene`], which the host maps
//! onto whatever scene graph it draws with.

use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PROXY_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a visual proxy, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(u64);

impl ProxyId {
    fn next() -> Self {
        Self(NEXT_PROXY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Geometry the renderer should draw for a proxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProxyMesh {
    /// Capsule aligned along Y
    Capsule { radius: f32, half_height: f32 },
    /// Box with full extents
    Cuboid { size: [f32; 3] },
    /// Horizontal plane
    Plane { width: f32, depth: f32 },
    /// Cylinder aligned along Y
    Cylinder { radius: f32, length: f32 },
    /// Sphere
    Sphere { radius: f32 },
}

/// Renderable stand-in for an entity.
///
/// Holds the last state written to the scene so managers can read back the
/// visual position without asking the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualProxy {
    id: ProxyId,
    /// Geometry
    pub mesh: ProxyMesh,
    /// Base colour (0xRRGGBB)
    pub color: u32,
    /// Whether the material glows
    pub emissive: bool,
    /// World-space position
    pub position: Vec3,
    /// World-space orientation
    pub orientation: Quat,
    /// Uniform scale
    pub scale: f32,
    /// Opacity in [0, 1]
    pub opacity: f32,
}

impl VisualProxy {
    /// Create a proxy with a fresh id at the origin
    pub fn new(mesh: ProxyMesh, color: u32) -> Self {
        Self {
            id: ProxyId::next(),
            mesh,
            color,
            emissive: false,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: 1.0,
            opacity: 1.0,
        }
    }

    /// Set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set orientation
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set opacity
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Mark the material as emissive
    pub fn with_emissive(mut self) -> Self {
        self.emissive = true;
        self
    }

    /// Proxy identifier
    pub fn id(&self) -> ProxyId {
        self.id
    }
}

/// Scene graph the host renders from
pub trait RenderScene {
    /// Start drawing a proxy
    fn attach(&mut self, proxy: &VisualProxy);

    /// Stop drawing a proxy
    fn detach(&mut self, proxy: &VisualProxy);

    /// Move a proxy
    fn set_transform(&mut self, proxy: &VisualProxy, position: Vec3, orientation: Quat);

    /// Change a proxy's uniform scale and opacity
    fn set_appearance(&mut self, proxy: &VisualProxy, scale: f32, opacity: f32);
}

/// What the scene last saw for one proxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedProxy {
    pub mesh: ProxyMesh,
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: f32,
    pub opacity: f32,
    pub attached: bool,
    pub attach_count: u32,
    pub detach_count: u32,
}

/// In-memory scene that records every call, for tests and headless hosts
#[derive(Debug, Default)]
pub struct RecordingScene {
    proxies: HashMap<ProxyId, RecordedProxy>,
    transform_writes: u64,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded state for a proxy, attached or not
    pub fn get(&self, id: ProxyId) -> Option<&RecordedProxy> {
        self.proxies.get(&id)
    }

    /// Whether a proxy is currently drawn
    pub fn is_attached(&self, id: ProxyId) -> bool {
        self.proxies.get(&id).is_some_and(|p| p.attached)
    }

    /// Number of proxies currently drawn
    pub fn attached_count(&self) -> usize {
        self.proxies.values().filter(|p| p.attached).count()
    }

    /// How many times a proxy was detached
    pub fn detach_count(&self, id: ProxyId) -> u32 {
        self.proxies.get(&id).map_or(0, |p| p.detach_count)
    }

    /// Total `set_transform` calls received
    pub fn transform_writes(&self) -> u64 {
        self.transform_writes
    }
}

impl RenderScene for RecordingScene {
    fn attach(&mut self, proxy: &VisualProxy) {
        let entry = self.proxies.entry(proxy.id()).or_insert(RecordedProxy {
            mesh: proxy.mesh,
            position: proxy.position,
            orientation: proxy.orientation,
            scale: proxy.scale,
            opacity: proxy.opacity,
            attached: false,
            attach_count: 0,
            detach_count: 0,
        });
        entry.attached = true;
        entry.attach_count += 1;
    }

    fn detach(&mut self, proxy: &VisualProxy) {
        if let Some(entry) = self.proxies.get_mut(&proxy.id()) {
            entry.attached = false;
            entry.detach_count += 1;
        }
    }

    fn set_transform(&mut self, proxy: &VisualProxy, position: Vec3, orientation: Quat) {
        self.transform_writes += 1;
        if let Some(entry) = self.proxies.get_mut(&proxy.id()) {
            entry.position = position;
            entry.orientation = orientation;
        }
    }

    fn set_appearance(&mut self, proxy: &VisualProxy, scale: f32, opacity: f32) {
        if let Some(entry) = self.proxies.get_mut(&proxy.id()) {
            entry.scale = scale;
            entry.opacity = opacity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_ids_are_unique() {
        let a = VisualProxy::new(ProxyMesh::Sphere { radius: 1.0 }, 0xffffff);
        let b = VisualProxy::new(ProxyMesh::Sphere { radius: 1.0 }, 0xffffff);
        assert_ne!(a.id(), b.id());
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_recording_scene_tracks_lifecycle() {
        let mut scene = RecordingScene::new();
        let proxy = VisualProxy::new(ProxyMesh::Sphere { radius: 0.05 }, 0xffff00);

        scene.attach(&proxy);
        assert!(scene.is_attached(proxy.id()));

        scene.set_transform(&proxy, Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        scene.set_appearance(&proxy, 2.0, 0.25);
        let recorded = scene.get(proxy.id()).unwrap();
        assert_eq!(recorded.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(recorded.scale, 2.0);
        assert_eq!(recorded.opacity, 0.25);

        scene.detach(&proxy);
        assert!(!scene.is_attached(proxy.id()));
        assert_eq!(scene.detach_count(proxy.id()), 1);
        assert_eq!(scene.attached_count(), 0);
    }
}
