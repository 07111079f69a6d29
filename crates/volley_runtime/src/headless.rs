//! Headless scene - a renderer stand-in that only counts and traces

use glam::{Quat, Vec3};
use volley_world::{RenderScene, VisualProxy};

/// Counters of everything the world asked the renderer to do
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SceneStats {
    pub attached: u64,
    pub detached: u64,
    pub transforms: u64,
    pub appearance_changes: u64,
}

impl SceneStats {
    /// Proxies currently drawn
    pub fn live(&self) -> u64 {
        self.attached.saturating_sub(self.detached)
    }
}

/// Scene with no output
#[derive(Debug, Default)]
pub struct HeadlessScene {
    stats: SceneStats,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> SceneStats {
        self.stats
    }
}

impl RenderScene for HeadlessScene {
    fn attach(&mut self, proxy: &VisualProxy) {
        self.stats.attached += 1;
        log::trace!("attach {:?} {:?} at {:?}", proxy.id(), proxy.mesh, proxy.position);
    }

    fn detach(&mut self, proxy: &VisualProxy) {
        self.stats.detached += 1;
        log::trace!("detach {:?}", proxy.id());
    }

    fn set_transform(&mut self, proxy: &VisualProxy, position: Vec3, orientation: Quat) {
        self.stats.transforms += 1;
        log::trace!("move {:?} to {:?} {:?}", proxy.id(), position, orientation);
    }

    fn set_appearance(&mut self, proxy: &VisualProxy, scale: f32, opacity: f32) {
        self.stats.appearance_changes += 1;
        log::trace!("fade {:?} scale {:.2} opacity {:.2}", proxy.id(), scale, opacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley_world::ProxyMesh;

    #[test]
    fn test_counts_lifecycle() {
        let mut scene = HeadlessScene::new();
        let proxy = VisualProxy::new(ProxyMesh::Sphere { radius: 0.03 }, 0x888888);

        scene.attach(&proxy);
        scene.set_appearance(&proxy, 1.5, 0.25);
        assert_eq!(scene.stats().live(), 1);

        scene.detach(&proxy);
        let stats = scene.stats();
        assert_eq!(stats.live(), 0);
        assert_eq!(stats.appearance_changes, 1);
    }
}
