//! Destroy sequence shared by every lifecycle manager

use crate::registry::{EntityId, EntityRegistry};
use crate::scene::RenderScene;
use volley_physics::PhysicsBackend;

/// Retire an entity: detach its proxy, release its body, then unregister it.
///
/// Returns `false` if the entity was already gone. The entity is looked up
/// once, so no step of the sequence can run twice for the same id.
pub fn retire<B, S>(registry: &mut EntityRegistry, backend: &mut B, scene: &mut S, id: EntityId) -> bool
where
    B: PhysicsBackend + ?Sized,
    S: RenderScene + ?Sized,
{
    let Some(entity) = registry.get(id) else {
        return false;
    };

    scene.detach(&entity.proxy);

    if let Some(body) = entity.body() {
        if !backend.remove_body(body) {
            log::debug!("Body of {} was already released", id);
        }
    }

    if let Some(entity) = registry.unregister(id) {
        log::trace!("Retired {:?} {}", entity.kind(), id);
    }
    true
}

/// Retire a body-less entity: detach its proxy, then unregister it
pub fn retire_visual<S>(registry: &mut EntityRegistry, scene: &mut S, id: EntityId) -> bool
where
    S: RenderScene + ?Sized,
{
    let Some(entity) = registry.unregister(id) else {
        return false;
    };

    scene.detach(&entity.proxy);
    if let Some(body) = entity.body() {
        log::warn!("{:?} {} retired without releasing body {:?}", entity.kind(), id, body);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{EntityDesc, EntityKind};
    use crate::scene::{ProxyMesh, RecordingScene, VisualProxy};
    use std::time::Duration;
    use volley_physics::prelude::*;

    #[test]
    fn test_retire_releases_everything_once() {
        let mut store = RigidBodyStore::default();
        pollster::block_on(store.initialize()).unwrap();
        let mut scene = RecordingScene::new();
        let mut registry = EntityRegistry::new();

        let body = store.create_body(BodyDesc::dynamic()).unwrap();
        let proxy = VisualProxy::new(ProxyMesh::Cuboid { size: [1.0; 3] }, 0xff0000);
        let proxy_id = proxy.id();
        scene.attach(&proxy);
        let id = registry
            .register(EntityDesc::new(EntityKind::DynamicProp, proxy, Duration::ZERO).with_body(body))
            .unwrap();

        assert!(retire(&mut registry, &mut store, &mut scene, id));
        assert!(!retire(&mut registry, &mut store, &mut scene, id));

        assert!(!registry.contains(id));
        assert!(!store.contains(body));
        assert_eq!(scene.detach_count(proxy_id), 1);
    }

    #[test]
    fn test_retire_visual_detaches_once() {
        let mut scene = RecordingScene::new();
        let mut registry = EntityRegistry::new();
        let proxy = VisualProxy::new(ProxyMesh::Sphere { radius: 0.05 }, 0xffff00);
        let proxy_id = proxy.id();
        scene.attach(&proxy);
        let id = registry
            .register(EntityDesc::new(EntityKind::MuzzleFlash, proxy, Duration::ZERO))
            .unwrap();

        assert!(retire_visual(&mut registry, &mut scene, id));
        assert!(!retire_visual(&mut registry, &mut scene, id));
        assert!(registry.is_empty());
        assert_eq!(scene.detach_count(proxy_id), 1);
    }
}
