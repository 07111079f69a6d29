//! Transform Sync - mirrors simulation transforms onto visual proxies

use crate::registry::{EntityId, EntityKind, EntityRegistry};
use crate::scene::RenderScene;
use glam::{Quat, Vec3};
use volley_physics::{PhysicsBackend, PhysicsError};

/// Outcome of one sync pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncReport {
    /// Entities whose proxy was updated
    pub synced: usize,
    /// Entities whose body handle no longer resolves; retire them
    pub invalid: Vec<EntityId>,
}

/// Copy post-step positions (and orientations) onto every body-backed proxy.
///
/// Player entities are never touched: their transform belongs to the
/// external player controller. Projectiles receive position only, since the
/// projectile manager orients them along their velocity. Body-less entities
/// are skipped.
///
/// Only `NotInitialized` aborts the pass; an invalid handle is reported and
/// the remaining entities are still synced.
pub fn sync_transforms<B, S>(
    registry: &mut EntityRegistry,
    backend: &B,
    scene: &mut S,
) -> Result<SyncReport, PhysicsError>
where
    B: PhysicsBackend + ?Sized,
    S: RenderScene + ?Sized,
{
    let mut report = SyncReport::default();

    for id in registry.snapshot_with_body() {
        let Some(entity) = registry.get_mut(id) else {
            continue;
        };
        if entity.kind() == EntityKind::Player {
            continue;
        }
        let Some(body) = entity.body() else {
            continue;
        };

        let snapshot = match backend.query(body) {
            Ok(snapshot) => snapshot,
            Err(PhysicsError::InvalidHandle(handle)) => {
                log::warn!("{:?} {} lost its body {:?}", entity.kind(), id, handle);
                report.invalid.push(id);
                continue;
            }
            Err(err) => return Err(err),
        };

        entity.proxy.position = Vec3::from_array(snapshot.position);
        if entity.kind() != EntityKind::Projectile {
            entity.proxy.orientation = Quat::from_array(snapshot.orientation);
        }

        scene.set_transform(&entity.proxy, entity.proxy.position, entity.proxy.orientation);
        report.synced += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityDesc;
    use crate::scene::{ProxyMesh, RecordingScene, VisualProxy};
    use std::time::Duration;
    use volley_physics::prelude::*;

    struct Fixture {
        store: RigidBodyStore,
        registry: EntityRegistry,
        scene: RecordingScene,
    }

    impl Fixture {
        fn new() -> Self {
            let mut store = RigidBodyStore::default();
            pollster::block_on(store.initialize()).unwrap();
            Self {
                store,
                registry: EntityRegistry::new(),
                scene: RecordingScene::new(),
            }
        }

        fn spawn(&mut self, kind: EntityKind, y: f32) -> (EntityId, BodyHandle) {
            let body = self
                .store
                .create_body(BodyDesc::dynamic().with_position(0.0, y, 0.0))
                .unwrap();
            let proxy = VisualProxy::new(ProxyMesh::Cuboid { size: [1.0; 3] }, 0xff0000);
            self.scene.attach(&proxy);
            let id = self
                .registry
                .register(EntityDesc::new(kind, proxy, Duration::ZERO).with_body(body))
                .unwrap();
            (id, body)
        }
    }

    #[test]
    fn test_proxies_match_store_after_step() {
        let mut fx = Fixture::new();
        let (prop, prop_body) = fx.spawn(EntityKind::DynamicProp, 5.0);

        for _ in 0..30 {
            fx.store.step(1.0 / 60.0).unwrap();
        }
        let report = sync_transforms(&mut fx.registry, &fx.store, &mut fx.scene).unwrap();

        assert_eq!(report.synced, 1);
        let expected = Vec3::from_array(fx.store.query(prop_body).unwrap().position);
        let entity = fx.registry.get(prop).unwrap();
        assert_eq!(entity.proxy.position, expected);
        assert_eq!(fx.scene.get(entity.proxy.id()).unwrap().position, expected);
        assert!(expected.y < 5.0);
    }

    #[test]
    fn test_player_is_never_synced() {
        let mut fx = Fixture::new();
        let (player, _) = fx.spawn(EntityKind::Player, 5.0);

        for _ in 0..30 {
            fx.store.step(1.0 / 60.0).unwrap();
        }
        let report = sync_transforms(&mut fx.registry, &fx.store, &mut fx.scene).unwrap();

        assert_eq!(report.synced, 0);
        assert_eq!(fx.registry.get(player).unwrap().proxy.position, Vec3::ZERO);
        assert_eq!(fx.scene.transform_writes(), 0);
    }

    #[test]
    fn test_body_less_entities_are_untouched() {
        let mut fx = Fixture::new();
        let proxy = VisualProxy::new(ProxyMesh::Sphere { radius: 0.03 }, 0x888888)
            .with_position(Vec3::new(1.0, 1.0, 1.0));
        let smoke = fx
            .registry
            .register(EntityDesc::new(EntityKind::TrailParticle, proxy, Duration::ZERO))
            .unwrap();

        sync_transforms(&mut fx.registry, &fx.store, &mut fx.scene).unwrap();
        assert_eq!(
            fx.registry.get(smoke).unwrap().proxy.position,
            Vec3::new(1.0, 1.0, 1.0)
        );
    }

    #[test]
    fn test_invalid_handle_is_reported_not_fatal() {
        let mut fx = Fixture::new();
        let (lost, lost_body) = fx.spawn(EntityKind::DynamicProp, 1.0);
        let (kept, _) = fx.spawn(EntityKind::DynamicProp, 2.0);
        fx.store.remove_body(lost_body);

        let report = sync_transforms(&mut fx.registry, &fx.store, &mut fx.scene).unwrap();

        assert_eq!(report.invalid, vec![lost]);
        assert_eq!(report.synced, 1);
        assert!(fx.registry.contains(kept));
    }
}
