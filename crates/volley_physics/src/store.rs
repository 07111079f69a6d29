//! Rigid body store - owns the simulation world

use crate::backend::PhysicsBackend;
use crate::body::{BodyDesc, BodyHandle, BodySnapshot};
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use rapier3d::prelude as rapier;
use std::num::NonZeroUsize;

/// Rapier state, present once the store is initialized
struct Simulation {
    /// Rapier physics pipeline
    pipeline: rapier::PhysicsPipeline,

    /// Gravity
    gravity: rapier::Vector<f32>,

    /// Integration parameters
    integration_params: rapier::IntegrationParameters,

    /// Island manager
    islands: rapier::IslandManager,

    /// Broad phase
    broad_phase: rapier::DefaultBroadPhase,

    /// Narrow phase
    narrow_phase: rapier::NarrowPhase,

    /// Impulse joint set
    impulse_joints: rapier::ImpulseJointSet,

    /// Multibody joint set
    multibody_joints: rapier::MultibodyJointSet,

    /// CCD solver
    ccd_solver: rapier::CCDSolver,

    /// Rigid body set
    bodies: rapier::RigidBodySet,

    /// Collider set
    colliders: rapier::ColliderSet,

    /// Accumulated time for fixed timestep
    accumulated_time: f32,
}

impl Simulation {
    fn new(config: &PhysicsConfig) -> Self {
        let gravity = rapier::Vector::new(config.gravity[0], config.gravity[1], config.gravity[2]);

        let mut integration_params = rapier::IntegrationParameters::default();
        integration_params.dt = config.timestep;
        integration_params.num_solver_iterations =
            NonZeroUsize::new(config.velocity_iterations).unwrap_or(NonZeroUsize::MIN);

        Self {
            pipeline: rapier::PhysicsPipeline::new(),
            gravity,
            integration_params,
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            accumulated_time: 0.0,
        }
    }

    fn step_internal(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }
}

/// Owner of every simulation body and collider.
///
/// The store starts uninitialized; [`RigidBodyStore::initialize`] must be
/// awaited before any body is created or the world is stepped.
pub struct RigidBodyStore {
    /// Configuration
    config: PhysicsConfig,

    /// Simulation state, `None` until initialized
    sim: Option<Simulation>,
}

impl RigidBodyStore {
    /// Create an uninitialized store
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config, sim: None }
    }

    /// Build the simulation pipeline.
    ///
    /// Calling this on an initialized store leaves the existing world alone.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.sim.is_some() {
            return Ok(());
        }

        self.config.validate()?;
        self.sim = Some(Simulation::new(&self.config));

        log::info!(
            "Physics initialized (timestep {:.4}s, gravity {:?}, capacity {})",
            self.config.timestep,
            self.config.gravity,
            self.config.max_bodies
        );
        Ok(())
    }

    /// Get the physics configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Change gravity for subsequent steps
    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        let sim = self.sim_mut()?;
        sim.gravity = rapier::Vector::new(x, y, z);
        self.config.gravity = [x, y, z];
        Ok(())
    }

    /// Number of colliders
    pub fn collider_count(&self) -> usize {
        self.sim.as_ref().map_or(0, |sim| sim.colliders.len())
    }

    fn sim(&self) -> Result<&Simulation> {
        self.sim.as_ref().ok_or(PhysicsError::NotInitialized)
    }

    fn sim_mut(&mut self) -> Result<&mut Simulation> {
        self.sim.as_mut().ok_or(PhysicsError::NotInitialized)
    }

    fn body(&self, handle: BodyHandle) -> Result<&rapier::RigidBody> {
        self.sim()?
            .bodies
            .get(handle.0)
            .ok_or(PhysicsError::InvalidHandle(handle))
    }
}

impl PhysicsBackend for RigidBodyStore {
    fn is_initialized(&self) -> bool {
        self.sim.is_some()
    }

    /// Step the simulation with a fixed timestep
    fn step(&mut self, delta_time: f32) -> Result<()> {
        let timestep = self.config.timestep;
        let max_substeps = self.config.max_substeps;
        let sim = self.sim_mut()?;

        sim.accumulated_time += delta_time.max(0.0);

        let mut steps = 0;
        while sim.accumulated_time >= timestep && steps < max_substeps {
            sim.step_internal();
            sim.accumulated_time -= timestep;
            steps += 1;
        }

        // Drop the backlog a stalled frame left behind
        if steps == max_substeps && sim.accumulated_time >= timestep {
            log::debug!(
                "Physics fell behind, discarding {:.4}s of simulation time",
                sim.accumulated_time
            );
            sim.accumulated_time = 0.0;
        }

        Ok(())
    }

    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle> {
        let capacity = self.config.max_bodies;
        let ccd_allowed = self.config.ccd_enabled;
        let sim = self.sim_mut()?;

        if sim.bodies.len() >= capacity {
            return Err(PhysicsError::ResourceExhausted { capacity });
        }

        let handle = sim.bodies.insert(desc.to_rapier_builder(ccd_allowed));
        sim.colliders
            .insert_with_parent(desc.collider.to_rapier_builder(), handle, &mut sim.bodies);

        if let Some(body) = sim.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&sim.colliders);
        }

        Ok(BodyHandle(handle))
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: [f32; 3]) -> Result<()> {
        let body = self
            .sim_mut()?
            .bodies
            .get_mut(handle.0)
            .ok_or(PhysicsError::InvalidHandle(handle))?;

        if body.is_dynamic() {
            body.apply_impulse(rapier::Vector::new(impulse[0], impulse[1], impulse[2]), true);
        }
        Ok(())
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(sim) = self.sim.as_mut() else {
            return false;
        };

        sim.bodies
            .remove(
                handle.0,
                &mut sim.islands,
                &mut sim.colliders,
                &mut sim.impulse_joints,
                &mut sim.multibody_joints,
                true, // Remove attached colliders
            )
            .is_some()
    }

    fn query(&self, handle: BodyHandle) -> Result<BodySnapshot> {
        self.body(handle).map(BodySnapshot::from_rapier)
    }

    fn mass(&self, handle: BodyHandle) -> Result<f32> {
        self.body(handle).map(|b| b.mass())
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.sim
            .as_ref()
            .is_some_and(|sim| sim.bodies.contains(handle.0))
    }

    fn body_count(&self) -> usize {
        self.sim.as_ref().map_or(0, |sim| sim.bodies.len())
    }
}

impl Default for RigidBodyStore {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{ColliderDesc, ColliderShape};
    use approx::assert_abs_diff_eq;

    fn ready_store(config: PhysicsConfig) -> RigidBodyStore {
        let mut store = RigidBodyStore::new(config);
        pollster::block_on(store.initialize()).unwrap();
        store
    }

    fn unit_cube() -> ColliderDesc {
        ColliderDesc::new(ColliderShape::cuboid(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_uninitialized_store_rejects_calls() {
        let mut store = RigidBodyStore::default();
        assert!(!store.is_initialized());
        assert_eq!(store.step(1.0 / 60.0), Err(PhysicsError::NotInitialized));
        assert_eq!(
            store.create_body(BodyDesc::dynamic()),
            Err(PhysicsError::NotInitialized)
        );
    }

    #[test]
    fn test_initialize_twice_keeps_bodies() {
        let mut store = ready_store(PhysicsConfig::default());
        store.create_body(BodyDesc::dynamic().with_collider(unit_cube())).unwrap();
        pollster::block_on(store.initialize()).unwrap();
        assert_eq!(store.body_count(), 1);
    }

    #[test]
    fn test_initialize_rejects_bad_config() {
        let mut store = RigidBodyStore::new(PhysicsConfig::default().with_timestep(-1.0));
        let result = pollster::block_on(store.initialize());
        assert!(matches!(result, Err(PhysicsError::InvalidConfig(_))));
        assert!(!store.is_initialized());
    }

    #[test]
    fn test_create_body_and_collider() {
        let mut store = ready_store(PhysicsConfig::default());
        let body = store
            .create_body(BodyDesc::dynamic().with_position(0.0, 10.0, 0.0).with_collider(unit_cube()))
            .unwrap();

        assert!(store.contains(body));
        assert_eq!(store.body_count(), 1);
        assert_eq!(store.collider_count(), 1);
        assert_abs_diff_eq!(store.mass(body).unwrap(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_gravity_fall() {
        let mut store = ready_store(PhysicsConfig::default());
        let body = store
            .create_body(BodyDesc::dynamic().with_position(0.0, 10.0, 0.0).with_collider(unit_cube()))
            .unwrap();

        let initial_y = store.query(body).unwrap().position[1];
        for _ in 0..60 {
            store.step(1.0 / 60.0).unwrap();
        }

        let final_y = store.query(body).unwrap().position[1];
        assert!(final_y < initial_y, "Body should fall due to gravity");
    }

    #[test]
    fn test_initial_rotation_is_kept() {
        let mut store = ready_store(PhysicsConfig::default());
        // Quarter turn about Y
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let body = store
            .create_body(BodyDesc::fixed().with_rotation([0.0, half, 0.0, half]).with_collider(unit_cube()))
            .unwrap();

        let [x, y, z, w] = store.query(body).unwrap().orientation;
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y, half, epsilon = 1e-6);
        assert_abs_diff_eq!(z, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(w, half, epsilon = 1e-6);
    }

    #[test]
    fn test_set_gravity() {
        let mut store = RigidBodyStore::default();
        assert_eq!(store.set_gravity(0.0, 0.0, 0.0), Err(PhysicsError::NotInitialized));

        pollster::block_on(store.initialize()).unwrap();
        store.set_gravity(0.0, 0.0, 0.0).unwrap();
        let body = store
            .create_body(BodyDesc::dynamic().with_position(0.0, 3.0, 0.0).with_collider(unit_cube()))
            .unwrap();
        for _ in 0..30 {
            store.step(1.0 / 60.0).unwrap();
        }

        assert_eq!(store.config().gravity, [0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(store.query(body).unwrap().position[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = ready_store(PhysicsConfig::default());
        let body = store.create_body(BodyDesc::dynamic().with_collider(unit_cube())).unwrap();

        assert!(store.remove_body(body));
        assert!(!store.remove_body(body));
        assert_eq!(store.body_count(), 0);
        assert_eq!(store.collider_count(), 0);
    }

    #[test]
    fn test_query_removed_handle_is_invalid() {
        let mut store = ready_store(PhysicsConfig::default());
        let body = store.create_body(BodyDesc::dynamic().with_collider(unit_cube())).unwrap();
        store.remove_body(body);

        assert_eq!(store.query(body), Err(PhysicsError::InvalidHandle(body)));
        assert_eq!(
            store.apply_impulse(body, [1.0, 0.0, 0.0]),
            Err(PhysicsError::InvalidHandle(body))
        );
    }

    #[test]
    fn test_impulse_on_static_body_is_noop() {
        let mut store = ready_store(PhysicsConfig::default());
        let ground = store
            .create_body(BodyDesc::fixed().with_position(0.0, -2.0, 0.0).with_collider(unit_cube()))
            .unwrap();

        store.apply_impulse(ground, [0.0, 100.0, 0.0]).unwrap();
        store.step(1.0 / 60.0).unwrap();

        let snapshot = store.query(ground).unwrap();
        assert_eq!(snapshot.position, [0.0, -2.0, 0.0]);
        assert_eq!(snapshot.linear_velocity, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_impulse_changes_velocity_by_inverse_mass() {
        let mut store = ready_store(PhysicsConfig::default().with_gravity(0.0, 0.0, 0.0));
        let body = store.create_body(BodyDesc::dynamic().with_collider(unit_cube())).unwrap();
        let mass = store.mass(body).unwrap();

        store.apply_impulse(body, [0.0, 0.0, -2.0 * mass]).unwrap();

        let velocity = store.query(body).unwrap().linear_velocity;
        assert_abs_diff_eq!(velocity[2], -2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_capacity_exhausted() {
        let mut store = ready_store(PhysicsConfig::default().with_max_bodies(2));
        store.create_body(BodyDesc::dynamic()).unwrap();
        store.create_body(BodyDesc::dynamic()).unwrap();

        assert_eq!(
            store.create_body(BodyDesc::dynamic()),
            Err(PhysicsError::ResourceExhausted { capacity: 2 })
        );
    }

    #[test]
    fn test_stall_backlog_is_discarded() {
        let mut store = ready_store(PhysicsConfig::default().with_gravity(0.0, 0.0, 0.0));
        let body = store.create_body(BodyDesc::dynamic().with_collider(unit_cube())).unwrap();
        let mass = store.mass(body).unwrap();
        store.apply_impulse(body, [mass, 0.0, 0.0]).unwrap();

        // Ten seconds in one call only advances max_substeps * timestep
        store.step(10.0).unwrap();
        let x = store.query(body).unwrap().position[0];
        assert_abs_diff_eq!(x, 4.0 / 60.0, epsilon = 1e-3);

        // And nothing is left over for the next frame
        store.step(0.0).unwrap();
        assert_abs_diff_eq!(store.query(body).unwrap().position[0], x, epsilon = 1e-6);
    }
}
