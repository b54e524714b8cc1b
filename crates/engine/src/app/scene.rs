use super::camera::Camera3D;
use super::input::InputSnapshot;
use super::math::{Aabb, Ray, Vec3};
use crate::content::DefDatabase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum RenderableKind {
    Placeholder,
    Sprite(String),
    /// Flat floor quad of the given size centred on the entity position.
    Floor { width: f32, depth: f32 },
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub tint: [u8; 4],
    pub debug_name: String,
}

impl RenderableDesc {
    pub fn placeholder(debug_name: impl Into<String>, tint: [u8; 4]) -> Self {
        Self {
            kind: RenderableKind::Placeholder,
            tint,
            debug_name: debug_name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub position: Vec3,
    /// Half extents of a box collider centred on `position`.
    pub collider: Option<Vec3>,
    pub renderable: RenderableDesc,
    /// Inactive entities are neither raycast nor drawn.
    pub active: bool,
    pub visible: bool,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn bounds(&self) -> Option<Aabb> {
        self.collider
            .map(|half_extents| Aabb::from_center_half_extents(self.position, half_extents))
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneVisualState {
    pub hovered_entity: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PostFx {
    pub vignette_intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodBarVisual {
    pub color: [u8; 4],
    pub fill: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HudState {
    pub mood_bar: Option<MoodBarVisual>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub entity: EntityId,
    pub point: Vec3,
    pub distance: f32,
}

/// Scene query: nearest collider hit along a ray.
pub trait SceneQuery {
    fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RaycastHit>;
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    next_applied_spawn_order: u64,
    camera: Camera3D,
    visual_state: SceneVisualState,
    post_fx: PostFx,
    hud: HudState,
    def_database: Option<DefDatabase>,
}

impl SceneWorld {
    pub fn spawn(&mut self, position: Vec3, renderable: RenderableDesc) -> EntityId {
        self.spawn_internal(position, None, renderable)
    }

    pub fn spawn_with_collider(
        &mut self,
        position: Vec3,
        half_extents: Vec3,
        renderable: RenderableDesc,
    ) -> EntityId {
        self.spawn_internal(position, Some(half_extents), renderable)
    }

    fn spawn_internal(
        &mut self,
        position: Vec3,
        collider: Option<Vec3>,
        renderable: RenderableDesc,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            position,
            collider,
            renderable,
            active: true,
            visible: true,
            applied_spawn_order: 0,
        });
        id
    }

    /// Makes spawns visible to queries and the renderer, in spawn order.
    pub fn apply_pending(&mut self) {
        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera3D::default();
        self.visual_state = SceneVisualState::default();
        self.post_fx = PostFx::default();
        self.hud = HudState::default();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    /// Returns false when the entity does not exist (yet).
    pub fn set_entity_active(&mut self, id: EntityId, active: bool) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.active = active;
                true
            }
            None => false,
        }
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera3D {
        &mut self.camera
    }

    pub fn set_hovered_entity_visual(&mut self, hovered: Option<EntityId>) {
        self.visual_state.hovered_entity = hovered;
    }

    pub fn visual_state(&self) -> &SceneVisualState {
        &self.visual_state
    }

    pub fn post_fx(&self) -> &PostFx {
        &self.post_fx
    }

    pub fn post_fx_mut(&mut self) -> &mut PostFx {
        &mut self.post_fx
    }

    pub fn hud(&self) -> &HudState {
        &self.hud
    }

    pub fn hud_mut(&mut self) -> &mut HudState {
        &mut self.hud
    }

    pub fn set_def_database(&mut self, def_database: DefDatabase) {
        self.def_database = Some(def_database);
    }

    pub fn def_database(&self) -> Option<&DefDatabase> {
        self.def_database.as_ref()
    }
}

impl SceneQuery for SceneWorld {
    fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RaycastHit> {
        let mut best: Option<(f32, u64, EntityId)> = None;
        for entity in &self.entities {
            if !entity.active {
                continue;
            }
            let Some(bounds) = entity.bounds() else {
                continue;
            };
            let Some(distance) = bounds.ray_intersection(ray) else {
                continue;
            };
            if distance > max_distance {
                continue;
            }
            // Equal distance: the later spawn sits on top.
            match best {
                Some((best_distance, order, _))
                    if best_distance < distance
                        || (best_distance == distance && order >= entity.applied_spawn_order) => {}
                _ => best = Some((distance, entity.applied_spawn_order, entity.id)),
            }
        }

        best.map(|(distance, _, entity)| RaycastHit {
            entity,
            point: ray.point_at(distance),
            distance,
        })
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot, world: &mut SceneWorld);
    fn render(&mut self, world: &SceneWorld);
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn set_def_database(&mut self, def_database: DefDatabase) {
        self.world.set_def_database(def_database);
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) {
        self.scene.update(fixed_dt_seconds, input, &mut self.world);
        self.world.apply_pending();
    }

    pub(crate) fn render(&mut self) {
        self.scene.render(&self.world);
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
    }
}
