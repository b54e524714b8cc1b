use std::fs;

use engine::{
    compile_def_database, EntityId, InputEvent, InputSnapshot, Scene, SceneWorld, Vec2, Vec3,
};
use tempfile::TempDir;

use super::controller::AnimationCue;
use super::interactable::{Interactable, InteractionState};
use super::registry::InteractableHandle;
use super::scene_impl::{AdventureScene, Level};
use crate::app::config::GameplayConfig;

const WINDOW: (u32, u32) = (1280, 720);
const DT: f32 = 1.0 / 60.0;

const DEFS: &str = r#"<Defs>
    <ItemDef><defName>item.watering_can</defName><label>Watering can</label><sprite>items/watering_can</sprite></ItemDef>
    <ItemDef><defName>item.pie_dish</defName><label>Pie dish</label><sprite>items/pie_dish</sprite></ItemDef>
    <PlantDef>
        <defName>plant.pietree</defName><label>Pietree sapling</label><sprite>items/pietree_seed</sprite>
        <growthDuration>30</growthDuration>
        <growingStateMeshes><li>meshes/pietree_0</li></growingStateMeshes>
        <growingStateMaterials><li>materials/pietree_0</li></growingStateMaterials>
    </PlantDef>
</Defs>"#;

fn world_with_defs() -> SceneWorld {
    let temp = TempDir::new().expect("temp");
    let defs_dir = temp.path().join("defs");
    fs::create_dir_all(&defs_dir).expect("mkdir");
    fs::write(defs_dir.join("items.xml"), DEFS).expect("write defs");
    let db = compile_def_database(temp.path()).expect("compile");

    let mut world = SceneWorld::default();
    world.set_def_database(db);
    world
}

fn loaded_scene(config: GameplayConfig) -> (AdventureScene, SceneWorld) {
    let mut world = world_with_defs();
    let mut scene = AdventureScene::new(config);
    scene.load(&mut world);
    world.apply_pending();
    (scene, world)
}

fn level(scene: &AdventureScene) -> &Level {
    scene.level().expect("level loaded")
}

fn find(scene: &AdventureScene, name: &str) -> (InteractableHandle, Interactable) {
    level(scene)
        .interactables
        .iter()
        .find(|(_, interactable)| interactable.name() == name)
        .map(|(handle, interactable)| (handle, interactable.clone()))
        .unwrap_or_else(|| panic!("missing interactable {name}"))
}

fn current(scene: &AdventureScene, handle: InteractableHandle) -> &Interactable {
    level(scene).interactables.get(handle).expect("handle")
}

fn screen_of(world: &SceneWorld, entity: EntityId) -> Vec2 {
    let position = world.find_entity(entity).expect("entity").position;
    world
        .camera()
        .world_to_screen(position, WINDOW)
        .expect("on screen")
}

fn screen_of_point(world: &SceneWorld, point: Vec3) -> Vec2 {
    world.camera().world_to_screen(point, WINDOW).expect("on screen")
}

fn sky() -> Vec2 {
    Vec2 { x: 2.0, y: 2.0 }
}

fn snapshot(cursor: Vec2, events: &[InputEvent]) -> InputSnapshot {
    events.iter().fold(
        InputSnapshot::empty()
            .with_cursor_position_px(Some(cursor))
            .with_window_size(WINDOW),
        |snapshot, event| snapshot.with_event(*event),
    )
}

fn click(scene: &mut AdventureScene, world: &mut SceneWorld, at: Vec2) {
    let input = snapshot(
        at,
        &[
            InputEvent::PrimaryPress { position_px: at },
            InputEvent::PrimaryRelease { position_px: at },
        ],
    );
    scene.update(DT, &input, world);
}

fn idle(scene: &mut AdventureScene, world: &mut SceneWorld, ticks: usize) {
    let input = snapshot(sky(), &[]);
    for _ in 0..ticks {
        scene.update(DT, &input, world);
    }
}

fn room_name(scene: &AdventureScene) -> String {
    let level = level(scene);
    let id = level.player.current_room().expect("room");
    level.rooms.room(id).expect("room").name().to_string()
}

#[test]
fn load_enters_starting_room_with_snapped_camera() {
    let (scene, world) = loaded_scene(GameplayConfig::default());
    assert_eq!(room_name(&scene), "garden");
    assert_eq!(world.camera().root, Vec3::ZERO);
    assert!(!level(&scene).rooms.transition().is_active());

    let (_, kitchen_door) = find(&scene, "kitchen_door");
    assert!(!world.find_entity(kitchen_door.entity()).expect("door").active);
    let (_, garden_door) = find(&scene, "garden_door");
    assert!(world.find_entity(garden_door.entity()).expect("door").active);

    let bar = world.hud().mood_bar.expect("mood bar initialised");
    assert!((bar.fill - 0.5).abs() < 1.0e-6);
}

#[test]
fn holding_an_item_gates_other_items_until_delivered() {
    let (mut scene, mut world) = loaded_scene(GameplayConfig::default());
    let (can, can_item) = find(&scene, "garden_watering_can");
    let (pietree, pietree_item) = find(&scene, "garden_pietree");
    let (_, basket) = find(&scene, "garden_basket");

    let at = screen_of(&world, can_item.entity());

    click(&mut scene, &mut world, at);
    let held = level(&scene).player.held_item().expect("holding");
    assert_eq!(held.def_name, "item.watering_can");
    assert!(current(&scene, can).payload().is_none());
    assert!(!world.find_entity(can_item.entity()).expect("can").visible);

    let player = &level(&scene).player;
    assert!(!current(&scene, pietree).is_interactable(player));

    let at = screen_of(&world, pietree_item.entity());

    click(&mut scene, &mut world, at);
    assert_eq!(current(&scene, pietree).state(), InteractionState::Idle);
    assert!(current(&scene, pietree).payload().is_some());
    assert_eq!(
        level(&scene).player.held_item().expect("still holding").def_name,
        "item.watering_can"
    );

    let at = screen_of(&world, basket.entity());

    click(&mut scene, &mut world, at);
    assert!(!level(&scene).player.has_item());
    assert!(current(&scene, pietree).is_interactable(&level(&scene).player));
}

#[test]
fn door_click_changes_room_and_runs_one_transition() {
    let (mut scene, mut world) = loaded_scene(GameplayConfig::default());
    let (_, door) = find(&scene, "garden_door");

    let at = screen_of(&world, door.entity());

    click(&mut scene, &mut world, at);
    assert_eq!(room_name(&scene), "kitchen");
    assert!(level(&scene).rooms.transition().is_active());
    assert!(world.post_fx().vignette_intensity > 0.0);

    idle(&mut scene, &mut world, 30);
    assert_eq!(world.camera().root, Vec3::new(14.0, 0.0, 0.0));
    assert_eq!(world.post_fx().vignette_intensity, 0.0);
    assert!(!world.find_entity(door.entity()).expect("door").active);

    let (_, kitchen_door) = find(&scene, "kitchen_door");
    assert!(world.find_entity(kitchen_door.entity()).expect("door").active);
}

#[test]
fn press_released_elsewhere_commits_nothing() {
    let (mut scene, mut world) = loaded_scene(GameplayConfig::default());
    let (can, can_item) = find(&scene, "garden_watering_can");
    let at = screen_of(&world, can_item.entity());

    scene.update(
        DT,
        &snapshot(at, &[InputEvent::PrimaryPress { position_px: at }]),
        &mut world,
    );
    assert_eq!(current(&scene, can).state(), InteractionState::Pressed);
    assert_eq!(level(&scene).controller.pressed(), Some(can));

    let away = sky();
    scene.update(
        DT,
        &snapshot(away, &[InputEvent::PrimaryRelease { position_px: away }]),
        &mut world,
    );
    assert_eq!(current(&scene, can).state(), InteractionState::Idle);
    assert!(current(&scene, can).payload().is_some());
    assert!(!level(&scene).player.has_item());
}

#[test]
fn hover_follows_cursor_and_clears_on_empty_space() {
    let (mut scene, mut world) = loaded_scene(GameplayConfig::default());
    let (can, can_item) = find(&scene, "garden_watering_can");
    let (pietree, pietree_item) = find(&scene, "garden_pietree");

    scene.update(
        DT,
        &snapshot(screen_of(&world, can_item.entity()), &[]),
        &mut world,
    );
    assert_eq!(level(&scene).controller.hovered(), Some(can));
    assert_eq!(current(&scene, can).state(), InteractionState::Hovered);
    assert_eq!(
        world.visual_state().hovered_entity,
        Some(can_item.entity())
    );

    scene.update(
        DT,
        &snapshot(screen_of(&world, pietree_item.entity()), &[]),
        &mut world,
    );
    assert_eq!(level(&scene).controller.hovered(), Some(pietree));
    assert_eq!(current(&scene, can).state(), InteractionState::Idle);

    idle(&mut scene, &mut world, 1);
    assert_eq!(level(&scene).controller.hovered(), None);
    assert_eq!(current(&scene, pietree).state(), InteractionState::Idle);
    assert_eq!(world.visual_state().hovered_entity, None);
}

#[test]
fn right_click_moves_to_nearest_navigable_point_and_stresses_mood() {
    let (mut scene, mut world) = loaded_scene(GameplayConfig::default());
    let target = screen_of_point(&world, Vec3::new(8.0, 0.0, 0.0));

    scene.update(
        DT,
        &snapshot(target, &[InputEvent::SecondaryPress { position_px: target }]),
        &mut world,
    );
    let destination = level(&scene).agent.destination().expect("destination");
    assert!((destination.x - 5.0).abs() < 1.0e-3, "{destination:?}");
    assert!(destination.z.abs() < 1.0e-2, "{destination:?}");
    assert_eq!(level(&scene).controller.animation_cue(), AnimationCue::Idle);

    idle(&mut scene, &mut world, 3);
    assert_eq!(level(&scene).controller.animation_cue(), AnimationCue::Walk);
    assert!(level(&scene).player.mood().value() > 0.5);
    assert!(!level(&scene).player.direction.is_zero());

    let player_entity = world
        .find_entity(level(&scene).player_entity)
        .expect("player entity");
    assert_eq!(player_entity.position, level(&scene).player.position);
}

#[test]
fn missing_definitions_leave_slots_empty_and_hidden() {
    let mut world = SceneWorld::default();
    let mut scene = AdventureScene::new(GameplayConfig::default());
    scene.load(&mut world);

    let (can, can_item) = find(&scene, "garden_watering_can");
    assert!(current(&scene, can).payload().is_none());
    assert!(!world.find_entity(can_item.entity()).expect("slot").visible);

    let at = screen_of(&world, can_item.entity());

    click(&mut scene, &mut world, at);
    assert!(!level(&scene).player.has_item());
}

#[test]
fn hidden_indicator_leaves_hud_empty() {
    let mut config = GameplayConfig::default();
    config.mood.show_indicator = false;
    let (scene, world) = loaded_scene(config);
    assert!(world.hud().mood_bar.is_none());
    assert!((level(&scene).player.mood().value() - 0.5).abs() < 1.0e-6);
}

#[test]
fn unknown_starting_room_falls_back_to_garden() {
    let mut config = GameplayConfig::default();
    config.starting_room = "attic".to_string();
    let (scene, _world) = loaded_scene(config);
    assert_eq!(room_name(&scene), "garden");
}

#[test]
fn kitchen_start_snaps_camera_to_kitchen() {
    let mut config = GameplayConfig::default();
    config.starting_room = "kitchen".to_string();
    let (scene, world) = loaded_scene(config);
    assert_eq!(room_name(&scene), "kitchen");
    assert_eq!(world.camera().root, Vec3::new(14.0, 0.0, 0.0));

    let (pie, _) = find(&scene, "kitchen_pie_dish");
    assert_eq!(
        current(&scene, pie).display_sprite(),
        Some("items/pie_dish")
    );
    let (counter, _) = find(&scene, "kitchen_counter");
    assert!(!current(&scene, counter).is_visible());
}

#[test]
fn pickup_stress_is_applied_on_commit() {
    let mut config = GameplayConfig::default();
    config.interaction.pickup_stress = 0.25;
    let (mut scene, mut world) = loaded_scene(config);
    let (_, can_item) = find(&scene, "garden_watering_can");

    let at = screen_of(&world, can_item.entity());

    click(&mut scene, &mut world, at);
    assert!((level(&scene).player.mood().value() - 0.75).abs() < 1.0e-6);
    let bar = world.hud().mood_bar.expect("bar");
    assert!((bar.fill - 0.75).abs() < 1.0e-6);
}
