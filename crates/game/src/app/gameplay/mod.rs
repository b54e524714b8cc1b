mod camera_transition;
mod controller;
mod interactable;
mod mood;
mod nav;
mod player;
mod pointer;
mod registry;
mod rooms;
mod scene_impl;

#[cfg(test)]
mod tests;

use engine::Scene;

use super::config::GameplayConfig;
use scene_impl::AdventureScene;

pub(crate) fn build_scene(config: GameplayConfig) -> Box<dyn Scene> {
    Box::new(AdventureScene::new(config))
}
