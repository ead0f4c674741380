// Scene loading: builds both bots and hands them over from a worker thread
//
// Bots are assembled procedurally from box fragments. Each fragment's extent
// is the full box size; its local transform places it relative to the actor.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use glam::{Quat, Vec3};
use thiserror::Error;

use crate::core::Transform;
use crate::game::actor::{Actor, ActorTag};
use crate::game::tuning::FightTuning;

pub const FIRST_SPAWN: Vec3 = Vec3::new(0.0, 3.0, -200.0);
pub const SECOND_SPAWN: Vec3 = Vec3::new(0.0, 1.0, 200.0);

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to start scene loader: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Shape of a bot before it is turned into pieces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotLayout {
    pub hull: Vec3,
    pub plate_thickness: f32,
    pub wheel: Vec3,
    pub weapon: Vec3,
    /// Add a mount point with no geometry (never simulated)
    pub include_socket: bool,
}

impl BotLayout {
    /// Horizontal-bar spinner
    pub const SPINNER: Self = Self {
        hull: Vec3::new(6.0, 2.0, 10.0),
        plate_thickness: 0.5,
        wheel: Vec3::new(1.0, 2.0, 2.0),
        weapon: Vec3::new(7.0, 1.0, 1.5),
        include_socket: true,
    };

    /// Vertical disc
    pub const DISC: Self = Self {
        hull: Vec3::new(5.0, 2.5, 9.0),
        plate_thickness: 0.75,
        wheel: Vec3::new(1.0, 2.5, 2.5),
        weapon: Vec3::new(1.0, 5.0, 5.0),
        include_socket: false,
    };
}

/// Which layouts to build and how fast the bots start
#[derive(Debug, Clone, Copy)]
pub struct SceneConfig {
    pub first: BotLayout,
    pub second: BotLayout,
    pub initial_speed: f32,
}

impl SceneConfig {
    pub fn new(fight: &FightTuning) -> Self {
        Self {
            first: BotLayout::SPINNER,
            second: BotLayout::DISC,
            initial_speed: fight.initial_approach_speed,
        }
    }
}

/// Build one bot at its spawn point
pub fn build_bot(tag: ActorTag, name: &str, layout: &BotLayout, initial_speed: f32) -> Actor {
    let transform = match tag {
        ActorTag::First => Transform::from_translation(FIRST_SPAWN),
        ActorTag::Second => Transform::from_translation_rotation(
            SECOND_SPAWN,
            Quat::from_rotation_y(std::f32::consts::PI),
        ),
    };
    let mut actor = Actor::new(tag, name, transform, initial_speed);

    // Wheels lift the hull off the floor; local +Z faces the opponent
    let ride_height = layout.wheel.y * 0.5;
    let hull_center = ride_height + layout.hull.y * 0.5;
    actor.add_piece(
        "hull",
        Some(layout.hull),
        Transform::from_translation(Vec3::new(0.0, hull_center, 0.0)),
    );

    let plate_y = ride_height + layout.hull.y + layout.plate_thickness * 0.5;
    let half_len = layout.hull.z * 0.25;
    for (i, z) in [-half_len, half_len].into_iter().enumerate() {
        actor.add_piece(
            &format!("top_plate_{}", i),
            Some(Vec3::new(layout.hull.x, layout.plate_thickness, layout.hull.z * 0.5)),
            Transform::from_translation(Vec3::new(0.0, plate_y, z)),
        );
    }

    let side_x = (layout.hull.x + layout.plate_thickness) * 0.5;
    for (i, x) in [-side_x, side_x].into_iter().enumerate() {
        actor.add_piece(
            &format!("side_plate_{}", i),
            Some(Vec3::new(layout.plate_thickness, layout.hull.y, layout.hull.z)),
            Transform::from_translation(Vec3::new(x, hull_center, 0.0)),
        );
    }

    let wheel_x = side_x + (layout.plate_thickness + layout.wheel.x) * 0.5;
    let wheel_z = layout.hull.z * 0.3;
    let mut wheel = 0;
    for x in [-wheel_x, wheel_x] {
        for z in [-wheel_z, wheel_z] {
            actor.add_piece(
                &format!("wheel_{}", wheel),
                Some(layout.wheel),
                Transform::from_translation(Vec3::new(x, ride_height, z)),
            );
            wheel += 1;
        }
    }

    let weapon_z = (layout.hull.z + layout.weapon.z) * 0.5;
    let weapon_y = ride_height + layout.weapon.y.max(layout.hull.y) * 0.5;
    actor.add_weapon(
        "weapon",
        Some(layout.weapon),
        Transform::from_translation(Vec3::new(0.0, weapon_y, weapon_z)),
    );

    if layout.include_socket {
        actor.add_piece(
            "weapon_socket",
            None,
            Transform::from_translation(Vec3::new(0.0, weapon_y, weapon_z)),
        );
    }

    actor
}

/// Build both bots synchronously
pub fn build_scene(config: &SceneConfig) -> [Actor; 2] {
    [
        build_bot(ActorTag::First, "spinner", &config.first, config.initial_speed),
        build_bot(ActorTag::Second, "disc", &config.second, config.initial_speed),
    ]
}

/// Loads the scene on a worker thread; actors are collected by polling
pub struct SceneLoader {
    receiver: Receiver<Actor>,
    worker: Option<JoinHandle<()>>,
    finished: bool,
}

impl SceneLoader {
    pub fn spawn(config: SceneConfig) -> Result<Self, SceneError> {
        let (sender, receiver) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("scene-loader".to_string())
            .spawn(move || {
                for actor in build_scene(&config) {
                    log::debug!("Loaded actor {} ({} pieces)", actor.name, actor.pieces.len());
                    if sender.send(actor).is_err() {
                        // Receiver dropped; nobody wants the scene anymore
                        return;
                    }
                }
            })?;

        Ok(Self {
            receiver,
            worker: Some(worker),
            finished: false,
        })
    }

    /// Actors that arrived since the last poll
    pub fn poll(&mut self) -> Vec<Actor> {
        let mut ready = Vec::new();
        if self.finished {
            return ready;
        }

        loop {
            match self.receiver.try_recv() {
                Ok(actor) => ready.push(actor),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finish();
                    break;
                }
            }
        }
        ready
    }

    /// The worker has delivered everything it will deliver
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Scene loader thread panicked");
            }
        }
    }
}
