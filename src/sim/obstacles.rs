//! Obstacle lifecycle
//!
//! Obstacles advance toward the player and are passed once they fall a fixed
//! distance behind it. Each pass is reported exactly once, on the frame it
//! happens.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::Aabb;
use super::scene::{NodeHandle, NodeKind, SceneGraph};
use crate::tuning::{ObstaclePolicy, RecycleGap, WorldTuning};

#[derive(Debug)]
pub struct Obstacle {
    pub id: u32,
    pub pos: Vec2,
    pub half_extents: Vec2,
    node: NodeHandle,
}

impl Obstacle {
    pub fn bounds(&self) -> Aabb {
        Aabb::planar(self.pos, self.half_extents)
    }
}

#[derive(Debug)]
pub struct ObstacleField {
    policy: ObstaclePolicy,
    size: Vec2,
    ground_y: f32,
    speed: f32,
    trailing_distance: f32,
    obstacles: Vec<Obstacle>,
    next_id: u32,
}

impl ObstacleField {
    pub fn new(world: &WorldTuning, policy: &ObstaclePolicy) -> Self {
        Self {
            policy: policy.clone(),
            size: world.obstacle_size,
            ground_y: world.ground_y,
            speed: world.game_speed,
            trailing_distance: world.trailing_distance,
            obstacles: Vec::new(),
            next_id: 1,
        }
    }

    /// Drop every obstacle and lay out a fresh lane ahead of the player
    pub fn reset(&mut self, player_x: f32, scene: &mut SceneGraph, rng: &mut Pcg32) {
        self.clear(scene);
        match self.policy {
            ObstaclePolicy::SingleRecycle { gap } => {
                let x = player_x + self.recycle_gap(gap);
                self.spawn(x, scene);
            }
            ObstaclePolicy::Queued { .. } => self.fill(player_x, scene, rng),
        }
    }

    /// Release every obstacle node
    pub fn clear(&mut self, scene: &mut SceneGraph) {
        for obstacle in self.obstacles.drain(..) {
            scene.release(obstacle.node);
        }
    }

    /// Move obstacles by `speed * dt`, retire passed ones, top up the lane.
    /// Returns the number of obstacles passed this frame.
    pub fn advance(&mut self, dt: f32, player_x: f32, scene: &mut SceneGraph, rng: &mut Pcg32) -> u32 {
        let threshold = player_x - self.trailing_distance;
        for obstacle in &mut self.obstacles {
            obstacle.pos.x -= self.speed * dt;
        }

        let passed = match self.policy {
            ObstaclePolicy::SingleRecycle { gap } => {
                let respawn_x = player_x + self.recycle_gap(gap);
                let mut passed = 0;
                for obstacle in &mut self.obstacles {
                    if obstacle.pos.x < threshold {
                        obstacle.pos.x = respawn_x;
                        passed += 1;
                        log::debug!("Obstacle {} recycled to x={:.2}", obstacle.id, respawn_x);
                    }
                }
                passed
            }
            ObstaclePolicy::Queued { .. } => {
                let (behind, ahead): (Vec<_>, Vec<_>) = self
                    .obstacles
                    .drain(..)
                    .partition(|o| o.pos.x < threshold);
                self.obstacles = ahead;
                let passed = behind.len() as u32;
                for obstacle in behind {
                    log::debug!("Obstacle {} passed", obstacle.id);
                    scene.release(obstacle.node);
                }
                self.fill(player_x, scene, rng);
                passed
            }
        };

        for obstacle in &self.obstacles {
            scene.set_pos(&obstacle.node, obstacle.pos.extend(0.0));
        }
        passed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    pub fn bounds(&self) -> Vec<Aabb> {
        self.obstacles.iter().map(Obstacle::bounds).collect()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Distances between consecutive obstacles, front to back
    pub fn gaps(&self) -> Vec<f32> {
        self.obstacles
            .windows(2)
            .map(|pair| pair[1].pos.x - pair[0].pos.x)
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn obstacles_mut(&mut self) -> &mut [Obstacle] {
        &mut self.obstacles
    }

    fn recycle_gap(&self, gap: RecycleGap) -> f32 {
        match gap {
            RecycleGap::Fixed(distance) => distance,
            RecycleGap::Frames(frames) => self.speed * frames,
        }
    }

    /// Append obstacles at random gaps until the frontmost one is within
    /// `spawn_buffer` of the horizon
    fn fill(&mut self, player_x: f32, scene: &mut SceneGraph, rng: &mut Pcg32) {
        let ObstaclePolicy::Queued {
            min_gap,
            max_gap,
            first_gap,
            spawn_horizon,
            spawn_buffer,
        } = self.policy
        else {
            return;
        };

        let horizon = player_x + spawn_horizon;
        loop {
            let x = match self.obstacles.last() {
                None => player_x + first_gap,
                Some(front) if front.pos.x < horizon - spawn_buffer => {
                    front.pos.x + rng.random_range(min_gap..=max_gap)
                }
                Some(_) => break,
            };
            self.spawn(x, scene);
        }
    }

    fn spawn(&mut self, x: f32, scene: &mut SceneGraph) {
        let half_extents = self.size / 2.0;
        let pos = Vec2::new(x, self.ground_y + half_extents.y);
        let node = scene.spawn(NodeKind::Obstacle, pos.extend(0.0), self.size);
        let id = self.next_id;
        self.next_id += 1;
        log::debug!("Spawned obstacle {} at x={:.2}", id, x);
        self.obstacles.push(Obstacle {
            id,
            pos,
            half_extents,
            node,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn queued() -> ObstaclePolicy {
        ObstaclePolicy::Queued {
            min_gap: 6.0,
            max_gap: 12.0,
            first_gap: 10.0,
            spawn_horizon: 40.0,
            spawn_buffer: 5.0,
        }
    }

    fn field(policy: ObstaclePolicy) -> (ObstacleField, SceneGraph, Pcg32) {
        let mut scene = SceneGraph::new();
        let mut rng = Pcg32::seed_from_u64(42);
        let mut field = ObstacleField::new(&WorldTuning::default(), &policy);
        field.reset(PLAYER_X, &mut scene, &mut rng);
        (field, scene, rng)
    }

    #[test]
    fn test_single_recycle_spawns_one_ahead() {
        let (field, scene, _) = field(ObstaclePolicy::default());
        assert_eq!(field.len(), 1);
        assert_eq!(scene.count_kind(NodeKind::Obstacle), 1);
        let obstacle = field.iter().next().unwrap();
        assert_eq!(obstacle.pos.x, PLAYER_X + OBSTACLE_GAP);
        assert_eq!(obstacle.pos.y, GROUND_Y + OBSTACLE_HEIGHT / 2.0);
    }

    #[test]
    fn test_single_recycle_counts_each_pass_once() {
        let (mut field, mut scene, mut rng) = field(ObstaclePolicy::default());
        // 13 units to cover at 0.13 per frame
        let mut total = 0;
        let mut pass_frames = Vec::new();
        for frame in 0..250 {
            let passed = field.advance(1.0, PLAYER_X, &mut scene, &mut rng);
            if passed > 0 {
                pass_frames.push(frame);
            }
            total += passed;
        }
        assert_eq!(total, 2);
        assert_eq!(pass_frames.len(), 2);
        assert_eq!(field.len(), 1);
        assert_eq!(scene.count_kind(NodeKind::Obstacle), 1);
    }

    #[test]
    fn test_timed_recycle_gap() {
        let policy = ObstaclePolicy::SingleRecycle {
            gap: RecycleGap::Frames(100.0),
        };
        let (field, _, _) = field(policy);
        let x = field.iter().next().unwrap().pos.x;
        assert!((x - (PLAYER_X + GAME_SPEED * 100.0)).abs() < 1e-4);
    }

    #[test]
    fn test_queued_fills_to_horizon_with_valid_gaps() {
        let (field, scene, _) = field(queued());
        assert!(field.len() >= 3);
        assert_eq!(scene.count_kind(NodeKind::Obstacle), field.len());
        assert_eq!(field.iter().next().unwrap().pos.x, PLAYER_X + 10.0);
        for gap in field.gaps() {
            assert!((6.0..=12.0).contains(&gap), "gap {gap}");
        }
        let front = field.iter().last().unwrap().pos.x;
        assert!(front >= PLAYER_X + 40.0 - 5.0);
    }

    #[test]
    fn test_queued_removal_preserves_order_and_releases_nodes() {
        let (mut field, mut scene, mut rng) = field(queued());
        let first_id = field.iter().next().unwrap().id;
        let second_id = field.iter().nth(1).unwrap().id;

        field.obstacles_mut()[0].pos.x = PLAYER_X - 3.0;
        let passed = field.advance(1.0, PLAYER_X, &mut scene, &mut rng);

        assert_eq!(passed, 1);
        assert!(field.iter().all(|o| o.id != first_id));
        assert_eq!(field.iter().next().unwrap().id, second_id);
        assert_eq!(scene.count_kind(NodeKind::Obstacle), field.len());
    }

    #[test]
    fn test_clear_releases_everything() {
        let (mut field, mut scene, _) = field(queued());
        field.clear(&mut scene);
        assert!(field.is_empty());
        assert!(scene.is_empty());
    }

    proptest! {
        #[test]
        fn prop_queued_gaps_stay_in_range(seed in any::<u64>(), frames in 1usize..600) {
            let mut scene = SceneGraph::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut field = ObstacleField::new(&WorldTuning::default(), &queued());
            field.reset(PLAYER_X, &mut scene, &mut rng);

            let mut total = 0;
            for _ in 0..frames {
                total += field.advance(1.0, PLAYER_X, &mut scene, &mut rng);
                for gap in field.gaps() {
                    prop_assert!((6.0 - 1e-3..=12.0 + 1e-3).contains(&gap));
                }
            }
            prop_assert_eq!(scene.count_kind(NodeKind::Obstacle), field.len());
            prop_assert!(total as f32 <= frames as f32 * GAME_SPEED / 6.0 + 1.0);
        }
    }
}
