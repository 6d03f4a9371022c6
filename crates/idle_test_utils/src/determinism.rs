//! Determinism testing utilities.
//!
//! Provides a harness for verifying that battles produce identical results
//! given identical requests.
//!
//! # Testing Strategy
//!
//! A replay record only stores seeds and inputs, so every battle must be
//! reproducible tick for tick. Sources of non-determinism include:
//!
//! - **Floating-point math**: stat multipliers are converted to
//!   [`idle_core::math::Fixed`] before they touch damage.
//!
//! - **HashMap iteration order**: the component tree is hashed and walked in
//!   sorted node id order; actors act in roster order.
//!
//! - **System randomness**: only [`CombatRequest::new_pve`] and
//!   [`CombatRequest::new_pvp`] draw fresh seeds. Everything after that uses
//!   the seeded streams.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: attack math and wave generation
//! 2. **Property tests**: random snapshots and seeds still replay exactly
//! 3. **Integration tests**: full battles are reproducible
//! 4. **Parallel tests**: running N battles on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use idle_core::prelude::*;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks stepped per run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel battle runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each battle.
    pub hashes: Vec<u64>,
    /// Duration of each battle in ticks.
    pub durations: Vec<u32>,
    /// Number of battles run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all battles produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
            && self.durations.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all battles matched.
    ///
    /// # Panics
    ///
    /// Panics if battles produced different hashes or durations.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel battles diverged!\n\
                 Battles: {}\n\
                 Durations: {:?}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.durations,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use idle_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run `request` twice for `num_ticks` steps and compare final state hashes.
///
/// Steps past the end of the battle are no-ops, so `num_ticks` may exceed
/// the battle's duration.
///
/// # Errors
///
/// Returns an error if the request cannot be initialized.
pub fn verify_battle_determinism(
    engine: &CombatEngine,
    request: &CombatRequest,
    num_ticks: u64,
) -> Result<bool> {
    // Report setup errors instead of hashing two empty runs
    engine.start_battle(request.clone())?;

    let result = verify_determinism(
        2,
        num_ticks,
        || engine.start_battle(request.clone()).ok(),
        |battle| {
            if let Some(battle) = battle {
                battle.advance();
            }
        },
        |battle| battle.as_ref().map_or(0, Battle::state_hash),
    );
    Ok(result.is_deterministic)
}

/// Run `num_sims` copies of `request` to completion on scoped threads.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Errors
///
/// Returns the first initialization error.
///
/// # Example
///
/// ```
/// use idle_core::prelude::*;
/// use idle_test_utils::determinism::run_parallel_battles;
/// use idle_test_utils::fixtures::mirror_match;
///
/// let result = run_parallel_battles(&CombatEngine::default(), &mirror_match(7), 4).unwrap();
/// result.assert_deterministic();
/// ```
pub fn run_parallel_battles(
    engine: &CombatEngine,
    request: &CombatRequest,
    num_sims: usize,
) -> Result<ParallelSimResult> {
    let outcomes: Vec<Result<(u64, u32)>> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| -> Result<(u64, u32)> {
                    let mut battle = engine.start_battle(request.clone())?;
                    battle.run_to_end();
                    Ok((battle.state_hash(), battle.current_tick()))
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    });

    let mut hashes = Vec::with_capacity(num_sims);
    let mut durations = Vec::with_capacity(num_sims);
    for outcome in outcomes {
        let (hash, duration) = outcome?;
        hashes.push(hash);
        durations.push(duration);
    }

    Ok(ParallelSimResult {
        hashes,
        durations,
        num_sims,
    })
}

/// Step two copies of `request` side by side, finding the first divergence.
///
/// # Returns
///
/// `Ok(None)` if both copies match for `num_ticks` steps, `Ok(Some(tick))`
/// for the first tick whose state hashes differ (0 for the initial state).
///
/// # Errors
///
/// Returns an error if the request cannot be initialized.
pub fn find_first_divergence(
    engine: &CombatEngine,
    request: &CombatRequest,
    num_ticks: u64,
) -> Result<Option<u64>> {
    let mut first = engine.start_battle(request.clone())?;
    let mut second = engine.start_battle(request.clone())?;

    if first.state_hash() != second.state_hash() {
        return Ok(Some(0));
    }

    for tick in 1..=num_ticks {
        first.advance();
        second.advance();

        if first.state_hash() != second.state_hash() {
            return Ok(Some(tick));
        }
    }

    Ok(None)
}

/// Run `request`, encode its replay record, decode it, and check the decoded
/// record replays to the same result, duration and final state.
pub fn verify_serialization_determinism(engine: &CombatEngine, request: &CombatRequest) -> bool {
    let Ok(mut battle) = engine.start_battle(request.clone()) else {
        return false;
    };
    battle.run_to_end();
    let hash_before = battle.state_hash();

    let Ok(record) = battle.replay_entity() else {
        return false;
    };
    let Ok(bytes) = record.to_bytes() else {
        return false;
    };
    let Ok(restored) = CombatReplayEntity::from_bytes(&bytes) else {
        return false;
    };
    if restored != record {
        return false;
    }

    let Ok(mut replay) = engine.start_battle(restored.to_request()) else {
        return false;
    };
    replay.run_to_end();

    replay.result() == record.battle_result
        && replay.current_tick() == record.duration_ticks
        && replay.state_hash() == hash_before
}

/// Hash of every per-tick snapshot of a replay, in order.
///
/// Two records with the same trace hash played out identically.
///
/// # Errors
///
/// Returns an error if the record cannot be replayed.
pub fn replay_trace_hash(engine: &CombatEngine, record: &CombatReplayEntity) -> Result<u64> {
    let mut hasher = DefaultHasher::new();
    for snapshot in engine.replay_battle(record)? {
        snapshot.tick.hash(&mut hasher);
        for state in snapshot
            .creator_faction
            .iter()
            .chain(&snapshot.enemy_faction)
        {
            state.node.hash(&mut hasher);
            state.current_health.hash(&mut hasher);
            state.current_target.hash(&mut hasher);
            state.attack_cooldown_ticks.hash(&mut hasher);
        }
    }
    Ok(hasher.finish())
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but valid battle inputs. Ranges are kept
/// small enough that most battles end well before their tick limit.
pub mod strategies {
    use idle_core::prelude::*;
    use proptest::prelude::*;

    /// Any seed, negative ones included.
    pub fn arb_seed() -> impl Strategy<Value = i32> {
        any::<i32>()
    }

    /// Health values (1-500).
    pub fn arb_health() -> impl Strategy<Value = i32> {
        1i32..500i32
    }

    /// An ordered damage range with `min` in 0-50 and a spread of 0-30.
    pub fn arb_damage_range() -> impl Strategy<Value = (i32, i32)> {
        (0i32..50i32, 0i32..30i32).prop_map(|(min, spread)| (min, min + spread))
    }

    /// Attacks per second (0.5-3.0).
    pub fn arb_attack_speed() -> impl Strategy<Value = f32> {
        (5u32..30u32).prop_map(|tenths| tenths as f32 / 10.0)
    }

    /// Valid combat stats at full health.
    pub fn arb_stats() -> impl Strategy<Value = CombatStats> {
        (
            arb_health(),
            arb_damage_range(),
            arb_attack_speed(),
            0u32..50u32,
            10u32..30u32,
            -20i32..200i32,
        )
            .prop_map(|(health, (damage_min, damage_max), speed, crit, mult, armor)| CombatStats {
                max_health: health,
                current_health: health,
                damage_min,
                damage_max,
                attack_speed: speed,
                crit_chance: crit as f32,
                crit_multiplier: mult as f32 / 10.0,
                armor,
                ..CombatStats::for_level(1)
            })
    }

    /// A valid player snapshot.
    pub fn arb_snapshot() -> impl Strategy<Value = CharacterSnapshot> {
        (1u64..1000u64, 1i32..20i32, arb_stats()).prop_map(|(id, level, stats)| {
            CharacterSnapshot::player(format!("Fighter {id}"), level)
                .with_id(id)
                .with_stats(stats)
        })
    }

    /// Between one and `max_len - 1` snapshots.
    pub fn arb_roster(max_len: usize) -> impl Strategy<Value = Vec<CharacterSnapshot>> {
        proptest::collection::vec(arb_snapshot(), 1..max_len)
    }

    /// A PvP arena request with pinned seeds.
    pub fn arb_pvp_request() -> impl Strategy<Value = CombatRequest> {
        (arb_roster(4), arb_roster(4), arb_seed(), arb_seed()).prop_map(
            |(creators, enemies, battle_seed, item_seed)| {
                CombatRequest::new_pvp(1, MapKind::PvPArena.key(), 0, 1, creators, enemies)
                    .with_seeds(battle_seed, item_seed)
            },
        )
    }

    /// A request on one of the built-in PvE maps with pinned seeds.
    pub fn arb_pve_request() -> impl Strategy<Value = CombatRequest> {
        (
            prop_oneof![
                Just(MapKind::StarterVillage),
                Just(MapKind::SkeletonGraveyard)
            ],
            0i32..4i32,
            1i32..10i32,
            arb_roster(3),
            arb_seed(),
            arb_seed(),
        )
            .prop_map(|(map, difficulty, level, creators, battle_seed, item_seed)| {
                CombatRequest::new_pve(1, map.key(), difficulty, level, creators)
                    .with_seeds(battle_seed, item_seed)
            })
    }

    /// Either kind of request.
    pub fn arb_request() -> impl Strategy<Value = CombatRequest> {
        prop_oneof![arb_pvp_request(), arb_pve_request()]
    }

    /// A structural operation on a component tree.
    ///
    /// Indices refer to previously inserted nodes, modulo the node count.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TreeOp {
        /// Insert a new root node.
        Insert,
        /// Move node `child` under node `parent`.
        Attach {
            /// Index of the child.
            child: usize,
            /// Index of the new parent.
            parent: usize,
        },
        /// Detach a node from its parent.
        Detach(usize),
        /// Remove a node from the tree.
        Remove(usize),
    }

    /// A single tree operation.
    pub fn arb_tree_op() -> impl Strategy<Value = TreeOp> {
        prop_oneof![
            2 => Just(TreeOp::Insert),
            3 => (any::<usize>(), any::<usize>())
                .prop_map(|(child, parent)| TreeOp::Attach { child, parent }),
            1 => any::<usize>().prop_map(TreeOp::Detach),
            1 => any::<usize>().prop_map(TreeOp::Remove),
        ]
    }

    /// A sequence of tree operations.
    pub fn arb_tree_ops(max_len: usize) -> impl Strategy<Value = Vec<TreeOp>> {
        proptest::collection::vec(arb_tree_op(), 0..max_len)
    }
}
