//! Squad-versus-squad battle resolution.
//!
//! A battle runs in rounds until one side is fully incapacitated or the
//! agents retreat. Each round every living agent attacks once, strongest
//! first, then every living enemy does the same.
//!
//! # Contest roll
//!
//! ```text
//! success_probability = 1 / (1 + (defender / attacker)^2)
//! failure_probability = defender^2 / (attacker^2 + defender^2)   (floored to the fixed scale)
//! success             = roll > failure_probability                (strictly)
//! ```
//!
//! # Retreat
//!
//! Agents withdraw after a round when both hold:
//! - their current total effective skill is below 50% of the battle-start total
//! - the surviving enemies' total is at least 80% of the agents' current total
//!
//! Skill rewards earned by agents are accumulated in the [`BattleReport`]
//! and applied by the caller once the battle is over.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{AgentId, Combatant, EnemyId};
use crate::config::Rules;
use crate::math::Fixed;
use crate::random::{RandomSource, RollChannel};
use crate::skill::effective_skill;
use crate::targeting::{select_target, TargetCandidate};

/// Agents retreat when below this share (percent) of their starting skill...
pub const RETREAT_AGENT_SKILL_PCT: i128 = 50;

/// ...and the enemy holds at least this share (percent) of the agents' current skill.
pub const RETREAT_ENEMY_SKILL_PCT: i128 = 80;

/// Hard stop for battles that cannot progress (every roll forced to fail).
/// Reaching it counts as a retreat.
pub const MAX_BATTLE_ROUNDS: u32 = 1_000;

/// Summary of a finished battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleReport {
    /// Rounds fought.
    pub rounds: u32,
    /// Whether the agents retreated.
    pub retreated: bool,
    /// Agents that entered the battle.
    pub agents_deployed: usize,
    /// Agents that survived with fewer hit points than they started with.
    pub agents_wounded: usize,
    /// Agents reduced to zero hit points.
    pub agents_terminated: usize,
    /// Enemies that entered the battle.
    pub enemies_deployed: usize,
    /// Enemies that survived with fewer hit points than they started with.
    pub enemies_wounded: usize,
    /// Enemies reduced to zero hit points.
    pub enemies_terminated: usize,
    /// Total effective skill of the agents at battle start.
    pub initial_agent_skill: Fixed,
    /// Total effective skill of the enemies at battle start.
    pub initial_enemy_skill: Fixed,
    /// Skill rewards earned per agent.
    pub agent_skill_gains: BTreeMap<AgentId, Fixed>,
    /// Enemy that landed each agent's killing blow.
    pub agent_killed_by: BTreeMap<AgentId, EnemyId>,
    /// Damage dealt by agents.
    pub damage_inflicted: Fixed,
    /// Damage dealt to agents.
    pub damage_taken: Fixed,
}

impl BattleReport {
    /// Agents still standing.
    #[must_use]
    pub fn agents_surviving(&self) -> usize {
        self.agents_deployed - self.agents_terminated
    }

    /// Enemies still standing.
    #[must_use]
    pub fn enemies_surviving(&self) -> usize {
        self.enemies_deployed - self.enemies_terminated
    }

    /// Whether every enemy was incapacitated.
    #[must_use]
    pub fn all_enemies_down(&self) -> bool {
        self.enemies_surviving() == 0
    }
}

/// Result of a single attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    /// Whether the contest roll succeeded.
    pub success: bool,
    /// Hit points actually removed from the defender.
    pub damage: Fixed,
    /// Whether the defender dropped to zero hit points.
    pub defender_killed: bool,
    /// Skill reward earned by the attacker.
    pub attacker_skill_gain: Fixed,
    /// Skill reward earned by the defender.
    pub defender_skill_gain: Fixed,
}

/// Failure probability of an attack, floored to the fixed-point scale.
#[must_use]
pub fn failure_probability(attacker_skill: Fixed, defender_skill: Fixed) -> Fixed {
    let attacker = i128::from(attacker_skill.non_negative().raw());
    let defender = i128::from(defender_skill.non_negative().raw());
    let denominator = attacker * attacker + defender * defender;
    if denominator == 0 {
        return Fixed::from_raw(Fixed::SCALE / 2);
    }
    let raw = defender * defender * i128::from(Fixed::SCALE) / denominator;
    Fixed::from_raw(raw as i64)
}

/// Resolve one attack, mutating both combatants.
pub fn resolve_attack<A, D>(
    attacker: &mut A,
    defender: &mut D,
    rules: &Rules,
    rng: &mut RandomSource,
) -> AttackOutcome
where
    A: Combatant + ?Sized,
    D: Combatant + ?Sized,
{
    let failure = failure_probability(
        effective_skill(attacker.actor()),
        effective_skill(defender.actor()),
    );
    let roll = rng.get_fixed(RollChannel::ContestRoll);
    attacker.actor_mut().exhaustion += Fixed::ONE;

    if roll > failure {
        let weapon = attacker.actor().weapon;
        let rolled = rng.int_inclusive(RollChannel::DamageRoll, weapon.min_damage, weapon.max_damage);
        let defender_actor = defender.actor_mut();
        let damage = defender_actor.take_damage(Fixed::from_int(rolled));
        let defender_killed = !defender_actor.is_alive();
        if !defender_killed {
            defender_actor.exhaustion += Fixed::ONE;
        }
        AttackOutcome {
            success: true,
            damage,
            defender_killed,
            attacker_skill_gain: rules.successful_attack_skill_reward,
            defender_skill_gain: rules.failed_defense_skill_reward,
        }
    } else {
        defender.actor_mut().exhaustion += Fixed::ONE;
        AttackOutcome {
            success: false,
            damage: Fixed::ZERO,
            defender_killed: false,
            attacker_skill_gain: rules.failed_attack_skill_reward,
            defender_skill_gain: rules.successful_defense_skill_reward,
        }
    }
}

/// Total effective skill of the living members of a side.
fn total_skill<C: Combatant>(side: &[C]) -> Fixed {
    side.iter()
        .filter(|c| c.actor().is_alive())
        .map(|c| effective_skill(c.actor()))
        .sum()
}

fn any_alive<C: Combatant>(side: &[C]) -> bool {
    side.iter().any(|c| c.actor().is_alive())
}

/// Retreat rule. Both conditions must hold.
#[must_use]
pub fn should_retreat(
    initial_agent_skill: Fixed,
    current_agent_skill: Fixed,
    current_enemy_skill: Fixed,
) -> bool {
    let initial = i128::from(initial_agent_skill.raw());
    let agents = i128::from(current_agent_skill.raw());
    let enemies = i128::from(current_enemy_skill.raw());

    let agents_weakened = agents * 100 < initial * RETREAT_AGENT_SKILL_PCT;
    let enemy_holds = enemies * 100 >= agents * RETREAT_ENEMY_SKILL_PCT;
    agents_weakened && enemy_holds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Agents,
    Enemies,
}

/// Bookkeeping shared by both halves of a round.
struct BattleLedger<'a> {
    rules: &'a Rules,
    report: BattleReport,
}

impl BattleLedger<'_> {
    fn record(&mut self, side: Side, attacker: u32, defender: u32, outcome: &AttackOutcome) {
        match side {
            Side::Agents => {
                self.report.damage_inflicted += outcome.damage;
                *self
                    .report
                    .agent_skill_gains
                    .entry(AgentId(attacker))
                    .or_default() += outcome.attacker_skill_gain;
            }
            Side::Enemies => {
                self.report.damage_taken += outcome.damage;
                *self
                    .report
                    .agent_skill_gains
                    .entry(AgentId(defender))
                    .or_default() += outcome.defender_skill_gain;
                if outcome.defender_killed {
                    self.report
                        .agent_killed_by
                        .insert(AgentId(defender), EnemyId(attacker));
                }
            }
        }
    }

    /// One side attacks once with every living member.
    fn attack_phase<A: Combatant, D: Combatant>(
        &mut self,
        side: Side,
        attackers: &mut [A],
        defenders: &mut [D],
        frozen_attackers: &[Fixed],
        frozen_defenders: &[Fixed],
        rng: &mut RandomSource,
    ) {
        let mut order: Vec<usize> = (0..attackers.len())
            .filter(|&i| attackers[i].actor().is_alive())
            .collect();
        order.sort_by_key(|&i| {
            (
                std::cmp::Reverse(effective_skill(attackers[i].actor())),
                attackers[i].ordinal(),
            )
        });

        let mut attack_counts = vec![0_u32; defenders.len()];
        for attacker_index in order {
            if !attackers[attacker_index].actor().is_alive() {
                continue;
            }
            let candidates: Vec<TargetCandidate> = defenders
                .iter()
                .enumerate()
                .filter(|(_, d)| d.actor().is_alive())
                .map(|(index, d)| TargetCandidate {
                    index,
                    ordinal: d.ordinal(),
                    frozen_skill: frozen_defenders[index],
                    hit_points: d.actor().hit_points,
                    max_hit_points: d.actor().max_hit_points,
                    attack_count: attack_counts[index],
                })
                .collect();
            let Some(target) = select_target(&candidates, frozen_attackers[attacker_index], rng)
            else {
                break;
            };
            attack_counts[target] += 1;

            let attacker = &mut attackers[attacker_index];
            let defender = &mut defenders[target];
            let outcome = resolve_attack(attacker, defender, self.rules, rng);
            self.record(side, attacker.ordinal(), defender.ordinal(), &outcome);
        }
    }
}

/// Count wounded and terminated members of a side against pre-battle hit points.
fn casualties<C: Combatant>(side: &[C], initial_hit_points: &[Fixed]) -> (usize, usize) {
    side.iter()
        .zip(initial_hit_points)
        .fold((0, 0), |(wounded, terminated), (c, &before)| {
            let hp = c.actor().hit_points;
            if !hp.is_positive() {
                (wounded, terminated + 1)
            } else if hp < before {
                (wounded + 1, terminated)
            } else {
                (wounded, terminated)
            }
        })
}

/// Fight a battle to its conclusion.
///
/// Both slices are mutated in place: hit points and exhaustion change as the
/// battle progresses. Skill rewards are only reported, not applied.
pub fn resolve_battle<A: Combatant, E: Combatant>(
    agents: &mut [A],
    enemies: &mut [E],
    rules: &Rules,
    rng: &mut RandomSource,
) -> BattleReport {
    let agent_hit_points: Vec<Fixed> = agents.iter().map(|a| a.actor().hit_points).collect();
    let enemy_hit_points: Vec<Fixed> = enemies.iter().map(|e| e.actor().hit_points).collect();

    let mut ledger = BattleLedger {
        rules,
        report: BattleReport {
            agents_deployed: agents.len(),
            enemies_deployed: enemies.len(),
            initial_agent_skill: total_skill(agents),
            initial_enemy_skill: total_skill(enemies),
            ..BattleReport::default()
        },
    };

    while any_alive(agents) && any_alive(enemies) {
        if ledger.report.rounds >= MAX_BATTLE_ROUNDS {
            tracing::warn!(rounds = ledger.report.rounds, "Battle stalled, agents withdraw");
            ledger.report.retreated = true;
            break;
        }
        ledger.report.rounds += 1;

        let frozen_agents: Vec<Fixed> = agents.iter().map(|a| effective_skill(a.actor())).collect();
        let frozen_enemies: Vec<Fixed> = enemies.iter().map(|e| effective_skill(e.actor())).collect();

        ledger.attack_phase(Side::Agents, agents, enemies, &frozen_agents, &frozen_enemies, rng);
        ledger.attack_phase(Side::Enemies, enemies, agents, &frozen_enemies, &frozen_agents, rng);

        let agent_skill = total_skill(agents);
        let enemy_skill = total_skill(enemies);
        tracing::debug!(
            round = ledger.report.rounds,
            agent_skill = %agent_skill,
            enemy_skill = %enemy_skill,
            "Battle round resolved"
        );

        if any_alive(agents)
            && any_alive(enemies)
            && should_retreat(ledger.report.initial_agent_skill, agent_skill, enemy_skill)
        {
            ledger.report.retreated = true;
            break;
        }
    }

    let mut report = ledger.report;
    (report.agents_wounded, report.agents_terminated) = casualties(agents, &agent_hit_points);
    (report.enemies_wounded, report.enemies_terminated) = casualties(enemies, &enemy_hit_points);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Actor, Agent, Weapon};
    use crate::enemies::{Enemy, EnemyKind};

    fn agent(id: u32, skill: i64, hp: i64, damage: i64) -> Agent {
        Agent::hired(
            AgentId(id),
            1,
            Actor::new(Fixed::from_int(skill), Fixed::from_int(hp), Weapon::new(damage)),
        )
    }

    fn enemy(id: u32, skill: i64, hp: i64) -> Enemy {
        let mut enemy = Enemy::new(EnemyId(id), EnemyKind::Initiate);
        enemy.actor = Actor::new(Fixed::from_int(skill), Fixed::from_int(hp), Weapon::new(8));
        enemy
    }

    #[test]
    fn test_failure_probability() {
        // 50^2 / (200^2 + 50^2) = 2500 / 42500 = 0.058823
        assert_eq!(
            failure_probability(Fixed::from_int(200), Fixed::from_int(50)),
            Fixed::from_raw(58_823)
        );
        assert_eq!(
            failure_probability(Fixed::from_int(100), Fixed::from_int(100)),
            Fixed::from_raw(500_000)
        );
        assert_eq!(failure_probability(Fixed::ZERO, Fixed::from_int(10)), Fixed::ONE);
        assert_eq!(failure_probability(Fixed::ZERO, Fixed::ZERO), Fixed::from_raw(500_000));
    }

    #[test]
    fn test_attack_success_rewards_and_exhaustion() {
        let rules = Rules::default();
        let mut rng = RandomSource::seeded(0);
        rng.set(RollChannel::ContestRoll, 1.0).unwrap();
        rng.set(RollChannel::DamageRoll, 0.0).unwrap();
        let mut attacker = agent(1, 100, 30, 10);
        let mut defender = enemy(1, 50, 20);

        let outcome = resolve_attack(&mut attacker, &mut defender, &rules, &mut rng);
        assert!(outcome.success);
        assert_eq!(outcome.damage, Fixed::from_int(5));
        assert_eq!(defender.actor.hit_points, Fixed::from_int(15));
        assert_eq!(attacker.actor.exhaustion, Fixed::ONE);
        assert_eq!(defender.actor.exhaustion, Fixed::ONE);
        assert_eq!(outcome.attacker_skill_gain, rules.successful_attack_skill_reward);
        assert_eq!(outcome.defender_skill_gain, rules.failed_defense_skill_reward);
    }

    #[test]
    fn test_attack_failure_on_exact_threshold() {
        let rules = Rules::default();
        let mut rng = RandomSource::seeded(0);
        // Equal skills: failure probability exactly 0.5; a roll of 0.5 is not strictly greater
        rng.set(RollChannel::ContestRoll, 0.5).unwrap();
        let mut attacker = agent(1, 100, 30, 10);
        let mut defender = enemy(1, 100, 20);

        let outcome = resolve_attack(&mut attacker, &mut defender, &rules, &mut rng);
        assert!(!outcome.success);
        assert_eq!(defender.actor.hit_points, Fixed::from_int(20));
        assert_eq!(attacker.actor.exhaustion, Fixed::ONE);
        assert_eq!(defender.actor.exhaustion, Fixed::ONE);
        assert_eq!(outcome.defender_skill_gain, rules.successful_defense_skill_reward);
    }

    #[test]
    fn test_killed_defender_gains_no_exhaustion() {
        let rules = Rules::default();
        let mut rng = RandomSource::seeded(0);
        rng.set_all(1.0).unwrap();
        let mut attacker = agent(1, 100, 30, 20);
        let mut defender = enemy(1, 50, 10);

        let outcome = resolve_attack(&mut attacker, &mut defender, &rules, &mut rng);
        assert!(outcome.defender_killed);
        assert_eq!(defender.actor.hit_points, Fixed::ZERO);
        assert_eq!(defender.actor.exhaustion, Fixed::ZERO);
        assert_eq!(outcome.damage, Fixed::from_int(10));
    }

    #[test]
    fn test_forced_success_battle_ends_in_first_round() {
        let rules = Rules::default();
        let mut rng = RandomSource::seeded(0);
        rng.set_all(1.0).unwrap();
        let mut agents = vec![agent(1, 200, 30, 20)];
        let mut enemies = vec![enemy(1, 50, 10)];

        let report = resolve_battle(&mut agents, &mut enemies, &rules, &mut rng);
        assert!(report.rounds <= 2);
        assert_eq!(report.enemies_terminated, 1);
        assert_eq!(report.agents_terminated, 0);
        assert_eq!(report.agents_wounded, 0);
        assert!(!report.retreated);
        assert_eq!(agents[0].actor.hit_points, Fixed::from_int(30));
        assert_eq!(
            report.agent_skill_gains.get(&AgentId(1)),
            Some(&rules.successful_attack_skill_reward)
        );
    }

    #[test]
    fn test_strongest_agent_attacks_first() {
        let rules = Rules::default();
        let mut rng = RandomSource::seeded(0);
        rng.set_all(1.0).unwrap();
        // Only one enemy; whoever attacks first kills it.
        let mut agents = vec![agent(1, 100, 30, 20), agent(2, 150, 30, 20)];
        let mut enemies = vec![enemy(1, 50, 10)];

        let report = resolve_battle(&mut agents, &mut enemies, &rules, &mut rng);
        assert_eq!(report.rounds, 1);
        assert!(report.agent_skill_gains.contains_key(&AgentId(2)));
        assert!(!report.agent_skill_gains.contains_key(&AgentId(1)));
        assert_eq!(agents[0].actor.exhaustion, Fixed::ZERO);
    }

    #[test]
    fn test_retreat_requires_both_conditions() {
        let initial = Fixed::from_int(1000);
        // Weakened and outmatched
        assert!(should_retreat(initial, Fixed::from_int(400), Fixed::from_int(320)));
        // Weakened but the enemy is crippled too
        assert!(!should_retreat(initial, Fixed::from_int(400), Fixed::from_int(319)));
        // Outmatched but not weakened enough
        assert!(!should_retreat(initial, Fixed::from_int(500), Fixed::from_int(900)));
    }

    #[test]
    fn test_conservation_and_no_negative_hp() {
        let rules = Rules::default();
        for seed in 0..20 {
            let mut rng = RandomSource::seeded(seed);
            let mut agents = vec![agent(1, 100, 30, 10), agent(2, 90, 30, 10), agent(3, 110, 30, 10)];
            let mut enemies = vec![enemy(1, 60, 25), enemy(2, 100, 30), enemy(3, 80, 25), enemy(4, 40, 20)];

            let report = resolve_battle(&mut agents, &mut enemies, &rules, &mut rng);
            let surviving_agents = agents.iter().filter(|a| a.actor.is_alive()).count();
            let surviving_enemies = enemies.iter().filter(|e| e.actor.is_alive()).count();
            assert_eq!(report.agents_terminated + surviving_agents, report.agents_deployed);
            assert_eq!(report.enemies_terminated + surviving_enemies, report.enemies_deployed);
            assert!(agents.iter().all(|a| !a.actor.hit_points.is_negative()));
            assert!(enemies.iter().all(|e| !e.actor.hit_points.is_negative()));
            assert!(report.retreated || surviving_agents == 0 || surviving_enemies == 0);
        }
    }

    #[test]
    fn test_stalled_battle_ends_as_retreat() {
        let rules = Rules::default();
        let mut rng = RandomSource::seeded(0);
        // Every contest fails; exhaustion eventually drains both sides.
        rng.set(RollChannel::ContestRoll, 0.0).unwrap();
        let mut agents = vec![agent(1, 100, 30, 10)];
        let mut enemies = vec![enemy(1, 100, 30)];

        let report = resolve_battle(&mut agents, &mut enemies, &rules, &mut rng);
        assert!(report.retreated);
        assert_eq!(report.agents_terminated, 0);
        assert_eq!(report.enemies_terminated, 0);
    }
}
