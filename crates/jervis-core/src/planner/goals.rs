//! Goal dependency graph and its topological sort (C9 phase 1 output).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One independent piece of work the planner wants done, with its
/// dependencies on other goals from the same planning round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalsDto {
    /// Id unique within this planning round (not a persisted [`crate::ids::ObjectId`])
    pub goal_id: u32,
    /// What the goal is meant to accomplish
    pub goal_intent: String,
    /// Ids of other goals in the same round this one depends on
    pub depends_on: Vec<u32>,
}

/// Topologically sort goals: a DFS with a `visiting` set to detect cycles,
/// returning goals in an order where every goal appears after all of its
/// dependencies.
pub fn topological_sort(goals: &[GoalsDto]) -> Result<Vec<GoalsDto>> {
    let by_id: HashMap<u32, &GoalsDto> = goals.iter().map(|g| (g.goal_id, g)).collect();

    for goal in goals {
        for dep in &goal.depends_on {
            if !by_id.contains_key(dep) {
                return Err(Error::MissingDependency(format!(
                    "goal {} depends on unknown goal {}",
                    goal.goal_id, dep
                )));
            }
        }
    }

    #[derive(PartialEq, Eq, Clone, Copy)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: HashMap<u32, Mark> = HashMap::new();
    let mut order: Vec<u32> = Vec::with_capacity(goals.len());

    fn visit(
        id: u32,
        by_id: &HashMap<u32, &GoalsDto>,
        marks: &mut HashMap<u32, Mark>,
        order: &mut Vec<u32>,
        stack: &mut Vec<u32>,
    ) -> Result<()> {
        match marks.get(&id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let cycle: Vec<String> = stack.iter().map(u32::to_string).collect();
                return Err(Error::CyclicDependency(format!(
                    "cycle detected: {}",
                    cycle.join(" -> ")
                )));
            }
            None => {}
        }

        marks.insert(id, Mark::Visiting);
        stack.push(id);
        let goal = by_id[&id];
        for dep in &goal.depends_on {
            visit(*dep, by_id, marks, order, stack)?;
        }
        stack.pop();
        marks.insert(id, Mark::Done);
        order.push(id);
        Ok(())
    }

    let mut stack = Vec::new();
    for goal in goals {
        if !matches!(marks.get(&goal.goal_id), Some(Mark::Done)) {
            visit(goal.goal_id, &by_id, &mut marks, &mut order, &mut stack)?;
        }
    }

    // `order` is in completion order (dependencies first), which is exactly
    // the topological order we want to return.
    Ok(order.into_iter().map(|id| (*by_id[&id]).clone()).collect())
}

/// Goals independent of one another if they share no dependency path in
/// either direction — the executor may run these concurrently.
#[must_use]
pub fn independent_groups(goals: &[GoalsDto]) -> Vec<Vec<u32>> {
    let mut reachable: HashMap<u32, HashSet<u32>> = HashMap::new();
    let by_id: HashMap<u32, &GoalsDto> = goals.iter().map(|g| (g.goal_id, g)).collect();

    fn collect(id: u32, by_id: &HashMap<u32, &GoalsDto>, seen: &mut HashSet<u32>) {
        if let Some(goal) = by_id.get(&id) {
            for dep in &goal.depends_on {
                if seen.insert(*dep) {
                    collect(*dep, by_id, seen);
                }
            }
        }
    }

    for goal in goals {
        let mut seen = HashSet::new();
        collect(goal.goal_id, &by_id, &mut seen);
        reachable.insert(goal.goal_id, seen);
    }

    let mut visited = HashSet::new();
    let mut groups = Vec::new();
    for goal in goals {
        if visited.contains(&goal.goal_id) {
            continue;
        }
        let mut group = vec![goal.goal_id];
        visited.insert(goal.goal_id);
        for other in goals {
            if other.goal_id == goal.goal_id || visited.contains(&other.goal_id) {
                continue;
            }
            let related = reachable[&goal.goal_id].contains(&other.goal_id)
                || reachable[&other.goal_id].contains(&goal.goal_id);
            if related {
                group.push(other.goal_id);
                visited.insert(other.goal_id);
            }
        }
        groups.push(group);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(id: u32, deps: &[u32]) -> GoalsDto {
        GoalsDto {
            goal_id: id,
            goal_intent: format!("goal {id}"),
            depends_on: deps.to_vec(),
        }
    }

    #[test]
    fn sorts_dependencies_before_dependents() {
        let goals = vec![goal(1, &[2]), goal(2, &[])];
        let sorted = topological_sort(&goals).unwrap();
        let positions: HashMap<u32, usize> =
            sorted.iter().enumerate().map(|(i, g)| (g.goal_id, i)).collect();
        assert!(positions[&2] < positions[&1]);
    }

    #[test]
    fn detects_cycles() {
        let goals = vec![goal(1, &[2]), goal(2, &[1])];
        let err = topological_sort(&goals).unwrap_err();
        assert!(matches!(err, Error::CyclicDependency(_)));
    }

    #[test]
    fn detects_missing_dependency() {
        let goals = vec![goal(1, &[99])];
        let err = topological_sort(&goals).unwrap_err();
        assert!(matches!(err, Error::MissingDependency(_)));
    }

    #[test]
    fn output_is_permutation_of_input() {
        let goals = vec![goal(1, &[2]), goal(2, &[3]), goal(3, &[])];
        let sorted = topological_sort(&goals).unwrap();
        let mut ids: Vec<u32> = sorted.iter().map(|g| g.goal_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn unrelated_goals_form_separate_groups() {
        let goals = vec![goal(1, &[2]), goal(2, &[]), goal(3, &[])];
        let groups = independent_groups(&goals);
        assert_eq!(groups.len(), 2);
    }
}
