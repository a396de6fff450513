// src/graph/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::graph::builtin::builtin_targets;
use crate::graph::target::{Target, TargetName};

/// Validated, immutable target graph.
///
/// Construction fails on duplicate names, dangling or self edges, and
/// cycles, so every graph that exists is a DAG.
#[derive(Debug, Clone)]
pub struct TargetGraph {
    /// Targets in declaration order.
    targets: Vec<Target>,
    index: HashMap<TargetName, usize>,
}

impl TargetGraph {
    pub fn new(targets: Vec<Target>) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, target) in targets.iter().enumerate() {
            if index.insert(target.name.clone(), i).is_some() {
                return Err(PipelineError::DuplicateTarget(target.name.clone()));
            }
        }

        let graph = Self { targets, index };
        graph.validate_edges()?;
        graph.validate_acyclic()?;
        debug!(targets = graph.targets.len(), "target graph validated");
        Ok(graph)
    }

    /// The built-in graph, with no project customisation.
    pub fn standard() -> Result<Self> {
        Self::new(builtin_targets())
    }

    /// The built-in graph merged with `[target.<name>]` sections.
    ///
    /// A config target with a built-in name replaces the built-in one in
    /// place; other config targets are appended in name order.
    pub fn with_config(cfg: &ConfigFile) -> Result<Self> {
        let mut targets = builtin_targets();
        for (name, tc) in cfg.target.iter() {
            let target = Target::from_config(name, tc);
            match targets.iter_mut().find(|t| &t.name == name) {
                Some(existing) => {
                    debug!(target = %name, "config overrides built-in target");
                    *existing = target;
                }
                None => targets.push(target),
            }
        }
        Self::new(targets)
    }

    pub fn get(&self, name: &str) -> Result<&Target> {
        self.index
            .get(name)
            .map(|&i| &self.targets[i])
            .ok_or_else(|| PipelineError::UnknownTarget(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All targets in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// Immediate prerequisites of a target, in declared order.
    pub fn prerequisites_of(&self, name: &str) -> &[TargetName] {
        self.index
            .get(name)
            .map(|&i| self.targets[i].prerequisites.as_slice())
            .unwrap_or(&[])
    }

    /// The prerequisite closure of `name` in execution order, ending with
    /// `name` itself.
    ///
    /// Depth-first post-order over declared prerequisite order, so the first
    /// declared prerequisite (and its own closure) runs first and shared
    /// prerequisites appear once, at their earliest position.
    pub fn closure(&self, name: &str) -> Result<Vec<TargetName>> {
        self.get(name)?;

        let mut order = Vec::new();
        let mut done: HashSet<&str> = HashSet::new();
        let mut on_stack: Vec<&str> = Vec::new();
        self.visit(name, &mut done, &mut on_stack, &mut order)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        done: &mut HashSet<&'a str>,
        on_stack: &mut Vec<&'a str>,
        order: &mut Vec<TargetName>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        if on_stack.contains(&name) {
            // Unreachable for graphs built through `new`, which rejects
            // cycles up front.
            return Err(PipelineError::Cycle(format!(
                "cycle detected in target graph: {} -> {}",
                on_stack.join(" -> "),
                name
            )));
        }

        on_stack.push(name);
        for dep in self.prerequisites_of(name) {
            self.visit(dep, done, on_stack, order)?;
        }
        on_stack.pop();

        done.insert(name);
        order.push(name.to_string());
        Ok(())
    }

    fn validate_edges(&self) -> Result<()> {
        for target in &self.targets {
            for dep in &target.prerequisites {
                if dep == &target.name {
                    return Err(PipelineError::SelfDependency(target.name.clone()));
                }
                if !self.index.contains_key(dep) {
                    return Err(PipelineError::UnknownPrerequisite {
                        target: target.name.clone(),
                        prerequisite: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_acyclic(&self) -> Result<()> {
        // Edge direction: prerequisite -> target.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for target in &self.targets {
            graph.add_node(target.name.as_str());
        }
        for target in &self.targets {
            for dep in &target.prerequisites {
                graph.add_edge(dep.as_str(), target.name.as_str(), ());
            }
        }

        // A topological sort will fail if there is a cycle.
        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(PipelineError::Cycle(format!(
                "cycle detected in target graph involving target '{}'",
                cycle.node_id()
            ))),
        }
    }
}
