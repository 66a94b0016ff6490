use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
};

use miette::{miette, Result};
use petgraph::{algo::toposort, graph::DiGraph};

use crate::module::Module;

/// The execution order of the modules, derived from their slot declarations.
pub(crate) struct Schedule {
    /// Indices into the module list, topologically sorted.
    pub(crate) order: Vec<usize>,
}

impl Schedule {
    /// Builds the schedule: maps every slot to its unique producer, checks that all
    /// dependencies are resolvable, and topologically sorts the producer→consumer graph.
    pub(crate) fn build(modules: &[Box<dyn Module>], inputs: &HashSet<TypeId>) -> Result<Self> {
        let mut producers: HashMap<TypeId, usize> = HashMap::new();
        for (index, module) in modules.iter().enumerate() {
            for production in module.productions() {
                if inputs.contains(&production.id) {
                    return Err(miette!(
                        "module `{}` produces `{}`, which is registered as an input slot",
                        module.name(),
                        production.name
                    ));
                }
                if let Some(&other) = producers.get(&production.id) {
                    return Err(miette!(
                        "slot `{}` has two producers: `{}` and `{}`",
                        production.name,
                        modules[other].name(),
                        module.name()
                    ));
                }
                producers.insert(production.id, index);
            }
        }

        let mut graph = DiGraph::<usize, ()>::new();
        let nodes: Vec<_> = (0..modules.len()).map(|index| graph.add_node(index)).collect();

        for (index, module) in modules.iter().enumerate() {
            for dependency in module.dependencies() {
                if let Some(&producer) = producers.get(&dependency.id) {
                    graph.add_edge(nodes[producer], nodes[index], ());
                } else if !inputs.contains(&dependency.id) {
                    return Err(miette!(
                        "module `{}` depends on `{}`, which no module produces and no input provides",
                        module.name(),
                        dependency.name
                    ));
                }
            }
        }

        let sorted = toposort(&graph, None).map_err(|cycle| {
            miette!(
                "dependency cycle involving module `{}`",
                modules[graph[cycle.node_id()]].name()
            )
        })?;

        Ok(Self {
            order: sorted.into_iter().map(|node| graph[node]).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::SlotInfo;
    use crate::storage::{DataType, Database};

    #[derive(Default)]
    struct A;
    impl DataType for A {}
    #[derive(Default)]
    struct B;
    impl DataType for B {}
    #[derive(Default)]
    struct In;
    impl DataType for In {}

    struct Producer<P: DataType, D: DataType> {
        name: &'static str,
        _marker: std::marker::PhantomData<(P, D)>,
    }

    impl<P: DataType, D: DataType> Producer<P, D> {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                _marker: std::marker::PhantomData,
            }
        }
    }

    impl<P: DataType, D: DataType> Module for Producer<P, D> {
        fn name(&self) -> &'static str {
            self.name
        }

        fn dependencies(&self) -> Vec<SlotInfo> {
            vec![SlotInfo::of::<D>()]
        }

        fn productions(&self) -> Vec<SlotInfo> {
            vec![SlotInfo::of::<P>()]
        }

        fn register(&self, database: &mut Database) -> Result<()> {
            database.register_production::<P>()
        }

        fn cycle(&mut self, _database: &Database) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn producers_run_before_consumers() -> Result<()> {
        // b depends on a, added in reverse order
        let modules: Vec<Box<dyn Module>> = vec![
            Box::new(Producer::<B, A>::new("b")),
            Box::new(Producer::<A, In>::new("a")),
        ];
        let inputs = HashSet::from([TypeId::of::<In>()]);

        let schedule = Schedule::build(&modules, &inputs)?;
        assert_eq!(schedule.order, vec![1, 0]);

        Ok(())
    }

    #[test]
    fn dependency_cycle_is_rejected() {
        let modules: Vec<Box<dyn Module>> = vec![
            Box::new(Producer::<A, B>::new("a")),
            Box::new(Producer::<B, A>::new("b")),
        ];

        let result = Schedule::build(&modules, &HashSet::new());
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_producer_is_rejected() {
        let modules: Vec<Box<dyn Module>> = vec![
            Box::new(Producer::<A, In>::new("first")),
            Box::new(Producer::<A, In>::new("second")),
        ];
        let inputs = HashSet::from([TypeId::of::<In>()]);

        let result = Schedule::build(&modules, &inputs);
        assert!(result.is_err());
    }

    #[test]
    fn unresolved_dependency_is_rejected() {
        let modules: Vec<Box<dyn Module>> = vec![Box::new(Producer::<A, B>::new("a"))];

        let result = Schedule::build(&modules, &HashSet::new());
        assert!(result.is_err());
    }
}
