// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Flattens a [`Group`] tree into an evaluable model.
//!
//! # Pipeline
//!
//! 1. **Declaration**: every component fills its variable registry and
//!    declares its Jacobian structure, in tree order.
//! 2. **Name resolution**: bottom-up, each group renames its children's
//!    variables through its promotions, ties together variables that end up
//!    sharing a name, then applies its explicit connections and input
//!    defaults.
//! 3. **Slot allocation**: one slot per output and one per family of
//!    unconnected inputs; every name resolves to a slot through the
//!    [`SymbolTable`].
//! 4. **Ordering**: the component dependency graph is checked for cycles and
//!    sorted.
//!
//! Structural errors from steps 1 and 2 are accumulated and reported
//! together; ordering is only attempted on a structurally valid model.

use super::group::{ComponentNode, Connection, Group, InputDefault, Node, Promotion};
use super::symbols::{DiscreteSlotId, DiscreteSlotInfo, SlotId, SlotInfo, SlotOwner, Symbol, SymbolTable};
use super::validation::{topological_levels, topological_order, validate_acyclic, DependencyGraph};
use crate::errors::{unit_label, AssemblyError};
use crate::jacobian::{Differentiation, Partials, Sparsity};
use crate::observability::messages::assembly::{AmbiguousInputDefault, ComponentDeclared, ModelAssembled};
use crate::observability::messages::StructuredLog;
use crate::traits::Component;
use crate::variables::registry::validate_name;
use crate::variables::{VarKind, VariableMeta, VariableRegistry};
use std::collections::HashMap;

/// A component placed in the flattened model.
pub struct FlatComponent {
    pub path: String,
    pub component: Box<dyn Component>,
    pub differentiation: Differentiation,
    pub vars: VariableRegistry,
    /// Zero-filled declared blocks, cloned for every Jacobian evaluation.
    pub partials: Partials,
    pub inputs: Vec<(String, SlotId)>,
    pub outputs: Vec<(String, SlotId)>,
    pub discrete_inputs: Vec<(String, DiscreteSlotId)>,
    pub discrete_outputs: Vec<(String, DiscreteSlotId)>,
}

impl FlatComponent {
    pub fn input_slot(&self, local: &str) -> Option<SlotId> {
        self.inputs
            .iter()
            .find(|(name, _)| name == local)
            .map(|(_, slot)| *slot)
    }

    pub fn output_slot(&self, local: &str) -> Option<SlotId> {
        self.outputs
            .iter()
            .find(|(name, _)| name == local)
            .map(|(_, slot)| *slot)
    }
}

/// The result of assembly: components, resolved names and evaluation order.
pub struct AssembledModel {
    pub components: Vec<FlatComponent>,
    pub symbols: SymbolTable,
    pub graph: DependencyGraph,
    /// Component indices in evaluation order.
    pub order: Vec<usize>,
    /// Component indices grouped into mutually independent levels.
    pub levels: Vec<Vec<usize>>,
}

/// Flatten `root` into an [`AssembledModel`].
pub fn assemble(root: Group) -> Result<AssembledModel, Vec<AssemblyError>> {
    let mut assembler = Assembler::default();
    let entries = assembler.collect(root, "");
    assembler.finish(entries)
}

struct FlatVar {
    path: String,
    component: usize,
    meta: VariableMeta,
}

/// A variable as seen from one group: its name there and its global index.
struct Entry {
    visible: String,
    var: usize,
}

struct PendingComponent {
    path: String,
    node: ComponentNode,
    vars: VariableRegistry,
    partials: Partials,
    var_ids: Vec<usize>,
}

#[derive(Default)]
struct Assembler {
    components: Vec<PendingComponent>,
    vars: Vec<FlatVar>,
    /// Union-find parent links over `vars`; inputs sharing a value are joined.
    parent: Vec<usize>,
    /// Source output of each input family, keyed by family root.
    sources: HashMap<usize, usize>,
    defaults: Vec<(usize, InputDefault)>,
    errors: Vec<AssemblyError>,
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn scope(path: &str) -> String {
    if path.is_empty() {
        "<model>".to_string()
    } else {
        path.to_string()
    }
}

impl Assembler {
    fn collect(&mut self, group: Group, path: &str) -> Vec<Entry> {
        let Group {
            children,
            connections,
            promotions,
            input_defaults,
        } = group;

        let mut entries = Vec::new();
        for (name, node) in children {
            let child_path = join(path, &name);
            let child_entries = match node {
                Node::Component(node) => self.add_component(&child_path, node),
                Node::Group(group) => self.collect(group, &child_path),
            };
            entries.extend(child_entries.into_iter().map(|e| Entry {
                visible: format!("{}.{}", name, e.visible),
                var: e.var,
            }));
        }

        self.apply_promotions(path, &promotions, &mut entries);
        self.merge_shared_names(path, &entries);
        for connection in &connections {
            self.apply_connection(path, connection, &entries);
        }
        for (name, default) in input_defaults {
            self.apply_default(path, &name, default, &entries);
        }
        entries
    }

    fn add_component(&mut self, path: &str, node: ComponentNode) -> Vec<Entry> {
        let index = self.components.len();
        let mut vars = VariableRegistry::new(path);
        if let Err(err) = node.component.declare(&mut vars) {
            self.errors.push(err);
        }

        let mut sparsity = Sparsity::new();
        node.component.declare_partials(&vars, &mut sparsity);
        let partials = match sparsity.validate(&vars) {
            Ok(partials) => partials,
            Err(errors) => {
                self.errors.extend(errors);
                Partials::new(path)
            }
        };

        let mut entries = Vec::with_capacity(vars.len());
        let mut var_ids = Vec::with_capacity(vars.len());
        for meta in vars.iter() {
            let id = self.vars.len();
            self.vars.push(FlatVar {
                path: join(path, &meta.name),
                component: index,
                meta: meta.clone(),
            });
            self.parent.push(id);
            var_ids.push(id);
            entries.push(Entry {
                visible: meta.name.clone(),
                var: id,
            });
        }

        ComponentDeclared {
            path,
            kind: node.component.name(),
            variables: vars.len(),
        }
        .log();
        self.components.push(PendingComponent {
            path: path.to_string(),
            node,
            vars,
            partials,
            var_ids,
        });
        entries
    }

    fn apply_promotions(&mut self, path: &str, promotions: &[Promotion], entries: &mut [Entry]) {
        let group = scope(path);
        let mut usable = vec![true; promotions.len()];
        for (i, promotion) in promotions.iter().enumerate() {
            let check = match promotion.wildcard_prefix() {
                Some(_) if promotion.external != "*" => Err(AssemblyError::InvalidName {
                    scope: group.clone(),
                    name: promotion.external.clone(),
                    reason: "wildcard promotions keep the child's own names".to_string(),
                }),
                Some(_) => Ok(()),
                None => validate_name(&group, &promotion.external),
            };
            if let Err(err) = check {
                self.errors.push(err);
                usable[i] = false;
            }
        }

        let mut matched = vec![false; promotions.len()];
        let mut renamed = vec![false; entries.len()];

        // explicit names take precedence over wildcards
        for (i, promotion) in promotions.iter().enumerate() {
            if !usable[i] || promotion.wildcard_prefix().is_some() {
                continue;
            }
            for (k, entry) in entries.iter_mut().enumerate() {
                if !renamed[k] && entry.visible == promotion.child_path {
                    entry.visible = promotion.external.clone();
                    renamed[k] = true;
                    matched[i] = true;
                }
            }
        }
        for (i, promotion) in promotions.iter().enumerate() {
            let Some(prefix) = promotion.wildcard_prefix().filter(|_| usable[i]) else {
                continue;
            };
            for (k, entry) in entries.iter_mut().enumerate() {
                if renamed[k] {
                    continue;
                }
                if let Some(rest) = entry.visible.strip_prefix(prefix).filter(|r| !r.is_empty()) {
                    entry.visible = rest.to_string();
                    renamed[k] = true;
                    matched[i] = true;
                }
            }
        }

        for (i, promotion) in promotions.iter().enumerate() {
            if usable[i] && !matched[i] {
                self.errors.push(AssemblyError::UnresolvedPath {
                    group: group.clone(),
                    path: promotion.child_path.clone(),
                    expected: "a child variable",
                });
            }
        }
    }

    /// Variables that share a visible name share a value: one output drives
    /// all inputs, or the inputs become one family.
    fn merge_shared_names(&mut self, path: &str, entries: &[Entry]) {
        let mut order: Vec<&str> = Vec::new();
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for entry in entries {
            let members = by_name.entry(entry.visible.as_str()).or_default();
            if members.is_empty() {
                order.push(entry.visible.as_str());
            }
            members.push(entry.var);
        }

        for name in order {
            let members = &by_name[name];
            if members.len() < 2 {
                continue;
            }
            let label = join(path, name);
            let outputs: Vec<usize> = members
                .iter()
                .copied()
                .filter(|&v| !self.vars[v].meta.kind.is_input())
                .collect();
            if outputs.len() > 1 {
                self.errors.push(AssemblyError::MultipleSources {
                    input: label,
                    existing: self.vars[outputs[0]].path.clone(),
                    source_name: self.vars[outputs[1]].path.clone(),
                });
                continue;
            }

            let anchor = outputs.first().copied().unwrap_or(members[0]);
            if !members
                .iter()
                .all(|&m| m == anchor || self.check_compatible(anchor, m))
            {
                continue;
            }

            let inputs: Vec<usize> = members
                .iter()
                .copied()
                .filter(|&v| self.vars[v].meta.kind.is_input())
                .collect();
            match outputs.first() {
                Some(&output) => {
                    for input in inputs {
                        self.bind(input, output, false, &label);
                    }
                }
                None => {
                    for pair in inputs.windows(2) {
                        self.union(pair[0], pair[1], &label);
                    }
                }
            }
        }
    }

    fn apply_connection(&mut self, path: &str, connection: &Connection, entries: &[Entry]) {
        let group = scope(path);
        let named = |name: &str, want_input: bool| -> Vec<usize> {
            entries
                .iter()
                .filter(|e| e.visible == name && self.vars[e.var].meta.kind.is_input() == want_input)
                .map(|e| e.var)
                .collect()
        };
        let sources = named(&connection.source, false);
        let targets = named(&connection.target, true);

        let source = match sources.as_slice() {
            [single] => *single,
            [] => {
                self.errors.push(AssemblyError::UnresolvedPath {
                    group,
                    path: connection.source.clone(),
                    expected: "an output",
                });
                return;
            }
            // several outputs under one name were already reported
            _ => return,
        };
        if targets.is_empty() {
            self.errors.push(AssemblyError::UnresolvedPath {
                group,
                path: connection.target.clone(),
                expected: "an input",
            });
            return;
        }
        if !targets.iter().all(|&t| self.check_compatible(source, t)) {
            return;
        }

        let mut roots = Vec::new();
        for target in targets {
            let root = self.find(target);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        let label = join(path, &connection.target);
        for root in roots {
            self.bind(root, source, true, &label);
        }
    }

    fn apply_default(&mut self, path: &str, name: &str, default: InputDefault, entries: &[Entry]) {
        let targets: Vec<usize> = entries
            .iter()
            .filter(|e| e.visible == name && self.vars[e.var].meta.kind.is_input())
            .map(|e| e.var)
            .collect();
        if targets.is_empty() {
            self.errors.push(AssemblyError::UnresolvedPath {
                group: scope(path),
                path: name.to_string(),
                expected: "an input",
            });
            return;
        }

        let label = format!("input default for '{}'", join(path, name));
        for &target in &targets {
            let var = &self.vars[target];
            let error = match (&default, var.meta.kind) {
                (InputDefault::Continuous(v), VarKind::Input) if v.len() != var.meta.size() => {
                    Some(AssemblyError::ShapeMismatch {
                        lhs: var.path.clone(),
                        lhs_size: var.meta.size(),
                        rhs: label.clone(),
                        rhs_size: v.len(),
                    })
                }
                (InputDefault::Continuous(_), VarKind::Input) | (InputDefault::Discrete(_), VarKind::DiscreteInput) => None,
                _ => Some(AssemblyError::KindMismatch {
                    lhs: var.path.clone(),
                    rhs: label.clone(),
                    reason: "continuous and discrete values cannot be mixed".to_string(),
                }),
            };
            match error {
                Some(err) => {
                    self.errors.push(err);
                    return;
                }
                None => self.defaults.push((target, default.clone())),
            }
        }
    }

    fn check_compatible(&mut self, a: usize, b: usize) -> bool {
        let (va, vb) = (&self.vars[a], &self.vars[b]);
        let error = if va.meta.kind.is_discrete() != vb.meta.kind.is_discrete() {
            Some(AssemblyError::KindMismatch {
                lhs: va.path.clone(),
                rhs: vb.path.clone(),
                reason: format!("{} and {} cannot share a value", va.meta.kind.label(), vb.meta.kind.label()),
            })
        } else if va.meta.units != vb.meta.units {
            Some(AssemblyError::UnitMismatch {
                lhs: va.path.clone(),
                lhs_unit: unit_label(va.meta.units()),
                rhs: vb.path.clone(),
                rhs_unit: unit_label(vb.meta.units()),
            })
        } else if va.meta.size() != vb.meta.size() {
            Some(AssemblyError::ShapeMismatch {
                lhs: va.path.clone(),
                lhs_size: va.meta.size(),
                rhs: vb.path.clone(),
                rhs_size: vb.meta.size(),
            })
        } else {
            None
        };
        match error {
            Some(err) => {
                self.errors.push(err);
                false
            }
            None => true,
        }
    }

    fn find(&mut self, var: usize) -> usize {
        let mut root = var;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = var;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize, label: &str) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (sa, sb) = (self.sources.get(&ra).copied(), self.sources.get(&rb).copied());
        if let (Some(x), Some(y)) = (sa, sb) {
            if x != y {
                self.errors.push(AssemblyError::MultipleSources {
                    input: label.to_string(),
                    existing: self.vars[x].path.clone(),
                    source_name: self.vars[y].path.clone(),
                });
                return;
            }
        }
        self.parent[rb] = ra;
        if let Some(source) = self.sources.remove(&rb) {
            self.sources.insert(ra, source);
        }
    }

    /// Attach `output` as the source of the family of `input`. Explicit
    /// connections may never target an already driven family.
    fn bind(&mut self, input: usize, output: usize, explicit: bool, label: &str) {
        let root = self.find(input);
        match self.sources.get(&root).copied() {
            Some(existing) if explicit || existing != output => {
                self.errors.push(AssemblyError::MultipleSources {
                    input: label.to_string(),
                    existing: self.vars[existing].path.clone(),
                    source_name: self.vars[output].path.clone(),
                });
            }
            Some(_) => {}
            None => {
                self.sources.insert(root, output);
            }
        }
    }

    fn finish(mut self, root_entries: Vec<Entry>) -> Result<AssembledModel, Vec<AssemblyError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        let visible: HashMap<usize, String> = root_entries.into_iter().map(|e| (e.var, e.visible)).collect();
        let mut family_default: HashMap<usize, InputDefault> = HashMap::new();
        for (var, default) in std::mem::take(&mut self.defaults) {
            let root = self.find(var);
            family_default.insert(root, default);
        }

        let mut symbols = SymbolTable::default();
        let mut slot_of: Vec<Option<Symbol>> = vec![None; self.vars.len()];

        for (id, var) in self.vars.iter().enumerate() {
            let name = visible.get(&id).cloned().unwrap_or_else(|| var.path.clone());
            let owner = SlotOwner::Output {
                component: var.component,
            };
            match var.meta.kind {
                VarKind::Output => {
                    slot_of[id] = Some(Symbol::Continuous(SlotId(symbols.slots.len())));
                    symbols.slots.push(SlotInfo {
                        name,
                        path: var.path.clone(),
                        owner,
                        meta: var.meta.clone(),
                    });
                }
                VarKind::DiscreteOutput => {
                    slot_of[id] = Some(Symbol::Discrete(DiscreteSlotId(symbols.discrete.len())));
                    symbols.discrete.push(DiscreteSlotInfo {
                        name,
                        path: var.path.clone(),
                        owner,
                        default: var.meta.discrete_default,
                    });
                }
                VarKind::Input | VarKind::DiscreteInput => {}
            }
        }

        let mut family_slot: HashMap<usize, Symbol> = HashMap::new();
        for id in 0..self.vars.len() {
            if !self.vars[id].meta.kind.is_input() {
                continue;
            }
            let root = self.find(id);
            let symbol = if let Some(&source) = self.sources.get(&root) {
                slot_of[source]
            } else if let Some(&symbol) = family_slot.get(&root) {
                if !family_default.contains_key(&root) {
                    self.warn_on_ambiguous_default(&symbols, symbol, id);
                }
                Some(symbol)
            } else {
                let symbol = self.independent_slot(&mut symbols, id, visible.get(&id), family_default.get(&root));
                family_slot.insert(root, symbol);
                Some(symbol)
            };
            slot_of[id] = symbol;
        }

        for (id, name) in &visible {
            if let Some(symbol) = slot_of[*id] {
                symbols.names.insert(name.clone(), symbol);
            }
        }
        for (id, var) in self.vars.iter().enumerate() {
            if let Some(symbol) = slot_of[id] {
                symbols.names.entry(var.path.clone()).or_insert(symbol);
            }
        }

        let mut components = Vec::with_capacity(self.components.len());
        for pending in self.components {
            let mut flat = FlatComponent {
                path: pending.path,
                component: pending.node.component,
                differentiation: pending.node.differentiation,
                vars: pending.vars,
                partials: pending.partials,
                inputs: Vec::new(),
                outputs: Vec::new(),
                discrete_inputs: Vec::new(),
                discrete_outputs: Vec::new(),
            };
            for id in pending.var_ids {
                let local = self.vars[id].meta.name.clone();
                match (self.vars[id].meta.kind, slot_of[id]) {
                    (VarKind::Input, Some(Symbol::Continuous(slot))) => flat.inputs.push((local, slot)),
                    (VarKind::Output, Some(Symbol::Continuous(slot))) => flat.outputs.push((local, slot)),
                    (VarKind::DiscreteInput, Some(Symbol::Discrete(slot))) => flat.discrete_inputs.push((local, slot)),
                    (VarKind::DiscreteOutput, Some(Symbol::Discrete(slot))) => flat.discrete_outputs.push((local, slot)),
                    _ => {}
                }
            }
            components.push(flat);
        }

        let graph = dependency_graph(&components, &symbols);
        validate_acyclic(&graph).map_err(|e| vec![e])?;
        let order = topological_order(&graph).map_err(|e| vec![e])?;
        let levels = topological_levels(&graph);

        ModelAssembled {
            components: components.len(),
            slots: symbols.slot_count(),
            discrete_slots: symbols.discrete_count(),
            connections: graph.edge_count(),
            levels: levels.len(),
        }
        .log();

        Ok(AssembledModel {
            components,
            symbols,
            graph,
            order,
            levels,
        })
    }

    fn independent_slot(
        &self,
        symbols: &mut SymbolTable,
        id: usize,
        visible: Option<&String>,
        default: Option<&InputDefault>,
    ) -> Symbol {
        let var = &self.vars[id];
        let name = visible.cloned().unwrap_or_else(|| var.path.clone());
        if var.meta.kind.is_discrete() {
            let value = match default {
                Some(InputDefault::Discrete(v)) => *v,
                _ => var.meta.discrete_default,
            };
            symbols.discrete.push(DiscreteSlotInfo {
                name,
                path: var.path.clone(),
                owner: SlotOwner::Independent,
                default: value,
            });
            Symbol::Discrete(DiscreteSlotId(symbols.discrete.len() - 1))
        } else {
            let mut meta = var.meta.clone();
            if let Some(InputDefault::Continuous(values)) = default {
                meta.default = values.clone();
            }
            symbols.slots.push(SlotInfo {
                name,
                path: var.path.clone(),
                owner: SlotOwner::Independent,
                meta,
            });
            Symbol::Continuous(SlotId(symbols.slots.len() - 1))
        }
    }

    fn warn_on_ambiguous_default(&self, symbols: &SymbolTable, symbol: Symbol, id: usize) {
        let var = &self.vars[id];
        let (shared, first) = match symbol {
            Symbol::Continuous(slot) => {
                let info = symbols.slot(slot);
                (info.meta.default != var.meta.default, info)
            }
            Symbol::Discrete(_) => return,
        };
        if shared {
            AmbiguousInputDefault {
                name: &first.name,
                kept: &first.path,
                ignored: &var.path,
            }
            .log();
        }
    }
}

fn dependency_graph(components: &[FlatComponent], symbols: &SymbolTable) -> DependencyGraph {
    let mut graph = DependencyGraph::new(components.iter().map(|c| c.path.clone()).collect());
    for (index, component) in components.iter().enumerate() {
        let continuous = component.inputs.iter().map(|(_, slot)| symbols.slot(*slot).owner);
        let discrete = component
            .discrete_inputs
            .iter()
            .map(|(_, slot)| symbols.discrete_slot(*slot).owner);
        for owner in continuous.chain(discrete) {
            if let SlotOwner::Output { component: source } = owner {
                graph.add_edge(source, index);
            }
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EvaluationError;
    use crate::variables::{DiscreteValues, Values, Var};

    /// Sums its inputs into every output; enough structure for name resolution.
    struct TestComponent {
        inputs: Vec<(&'static str, Option<&'static str>, usize)>,
        outputs: Vec<(&'static str, Option<&'static str>, usize)>,
        discrete: Vec<&'static str>,
    }

    impl TestComponent {
        fn new() -> Self {
            Self {
                inputs: Vec::new(),
                outputs: Vec::new(),
                discrete: Vec::new(),
            }
        }

        fn input(mut self, name: &'static str, units: Option<&'static str>) -> Self {
            self.inputs.push((name, units, 1));
            self
        }

        fn array_input(mut self, name: &'static str, len: usize) -> Self {
            self.inputs.push((name, None, len));
            self
        }

        fn output(mut self, name: &'static str, units: Option<&'static str>) -> Self {
            self.outputs.push((name, units, 1));
            self
        }

        fn discrete_input(mut self, name: &'static str) -> Self {
            self.discrete.push(name);
            self
        }
    }

    fn var(name: &str, units: Option<&str>, len: usize) -> Var {
        let v = if len == 1 { Var::scalar(name) } else { Var::array(name, len) };
        match units {
            Some(u) => v.units(u),
            None => v,
        }
    }

    impl Component for TestComponent {
        fn name(&self) -> &'static str {
            "TestComponent"
        }

        fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
            for (name, units, len) in &self.inputs {
                vars.input(var(name, *units, *len))?;
            }
            for name in &self.discrete {
                vars.discrete_input(name, 0)?;
            }
            for (name, units, len) in &self.outputs {
                vars.output(var(name, *units, *len))?;
            }
            Ok(())
        }

        fn compute(&self, inputs: &Values<f64>, _d: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
            let mut total = 0.0;
            for (name, _, _) in &self.inputs {
                total += inputs.array(name)?.iter().sum::<f64>();
            }
            for (name, _, len) in &self.outputs {
                outputs.set_array(name, vec![total; *len]);
            }
            Ok(())
        }
    }

    fn slot(model: &AssembledModel, name: &str) -> SlotId {
        match model.symbols.resolve(name) {
            Some(Symbol::Continuous(slot)) => slot,
            other => panic!("'{}' resolved to {:?}", name, other),
        }
    }

    fn errors_of(group: Group) -> Vec<AssemblyError> {
        match assemble(group) {
            Ok(_) => panic!("assembly unexpectedly succeeded"),
            Err(errors) => errors,
        }
    }

    #[test]
    fn test_promoted_inputs_share_one_slot() {
        let mut root = Group::new();
        root.add_subsystem("a", TestComponent::new().input("R0", Some("m")).output("y", None)).unwrap();
        root.add_subsystem("b", TestComponent::new().input("R0", Some("m")).output("z", None)).unwrap();
        root.promotes("a", &["R0"]);
        root.promotes("b", &["R0"]);

        let model = assemble(root).unwrap();
        let r0 = slot(&model, "R0");
        assert_eq!(slot(&model, "a.R0"), r0);
        assert_eq!(slot(&model, "b.R0"), r0);
        assert!(model.symbols.slot(r0).is_independent());
        assert_eq!(model.symbols.slot(r0).name, "R0");
        assert_eq!(model.graph.edge_count(), 0);
    }

    #[test]
    fn test_promoted_output_drives_promoted_inputs() {
        let mut root = Group::new();
        root.add_subsystem("consumer", TestComponent::new().input("a", Some("m")).output("y", None)).unwrap();
        root.add_subsystem("producer", TestComponent::new().input("R0", Some("m")).output("a", Some("m"))).unwrap();
        root.promotes("consumer", &["*"]);
        root.promotes("producer", &["*"]);

        let model = assemble(root).unwrap();
        let a = slot(&model, "a");
        assert_eq!(slot(&model, "consumer.a"), a);
        assert_eq!(model.symbols.slot(a).owner, SlotOwner::Output { component: 1 });
        // consumer is declared first but must run second
        assert_eq!(model.order, vec![1, 0]);
    }

    #[test]
    fn test_explicit_connection_and_nested_groups() {
        let mut inner = Group::new();
        inner.add_subsystem("geom", TestComponent::new().input("R0", Some("m")).output("a", Some("m"))).unwrap();
        inner.promote("geom.a", "minor_radius");

        let mut root = Group::new();
        root.add_group("plasma", inner).unwrap();
        root.add_subsystem("use", TestComponent::new().input("a", Some("m")).output("y", None)).unwrap();
        root.connect("plasma.minor_radius", "use.a");

        let model = assemble(root).unwrap();
        let source = slot(&model, "plasma.geom.a");
        assert_eq!(slot(&model, "use.a"), source);
        assert_eq!(slot(&model, "plasma.minor_radius"), source);
        assert!(model.symbols.slot(slot(&model, "plasma.geom.R0")).is_independent());
        assert_eq!(model.levels, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_set_input_defaults_resolves_shared_default() {
        let mut root = Group::new();
        root.add_subsystem("a", TestComponent::new().input("R0", Some("m")).output("y", None)).unwrap();
        root.add_subsystem("b", TestComponent::new().input("R0", Some("m")).output("z", None)).unwrap();
        root.promotes("a", &["*"]);
        root.promotes("b", &["*"]);
        root.set_input_defaults("R0", vec![3.0]);

        let model = assemble(root).unwrap();
        assert_eq!(model.symbols.slot(slot(&model, "R0")).meta.default, vec![3.0]);
    }

    #[test]
    fn test_unit_mismatch_on_promotion() {
        let mut root = Group::new();
        root.add_subsystem("a", TestComponent::new().input("R0", Some("m")).output("y", None)).unwrap();
        root.add_subsystem("b", TestComponent::new().input("R0", Some("cm")).output("z", None)).unwrap();
        root.promotes("a", &["R0"]);
        root.promotes("b", &["R0"]);

        let errors = errors_of(root);
        assert!(matches!(
            &errors[..],
            [AssemblyError::UnitMismatch { lhs, rhs, .. }] if lhs == "a.R0" && rhs == "b.R0"
        ));
    }

    #[test]
    fn test_shape_and_kind_mismatch_on_connection() {
        let mut root = Group::new();
        root.add_subsystem("src", TestComponent::new().input("x", None).output("y", None)).unwrap();
        root.add_subsystem("vec", TestComponent::new().array_input("v", 3).output("w", None)).unwrap();
        root.add_subsystem("disc", TestComponent::new().discrete_input("n").output("q", None)).unwrap();
        root.connect("src.y", "vec.v");
        root.connect("src.y", "disc.n");

        let errors = errors_of(root);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], AssemblyError::ShapeMismatch { lhs_size: 1, rhs_size: 3, .. }));
        assert!(matches!(errors[1], AssemblyError::KindMismatch { .. }));
    }

    #[test]
    fn test_multiple_sources() {
        // two connections into one input
        let mut root = Group::new();
        root.add_subsystem("a", TestComponent::new().output("y", None)).unwrap();
        root.add_subsystem("b", TestComponent::new().output("y", None)).unwrap();
        root.add_subsystem("c", TestComponent::new().input("x", None).output("z", None)).unwrap();
        root.connect("a.y", "c.x");
        root.connect("b.y", "c.x");
        assert!(matches!(
            &errors_of(root)[..],
            [AssemblyError::MultipleSources { input, .. }] if input == "c.x"
        ));

        // connection into an input already driven through promotion
        let mut root = Group::new();
        root.add_subsystem("a", TestComponent::new().output("x", None)).unwrap();
        root.add_subsystem("b", TestComponent::new().output("y", None)).unwrap();
        root.add_subsystem("c", TestComponent::new().input("x", None).output("z", None)).unwrap();
        root.promotes("a", &["x"]);
        root.promotes("c", &["x"]);
        root.connect("b.y", "x");
        assert!(matches!(
            &errors_of(root)[..],
            [AssemblyError::MultipleSources { existing, source_name, .. }] if existing == "a.x" && source_name == "b.y"
        ));

        // two outputs promoted to one name
        let mut root = Group::new();
        root.add_subsystem("a", TestComponent::new().output("y", None)).unwrap();
        root.add_subsystem("b", TestComponent::new().output("y", None)).unwrap();
        root.promotes("a", &["*"]);
        root.promotes("b", &["*"]);
        assert!(matches!(&errors_of(root)[..], [AssemblyError::MultipleSources { .. }]));
    }

    #[test]
    fn test_unresolved_paths_are_all_reported() {
        let mut root = Group::new();
        root.add_subsystem("a", TestComponent::new().input("x", None).output("y", None)).unwrap();
        root.promote("a.nope", "nope");
        root.promote("ghost.*", "*");
        root.connect("a.x", "a.x");
        root.set_input_defaults("missing", vec![1.0]);

        let errors = errors_of(root);
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .all(|e| matches!(e, AssemblyError::UnresolvedPath { .. })));
    }

    #[test]
    fn test_duplicate_and_invalid_subsystem_names() {
        let mut root = Group::new();
        root.add_subsystem("a", TestComponent::new()).unwrap();
        assert!(matches!(
            root.add_subsystem("a", TestComponent::new()),
            Err(AssemblyError::DuplicateName { .. })
        ));
        assert!(matches!(
            root.add_group("a.b", Group::new()),
            Err(AssemblyError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_connection_cycle_is_rejected_before_evaluation() {
        let mut root = Group::new();
        root.add_subsystem("A", TestComponent::new().input("x", None).output("y", None)).unwrap();
        root.add_subsystem("B", TestComponent::new().input("x", None).output("y", None)).unwrap();
        root.connect("A.y", "B.x");
        root.connect("B.y", "A.x");

        match &errors_of(root)[..] {
            [AssemblyError::CyclicDependency { cycle }] => assert_eq!(cycle, &vec!["A", "B", "A"]),
            other => panic!("expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_discrete_inputs_resolve_separately() {
        let mut root = Group::new();
        root.add_subsystem("a", TestComponent::new().discrete_input("n_coil").output("y", None)).unwrap();
        root.add_subsystem("b", TestComponent::new().discrete_input("n_coil").output("z", None)).unwrap();
        root.promotes("a", &["n_coil"]);
        root.promotes("b", &["n_coil"]);
        root.set_discrete_default("n_coil", 16);

        let model = assemble(root).unwrap();
        match model.symbols.resolve("n_coil") {
            Some(Symbol::Discrete(id)) => assert_eq!(model.symbols.discrete_slot(id).default, 16),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(model.symbols.discrete_count(), 1);
    }
}
