//! The Petri net aggregate.
//!
//! A [`PetriNet`] owns every place, transition and arc of one net instance.
//! Storage is a petgraph [`StableGraph`] whose nodes are places and
//! transitions ([`NetNode`]) and whose edges are arcs ([`NetArc`]). Next to
//! the graph the net keeps registration-order index vectors, so iteration
//! over places, transitions and each transition's arcs is deterministic,
//! and hash tables giving O(1) lookup by identifier.
//!
//! # Building a net
//!
//! ```
//! use petrisim::arc::{InputArc, OutputArc};
//! use petrisim::element::{ElementKind, Identity};
//! use petrisim::expression::Interpreter;
//! use petrisim::net::PetriNet;
//! use petrisim::place::Place;
//! use petrisim::token::{Token, Value};
//! use petrisim::transition::Transition;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut net = PetriNet::new("example");
//! net.add_place(Place::new(Identity::new("p1")))?;
//! net.add_place(Place::new(Identity::new("p2")))?;
//! net.add_transition(Transition::new(Identity::new("t1")))?;
//!
//! let i1 = net.generate_id(ElementKind::InputArc);
//! net.add_input_arc(InputArc::new(Identity::new(i1), "p1", "t1"))?;
//! let o1 = net.generate_id(ElementKind::OutputArc);
//! net.add_output_arc(OutputArc::new(Identity::new(o1), "t1", "p2"))?;
//!
//! net.place_mut(&"p1".into()).unwrap().add_token(Token::new(Value::Int(1)));
//!
//! let evaluator = Interpreter::new();
//! assert!(!net.is_dead(&evaluator)?);
//! net.fire(&"t1".into(), 0, &evaluator)?;
//! assert!(net.is_dead(&evaluator)?);
//! # Ok(())
//! # }
//! ```

mod firing;
pub mod parser;
pub mod serialisation;
#[cfg(test)]
mod tests;

pub use firing::{ArcTransfer, Firing};

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;

use crate::arc::{InputArc, NetArc, OutputArc};
use crate::element::{ElementKind, IdGenerator, Identity, NetElement, Symbol};
use crate::error::{NetError, SimulationError};
use crate::expression::ExpressionEvaluator;
use crate::place::Place;
use crate::token::{Time, TokenSet};
use crate::transition::Transition;

/// Node of the net graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetNode {
    Place(Place),
    Transition(Transition),
}

impl NetNode {
    pub fn kind(&self) -> ElementKind {
        match self {
            NetNode::Place(_) => ElementKind::Place,
            NetNode::Transition(_) => ElementKind::Transition,
        }
    }

    pub fn as_place(&self) -> Option<&Place> {
        match self {
            NetNode::Place(place) => Some(place),
            NetNode::Transition(_) => None,
        }
    }

    pub fn as_transition(&self) -> Option<&Transition> {
        match self {
            NetNode::Transition(transition) => Some(transition),
            NetNode::Place(_) => None,
        }
    }
}

impl NetElement for NetNode {
    fn identity(&self) -> &Identity {
        match self {
            NetNode::Place(place) => &place.identity,
            NetNode::Transition(transition) => &transition.identity,
        }
    }
}

impl fmt::Display for NetNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetNode::Place(place) if place.is_bounded() => write!(
                f,
                "{} {}/{}",
                place.label(),
                place.tokens.len(),
                place.capacity
            ),
            NetNode::Place(place) => write!(f, "{} {}", place.label(), place.tokens.len()),
            NetNode::Transition(transition) => write!(f, "{}", transition.label()),
        }
    }
}

impl fmt::Display for NetArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.execute_text())
    }
}

pub type NetGraph = StableGraph<NetNode, NetArc>;

/// Arcs bound to one transition, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Wiring {
    inputs: Vec<EdgeIndex>,
    outputs: Vec<EdgeIndex>,
}

/// Aggregate owning the places, transitions and arcs of one net.
#[derive(Debug, Clone)]
pub struct PetriNet {
    pub identity: Identity,
    /// Free-form text carried along for code generators.
    pub declarations: String,
    pub imports: String,
    pub implements: String,
    graph: NetGraph,
    places: Vec<NodeIndex>,
    transitions: Vec<NodeIndex>,
    input_arcs: Vec<EdgeIndex>,
    output_arcs: Vec<EdgeIndex>,
    wiring: HashMap<NodeIndex, Wiring>,
    lut: HashMap<Symbol, NodeIndex>,
    arc_lut: HashMap<Symbol, EdgeIndex>,
    ids: IdGenerator,
}

impl PetriNet {
    pub fn new(id: impl Into<Symbol>) -> Self {
        Self {
            identity: Identity::new(id),
            declarations: String::new(),
            imports: String::new(),
            implements: String::new(),
            graph: NetGraph::new(),
            places: Vec::new(),
            transitions: Vec::new(),
            input_arcs: Vec::new(),
            output_arcs: Vec::new(),
            wiring: HashMap::new(),
            lut: HashMap::new(),
            arc_lut: HashMap::new(),
            ids: IdGenerator::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.identity.label = Some(label.into());
        self
    }

    /// Draws a fresh identifier that no element of this net uses yet.
    pub fn generate_id(&mut self, kind: ElementKind) -> Symbol {
        let (lut, arc_lut) = (&self.lut, &self.arc_lut);
        self.ids
            .next_id(kind, |id| lut.contains_key(id) || arc_lut.contains_key(id))
    }

    /// Restarts id generation, e.g. before rebuilding a net from scratch.
    pub fn reset_ids(&mut self) {
        self.ids.reset();
    }

    fn ensure_unique(&self, id: &Symbol) -> Result<(), NetError> {
        if self.lut.contains_key(id) || self.arc_lut.contains_key(id) {
            Err(NetError::DuplicateId(id.clone()))
        } else {
            Ok(())
        }
    }

    pub fn add_place(&mut self, place: Place) -> Result<NodeIndex, NetError> {
        self.ensure_unique(&place.identity.id)?;
        let id = place.identity.id.clone();
        let ix = self.graph.add_node(NetNode::Place(place));
        self.places.push(ix);
        self.lut.insert(id, ix);
        Ok(ix)
    }

    pub fn add_transition(&mut self, transition: Transition) -> Result<NodeIndex, NetError> {
        self.ensure_unique(&transition.identity.id)?;
        let id = transition.identity.id.clone();
        let ix = self.graph.add_node(NetNode::Transition(transition));
        self.transitions.push(ix);
        self.wiring.insert(ix, Wiring::default());
        self.lut.insert(id, ix);
        Ok(ix)
    }

    fn node_of_kind(&self, id: &Symbol, expected: ElementKind) -> Result<NodeIndex, NetError> {
        let ix = *self
            .lut
            .get(id)
            .ok_or_else(|| NetError::UnknownElement(id.clone()))?;
        if self.graph[ix].kind() != expected {
            return Err(NetError::WrongKind {
                id: id.clone(),
                expected,
            });
        }
        Ok(ix)
    }

    pub fn add_input_arc(&mut self, arc: InputArc) -> Result<EdgeIndex, NetError> {
        self.ensure_unique(&arc.identity.id)?;
        let place = self.node_of_kind(&arc.place, ElementKind::Place)?;
        let transition = self.node_of_kind(&arc.transition, ElementKind::Transition)?;
        let id = arc.identity.id.clone();

        let ex = self.graph.add_edge(place, transition, NetArc::Input(arc));
        self.input_arcs.push(ex);
        self.wiring.entry(transition).or_default().inputs.push(ex);
        self.arc_lut.insert(id, ex);
        Ok(ex)
    }

    pub fn add_output_arc(&mut self, arc: OutputArc) -> Result<EdgeIndex, NetError> {
        self.ensure_unique(&arc.identity.id)?;
        let transition = self.node_of_kind(&arc.transition, ElementKind::Transition)?;
        let place = self.node_of_kind(&arc.place, ElementKind::Place)?;
        let id = arc.identity.id.clone();

        let ex = self.graph.add_edge(transition, place, NetArc::Output(arc));
        self.output_arcs.push(ex);
        self.wiring.entry(transition).or_default().outputs.push(ex);
        self.arc_lut.insert(id, ex);
        Ok(ex)
    }

    /// Looks up a place or transition by identifier.
    pub fn get_net_element(&self, id: &Symbol) -> Option<&NetNode> {
        self.lut.get(id).map(|ix| &self.graph[*ix])
    }

    pub fn arc(&self, id: &Symbol) -> Option<&NetArc> {
        self.arc_lut.get(id).map(|ex| &self.graph[*ex])
    }

    pub fn place(&self, id: &Symbol) -> Option<&Place> {
        self.get_net_element(id).and_then(NetNode::as_place)
    }

    pub fn place_mut(&mut self, id: &Symbol) -> Option<&mut Place> {
        let ix = *self.lut.get(id)?;
        match &mut self.graph[ix] {
            NetNode::Place(place) => Some(place),
            NetNode::Transition(_) => None,
        }
    }

    pub fn transition(&self, id: &Symbol) -> Option<&Transition> {
        self.get_net_element(id).and_then(NetNode::as_transition)
    }

    pub fn transition_mut(&mut self, id: &Symbol) -> Option<&mut Transition> {
        let ix = *self.lut.get(id)?;
        match &mut self.graph[ix] {
            NetNode::Transition(transition) => Some(transition),
            NetNode::Place(_) => None,
        }
    }

    pub fn arc_mut(&mut self, id: &Symbol) -> Option<&mut NetArc> {
        let ex = *self.arc_lut.get(id)?;
        Some(&mut self.graph[ex])
    }

    /// Places in registration order.
    pub fn places(&self) -> impl Iterator<Item = &Place> + '_ {
        self.places.iter().filter_map(|ix| self.graph[*ix].as_place())
    }

    /// Transitions in registration order.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions
            .iter()
            .filter_map(|ix| self.graph[*ix].as_transition())
    }

    pub fn input_arcs(&self) -> impl Iterator<Item = &InputArc> + '_ {
        self.input_arcs.iter().filter_map(|ex| match &self.graph[*ex] {
            NetArc::Input(arc) => Some(arc),
            NetArc::Output(_) => None,
        })
    }

    pub fn output_arcs(&self) -> impl Iterator<Item = &OutputArc> + '_ {
        self.output_arcs.iter().filter_map(|ex| match &self.graph[*ex] {
            NetArc::Output(arc) => Some(arc),
            NetArc::Input(_) => None,
        })
    }

    pub fn place_count(&self) -> usize {
        self.places.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Underlying graph, e.g. for DOT export.
    pub fn graph(&self) -> &NetGraph {
        &self.graph
    }

    /// Current marking as `(place id, tokens)` pairs in registration order.
    pub fn marking(&self) -> Vec<(&Symbol, &TokenSet)> {
        self.places()
            .map(|place| (&place.identity.id, &place.tokens))
            .collect()
    }

    /// Smallest timestamp strictly greater than `after` among the timed
    /// tokens of all places.
    pub fn earliest_pending_time(&self, after: Time) -> Option<Time> {
        self.places()
            .filter_map(|place| place.tokens.earliest_pending(after))
            .min()
    }

    /// Whether no transition is enabled at clock 0.
    ///
    /// A net without transitions is dead. Timed liveness depends on the
    /// clock and is decided by the simulation driver.
    pub fn is_dead(&self, evaluator: &dyn ExpressionEvaluator) -> Result<bool, SimulationError> {
        for transition in self.transitions() {
            if self.enabled(&transition.identity.id, 0, evaluator)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn transition_index(&self, id: &Symbol) -> Result<NodeIndex, SimulationError> {
        match self.lut.get(id) {
            Some(ix) if self.graph[*ix].as_transition().is_some() => Ok(*ix),
            _ => Err(SimulationError::UnknownTransition(id.clone())),
        }
    }

    fn wiring(&self, transition: NodeIndex) -> &Wiring {
        static UNWIRED: Wiring = Wiring {
            inputs: Vec::new(),
            outputs: Vec::new(),
        };
        self.wiring.get(&transition).unwrap_or(&UNWIRED)
    }
}
