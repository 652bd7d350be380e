//! Enablement and firing.
//!
//! # Enablement
//!
//! A transition is enabled at `clock` when, in order:
//!
//! 1. its guard holds (a false guard short-circuits everything else);
//! 2. for every input arc, in registration order, the place's tokens are
//!    available at `clock` *and* the arc's evaluate predicate holds. Both
//!    halves are always evaluated for an arc; the scan stops at the first
//!    failing arc;
//! 3. every bounded output place has room for one more token.
//!
//! # Firing
//!
//! Firing is atomic. Withdrawals and productions run in registration order
//! against scratch copies of the affected places; the net is only updated
//! once every inscription has been evaluated, every place could supply its
//! tokens and every production fits within its place's capacity. On any
//! failure the marking and the transition's last fired clock are left
//! exactly as they were. A delay that would overflow the clock is such a
//! failure.
//!
//! Firing does not re-check the guard or the evaluate predicates; callers
//! are expected to have found the transition enabled at the same clock.

use std::collections::HashMap;

use log::{debug, trace};
use petgraph::graph::{EdgeIndex, NodeIndex};

use super::{NetNode, PetriNet};
use crate::arc::NetArc;
use crate::element::{NetElement, Symbol};
use crate::error::SimulationError;
use crate::expression::{EvalContext, ExpressionEvaluator};
use crate::place::Place;
use crate::token::{Time, TokenSet};
use crate::transition::FiringPhase;

/// Tokens moved along one arc during a firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcTransfer {
    pub arc: Symbol,
    pub place: Symbol,
    /// The execute inscription that produced the transfer.
    pub inscription: String,
    pub tokens: TokenSet,
    /// Token count of the place once the firing was committed.
    pub marking: usize,
}

/// Outcome of a committed firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firing {
    pub transition: Symbol,
    pub label: String,
    pub clock: Time,
    pub consumed: Vec<ArcTransfer>,
    pub produced: Vec<ArcTransfer>,
}

fn evaluation_error(
    transition: &Symbol,
    arc: Option<&Symbol>,
    phase: FiringPhase,
) -> impl FnOnce(crate::expression::EvalError) -> SimulationError {
    let transition = transition.clone();
    let arc = arc.cloned();
    move |source| SimulationError::Evaluation {
        transition,
        arc,
        phase,
        source,
    }
}

impl PetriNet {
    fn place_at(&self, ix: NodeIndex) -> &Place {
        match &self.graph[ix] {
            NetNode::Place(place) => place,
            NetNode::Transition(_) => unreachable!("arcs always end at a place"),
        }
    }

    fn arc_place(&self, ex: EdgeIndex) -> NodeIndex {
        match (&self.graph[ex], self.graph.edge_endpoints(ex)) {
            (NetArc::Input(_), Some((place, _))) => place,
            (NetArc::Output(_), Some((_, place))) => place,
            (_, None) => unreachable!("registered arcs are never removed"),
        }
    }

    /// Whether `transition` may fire at `clock`.
    pub fn enabled(
        &self,
        transition: &Symbol,
        clock: Time,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<bool, SimulationError> {
        let tx = self.transition_index(transition)?;
        let guard = match &self.graph[tx] {
            NetNode::Transition(t) => &t.guard,
            NetNode::Place(_) => unreachable!(),
        };

        let ctx = EvalContext::new(clock, transition);
        let guard_holds = evaluator
            .evaluate(guard, &ctx)
            .map_err(evaluation_error(transition, None, FiringPhase::Evaluating))?;
        if !guard_holds {
            return Ok(false);
        }

        let wiring = self.wiring(tx);
        for &ex in &wiring.inputs {
            let arc = &self.graph[ex];
            let place = self.place_at(self.arc_place(ex));
            let available = place.tokens.contains_time(clock);
            let ctx = EvalContext::new(clock, transition).with_tokens(&place.tokens);
            let accepted = evaluator
                .evaluate(arc.evaluate_text()?, &ctx)
                .map_err(evaluation_error(
                    transition,
                    Some(arc.id()),
                    FiringPhase::Evaluating,
                ))?;
            if !(available & accepted) {
                return Ok(false);
            }
        }

        for &ex in &wiring.outputs {
            if !self.place_at(self.arc_place(ex)).has_headroom() {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Transitions enabled at `clock`, in registration order.
    pub fn enabled_transitions(
        &self,
        clock: Time,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Vec<Symbol>, SimulationError> {
        let mut enabled = Vec::new();
        for transition in self.transitions() {
            if self.enabled(&transition.identity.id, clock, evaluator)? {
                enabled.push(transition.identity.id.clone());
            }
        }
        Ok(enabled)
    }

    /// Fires `transition` at `clock`, atomically.
    pub fn fire(
        &mut self,
        transition: &Symbol,
        clock: Time,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Firing, SimulationError> {
        let tx = self.transition_index(transition)?;
        let wiring = self.wiring(tx).clone();
        let mut scratch: HashMap<NodeIndex, TokenSet> = HashMap::new();
        let mut consumed = Vec::with_capacity(wiring.inputs.len());
        let mut produced = Vec::with_capacity(wiring.outputs.len());

        for &ex in &wiring.inputs {
            let arc = &self.graph[ex];
            let px = self.arc_place(ex);
            let place = self.place_at(px);
            let tokens = scratch.entry(px).or_insert_with(|| place.tokens.clone());

            let request = {
                let ctx = EvalContext::new(clock, transition).with_tokens(tokens);
                evaluator
                    .execute(arc.execute_text(), &ctx)
                    .map_err(evaluation_error(
                        transition,
                        Some(arc.id()),
                        FiringPhase::Consuming,
                    ))?
            };
            let taken = tokens.withdraw(&request, clock).ok_or_else(|| {
                SimulationError::InsufficientTokens {
                    transition: transition.clone(),
                    place: place.identity.id.clone(),
                    requested: request.len(),
                    clock,
                }
            })?;
            trace!("{}: - {} from {}", transition, taken, place.identity.id);

            consumed.push(ArcTransfer {
                arc: arc.id().clone(),
                place: place.identity.id.clone(),
                inscription: arc.execute_text().to_string(),
                tokens: taken,
                marking: 0,
            });
        }

        for &ex in &wiring.outputs {
            let arc = &self.graph[ex];
            let px = self.arc_place(ex);
            let place = self.place_at(px);
            let tokens = scratch.entry(px).or_insert_with(|| place.tokens.clone());

            let mut fresh = {
                let ctx = EvalContext::new(clock, transition).with_tokens(tokens);
                evaluator
                    .execute(arc.execute_text(), &ctx)
                    .map_err(evaluation_error(
                        transition,
                        Some(arc.id()),
                        FiringPhase::Producing,
                    ))?
            };
            fresh
                .increment_time(clock)
                .ok_or_else(|| SimulationError::TimeOverflow {
                    transition: transition.clone(),
                    arc: arc.id().clone(),
                })?;

            if !place.fits(tokens.len() + fresh.len()) {
                return Err(SimulationError::CapacityExceeded {
                    transition: transition.clone(),
                    place: place.identity.id.clone(),
                    capacity: place.capacity,
                });
            }
            trace!("{}: + {} into {}", transition, fresh, place.identity.id);
            tokens.extend(fresh.clone());

            produced.push(ArcTransfer {
                arc: arc.id().clone(),
                place: place.identity.id.clone(),
                inscription: arc.execute_text().to_string(),
                tokens: fresh,
                marking: 0,
            });
        }

        // Commit.
        for (px, tokens) in scratch {
            if let NetNode::Place(place) = &mut self.graph[px] {
                place.tokens = tokens;
            }
        }
        let label = match &mut self.graph[tx] {
            NetNode::Transition(t) => {
                t.last_fired_clock = clock;
                t.label().to_string()
            }
            NetNode::Place(_) => unreachable!(),
        };

        for transfer in consumed.iter_mut().chain(produced.iter_mut()) {
            transfer.marking = self.place(&transfer.place).map_or(0, |p| p.tokens.len());
        }

        debug!("{} ({}) fired at {}", label, transition, clock);
        Ok(Firing {
            transition: transition.clone(),
            label,
            clock,
            consumed,
            produced,
        })
    }
}
