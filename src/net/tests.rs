use super::*;
use crate::arc::{InputArc, OutputArc};
use crate::expression::Interpreter;
use crate::token::{Token, Value};
use crate::transition::FiringPhase;

fn sym(s: &str) -> Symbol {
    Symbol::from(s)
}

/// `p1 -> t1 -> p2` with default inscriptions and one token in `p1`.
fn pipeline() -> PetriNet {
    let mut net = PetriNet::new("pipeline");
    net.add_place(
        Place::new(Identity::new("p1")).with_tokens(Token::new(Value::Int(1)).into()),
    )
    .unwrap();
    net.add_place(Place::new(Identity::new("p2"))).unwrap();
    net.add_transition(Transition::new(Identity::new("t1"))).unwrap();
    net.add_input_arc(InputArc::new(Identity::new("i1"), "p1", "t1"))
        .unwrap();
    net.add_output_arc(OutputArc::new(Identity::new("o1"), "t1", "p2"))
        .unwrap();
    net
}

#[test]
fn fire_moves_one_token() {
    let evaluator = Interpreter::new();
    let mut net = pipeline();

    assert!(net.enabled(&sym("t1"), 0, &evaluator).unwrap());
    let firing = net.fire(&sym("t1"), 0, &evaluator).unwrap();

    assert_eq!(net.place(&sym("p1")).unwrap().tokens.len(), 0);
    assert_eq!(net.place(&sym("p2")).unwrap().tokens.len(), 1);
    assert_eq!(firing.consumed.len(), 1);
    assert_eq!(firing.consumed[0].marking, 0);
    assert_eq!(firing.produced[0].marking, 1);
    assert!(net.is_dead(&evaluator).unwrap());
}

#[test]
fn empty_net_is_dead() {
    let net = PetriNet::new("empty");
    assert!(net.is_dead(&Interpreter::new()).unwrap());
}

#[test]
fn false_guard_disables_regardless_of_arcs() {
    let evaluator = Interpreter::new();
    let mut net = pipeline();
    net.transition_mut(&sym("t1")).unwrap().guard = "1 == 2".to_string();
    assert!(!net.enabled(&sym("t1"), 0, &evaluator).unwrap());
    assert!(net.enabled_transitions(0, &evaluator).unwrap().is_empty());
}

#[test]
fn bounded_output_blocks_enablement() {
    let evaluator = Interpreter::new();
    let mut net = pipeline();
    {
        let p2 = net.place_mut(&sym("p2")).unwrap();
        p2.capacity = 1;
        p2.add_token(Token::default());
    }
    assert!(!net.enabled(&sym("t1"), 0, &evaluator).unwrap());
    net.place_mut(&sym("p2")).unwrap().capacity = 2;
    assert!(net.enabled(&sym("t1"), 0, &evaluator).unwrap());
}

#[test]
fn timed_input_waits_for_the_clock() {
    let evaluator = Interpreter::new();
    let mut net = pipeline();
    net.place_mut(&sym("p1")).unwrap().tokens = Token::timed(Value::Int(1), 5).into();

    assert!(!net.enabled(&sym("t1"), 4, &evaluator).unwrap());
    assert!(net.enabled(&sym("t1"), 5, &evaluator).unwrap());
    assert_eq!(net.earliest_pending_time(0), Some(5));
    assert_eq!(net.earliest_pending_time(5), None);
}

#[test]
fn output_delay_is_offset_by_the_firing_clock() {
    let evaluator = Interpreter::new();
    let mut net = PetriNet::new("delay");
    net.add_place(Place::new(Identity::new("a")).with_tokens(Token::new(Value::Unit).into()))
        .unwrap();
    net.add_place(Place::new(Identity::new("b"))).unwrap();
    net.add_transition(Transition::new(Identity::new("t"))).unwrap();
    net.add_input_arc(InputArc::new(Identity::new("i"), "a", "t"))
        .unwrap();
    net.add_output_arc(OutputArc::new(Identity::new("o"), "t", "b").with_execute("\"x\"@10"))
        .unwrap();

    net.fire(&sym("t"), 3, &evaluator).unwrap();
    let b = net.place(&sym("b")).unwrap();
    assert_eq!(b.tokens.get(0).unwrap().timestamp(), 13);
    assert_eq!(net.transition(&sym("t")).unwrap().last_fired_clock, 3);
}

#[test]
fn delay_past_the_end_of_time_aborts_the_firing() {
    let evaluator = Interpreter::new();
    let mut net = pipeline();
    net.add_output_arc(OutputArc::new(Identity::new("late"), "t1", "p2").with_execute("()@10"))
        .unwrap();

    assert_eq!(
        net.fire(&sym("t1"), Time::MAX - 5, &evaluator),
        Err(SimulationError::TimeOverflow {
            transition: sym("t1"),
            arc: sym("late"),
        })
    );
    assert_eq!(net.place(&sym("p1")).unwrap().tokens.len(), 1);
    assert_eq!(net.place(&sym("p2")).unwrap().tokens.len(), 0);
    assert_eq!(net.transition(&sym("t1")).unwrap().last_fired_clock, 0);
}

#[test]
fn failed_firing_leaves_marking_untouched() {
    let evaluator = Interpreter::new();
    let mut net = pipeline();
    net.add_place(Place::new(Identity::new("p3"))).unwrap();
    net.add_output_arc(OutputArc::new(Identity::new("o2"), "t1", "p3").with_execute("1 / 0"))
        .unwrap();

    let err = net.fire(&sym("t1"), 0, &evaluator).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Evaluation {
            phase: FiringPhase::Producing,
            ref arc,
            ..
        } if arc.as_ref() == Some(&sym("o2"))
    ));
    assert_eq!(net.place(&sym("p1")).unwrap().tokens.len(), 1);
    assert_eq!(net.place(&sym("p2")).unwrap().tokens.len(), 0);
    assert_eq!(net.place(&sym("p3")).unwrap().tokens.len(), 0);
}

#[test]
fn production_beyond_capacity_aborts_the_firing() {
    let evaluator = Interpreter::new();
    let mut net = pipeline();
    net.place_mut(&sym("p2")).unwrap().capacity = 2;
    net.add_output_arc(OutputArc::new(Identity::new("o2"), "t1", "p2").with_execute("[1, 2]"))
        .unwrap();

    assert!(net.enabled(&sym("t1"), 0, &evaluator).unwrap());
    assert_eq!(
        net.fire(&sym("t1"), 0, &evaluator),
        Err(SimulationError::CapacityExceeded {
            transition: sym("t1"),
            place: sym("p2"),
            capacity: 2,
        })
    );
    assert_eq!(net.place(&sym("p1")).unwrap().tokens.len(), 1);
}

#[test]
fn insufficient_tokens_is_reported() {
    let evaluator = Interpreter::new();
    let mut net = PetriNet::new("greedy");
    net.add_place(Place::new(Identity::new("p")).with_tokens(Token::new(Value::Int(1)).into()))
        .unwrap();
    net.add_transition(Transition::new(Identity::new("t"))).unwrap();
    net.add_input_arc(InputArc::new(Identity::new("i"), "p", "t").with_execute("[1, 1]"))
        .unwrap();

    assert_eq!(
        net.fire(&sym("t"), 0, &evaluator),
        Err(SimulationError::InsufficientTokens {
            transition: sym("t"),
            place: sym("p"),
            requested: 2,
            clock: 0,
        })
    );
    assert_eq!(net.place(&sym("p")).unwrap().tokens.len(), 1);
}

#[test]
fn evaluate_runs_even_when_tokens_are_pending() {
    // The predicate fails to evaluate on a pending place, which proves it
    // was called despite the availability check already failing.
    let evaluator = Interpreter::new();
    let mut net = pipeline();
    net.place_mut(&sym("p1")).unwrap().tokens = Token::timed(Value::Int(1), 9).into();
    if let Some(NetArc::Input(arc)) = net.arc_mut(&sym("i1")) {
        arc.evaluate = "first() == 1".to_string();
    }
    assert!(matches!(
        net.enabled(&sym("t1"), 0, &evaluator),
        Err(SimulationError::Evaluation {
            phase: FiringPhase::Evaluating,
            ..
        })
    ));
}

#[test]
fn payload_guided_withdrawal() {
    let evaluator = Interpreter::new();
    let mut net = PetriNet::new("colors");
    let tokens: TokenSet = vec![
        Token::new(Value::from("red")),
        Token::new(Value::from("blue")),
    ]
    .into();
    net.add_place(Place::new(Identity::new("p")).with_tokens(tokens))
        .unwrap();
    net.add_transition(Transition::new(Identity::new("t"))).unwrap();
    net.add_input_arc(
        InputArc::new(Identity::new("i"), "p", "t")
            .with_evaluate("contains(\"blue\")")
            .with_execute("\"blue\""),
    )
    .unwrap();

    let firing = net.fire(&sym("t"), 0, &evaluator).unwrap();
    assert_eq!(
        firing.consumed[0].tokens.get(0).unwrap().value(),
        &Value::from("blue")
    );
    let left = &net.place(&sym("p")).unwrap().tokens;
    assert_eq!(left.get(0).unwrap().value(), &Value::from("red"));
}

#[test]
fn construction_errors() {
    let mut net = pipeline();
    assert_eq!(
        net.add_place(Place::new(Identity::new("t1"))),
        Err(NetError::DuplicateId(sym("t1")))
    );
    assert_eq!(
        net.add_input_arc(InputArc::new(Identity::new("i9"), "nowhere", "t1")),
        Err(NetError::UnknownElement(sym("nowhere")))
    );
    assert_eq!(
        net.add_output_arc(OutputArc::new(Identity::new("o9"), "p1", "p2")),
        Err(NetError::WrongKind {
            id: sym("p1"),
            expected: ElementKind::Transition
        })
    );
    assert_eq!(
        net.add_output_arc(OutputArc::new(Identity::new("i1"), "t1", "p2")),
        Err(NetError::DuplicateId(sym("i1")))
    );
}

#[test]
fn unknown_transition() {
    let evaluator = Interpreter::new();
    let mut net = pipeline();
    assert_eq!(
        net.fire(&sym("p1"), 0, &evaluator),
        Err(SimulationError::UnknownTransition(sym("p1")))
    );
}

#[test]
fn generated_ids_skip_supplied_ones() {
    let mut net = pipeline();
    net.reset_ids();
    assert_eq!(net.generate_id(ElementKind::Place).as_ref(), "p3");
    assert_eq!(net.generate_id(ElementKind::OutputArc).as_ref(), "o4");
}

#[test]
fn lookup_and_registration_order() {
    let net = pipeline();
    assert!(matches!(net.get_net_element(&sym("p1")), Some(NetNode::Place(_))));
    assert!(matches!(
        net.get_net_element(&sym("t1")),
        Some(NetNode::Transition(_))
    ));
    assert!(net.get_net_element(&sym("i1")).is_none());
    assert!(net.arc(&sym("i1")).unwrap().is_input());

    let ids: Vec<_> = net.places().map(|p| p.identity.id.to_string()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert_eq!(net.marking()[0].1.len(), 1);
}
