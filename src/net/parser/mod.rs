//! Textual net descriptions.
//!
//! A net file is a sequence of `;`-terminated entries. `#` starts a comment
//! running to the end of the line.
//!
//! ```text
//! net producer label "Producer/consumer";
//! declarations "free text kept for code generators";
//! place buffer label "Buffer" capacity 3 tokens ["1", "2@5"];
//! place done;
//! transition consume guard "true";
//! input i1 buffer -> consume evaluate "size() > 0" execute "1";
//! output consume -> done execute "1@10";
//! ```
//!
//! Entries may come in any order; arcs are wired once every place and
//! transition is known, in the order they appear. Arc identifiers are
//! optional and generated when absent. Each string of a place's `tokens`
//! list is an execute inscription evaluated at clock 0.

mod ast;

lalrpop_util::lalrpop_mod! {grammar, "/net/parser/grammar.rs"}

use std::collections::HashSet;
use std::{error::Error, fmt};

use ast::{ArcAttr, Entry, PlaceAttr, TransitionAttr};

use crate::arc::{InputArc, OutputArc};
use crate::element::{ElementKind, Identity, Symbol};
use crate::error::NetError;
use crate::expression::{EvalContext, EvalError, ExpressionEvaluator};
use crate::net::PetriNet;
use crate::place::Place;
use crate::token::TokenSet;
use crate::transition::Transition;

type LarlPopError<'a> = lalrpop_util::ParseError<usize, grammar::Token<'a>, &'static str>;

/// Error Response of [`parse`].
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    SyntaxError(String),
    Construction(NetError),
    /// An initial-marking inscription failed to evaluate.
    Marking {
        place: Symbol,
        expression: String,
        source: EvalError,
    },
    /// An attribute that the element kind does not carry.
    InvalidAttribute {
        element: Symbol,
        attribute: &'static str,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::SyntaxError(err) => write!(f, "{}", err),
            ParseError::Construction(err) => write!(f, "{}", err),
            ParseError::Marking {
                place,
                expression,
                source,
            } => write!(
                f,
                "Invalid initial marking `{}` of place {}: {}",
                expression, place, source
            ),
            ParseError::InvalidAttribute { element, attribute } => {
                write!(f, "Output arc {} cannot have an {} attribute", element, attribute)
            }
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Construction(err) => Some(err),
            ParseError::Marking { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LarlPopError<'_>> for ParseError {
    fn from(err: LarlPopError) -> Self {
        ParseError::SyntaxError(format!("{}", err))
    }
}

impl From<NetError> for ParseError {
    fn from(err: NetError) -> Self {
        ParseError::Construction(err)
    }
}

struct ArcEntry {
    input: bool,
    id: Option<Symbol>,
    place: Symbol,
    transition: Symbol,
    attrs: Vec<ArcAttr>,
}

/// Parses a net description, evaluating initial markings with `evaluator`.
pub fn parse(input: &str, evaluator: &dyn ExpressionEvaluator) -> Result<PetriNet, ParseError> {
    let entries = grammar::NetFileParser::new().parse(input)?;

    let mut net = PetriNet::new("untitled");
    let mut arcs = Vec::new();

    for entry in entries.into_iter() {
        match entry {
            Entry::Net { id, label } => {
                net.identity = Identity { id, label };
            }
            Entry::Declarations(text) => net.declarations = text,
            Entry::Imports(text) => net.imports = text,
            Entry::Implements(text) => net.implements = text,
            Entry::Place { id, attrs } => {
                let place = build_place(id, attrs, evaluator)?;
                net.add_place(place)?;
            }
            Entry::Transition { id, attrs } => {
                let mut transition = Transition::new(Identity::new(id));
                for attr in attrs {
                    match attr {
                        TransitionAttr::Label(label) => transition.identity.label = Some(label),
                        TransitionAttr::Guard(guard) => transition.guard = guard,
                    }
                }
                net.add_transition(transition)?;
            }
            Entry::Input {
                id,
                place,
                transition,
                attrs,
            } => arcs.push(ArcEntry {
                input: true,
                id,
                place,
                transition,
                attrs,
            }),
            Entry::Output {
                id,
                transition,
                place,
                attrs,
            } => arcs.push(ArcEntry {
                input: false,
                id,
                place,
                transition,
                attrs,
            }),
        }
    }

    let explicit: HashSet<Symbol> = arcs.iter().filter_map(|arc| arc.id.clone()).collect();

    for arc in arcs.into_iter() {
        let kind = if arc.input {
            ElementKind::InputArc
        } else {
            ElementKind::OutputArc
        };
        let id = match arc.id {
            Some(id) => id,
            None => loop {
                let candidate = net.generate_id(kind);
                if !explicit.contains(&candidate) {
                    break candidate;
                }
            },
        };

        if arc.input {
            let mut input = InputArc::new(Identity::new(id), arc.place, arc.transition);
            for attr in arc.attrs {
                match attr {
                    ArcAttr::Label(label) => input.identity.label = Some(label),
                    ArcAttr::Evaluate(text) => input.evaluate = text,
                    ArcAttr::Execute(text) => input.execute = text,
                }
            }
            net.add_input_arc(input)?;
        } else {
            let mut output = OutputArc::new(Identity::new(id), arc.transition, arc.place);
            for attr in arc.attrs {
                match attr {
                    ArcAttr::Label(label) => output.identity.label = Some(label),
                    ArcAttr::Execute(text) => output.execute = text,
                    ArcAttr::Evaluate(_) => {
                        return Err(ParseError::InvalidAttribute {
                            element: output.identity.id,
                            attribute: "evaluate",
                        });
                    }
                }
            }
            net.add_output_arc(output)?;
        }
    }

    Ok(net)
}

fn build_place(
    id: Symbol,
    attrs: Vec<PlaceAttr>,
    evaluator: &dyn ExpressionEvaluator,
) -> Result<Place, ParseError> {
    let mut place = Place::new(Identity::new(id));
    for attr in attrs {
        match attr {
            PlaceAttr::Label(label) => place.identity.label = Some(label),
            PlaceAttr::Capacity(capacity) => place.capacity = capacity,
            PlaceAttr::Tokens(expressions) => {
                for expression in expressions {
                    let tokens = initial_marking(&place.identity.id, &expression, evaluator)?;
                    place.tokens.extend(tokens);
                }
            }
        }
    }
    Ok(place)
}

/// Evaluates one initial-marking inscription at clock 0.
///
/// A token keeps the inscription text when it is the only token the
/// inscription produced.
fn initial_marking(
    place: &Symbol,
    expression: &str,
    evaluator: &dyn ExpressionEvaluator,
) -> Result<TokenSet, ParseError> {
    let empty = TokenSet::new();
    let ctx = EvalContext::new(0, place).with_tokens(&empty);
    let tokens = evaluator
        .execute(expression, &ctx)
        .map_err(|source| ParseError::Marking {
            place: place.clone(),
            expression: expression.to_string(),
            source,
        })?;

    if tokens.len() == 1 {
        Ok(tokens
            .into_iter()
            .map(|token| token.with_initial_marking(expression))
            .collect())
    } else {
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Interpreter;

    const PRODUCER: &str = r#"
        # a bounded producer/consumer
        net producer label "Producer/consumer";
        declarations "int produced = 0;";
        place ready tokens ["()"];
        place buffer label "Buffer" capacity 4 tokens ["1", "[2, 3]@5"];
        place done;
        transition produce guard "true";
        transition consume label "Consume";
        input ready -> produce;
        output produce -> ready;
        output o9 produce -> buffer execute "1";
        input buffer -> consume evaluate "available() > 0" execute "1";
        output consume -> done execute "1@10";
    "#;

    #[test]
    fn parses_a_complete_net() {
        let net = parse(PRODUCER, &Interpreter::new()).unwrap();

        assert_eq!(net.identity.id.as_ref(), "producer");
        assert_eq!(net.identity.label.as_deref(), Some("Producer/consumer"));
        assert_eq!(net.declarations, "int produced = 0;");
        assert_eq!(net.place_count(), 3);
        assert_eq!(net.transition_count(), 2);

        let buffer = net.place(&"buffer".into()).unwrap();
        assert_eq!(buffer.capacity, 4);
        assert_eq!(buffer.tokens.len(), 3);
        assert_eq!(buffer.tokens.get(0).unwrap().initial_marking(), Some("1"));
        assert_eq!(buffer.tokens.get(1).unwrap().timestamp(), 5);

        let arc_ids: Vec<_> = net
            .input_arcs()
            .map(|arc| arc.identity.id.to_string())
            .chain(net.output_arcs().map(|arc| arc.identity.id.to_string()))
            .collect();
        assert_eq!(arc_ids, vec!["i1", "i3", "o2", "o9", "o4"]);
    }

    #[test]
    fn reports_syntax_errors() {
        let err = parse("place p1 capacity;", &Interpreter::new()).unwrap_err();
        assert!(matches!(err, ParseError::SyntaxError(_)));
    }

    #[test]
    fn reports_unknown_elements() {
        let err = parse("place p1; input p1 -> t1;", &Interpreter::new()).unwrap_err();
        assert_eq!(
            err,
            ParseError::Construction(NetError::UnknownElement("t1".into()))
        );
    }

    #[test]
    fn reports_duplicates() {
        let err = parse("place p1; transition p1;", &Interpreter::new()).unwrap_err();
        assert_eq!(err, ParseError::Construction(NetError::DuplicateId("p1".into())));
    }

    #[test]
    fn reports_bad_markings() {
        let err = parse(r#"place p1 tokens ["1 +"];"#, &Interpreter::new()).unwrap_err();
        assert!(matches!(err, ParseError::Marking { ref expression, .. } if expression == "1 +"));
    }

    #[test]
    fn output_arcs_have_no_evaluate() {
        let err = parse(
            r#"place p; transition t; output o1 t -> p evaluate "true";"#,
            &Interpreter::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidAttribute {
                element: "o1".into(),
                attribute: "evaluate"
            }
        );
    }
}
