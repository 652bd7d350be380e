//! Serialization of nets to the format read by [`parse`](super::parser::parse).

use std::fmt::{self, Write};

use itertools::Itertools;

use crate::arc::{DEFAULT_EVALUATE, DEFAULT_EXECUTE};
use crate::net::PetriNet;
use crate::token::Token;
use crate::transition::DEFAULT_GUARD;

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn token_inscription(token: &Token) -> String {
    match token.initial_marking() {
        Some(expression) => expression.to_string(),
        None if token.is_timed() => {
            format!("{}@{}", token.value().to_literal(), token.timestamp())
        }
        None => token.value().to_literal(),
    }
}

fn label_suffix(label: &Option<String>) -> String {
    match label {
        Some(label) => format!(" label {}", quote(label)),
        None => String::new(),
    }
}

/// Serialize a net into the provided writer.
///
/// The current marking is written as the places' `tokens`. Attributes equal
/// to their defaults are omitted.
pub fn serialize_net_to<W: Write>(net: &PetriNet, writer: &mut W) -> fmt::Result {
    writeln!(
        writer,
        "net {}{};",
        net.identity.id,
        label_suffix(&net.identity.label)
    )?;
    for (keyword, text) in [
        ("declarations", &net.declarations),
        ("imports", &net.imports),
        ("implements", &net.implements),
    ] {
        if !text.is_empty() {
            writeln!(writer, "{} {};", keyword, quote(text))?;
        }
    }

    for place in net.places() {
        write!(
            writer,
            "place {}{}",
            place.identity.id,
            label_suffix(&place.identity.label)
        )?;
        if place.is_bounded() {
            write!(writer, " capacity {}", place.capacity)?;
        }
        if !place.tokens.is_empty() {
            write!(
                writer,
                " tokens [{}]",
                place
                    .tokens
                    .iter()
                    .map(|token| quote(&token_inscription(token)))
                    .join(", ")
            )?;
        }
        writeln!(writer, ";")?;
    }

    for transition in net.transitions() {
        write!(
            writer,
            "transition {}{}",
            transition.identity.id,
            label_suffix(&transition.identity.label)
        )?;
        if transition.guard != DEFAULT_GUARD {
            write!(writer, " guard {}", quote(&transition.guard))?;
        }
        writeln!(writer, ";")?;
    }

    for arc in net.input_arcs() {
        write!(
            writer,
            "input {} {} -> {}{}",
            arc.identity.id,
            arc.place,
            arc.transition,
            label_suffix(&arc.identity.label)
        )?;
        if arc.evaluate != DEFAULT_EVALUATE {
            write!(writer, " evaluate {}", quote(&arc.evaluate))?;
        }
        if arc.execute != DEFAULT_EXECUTE {
            write!(writer, " execute {}", quote(&arc.execute))?;
        }
        writeln!(writer, ";")?;
    }

    for arc in net.output_arcs() {
        write!(
            writer,
            "output {} {} -> {}{}",
            arc.identity.id,
            arc.transition,
            arc.place,
            label_suffix(&arc.identity.label)
        )?;
        if arc.execute != DEFAULT_EXECUTE {
            write!(writer, " execute {}", quote(&arc.execute))?;
        }
        writeln!(writer, ";")?;
    }

    Ok(())
}

/// Serialize a net to a string.
///
/// # Example
///
/// ```
/// use petrisim::expression::Interpreter;
/// use petrisim::net::{parser::parse, serialisation::serialize_net};
///
/// let net = parse("place p1 tokens [\"1\"]; transition t1; input p1 -> t1;", &Interpreter::new()).unwrap();
/// let text = serialize_net(&net);
/// assert!(text.contains("input i1 p1 -> t1;"));
/// ```
pub fn serialize_net(net: &PetriNet) -> String {
    let mut out = String::new();
    // Infallible for String
    let _ = serialize_net_to(net, &mut out);
    out
}
