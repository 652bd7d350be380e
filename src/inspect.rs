//! The `inspect` command: tabulates a net file without running it.

use std::{fs, path::PathBuf};

use anyhow::*;
use clap::Parser;
use petgraph::dot;
use prettytable::*;

use crate::{
    element::NetElement,
    expression::{ExpressionEvaluator, Interpreter},
    net::{PetriNet, serialisation::serialize_net},
    read_file,
};

/// Command-line arguments for the inspect command.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Net description file
    pub input: PathBuf,

    /// DOT file displaying the net graph
    #[clap(long)]
    pub dot: Option<PathBuf>,

    /// Write the net back in normalised form
    #[clap(long, short)]
    pub output: Option<PathBuf>,
}

/// Print the places, transitions and arcs of a net and whether each
/// transition is enabled in the initial marking.
pub fn inspect_main(args: InspectArgs) -> Result<()> {
    let InspectArgs { input, dot, output } = args;

    let evaluator = Interpreter::new();
    let net = read_file(&input, &evaluator)?;

    match &net.identity.label {
        Some(label) => println!("Net {} ({})", net.identity.id, label),
        None => println!("Net {}", net.identity.id),
    }

    places_table(&net).printstd();
    transitions_table(&net, &evaluator).printstd();
    arcs_table(&net).printstd();

    if net.is_dead(&evaluator)? {
        println!("No transition is enabled.");
    }

    if let Some(filename) = dot {
        fs::write(filename, format!("{}", dot::Dot::new(net.graph())))?;
    }

    if let Some(filename) = output {
        fs::write(filename, serialize_net(&net))?;
    }

    Ok(())
}

fn places_table(net: &PetriNet) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["Place", "Label", "Capacity", "Tokens"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    for place in net.places() {
        let capacity = if place.is_bounded() {
            place.capacity.to_string()
        } else {
            "-".to_string()
        };
        table.add_row(row![place.id(), place.label(), r->capacity, place.tokens]);
    }
    table
}

fn transitions_table(net: &PetriNet, evaluator: &dyn ExpressionEvaluator) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["Transition", "Label", "Guard", "In", "Out", "Enabled"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    for transition in net.transitions() {
        let id = transition.id();
        let inputs = net.input_arcs().filter(|arc| &arc.transition == id).count();
        let outputs = net.output_arcs().filter(|arc| &arc.transition == id).count();
        let enabled = match net.enabled(id, 0, evaluator) {
            Result::Ok(true) => "yes".to_string(),
            Result::Ok(false) => "no".to_string(),
            Err(err) => format!("error: {}", err),
        };
        table.add_row(row![
            id,
            transition.label(),
            transition.guard,
            r->inputs,
            r->outputs,
            enabled,
        ]);
    }
    table
}

fn arcs_table(net: &PetriNet) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["Arc", "From", "To", "Evaluate", "Execute"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    for arc in net.input_arcs() {
        table.add_row(row![
            arc.identity.id,
            arc.place,
            arc.transition,
            arc.evaluate,
            arc.execute,
        ]);
    }
    for arc in net.output_arcs() {
        table.add_row(row![arc.identity.id, arc.transition, arc.place, "", arc.execute]);
    }
    table
}
