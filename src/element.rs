//! Shared identity of net elements.
//!
//! Every place, transition and arc carries a unique identifier and an
//! optional human label. Identifiers are either supplied by a loader or
//! drawn from the [`IdGenerator`] owned by the net being built.

use std::fmt;

use string_cache::DefaultAtom;

/// Interned identifier.
pub type Symbol = DefaultAtom;

/// Identifier and optional label of a net element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: Symbol,
    pub label: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<Symbol>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Trait for places, transitions and arcs.
///
/// Implementors only provide [`identity`](NetElement::identity); the label
/// falls back to the identifier when unset.
pub trait NetElement {
    fn identity(&self) -> &Identity;

    fn id(&self) -> &Symbol {
        &self.identity().id
    }

    fn label(&self) -> &str {
        match &self.identity().label {
            Some(label) => label,
            None => self.id().as_ref(),
        }
    }
}

/// Kind of net element, used for id prefixes and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Place,
    Transition,
    InputArc,
    OutputArc,
}

impl ElementKind {
    /// Prefix of generated identifiers.
    pub fn prefix(self) -> &'static str {
        match self {
            ElementKind::Place => "p",
            ElementKind::Transition => "t",
            ElementKind::InputArc => "i",
            ElementKind::OutputArc => "o",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Place => "place",
            ElementKind::Transition => "transition",
            ElementKind::InputArc => "input arc",
            ElementKind::OutputArc => "output arc",
        };
        write!(f, "{}", name)
    }
}

/// Monotonic identifier source.
///
/// All kinds share one counter, so generated ids never collide across
/// kinds. Ids for which `is_taken` holds are skipped, which lets supplied
/// and generated identifiers coexist in one net.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: usize,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Returns the next free identifier for `kind`.
    pub fn next_id(&mut self, kind: ElementKind, is_taken: impl Fn(&Symbol) -> bool) -> Symbol {
        loop {
            self.next += 1;
            let candidate: Symbol = format!("{}{}", kind.prefix(), self.next).into();
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }

    /// Restarts numbering from the beginning.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Dummy(Identity);

    impl NetElement for Dummy {
        fn identity(&self) -> &Identity {
            &self.0
        }
    }

    #[test]
    fn label_defaults_to_id() {
        let plain = Dummy(Identity::new("p1"));
        assert_eq!(plain.label(), "p1");
        let labelled = Dummy(Identity::new("p1").with_label("Buffer"));
        assert_eq!(labelled.label(), "Buffer");
        assert_eq!(labelled.id().as_ref(), "p1");
    }

    #[test]
    fn generator_shares_one_counter_and_skips_taken_ids() {
        let mut ids = IdGenerator::new();
        let taken: HashSet<Symbol> = [Symbol::from("t2")].into_iter().collect();
        let taken = |id: &Symbol| taken.contains(id);

        assert_eq!(ids.next_id(ElementKind::Place, taken).as_ref(), "p1");
        assert_eq!(ids.next_id(ElementKind::Transition, taken).as_ref(), "t3");
        assert_eq!(ids.next_id(ElementKind::InputArc, taken).as_ref(), "i4");

        ids.reset();
        assert_eq!(ids.next_id(ElementKind::OutputArc, taken).as_ref(), "o1");
    }
}
