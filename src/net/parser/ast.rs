use crate::element::Symbol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceAttr {
    Label(String),
    Capacity(usize),
    Tokens(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionAttr {
    Label(String),
    Guard(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArcAttr {
    Label(String),
    Evaluate(String),
    Execute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Net {
        id: Symbol,
        label: Option<String>,
    },
    Declarations(String),
    Imports(String),
    Implements(String),
    Place {
        id: Symbol,
        attrs: Vec<PlaceAttr>,
    },
    Transition {
        id: Symbol,
        attrs: Vec<TransitionAttr>,
    },
    Input {
        id: Option<Symbol>,
        place: Symbol,
        transition: Symbol,
        attrs: Vec<ArcAttr>,
    },
    Output {
        id: Option<Symbol>,
        transition: Symbol,
        place: Symbol,
        attrs: Vec<ArcAttr>,
    },
}
