use crate::element::{Identity, NetElement};
use crate::token::{Token, TokenSet};

/// Token container with an optional capacity bound (`0` = unbounded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub identity: Identity,
    pub tokens: TokenSet,
    pub capacity: usize,
}

impl Place {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            tokens: TokenSet::new(),
            capacity: 0,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_tokens(mut self, tokens: TokenSet) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.capacity > 0
    }

    /// Whether a marking of `count` tokens respects the capacity.
    pub fn fits(&self, count: usize) -> bool {
        !self.is_bounded() || count <= self.capacity
    }

    /// Whether one more token fits. Unbounded places always have room.
    pub fn has_headroom(&self) -> bool {
        self.fits(self.tokens.len() + 1)
    }

    pub fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }
}

impl NetElement for Place {
    fn identity(&self) -> &Identity {
        &self.identity
    }
}
