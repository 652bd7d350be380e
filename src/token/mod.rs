//! Tokens and ordered token collections.
//!
//! A [`Token`] pairs a payload ([`Value`]) with a logical timestamp. A
//! timestamp of `0` marks the token as *untimed*: it is available at any
//! clock value. A *timed* token (timestamp > 0) becomes available once the
//! simulation clock reaches its timestamp.
//!
//! A [`TokenSet`] is the ordered multiset held by a place. Insertion order
//! reflects firing order and is stable, which keeps withdrawals and test
//! expectations deterministic.
//!
//! # Example
//!
//! ```
//! use petrisim::token::{Token, TokenSet, Value};
//!
//! let mut tokens = TokenSet::new();
//! tokens.push(Token::new(Value::Int(1)));
//! tokens.push(Token::timed(Value::Int(2), 5));
//!
//! // The untimed token is available immediately.
//! assert!(tokens.contains_time(0));
//! assert_eq!(tokens.earliest_pending(0), Some(5));
//! ```

mod value;

pub use value::Value;

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use itertools::Itertools;

/// Logical simulation time. `0` denotes "untimed".
pub type Time = u64;

/// A token: payload, timestamp and the initial-marking text it came from.
///
/// Equality and hashing only consider the payload and the timestamp; two
/// tokens with equal payload and timestamp are interchangeable.
#[derive(Debug, Clone, Default)]
pub struct Token {
    value: Value,
    timestamp: Time,
    initial_marking: Option<String>,
}

impl Token {
    /// Creates an untimed token.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            timestamp: 0,
            initial_marking: None,
        }
    }

    /// Creates a token available from `timestamp` on.
    pub fn timed(value: Value, timestamp: Time) -> Self {
        Self {
            value,
            timestamp,
            initial_marking: None,
        }
    }

    /// Records the initial-marking expression this token was produced from.
    pub fn with_initial_marking(mut self, expression: impl Into<String>) -> Self {
        self.initial_marking = Some(expression.into());
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn timestamp(&self) -> Time {
        self.timestamp
    }

    pub fn initial_marking(&self) -> Option<&str> {
        self.initial_marking.as_deref()
    }

    pub fn is_timed(&self) -> bool {
        self.timestamp != 0
    }

    /// Whether the token may be consumed at `clock`.
    pub fn is_available(&self, clock: Time) -> bool {
        self.timestamp <= clock
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.value == other.value
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.timestamp.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.initial_marking {
            Some(expression) if !expression.is_empty() => write!(f, "{}", expression),
            _ if self.is_timed() => write!(f, "{} {}", self.value, self.timestamp),
            _ => write!(f, "{}", self.value),
        }
    }
}

/// Ordered multiset of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet(Vec<Token>);

impl TokenSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, token: Token) {
        self.0.push(token);
    }

    /// Appends every token of `other`, preserving its order.
    pub fn extend(&mut self, other: TokenSet) {
        self.0.extend(other.0);
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.0.iter()
    }

    /// Availability gate for timed input arcs.
    ///
    /// Returns `true` when every token is untimed (this includes the empty
    /// set), or when at least one token has a timestamp `<= clock`.
    pub fn contains_time(&self, clock: Time) -> bool {
        let all_untimed = self.0.iter().all(|token| !token.is_timed());
        all_untimed || self.0.iter().any(|token| token.timestamp <= clock)
    }

    /// Adds `delta` to the timestamp of every timed token. Untimed tokens
    /// stay at `0`.
    ///
    /// Returns `None` and leaves the set untouched if a timestamp would
    /// overflow.
    pub fn increment_time(&mut self, delta: Time) -> Option<()> {
        let shifted = self
            .0
            .iter()
            .map(|token| {
                if token.is_timed() {
                    token.timestamp.checked_add(delta)
                } else {
                    Some(0)
                }
            })
            .collect::<Option<Vec<_>>>()?;

        for (token, timestamp) in self.0.iter_mut().zip(shifted) {
            token.timestamp = timestamp;
        }
        Some(())
    }

    /// Smallest timestamp strictly greater than `after` among timed tokens.
    pub fn earliest_pending(&self, after: Time) -> Option<Time> {
        self.0
            .iter()
            .map(Token::timestamp)
            .filter(|&timestamp| timestamp != 0 && timestamp > after)
            .min()
    }

    /// Number of tokens consumable at `clock`.
    pub fn available(&self, clock: Time) -> usize {
        self.0.iter().filter(|token| token.is_available(clock)).count()
    }

    /// Removes one available token per requested token and returns them.
    ///
    /// For each token of `request`, in order, the first available token
    /// (timestamp `<= clock`) with an equal payload is removed; when none
    /// matches, the first available token in iteration order is taken
    /// instead. Returns `None` and leaves the set untouched when the set
    /// runs out of available tokens.
    pub fn withdraw(&mut self, request: &TokenSet, clock: Time) -> Option<TokenSet> {
        let mut remaining = self.0.clone();
        let mut removed = TokenSet::new();

        for wanted in request.iter() {
            let index = remaining
                .iter()
                .position(|token| token.is_available(clock) && token.value == wanted.value)
                .or_else(|| remaining.iter().position(|token| token.is_available(clock)))?;
            removed.push(remaining.remove(index));
        }

        self.0 = remaining;
        Some(removed)
    }
}

impl From<Vec<Token>> for TokenSet {
    fn from(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }
}

impl From<Token> for TokenSet {
    fn from(token: Token) -> Self {
        Self(vec![token])
    }
}

impl FromIterator<Token> for TokenSet {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TokenSet {
    type Item = Token;
    type IntoIter = std::vec::IntoIter<Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TokenSet {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(timestamps: &[Time]) -> TokenSet {
        timestamps
            .iter()
            .map(|&ts| Token::timed(Value::Int(1), ts))
            .collect()
    }

    #[test]
    fn token_equality_ignores_initial_marking() {
        let a = Token::new(Value::Int(1)).with_initial_marking("1");
        let b = Token::new(Value::Int(1));
        assert_eq!(a, b);
        assert_ne!(a, Token::timed(Value::Int(1), 3));
    }

    #[test]
    fn token_display() {
        assert_eq!(Token::new(Value::from("job")).to_string(), "job");
        assert_eq!(Token::timed(Value::Int(4), 12).to_string(), "4 12");
        assert_eq!(
            Token::timed(Value::Int(4), 12)
                .with_initial_marking("4@12")
                .to_string(),
            "4@12"
        );
    }

    #[test]
    fn untimed_set_is_always_available() {
        let tokens = set(&[0, 0, 0]);
        for clock in [0, 1, 1000] {
            assert!(tokens.contains_time(clock));
        }
        assert!(TokenSet::new().contains_time(7));
    }

    #[test]
    fn timed_token_becomes_available_at_its_timestamp() {
        let tokens = set(&[5]);
        assert!(!tokens.contains_time(4));
        assert!(tokens.contains_time(5));
        assert!(tokens.contains_time(6));
    }

    #[test]
    fn mixed_set_needs_one_ready_token() {
        // An untimed token next to a pending one is not enough on its own:
        // the set is timed, and the untimed token has timestamp 0 <= clock.
        let tokens = set(&[0, 9]);
        assert!(tokens.contains_time(0));
        let tokens = set(&[7, 9]);
        assert!(!tokens.contains_time(6));
        assert!(tokens.contains_time(7));
    }

    #[test]
    fn increment_time_skips_untimed_tokens() {
        let mut tokens = set(&[0, 3, 10]);
        tokens.increment_time(5).unwrap();
        let timestamps: Vec<_> = tokens.iter().map(Token::timestamp).collect();
        assert_eq!(timestamps, vec![0, 8, 15]);
    }

    #[test]
    fn earliest_pending_skips_untimed_and_past_tokens() {
        let tokens = set(&[0, 100, 50]);
        assert_eq!(tokens.earliest_pending(10), Some(50));
        assert_eq!(tokens.earliest_pending(50), Some(100));
        assert_eq!(tokens.earliest_pending(100), None);
        assert_eq!(set(&[0, 0]).earliest_pending(0), None);
    }

    #[test]
    fn withdraw_prefers_matching_payload() {
        let mut tokens: TokenSet = vec![
            Token::new(Value::from("a")),
            Token::new(Value::from("b")),
            Token::new(Value::from("a")),
        ]
        .into();
        let removed = tokens
            .withdraw(&Token::new(Value::from("b")).into(), 0)
            .expect("a token is available");
        assert_eq!(removed.get(0).unwrap().value(), &Value::from("b"));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn withdraw_falls_back_to_first_available_token() {
        let mut tokens: TokenSet = vec![
            Token::timed(Value::from("late"), 20),
            Token::timed(Value::from("ready"), 4),
        ]
        .into();
        let removed = tokens
            .withdraw(&Token::new(Value::Int(1)).into(), 10)
            .expect("one token is ready");
        assert_eq!(removed.get(0).unwrap().value(), &Value::from("ready"));
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn withdraw_is_all_or_nothing() {
        let mut tokens = set(&[0]);
        let request = set(&[0, 0]);
        assert!(tokens.withdraw(&request, 0).is_none());
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn increment_time_overflow_leaves_the_set_untouched() {
        let mut tokens = set(&[0, 4, Time::MAX - 1]);
        assert_eq!(tokens.increment_time(2), None);
        let timestamps: Vec<_> = tokens.iter().map(Token::timestamp).collect();
        assert_eq!(timestamps, vec![0, 4, Time::MAX - 1]);

        assert_eq!(tokens.increment_time(1), Some(()));
        assert_eq!(tokens.get(2).unwrap().timestamp(), Time::MAX);
    }
}
