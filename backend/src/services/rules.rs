//! Declarative threshold rules.
//!
//! Recommendations, issues and forecast insights are all tables of
//! `(predicate, message)` pairs evaluated in order over a context value, so
//! each rule set can be read, extended and tested on its own.

/// A single threshold rule over a context `C`.
pub struct Rule<C> {
    pub id: &'static str,
    pub applies: fn(&C) -> bool,
    pub message: fn(&C) -> String,
}

impl<C> Rule<C> {
    pub const fn new(
        id: &'static str,
        applies: fn(&C) -> bool,
        message: fn(&C) -> String,
    ) -> Self {
        Self {
            id,
            applies,
            message,
        }
    }
}

/// Evaluate every rule in table order and collect the messages that fire.
pub fn evaluate<C>(rules: &[Rule<C>], ctx: &C) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| (rule.applies)(ctx))
        .map(|rule| {
            log::trace!("Rule {} fired", rule.id);
            (rule.message)(ctx)
        })
        .collect()
}

/// Evaluate several tables in order, keeping the first occurrence of each
/// message.
pub fn evaluate_all<C>(tables: &[&[Rule<C>]], ctx: &C) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for table in tables {
        for message in evaluate(table, ctx) {
            if !out.contains(&message) {
                out.push(message);
            }
        }
    }
    out
}
