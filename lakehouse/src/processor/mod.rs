pub mod engine;
pub mod predicate;

pub use engine::{FilterRequest, QueryEngine, QueryResult};
pub use predicate::{Condition, Operator, PredicateBuilder};
