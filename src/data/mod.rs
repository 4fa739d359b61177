mod history;
mod limit;
mod request;
mod result;
mod style;

pub use history::HistorySink;
pub use limit::{LimitParseError, LimitSpec, Unit};
pub use request::{Credentials, GenerationRequest, RequestError};
pub use result::{ConstraintViolation, GenerationResult, StyleFinding, StyleRule, Variant};
pub use style::StyleRuleSet;
