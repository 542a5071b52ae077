pub mod condition;
pub mod record;
pub mod response;
pub mod view;

pub use condition::{Comparison, CompositeCondition, Logic, Operator, matches, matches_composite};
pub use record::{FieldDef, FieldKind, FieldValue, GridSchema, Record};
pub use response::{GridOperationResponse, GroupSpec, HighlightRule, SortDir, SortSpec};
pub use view::ViewState;
