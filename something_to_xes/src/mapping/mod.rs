//! Templates, mapping rules and trace routing
pub(crate) mod attribute_name;
pub(crate) mod router;
pub(crate) mod rules;
pub(crate) mod template;

#[doc(inline)]
pub use attribute_name::AttributeName;
#[doc(inline)]
pub use router::TraceRouter;
#[doc(inline)]
pub use rules::{AttributeMapper, MappingRule};
#[doc(inline)]
pub use template::Template;
